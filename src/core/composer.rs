use crate::core::world_bank;
use crate::domain::model::{Layout, PortfolioRecord, PLACEHOLDER};
use chrono::NaiveDate;

const SHEET_TITLE: &str = "Kartoza Project Sheet";
const ACCENT: &str = "#f4b340";
const ASSET_DIR: &str = "/assets/portfolio/images";

/// Prefixes `path` with `base_url` unless it already carries an http(s) scheme.
pub fn absolute_url(base_url: &str, path: &str) -> String {
    let path = path.trim();
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Builds one HTML document covering every record, in the given order.
pub fn compose(records: &[PortfolioRecord], layout: Layout, base_url: &str) -> String {
    let (title, sections) = match layout {
        Layout::Kartoza => (
            SHEET_TITLE,
            records
                .iter()
                .map(|r| kartoza_section(r, base_url))
                .collect::<String>(),
        ),
        Layout::WorldBank => (
            world_bank::DOCUMENT_TITLE,
            world_bank_sections(records),
        ),
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        title, sections
    )
}

fn cell_style(extra: &str) -> String {
    format!(
        "display: table-cell; border: 1px solid gray; padding: 10px; vertical-align: middle;{}",
        extra
    )
}

fn kartoza_section(record: &PortfolioRecord, base_url: &str) -> String {
    let asset = |name: &str| absolute_url(base_url, &format!("{}/{}.png", ASSET_DIR, name));
    let mut html = String::new();

    // 標題
    html.push_str(&format!(
        "<h3 style=\"color:{};text-align:center\">{}</h3>\n",
        ACCENT, SHEET_TITLE
    ));
    html.push_str(&format!(
        "<h2 style=\"text-align:center\">{}</h2>\n",
        escape_html(record.title())
    ));
    html.push_str(&format!(
        "<hr style=\"border: 8px solid {}; width: 90px; margin: auto;\">\n",
        ACCENT
    ));

    // 客戶 / 地點 / 期間
    let info = [
        ("person", format!("Client: {}", escape_html(record.client()))),
        ("location", format!("Location: {}", escape_html(record.location()))),
        (
            "time",
            format!(
                "Period: {} - {}",
                format_date(record.start_date),
                format_date(record.end_date)
            ),
        ),
    ];
    html.push_str("<div style=\"display: table; width: 100%;\">\n<div style=\"display: table-row;\">\n");
    for (icon, label) in &info {
        html.push_str(&format!(
            "<div style=\"{}\">\n<img src=\"{}\" alt=\"{}\" style=\"width:80px;height:auto;\">\n<p style=\"text-align:center\">{}</p>\n</div>\n",
            cell_style(" width: 33%; text-align: center;"),
            asset(*icon),
            icon,
            label
        ));
    }
    html.push_str("</div>\n</div>\n");

    // 客戶資訊與圖片
    let logo = match record.client_logo() {
        Some(path) => format!(
            "<img src=\"{}\" alt=\"Client logo\" style=\"width:100%;height:auto;\">",
            escape_html(&absolute_url(base_url, path))
        ),
        None => format!("<p>Client logo: {}</p>", PLACEHOLDER),
    };
    let gallery: String = record
        .image_paths()
        .map(|path| {
            format!(
                "<img src=\"{}\" alt=\"Screenshot\" style=\"width:100%;height:auto;padding:10px\">\n",
                escape_html(&absolute_url(base_url, path))
            )
        })
        .collect();
    html.push_str(&format!(
        "<div style=\"display: table; width: 100%;\">\n<div style=\"display: table-row;\">\n\
         <div style=\"{}\">\n{}\n<p>Client reference: {}</p>\n<p>Client contact: {}</p>\n</div>\n\
         <div style=\"{}\">\n{}</div>\n</div>\n</div>\n",
        cell_style(" width: 40%;"),
        logo,
        escape_html(record.client_reference_or_placeholder()),
        escape_html(record.contact_or_placeholder()),
        cell_style(" width: 60%;"),
        gallery
    ));

    // 專案描述與服務
    html.push_str(&format!(
        "<div style=\"display: table; width: 100%;\">\n<div style=\"display: table-row;\">\n\
         <div style=\"{}\">\n<p style=\"font-weight: bold\">Project Description</p>\n<p>{}</p>\n</div>\n\
         <div style=\"{}\">\n<p style=\"font-weight: bold\">Services Provided</p>\n<ul>\n{}</ul>\n</div>\n</div>\n</div>\n",
        cell_style(" width: 60%;"),
        record.body(),
        cell_style(" width: 40%;"),
        list_items(record.services())
    ));

    let technologies = list_items(record.technologies());
    if !technologies.is_empty() {
        html.push_str(&format!(
            "<div>\n<p style=\"font-weight: bold\">Technologies</p>\n<ul>\n{}</ul>\n</div>\n",
            technologies
        ));
    }

    html.push_str(&format!(
        "<div>\n<img src=\"{}\" alt=\"Footer\" style=\"width:100%;height:auto;\">\n</div>\n",
        asset("footer")
    ));
    html
}

fn list_items<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items
        .map(|item| format!("<li>{}</li>\n", escape_html(item)))
        .collect()
}

fn world_bank_sections(records: &[PortfolioRecord]) -> String {
    let mut html = format!(
        "<h1 style=\"font-weight: bold\">{}</h1>\n",
        world_bank::DOCUMENT_TITLE
    );
    for record in records {
        html.push_str(&format!("<h2>{}</h2>\n", escape_html(record.title())));
        html.push_str("<table style=\"border-collapse: collapse; width: 100%;\" border=\"1\">\n");
        for (key, value) in world_bank::rows(record) {
            html.push_str(&format!(
                "<tr><td style=\"width: 40%;\">{}</td><td style=\"width: 60%;\">{}</td></tr>\n",
                escape_html(key),
                escape_html(&value)
            ));
        }
        html.push_str("</table>\n");
    }
    html
}
