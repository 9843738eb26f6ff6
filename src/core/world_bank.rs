use crate::domain::document::{Alignment, Block, Cell, Document, Table};
use crate::domain::model::PortfolioRecord;
use chrono::NaiveDate;
use scraper::Html;

pub const DOCUMENT_TITLE: &str = "Assignment Details";

/// Key column and value column widths, in points.
pub const COLUMN_WIDTHS_PT: [f32; 2] = [200.0, 300.0];

/// Key/value rows of the World Bank assignment table, always 14 of them.
pub fn rows(record: &PortfolioRecord) -> Vec<(&'static str, String)> {
    let staff_months = format_number(record.total_staff_months);
    vec![
        ("Assignment name:", record.title().to_string()),
        (
            "Approx. value of the contract (in current US$):",
            format_amount(record.approximate_contract_value),
        ),
        ("Country:", record.location().to_string()),
        (
            "Duration of assignment (months):",
            format_number(record.duration_of_assignment),
        ),
        ("Name of Client(s):", record.client().to_string()),
        (
            "Contact Person, Title/Designation, Tel. No./Address:",
            record.contact_or_placeholder().to_string(),
        ),
        ("Start Date (month/year):", format_month_year(record.start_date)),
        ("End Date (month/year):", format_month_year(record.end_date)),
        (
            "Total No. of staff-months of the assignment:",
            staff_months.clone(),
        ),
        (
            "No. of professional staff-months provided by your consulting firm/organization or your sub consultants:",
            staff_months,
        ),
        ("Name of associated Consultants, if any:", String::new()),
        (
            "Name of senior professional staff of your consulting firm/organization involved and designation and/or functions performed (e.g. Project Director/ Coordinator, Team Leader):",
            String::new(),
        ),
        ("Description of Project:", plain_text(record.body())),
        (
            "Description of actual services provided by your staff within the assignment:",
            record.services().collect::<Vec<_>>().join(", "),
        ),
    ]
}

/// Builds the World Bank document straight from the records.
pub fn build_document(records: &[PortfolioRecord]) -> Document {
    let mut doc = Document::new();
    doc.push(Block::Heading {
        level: 1,
        text: DOCUMENT_TITLE.to_string(),
        alignment: Alignment::Inherit,
        bold: true,
    });

    for record in records {
        doc.push(Block::heading(2, record.title()));
        let table_rows = rows(record)
            .into_iter()
            .map(|(key, value)| vec![Cell::text(key), Cell::text(value)])
            .collect();
        doc.push(Block::Table(Table {
            rows: table_rows,
            column_widths_pt: Some(COLUMN_WIDTHS_PT.to_vec()),
            bordered: true,
        }));
    }

    doc
}

pub fn format_month_year(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%m/%Y").to_string())
        .unwrap_or_default()
}

/// Whole numbers without decimals, others with up to two.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
        Some(v) => {
            let formatted = format!("{:.2}", v);
            formatted
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        }
    }
}

/// Amount with thousands separators and two decimals, e.g. `1,250,000.00`.
pub fn format_amount(value: Option<f64>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    let formatted = format!("{:.2}", value.abs());
    let (whole, decimals) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, decimals)
}

/// Reduces host HTML (rich text fields) to whitespace-normalised text.
pub fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
