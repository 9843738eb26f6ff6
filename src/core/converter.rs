//! HTML to document-model conversion.
//!
//! Walks the `<body>` tree once, in document order. Layout containers
//! (`display: flex` / `display: table` and real `<table>`s) become tables with
//! one row per child container and one cell per grandchild.

use crate::core::composer::absolute_url;
use crate::core::style::{parse_length, InlineStyle};
use crate::domain::document::{Alignment, Block, Cell, Document, ImageWidth, Paragraph, Table, CONTENT_WIDTH_INCHES};
use scraper::node::Node;
use scraper::{ElementRef, Html};

const SKIPPED: &[&str] = &[
    "head", "title", "meta", "link", "script", "style", "hr", "br", "noscript",
];
const INLINE: &[&str] = &[
    "a", "abbr", "b", "code", "em", "font", "i", "label", "mark", "small", "span", "strong",
    "sub", "sup", "u",
];
const CELL_CONTAINERS: &[&str] = &["div", "td", "th", "section"];
/// Elements whose edges separate words when flattened to text.
const TEXT_BOUNDARIES: &[&str] = &[
    "blockquote", "dd", "div", "dl", "dt", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ol", "p",
    "section", "table", "td", "th", "tr", "ul",
];

pub fn convert(html: &str, base_url: &str) -> Document {
    let parsed = Html::parse_document(html);
    let root = parsed.root_element();
    let body = root
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "body")
        .unwrap_or(root);

    let walker = Walker {
        base_url,
        in_cell: false,
    };
    let mut doc = Document::new();
    walker.walk_children(body, &mut doc.blocks);
    tracing::debug!("Converted HTML into {} blocks", doc.blocks.len());
    doc
}

#[derive(Clone, Copy)]
struct Walker<'a> {
    base_url: &'a str,
    in_cell: bool,
}

impl<'a> Walker<'a> {
    fn walk_children(&self, el: ElementRef<'_>, out: &mut Vec<Block>) {
        let mut pending = String::new();

        for child in el.children() {
            match child.value() {
                Node::Text(text) => push_text(&mut pending, text),
                Node::Element(_) => {
                    let Some(child_el) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if is_inline(child_el) {
                        collect_text(child_el, &mut pending);
                    } else {
                        flush(&mut pending, out);
                        self.walk_element(child_el, out);
                    }
                }
                _ => {}
            }
        }
        flush(&mut pending, out);
    }

    fn walk_element(&self, el: ElementRef<'_>, out: &mut Vec<Block>) {
        let name = el.value().name();
        let style = style_of(el);

        match name {
            _ if SKIPPED.contains(&name) => {}
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let text = element_text(el);
                if text.is_empty() {
                    return;
                }
                if self.in_cell {
                    out.push(Block::Paragraph(Paragraph::new(text).bold().align(style.alignment())));
                } else {
                    let level = name[1..].parse().unwrap_or(1);
                    out.push(Block::Heading {
                        level,
                        text,
                        alignment: style.alignment(),
                        bold: style.is_bold(),
                    });
                }
            }
            "p" => {
                if has_descendant(el, "img") {
                    self.walk_children(el, out);
                    return;
                }
                let text = element_text(el);
                if text.is_empty() {
                    return;
                }
                out.push(Block::Paragraph(Paragraph {
                    text,
                    alignment: style.alignment(),
                    bold: style.is_bold() || is_wrapped_bold(el),
                    size_pt: style.font_size_pt(),
                }));
            }
            "ul" | "ol" => {
                for li in el.children().filter_map(ElementRef::wrap) {
                    if li.value().name() != "li" {
                        continue;
                    }
                    let text = element_text(li);
                    if !text.is_empty() {
                        out.push(Block::Bullet(text));
                    }
                }
            }
            "li" => {
                let text = element_text(el);
                if !text.is_empty() {
                    out.push(Block::Bullet(text));
                }
            }
            "img" => {
                if let Some(block) = self.image(el, &style) {
                    out.push(block);
                }
            }
            "table" if !self.in_cell => {
                if let Some(table) = self.html_table(el) {
                    out.push(Block::Table(table));
                }
            }
            _ if !self.in_cell && style.is_layout_container() => {
                match self.layout_table(el, &style) {
                    Some(table) => out.push(Block::Table(table)),
                    None => self.walk_children(el, out),
                }
            }
            _ => self.walk_children(el, out),
        }
    }

    fn image(&self, el: ElementRef<'_>, style: &InlineStyle) -> Option<Block> {
        let src = el.value().attr("src").map(str::trim).filter(|s| !s.is_empty())?;
        let width = style
            .width()
            .or_else(|| el.value().attr("width").and_then(parse_length))
            .unwrap_or(ImageWidth::Default);
        Some(Block::Image {
            src: absolute_url(self.base_url, src),
            width,
        })
    }

    fn cell_walker(&self) -> Walker<'a> {
        Walker {
            in_cell: true,
            ..*self
        }
    }

    fn cell(&self, el: ElementRef<'_>) -> Cell {
        let mut blocks = Vec::new();
        self.cell_walker().walk_children(el, &mut blocks);
        Cell { blocks }
    }

    /// `None` when the container yields no rows at all.
    fn layout_table(&self, container: ElementRef<'_>, style: &InlineStyle) -> Option<Table> {
        let mut rows = Vec::new();
        let mut first_row_cells: Vec<ElementRef<'_>> = Vec::new();
        let mut pending = String::new();

        for child in container.children() {
            let row_el = match child.value() {
                Node::Text(text) => {
                    push_text(&mut pending, text);
                    continue;
                }
                Node::Element(_) => match ElementRef::wrap(child) {
                    Some(el) => el,
                    None => continue,
                },
                _ => continue,
            };
            let name = row_el.value().name();
            if name == "br" {
                push_break(&mut pending);
                continue;
            }
            if SKIPPED.contains(&name) {
                continue;
            }
            // 文字與行內元素合併成單一儲存格的列
            if is_inline(row_el) {
                collect_text(row_el, &mut pending);
                continue;
            }
            flush_row(&mut pending, &mut rows);

            let cell_els: Vec<ElementRef<'_>> = row_el
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|el| CELL_CONTAINERS.contains(&el.value().name()))
                .collect();

            let cells = if cell_els.is_empty() {
                vec![self.cell(row_el)]
            } else {
                cell_els.iter().map(|el| self.cell(*el)).collect()
            };
            if rows.is_empty() {
                first_row_cells = cell_els;
            }
            rows.push(cells);
        }
        flush_row(&mut pending, &mut rows);

        if rows.is_empty() {
            return None;
        }
        let bordered = style.has_border()
            || first_row_cells
                .iter()
                .any(|el| style_of(*el).has_border());
        Some(finish_table(rows, column_widths(&first_row_cells), bordered))
    }

    fn html_table(&self, table: ElementRef<'_>) -> Option<Table> {
        let mut row_els = Vec::new();
        for child in table.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "tr" => row_els.push(child),
                "thead" | "tbody" | "tfoot" => row_els.extend(
                    child
                        .children()
                        .filter_map(ElementRef::wrap)
                        .filter(|el| el.value().name() == "tr"),
                ),
                _ => {}
            }
        }

        let mut rows = Vec::new();
        let mut first_row_cells = Vec::new();
        for row_el in row_els {
            let cell_els: Vec<ElementRef<'_>> = row_el
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|el| matches!(el.value().name(), "td" | "th"))
                .collect();
            if cell_els.is_empty() {
                continue;
            }
            let cells = cell_els.iter().map(|el| self.cell(*el)).collect();
            if rows.is_empty() {
                first_row_cells = cell_els;
            }
            rows.push(cells);
        }

        if rows.is_empty() {
            return None;
        }
        let bordered = table
            .value()
            .attr("border")
            .map(|b| b.trim() != "0")
            .unwrap_or(false)
            || style_of(table).has_border();
        Some(finish_table(rows, column_widths(&first_row_cells), bordered))
    }
}

fn finish_table(mut rows: Vec<Vec<Cell>>, column_widths_pt: Option<Vec<f32>>, bordered: bool) -> Table {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize_with(columns, Cell::default);
    }
    let column_widths_pt = column_widths_pt.filter(|widths| widths.len() == columns);
    Table {
        rows,
        column_widths_pt,
        bordered,
    }
}

/// Column widths from the first row, only when every cell states a percentage.
fn column_widths(cells: &[ElementRef<'_>]) -> Option<Vec<f32>> {
    if cells.is_empty() {
        return None;
    }
    let page_pt = CONTENT_WIDTH_INCHES * 72.0;
    cells
        .iter()
        .map(|el| match style_of(*el).width() {
            Some(ImageWidth::Percent(p)) => Some(page_pt * p / 100.0),
            _ => None,
        })
        .collect()
}

fn style_of(el: ElementRef<'_>) -> InlineStyle {
    InlineStyle::parse(el.value().attr("style").unwrap_or_default())
}

fn is_inline(el: ElementRef<'_>) -> bool {
    INLINE.contains(&el.value().name()) && !has_descendant(el, "img")
}

fn has_descendant(el: ElementRef<'_>, name: &str) -> bool {
    el.descendants()
        .filter_map(ElementRef::wrap)
        .any(|d| d.value().name() == name)
}

/// `<p><strong>...</strong></p>` with no text outside the wrapper.
fn is_wrapped_bold(el: ElementRef<'_>) -> bool {
    let mut wrapped = false;
    for child in el.children() {
        match child.value() {
            Node::Text(text) if text.trim().is_empty() => {}
            Node::Element(e) if matches!(e.name(), "b" | "strong") && !wrapped => wrapped = true,
            Node::Comment(_) => {}
            _ => return false,
        }
    }
    wrapped
}

fn element_text(el: ElementRef<'_>) -> String {
    let mut text = String::new();
    collect_text(el, &mut text);
    text.trim().to_string()
}

/// Flattens an element to text; `<br>` and block edges become spaces.
fn collect_text(el: ElementRef<'_>, buffer: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_text(buffer, text),
            Node::Element(e) if e.name() == "br" => push_break(buffer),
            Node::Element(e) if matches!(e.name(), "script" | "style") => {}
            Node::Element(e) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let boundary = TEXT_BOUNDARIES.contains(&e.name());
                if boundary {
                    push_break(buffer);
                }
                collect_text(child_el, buffer);
                if boundary {
                    push_break(buffer);
                }
            }
            _ => {}
        }
    }
}

fn push_break(buffer: &mut String) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
}

/// Appends text, collapsing runs of whitespace to a single space.
fn push_text(buffer: &mut String, text: &str) {
    let starts_with_space = text.starts_with(char::is_whitespace);
    for (i, word) in text.split_whitespace().enumerate() {
        if !buffer.is_empty() && (i > 0 || starts_with_space) && !buffer.ends_with(' ') {
            buffer.push(' ');
        }
        buffer.push_str(word);
    }
    if text.ends_with(char::is_whitespace) && !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
}

fn flush_row(pending: &mut String, rows: &mut Vec<Vec<Cell>>) {
    let text = pending.trim();
    if !text.is_empty() {
        rows.push(vec![Cell::text(text)]);
    }
    pending.clear();
}

fn flush(pending: &mut String, out: &mut Vec<Block>) {
    let text = pending.trim();
    if !text.is_empty() {
        out.push(Block::Paragraph(Paragraph::new(text)));
    }
    pending.clear();
}
