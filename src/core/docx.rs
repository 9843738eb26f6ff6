use crate::domain::document::{
    Alignment, Block, Cell, Document, Table, CONTENT_HEIGHT_INCHES, CONTENT_WIDTH_INCHES,
    DEFAULT_IMAGE_WIDTH_INCHES,
};
use crate::domain::ports::ImageFetcher;
use crate::utils::error::{ExportError, Result};
use docx_rs::{AlignmentType, Docx, Pic, Run, Style, StyleType, TableCell, TableRow, WidthType};
use image::ImageFormat;
use std::collections::HashMap;
use std::io::Cursor;

const EMU_PER_INCH: f32 = 914_400.0;
const DXA_PER_INCH: f32 = 1_440.0;
const DXA_PER_POINT: f32 = 20.0;
const HEADING_SIZES_PT: [usize; 6] = [20, 16, 14, 13, 12, 11];
const BULLET_STYLE: &str = "ListBullet";

/// Image bytes that are known to decode, with their pixel size.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub data: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl PreparedImage {
    pub fn from_bytes(data: Vec<u8>) -> std::result::Result<Self, String> {
        let format = image::guess_format(&data).map_err(|e| e.to_string())?;
        if !matches!(
            format,
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::Bmp
        ) {
            return Err(format!("unsupported image format {:?}", format));
        }
        let decoded =
            image::load_from_memory_with_format(&data, format).map_err(|e| e.to_string())?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err("image has no pixels".to_string());
        }
        Ok(Self {
            width_px: decoded.width(),
            height_px: decoded.height(),
            data,
        })
    }

    /// EMU size for a given width in inches, keeping the aspect ratio and
    /// shrinking to fit the page height.
    fn size_emu(&self, width_in: f32) -> (u32, u32) {
        let mut width_in = width_in;
        let mut height_in = width_in * self.height_px as f32 / self.width_px as f32;
        if height_in > CONTENT_HEIGHT_INCHES {
            width_in *= CONTENT_HEIGHT_INCHES / height_in;
            height_in = CONTENT_HEIGHT_INCHES;
        }
        (
            (width_in * EMU_PER_INCH).round() as u32,
            (height_in * EMU_PER_INCH).round() as u32,
        )
    }
}

pub struct DocxWriter<'a> {
    images: &'a dyn ImageFetcher,
    default_image_width: f32,
}

impl<'a> DocxWriter<'a> {
    pub fn new(images: &'a dyn ImageFetcher) -> Self {
        Self {
            images,
            default_image_width: DEFAULT_IMAGE_WIDTH_INCHES,
        }
    }

    pub fn with_default_image_width(mut self, inches: f32) -> Self {
        self.default_image_width = inches;
        self
    }

    /// Fetches every referenced image once, then serialises the document.
    pub async fn render(&self, doc: &Document) -> Result<Vec<u8>> {
        let images = self.fetch_images(doc).await;
        self.build(doc, &images)
    }

    async fn fetch_images(&self, doc: &Document) -> HashMap<String, PreparedImage> {
        let mut images = HashMap::new();
        let mut failed = 0usize;

        for src in doc.image_sources() {
            if images.contains_key(src) {
                continue;
            }
            match self.images.fetch(src).await {
                Ok(bytes) => match PreparedImage::from_bytes(bytes) {
                    Ok(prepared) => {
                        images.insert(src.to_string(), prepared);
                    }
                    Err(reason) => {
                        failed += 1;
                        tracing::warn!("⚠️ Skipping image {}: {}", src, reason);
                    }
                },
                Err(e) => {
                    failed += 1;
                    tracing::warn!("⚠️ Failed to fetch image {}: {}", src, e);
                }
            }
        }

        tracing::debug!("Embedded {} images, skipped {}", images.len(), failed);
        images
    }

    pub fn build(&self, doc: &Document, images: &HashMap<String, PreparedImage>) -> Result<Vec<u8>> {
        let mut docx = Docx::new().add_style(
            Style::new(BULLET_STYLE, StyleType::Paragraph).name("List Bullet"),
        );
        for (i, size) in HEADING_SIZES_PT.iter().enumerate() {
            docx = docx.add_style(
                Style::new(&format!("Heading{}", i + 1), StyleType::Paragraph)
                    .name(&format!("Heading {}", i + 1))
                    .size(size * 2)
                    .bold(),
            );
        }

        for block in &doc.blocks {
            match block {
                // 沒有列的表格 Word 會視為損毀
                Block::Table(table) if table.rows.is_empty() => {}
                Block::Table(table) => docx = docx.add_table(self.table(table, images)),
                other => {
                    if let Some(paragraph) = self.paragraph(other, images, CONTENT_WIDTH_INCHES) {
                        docx = docx.add_paragraph(paragraph);
                    }
                }
            }
        }

        let mut buffer = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buffer)
            .map_err(|e| ExportError::DocumentError {
                message: format!("failed to pack docx: {}", e),
            })?;
        Ok(buffer.into_inner())
    }

    fn paragraph(
        &self,
        block: &Block,
        images: &HashMap<String, PreparedImage>,
        available_width: f32,
    ) -> Option<docx_rs::Paragraph> {
        match block {
            Block::Heading {
                level,
                text,
                alignment,
                bold,
            } => {
                let mut run = Run::new().add_text(text);
                if *bold {
                    run = run.bold();
                }
                let paragraph = docx_rs::Paragraph::new()
                    .add_run(run)
                    .style(&format!("Heading{}", level));
                Some(align(paragraph, *alignment))
            }
            Block::Paragraph(p) => {
                let mut run = Run::new().add_text(&p.text);
                if p.bold {
                    run = run.bold();
                }
                if let Some(size) = p.size_pt {
                    run = run.size((size * 2.0).round() as usize);
                }
                Some(align(docx_rs::Paragraph::new().add_run(run), p.alignment))
            }
            Block::Bullet(text) => Some(
                docx_rs::Paragraph::new()
                    .add_run(Run::new().add_text(format!("• {}", text)))
                    .style(BULLET_STYLE),
            ),
            Block::Image { src, width } => {
                // 下載失敗的圖片直接略過
                let prepared = images.get(src)?;
                let width_in = width.inches(available_width, self.default_image_width);
                let (cx, cy) = prepared.size_emu(width_in);
                let pic = Pic::new(&prepared.data).size(cx, cy);
                Some(docx_rs::Paragraph::new().add_run(Run::new().add_image(pic)))
            }
            Block::Table(table) => {
                // 巢狀表格攤平成文字
                let text = table
                    .rows
                    .iter()
                    .map(|row| row.iter().map(Cell::plain_text).collect::<Vec<_>>().join(" | "))
                    .collect::<Vec<_>>()
                    .join("\n");
                Some(docx_rs::Paragraph::new().add_run(Run::new().add_text(text)))
            }
        }
    }

    fn table(&self, table: &Table, images: &HashMap<String, PreparedImage>) -> docx_rs::Table {
        let columns = table.column_count().max(1);
        let widths: Vec<usize> = match &table.column_widths_pt {
            Some(widths) if widths.len() == columns => widths
                .iter()
                .map(|pt| (pt * DXA_PER_POINT).round() as usize)
                .collect(),
            _ => vec![(CONTENT_WIDTH_INCHES * DXA_PER_INCH) as usize / columns; columns],
        };

        let rows = table
            .rows
            .iter()
            .map(|row| {
                let cells = (0..columns)
                    .map(|i| {
                        let cell = row.get(i);
                        self.table_cell(cell, widths[i], images)
                    })
                    .collect();
                TableRow::new(cells)
            })
            .collect();

        let rendered = docx_rs::Table::new(rows).set_grid(widths);
        if table.bordered {
            rendered
        } else {
            rendered.clear_all_border()
        }
    }

    fn table_cell(
        &self,
        cell: Option<&Cell>,
        width_dxa: usize,
        images: &HashMap<String, PreparedImage>,
    ) -> TableCell {
        let available = width_dxa as f32 / DXA_PER_INCH;
        let paragraphs: Vec<docx_rs::Paragraph> = cell
            .map(|c| {
                c.blocks
                    .iter()
                    .filter_map(|block| self.paragraph(block, images, available))
                    .collect()
            })
            .unwrap_or_default();

        let mut rendered = TableCell::new().width(width_dxa, WidthType::Dxa);
        if paragraphs.is_empty() {
            // Word 要求每個儲存格至少一個段落
            return rendered.add_paragraph(docx_rs::Paragraph::new());
        }
        for paragraph in paragraphs {
            rendered = rendered.add_paragraph(paragraph);
        }
        rendered
    }
}

fn align(paragraph: docx_rs::Paragraph, alignment: Alignment) -> docx_rs::Paragraph {
    match alignment {
        Alignment::Inherit => paragraph,
        Alignment::Left => paragraph.align(AlignmentType::Left),
        Alignment::Center => paragraph.align(AlignmentType::Center),
        Alignment::Right => paragraph.align(AlignmentType::Right),
        Alignment::Justify => paragraph.align(AlignmentType::Both),
    }
}
