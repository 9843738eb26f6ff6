//! Word-processor independent document model.
//!
//! The HTML converter and the World Bank layout both produce a [`Document`];
//! the DOCX writer is the only place that knows about the output format.

/// Usable page width between margins, in inches.
pub const CONTENT_WIDTH_INCHES: f32 = 6.0;

/// Usable page height between margins, in inches.
pub const CONTENT_HEIGHT_INCHES: f32 = 9.0;

/// Width used for images that carry no usable size hint.
pub const DEFAULT_IMAGE_WIDTH_INCHES: f32 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Inherit,
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageWidth {
    /// Fraction of the available width, 0-100.
    Percent(f32),
    Pixels(f32),
    Default,
}

impl ImageWidth {
    /// Resolves to inches, never wider than `available` (96 dpi for pixels).
    pub fn inches(&self, available: f32, default: f32) -> f32 {
        let width = match self {
            ImageWidth::Percent(p) => available * p / 100.0,
            ImageWidth::Pixels(px) => px / 96.0,
            ImageWidth::Default => default,
        };
        if width <= 0.0 {
            default.min(available)
        } else {
            width.min(available)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub alignment: Alignment,
    pub bold: bool,
    pub size_pt: Option<f32>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: u8,
        text: String,
        alignment: Alignment,
        bold: bool,
    },
    Paragraph(Paragraph),
    Bullet(String),
    Image {
        src: String,
        width: ImageWidth,
    },
    Table(Table),
}

impl Block {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level: level.clamp(1, 6),
            text: text.into(),
            alignment: Alignment::Inherit,
            bold: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub blocks: Vec<Block>,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![Block::Paragraph(Paragraph::new(text))],
        }
    }

    /// Concatenated text of the cell, one line per block.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading { text, .. } | Block::Bullet(text) => Some(text.as_str()),
                Block::Paragraph(p) => Some(p.text.as_str()),
                Block::Image { .. } | Block::Table(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
    /// Column widths in points; evenly split when `None`.
    pub column_widths_pt: Option<Vec<f32>>,
    pub bordered: bool,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Image sources in document order, including those inside table cells.
    pub fn image_sources(&self) -> Vec<&str> {
        fn collect<'a>(blocks: &'a [Block], out: &mut Vec<&'a str>) {
            for block in blocks {
                match block {
                    Block::Image { src, .. } => out.push(src),
                    Block::Table(table) => {
                        for cell in table.rows.iter().flatten() {
                            collect(&cell.blocks, out);
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut sources = Vec::new();
        collect(&self.blocks, &mut sources);
        sources
    }
}
