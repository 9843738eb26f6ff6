use crate::domain::document::{Alignment, ImageWidth};

/// Parsed `style="..."` attribute. Later declarations win, like in CSS.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn parse(style: &str) -> Self {
        let declarations = style
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .map(|(name, value)| {
                let value = value.trim().to_ascii_lowercase();
                let value = value.trim_end_matches("!important").trim().to_string();
                (name.trim().to_ascii_lowercase(), value)
            })
            .filter(|(name, value)| !name.is_empty() && !value.is_empty())
            .collect();
        Self { declarations }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn alignment(&self) -> Alignment {
        match self.get("text-align") {
            Some("center") => Alignment::Center,
            Some("left") | Some("start") => Alignment::Left,
            Some("right") | Some("end") => Alignment::Right,
            Some("justify") => Alignment::Justify,
            _ => Alignment::Inherit,
        }
    }

    pub fn is_bold(&self) -> bool {
        match self.get("font-weight") {
            Some("bold") | Some("bolder") => true,
            Some(weight) => weight.parse::<u32>().map(|w| w >= 600).unwrap_or(false),
            None => false,
        }
    }

    pub fn font_size_pt(&self) -> Option<f32> {
        let value = self.get("font-size")?;
        if let Some(pt) = value.strip_suffix("pt") {
            pt.trim().parse().ok()
        } else if let Some(px) = value.strip_suffix("px") {
            px.trim().parse::<f32>().ok().map(|px| px * 0.75)
        } else {
            None
        }
    }

    /// Containers laid out as rows and cells (`display: flex` / `display: table`).
    pub fn is_layout_container(&self) -> bool {
        matches!(
            self.get("display"),
            Some("flex") | Some("inline-flex") | Some("table")
        )
    }

    pub fn has_border(&self) -> bool {
        self.get("border")
            .or_else(|| self.get("border-style"))
            .map(|v| v != "none" && v != "0")
            .unwrap_or(false)
    }

    pub fn width(&self) -> Option<ImageWidth> {
        self.get("width").and_then(parse_length)
    }
}

/// Parses a CSS or attribute length; bare numbers are pixels.
pub fn parse_length(value: &str) -> Option<ImageWidth> {
    let value = value.trim();
    if let Some(pct) = value.strip_suffix('%') {
        return pct.trim().parse().ok().map(ImageWidth::Percent);
    }
    if let Some(px) = value.strip_suffix("px") {
        return px.trim().parse().ok().map(ImageWidth::Pixels);
    }
    if let Some(inches) = value.strip_suffix("in") {
        return inches
            .trim()
            .parse::<f32>()
            .ok()
            .map(|i| ImageWidth::Pixels(i * 96.0));
    }
    value.parse().ok().map(ImageWidth::Pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tolerates_spacing_and_case() {
        let style = InlineStyle::parse("Text-Align : Center;font-weight:700 ; FONT-SIZE: 16px");
        assert_eq!(style.alignment(), Alignment::Center);
        assert!(style.is_bold());
        assert_eq!(style.font_size_pt(), Some(12.0));
    }

    #[test]
    fn test_last_declaration_wins() {
        let style = InlineStyle::parse("text-align:center; text-align: right !important");
        assert_eq!(style.alignment(), Alignment::Right);
    }

    #[test]
    fn test_layout_detection() {
        assert!(InlineStyle::parse("display: flex; width: 100%").is_layout_container());
        assert!(InlineStyle::parse("display:table").is_layout_container());
        assert!(!InlineStyle::parse("display: table-cell").is_layout_container());
        assert!(!InlineStyle::parse("flex: 1").is_layout_container());
    }

    #[test]
    fn test_lengths() {
        assert_eq!(parse_length("100%"), Some(ImageWidth::Percent(100.0)));
        assert_eq!(parse_length("80px"), Some(ImageWidth::Pixels(80.0)));
        assert_eq!(parse_length("80"), Some(ImageWidth::Pixels(80.0)));
        assert_eq!(parse_length("1in"), Some(ImageWidth::Pixels(96.0)));
        assert_eq!(parse_length("auto"), None);
    }
}
