use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    pub background_color: Color,
    pub text_style: Style,
    pub muted_style: Style,
    pub heading_style: Style,
    pub link_style: Style,
    pub citation_style: Style,
    pub inline_code_style: Style,
    pub codeblock_text_style: Style,
    pub codeblock_bg: Option<Color>,
    pub blockquote_style: Style,
    pub list_marker_style: Style,
    pub cursor_style: Style,
    pub success_style: Style,
    pub error_style: Style,
    pub badge_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            name: "dark",
            background_color: Color::Black,
            text_style: Style::default().fg(Color::White),
            muted_style: Style::default().fg(Color::DarkGray),
            heading_style: Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
            link_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::UNDERLINED),
            citation_style: Style::default().fg(Color::Cyan),
            inline_code_style: Style::default().fg(Color::LightYellow),
            codeblock_text_style: Style::default().fg(Color::Gray),
            codeblock_bg: Some(Color::Rgb(30, 30, 30)),
            blockquote_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            list_marker_style: Style::default().fg(Color::Cyan),
            cursor_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::SLOW_BLINK),
            success_style: Style::default().fg(Color::LightGreen),
            error_style: Style::default().fg(Color::LightRed),
            badge_style: Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        }
    }

    pub fn light() -> Self {
        Theme {
            name: "light",
            background_color: Color::White,
            text_style: Style::default().fg(Color::Black),
            muted_style: Style::default().fg(Color::Gray),
            heading_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            link_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            citation_style: Style::default().fg(Color::Magenta),
            inline_code_style: Style::default().fg(Color::Red),
            codeblock_text_style: Style::default().fg(Color::Black),
            codeblock_bg: Some(Color::Rgb(240, 240, 240)),
            blockquote_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            list_marker_style: Style::default().fg(Color::Blue),
            cursor_style: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::SLOW_BLINK),
            success_style: Style::default().fg(Color::Green),
            error_style: Style::default().fg(Color::Red),
            badge_style: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Modifiers only, for terminals without color.
    pub fn monochrome() -> Self {
        let plain = Style::default();
        Theme {
            name: "monochrome",
            background_color: Color::Reset,
            text_style: plain,
            muted_style: plain.add_modifier(Modifier::DIM),
            heading_style: plain.add_modifier(Modifier::BOLD),
            link_style: plain.add_modifier(Modifier::UNDERLINED),
            citation_style: plain.add_modifier(Modifier::BOLD),
            inline_code_style: plain.add_modifier(Modifier::REVERSED),
            codeblock_text_style: plain,
            codeblock_bg: None,
            blockquote_style: plain.add_modifier(Modifier::ITALIC),
            list_marker_style: plain,
            cursor_style: plain.add_modifier(Modifier::SLOW_BLINK),
            success_style: plain.add_modifier(Modifier::BOLD),
            error_style: plain.add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            badge_style: plain.add_modifier(Modifier::BOLD),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            "monochrome" | "mono" | "none" => Self::monochrome(),
            // Fallback
            _ => Self::dark_default(),
        }
    }

    pub fn names() -> [&'static str; 3] {
        ["dark", "light", "monochrome"]
    }

    pub fn is_dark(&self) -> bool {
        match self.background_color {
            Color::Rgb(r, g, b) => {
                let brightness = 0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32;
                brightness < 128.0
            }
            Color::White => false,
            _ => true,
        }
    }

    pub fn codeblock_style(&self) -> Style {
        match self.codeblock_bg {
            Some(bg) => self.codeblock_text_style.bg(bg),
            None => self.codeblock_text_style,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_fall_back_to_dark() {
        assert_eq!(Theme::from_name("Light").name, "light");
        assert_eq!(Theme::from_name("solarized").name, "dark");
        assert_eq!(Theme::from_name("mono").name, "monochrome");
    }

    #[test]
    fn brightness_heuristic() {
        assert!(Theme::dark_default().is_dark());
        assert!(!Theme::light().is_dark());
        let mut custom = Theme::light();
        custom.background_color = Color::Rgb(10, 10, 10);
        assert!(custom.is_dark());
    }
}
