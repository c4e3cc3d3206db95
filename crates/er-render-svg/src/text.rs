//! Label measurement and wrapping.
//!
//! Widths come from a per-character heuristic since no font data is loaded.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnchor {
    Start,
    #[default]
    Middle,
    End,
}

impl TextAnchor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// Relative advance of a glyph against the average one.
fn glyph_factor(c: char) -> f64 {
    match c {
        'W' | 'M' | '@' | '%' => 1.5,
        'w' | 'm' => 1.2,
        'I' | 'j' | 't' | 'f' => 0.6,
        ' ' => 0.5,
        'i' | 'l' | '|' | '!' | '\'' | '.' | ',' => 0.4,
        _ => 1.0,
    }
}

/// Font-free label metrics: one em is `font_size` and the average glyph is 0.6 em.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub font_size: f64,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self::for_font_size(12.0)
    }
}

impl TextMetrics {
    const AVERAGE_GLYPH_EM: f64 = 0.6;

    #[must_use]
    pub const fn for_font_size(font_size: f64) -> Self {
        Self {
            font_size,
            line_height: 1.3,
        }
    }

    #[must_use]
    pub fn estimate_width(&self, text: &str) -> f64 {
        let ems: f64 = text.chars().map(glyph_factor).sum();
        ems * self.font_size * Self::AVERAGE_GLYPH_EM
    }

    #[must_use]
    pub fn line_height_px(&self) -> f64 {
        self.font_size * self.line_height
    }

    /// Break `text` into lines no wider than `max_width`.
    ///
    /// Explicit newlines are kept. Words go on greedily; a word that alone
    /// overflows is cut between characters. Always returns at least one line.
    #[must_use]
    pub fn wrap(&self, text: &str, max_width: f64) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.lines() {
            let mut line = String::new();
            for word in paragraph.split_whitespace() {
                let joined = if line.is_empty() {
                    word.to_owned()
                } else {
                    format!("{line} {word}")
                };
                if self.estimate_width(&joined) <= max_width {
                    line = joined;
                    continue;
                }
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                self.cut_word(word, max_width, &mut lines, &mut line);
            }
            if !line.is_empty() {
                lines.push(line);
            }
        }
        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }

    /// Appends `word` to the empty `line`, flushing full chunks into `lines`.
    fn cut_word(&self, word: &str, max_width: f64, lines: &mut Vec<String>, line: &mut String) {
        for ch in word.chars() {
            line.push(ch);
            if line.chars().nth(1).is_some() && self.estimate_width(line) > max_width {
                line.pop();
                lines.push(std::mem::replace(line, ch.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wider_glyphs_measure_wider() {
        let metrics = TextMetrics::default();
        assert!(metrics.estimate_width("WWWW") > metrics.estimate_width("iiii"));
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let metrics = TextMetrics::for_font_size(10.0);
        let lines = metrics.wrap("Data de Nascimento", 60.0);
        assert_eq!(lines, ["Data de", "Nascimento"]);
    }

    #[test]
    fn splits_words_longer_than_a_line() {
        let metrics = TextMetrics::for_font_size(10.0);
        let lines = metrics.wrap("AAAAAAAAAAAA", 30.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| metrics.estimate_width(line) <= 30.0));
        assert_eq!(lines.concat(), "AAAAAAAAAAAA");
    }

    #[test]
    fn empty_text_yields_one_empty_line() {
        assert_eq!(TextMetrics::default().wrap("", 100.0), [String::new()]);
    }
}
