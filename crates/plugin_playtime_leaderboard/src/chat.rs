//! Styled chat output.
//!
//! A line is a sequence of spans, each carrying its own color, weight and
//! optional hover text. Sinks decide how to present them.

use parking_lot::Mutex;
use playtime_core::ChatColor;

/// A run of text with a single style
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatSpan {
    pub text: String,
    pub color: Option<ChatColor>,
    pub bold: bool,
    pub hover: Option<String>,
}

impl ChatSpan {
    /// Unstyled text
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn colored(text: impl Into<String>, color: ChatColor) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
            ..Default::default()
        }
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_hover(mut self, hover: impl Into<String>) -> Self {
        self.hover = Some(hover.into());
        self
    }

    /// Width in characters
    pub fn width(&self) -> usize {
        self.text.chars().count()
    }
}

/// One line of chat output
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatLine {
    pub spans: Vec<ChatSpan>,
}

impl ChatLine {
    pub fn new(spans: Vec<ChatSpan>) -> Self {
        Self { spans }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A line made of a single colored span
    pub fn colored(text: impl Into<String>, color: ChatColor) -> Self {
        Self::new(vec![ChatSpan::colored(text, color)])
    }

    pub fn push(&mut self, span: ChatSpan) {
        self.spans.push(span);
    }

    /// Text without styling
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    /// Width in characters
    pub fn width(&self) -> usize {
        self.spans.iter().map(ChatSpan::width).sum()
    }

    /// Text with ANSI escapes for a terminal. Hover texts are not shown.
    pub fn to_ansi(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            let mut codes = Vec::new();
            if span.bold {
                codes.push("1".to_string());
            }
            if let Some(color) = span.color {
                codes.push(color.ansi_code().to_string());
            }

            if codes.is_empty() {
                out.push_str(&span.text);
            } else {
                out.push_str(&format!("\x1b[{}m{}\x1b[0m", codes.join(";"), span.text));
            }
        }
        out
    }
}

/// Output channel receiving lines one at a time, top to bottom
pub trait ChatSink: Send + Sync {
    fn send(&self, line: ChatLine);
}

/// Sink that keeps every line it receives
#[derive(Debug, Default)]
pub struct CollectingSink {
    lines: Mutex<Vec<ChatLine>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<ChatLine> {
        self.lines.lock().clone()
    }

    /// Plain text of every received line
    pub fn texts(&self) -> Vec<String> {
        self.lines.lock().iter().map(ChatLine::plain_text).collect()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl ChatSink for CollectingSink {
    fn send(&self, line: ChatLine) {
        self.lines.lock().push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_counts_characters() {
        let line = ChatLine::new(vec![
            ChatSpan::colored("✪ ", ChatColor::Gold),
            ChatSpan::colored("1200", ChatColor::Yellow),
            ChatSpan::plain("h"),
        ]);
        assert_eq!(line.width(), 7);
        assert_eq!(line.plain_text(), "✪ 1200h");
    }

    #[test]
    fn test_ansi_rendering() {
        let line = ChatLine::new(vec![
            ChatSpan::colored("1.", ChatColor::Gold).bold(true),
            ChatSpan::plain(" "),
        ]);
        assert_eq!(line.to_ansi(), "\x1b[1;33m1.\x1b[0m ");
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.send(ChatLine::colored("hello", ChatColor::Green));
        sink.send(ChatLine::empty());
        assert_eq!(sink.texts(), vec!["hello".to_string(), String::new()]);
    }
}
