//! Context windows around a match.
//!
//! Two tiers are cut from the source text on each side of a match: the near
//! context (`context_length` chars) shown by default, and the far text
//! (`max_window` chars) shown only on reveal. Slices are clamped to the
//! document, so a match near an edge simply gets a shorter window.

use serde::{Deserialize, Serialize};

/// Default near-context length in characters
pub const DEFAULT_CONTEXT_LENGTH: usize = 180;

/// Default far-window length in characters
pub const DEFAULT_MAX_WINDOW: usize = 500;

/// Window sizes used when cutting context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_context_length")]
    pub context_length: usize,

    #[serde(default = "default_max_window")]
    pub max_window: usize,
}

fn default_context_length() -> usize {
    DEFAULT_CONTEXT_LENGTH
}

fn default_max_window() -> usize {
    DEFAULT_MAX_WINDOW
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            context_length: DEFAULT_CONTEXT_LENGTH,
            max_window: DEFAULT_MAX_WINDOW,
        }
    }
}

/// Text with precomputed character boundaries for char-indexed slicing
#[derive(Debug, Clone)]
pub struct CharText<'a> {
    text: &'a str,
    /// Byte offset of every char, plus `text.len()` as the final entry
    boundaries: Vec<usize>,
}

impl<'a> CharText<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { text, boundaries }
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Slice by character offsets, clamped to the text
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        let end = end.min(self.char_len());
        let start = start.min(end);
        &self.text[self.boundaries[start]..self.boundaries[end]]
    }

    /// Character offset of a byte offset that lies on a char boundary
    pub fn char_offset(&self, byte: usize) -> usize {
        self.boundaries.partition_point(|&b| b < byte)
    }
}

/// The four derived substrings plus the match offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    pub precontext: String,
    pub postcontext: String,
    pub pretext: String,
    pub posttext: String,
    pub start_index: usize,
    pub end_index: usize,
}

impl ContextWindow {
    /// Cut both tiers around the character span `[start, end)`
    pub fn compute(text: &CharText<'_>, start: usize, end: usize, config: WindowConfig) -> Self {
        let end = end.min(text.char_len());
        let start = start.min(end);

        Self {
            precontext: text
                .slice(start.saturating_sub(config.context_length), start)
                .to_string(),
            postcontext: text
                .slice(end, end.saturating_add(config.context_length))
                .to_string(),
            pretext: text
                .slice(start.saturating_sub(config.max_window), start)
                .to_string(),
            posttext: text
                .slice(end, end.saturating_add(config.max_window))
                .to_string(),
            start_index: start,
            end_index: end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(context_length: usize, max_window: usize) -> WindowConfig {
        WindowConfig {
            context_length,
            max_window,
        }
    }

    #[test]
    fn test_windows_clamp_at_document_start() {
        let text = CharText::new("She felt jealous and envious.");
        let window = ContextWindow::compute(&text, 9, 16, cfg(10, 20));
        assert_eq!(window.precontext, "She felt ");
        assert_eq!(window.postcontext, " and envio");
        assert_eq!(window.pretext, "She felt ");
        assert_eq!(window.posttext, " and envious.");
    }

    #[test]
    fn test_windows_clamp_at_document_end() {
        let text = CharText::new("abcdef");
        let window = ContextWindow::compute(&text, 4, 6, cfg(2, 3));
        assert_eq!(window.precontext, "cd");
        assert_eq!(window.pretext, "bcd");
        assert_eq!(window.postcontext, "");
        assert_eq!(window.posttext, "");
    }

    #[test]
    fn test_out_of_range_span_is_clamped() {
        let text = CharText::new("abc");
        let window = ContextWindow::compute(&text, 10, 12, cfg(2, 3));
        assert_eq!(window.start_index, 3);
        assert_eq!(window.end_index, 3);
        assert_eq!(window.precontext, "bc");
        assert_eq!(window.postcontext, "");
    }

    #[test]
    fn test_slicing_counts_characters_not_bytes() {
        let text = CharText::new("café crème brûlée");
        assert_eq!(text.char_len(), 17);
        assert_eq!(text.slice(5, 10), "crème");
        assert_eq!(text.char_offset("café ".len()), 5);

        let window = ContextWindow::compute(&text, 5, 10, cfg(3, 5));
        assert_eq!(window.precontext, "fé ");
        assert_eq!(window.pretext, "café ");
        assert_eq!(window.postcontext, " br");
    }

    #[test]
    fn test_near_context_is_suffix_of_far_text() {
        let text = CharText::new("The quick brown fox jumps over the lazy dog");
        for start in 0..text.char_len() {
            let end = (start + 3).min(text.char_len());
            let window = ContextWindow::compute(&text, start, end, cfg(4, 9));
            assert!(window.pretext.ends_with(&window.precontext));
            assert!(window.posttext.starts_with(&window.postcontext));
            assert!(window.precontext.chars().count() <= 4);
            assert!(window.pretext.chars().count() <= 9);
        }
    }
}
