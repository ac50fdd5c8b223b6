//! Layered highlighting over the visible text window.
//!
//! The visible window is `before + match + after`, where `before`/`after`
//! are the near context or the far text depending on the reveal toggles.
//! Paint is applied per character in a fixed order:
//!
//! 1. pattern highlights (configured rules, then a transient search)
//! 2. marks
//! 3. the target match
//!
//! The first two layers share one fill per character and the last one to
//! touch a character wins. The target is an overlay on top of the fill, so
//! a mark drawn over the match stays visible under it. Marks are stored
//! relative to the match and translated on every composition, so toggling
//! a reveal never leaves a mark misaligned.

use std::collections::BTreeMap;
use std::ops::Range;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use super::offsets::{LineMap, OffsetError};
use super::palette::{self, Swatch, DEFAULT_MARK_COLOR};
use crate::domain::{HighlightRule, Mark, MarkKind, MatchRecord};
use crate::scan::CharText;

/// Which context tiers are revealed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reveal {
    /// Show the far text before the match instead of the near context
    pub before: bool,
    /// Show the far text after the match instead of the near context
    pub after: bool,
}

/// Fill painted by the pattern, search and mark layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Base,
    Pattern(&'static Swatch),
    Search,
    Mark(&'static Swatch),
}

/// Style applied to one character: its fill plus the target overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paint {
    pub fill: Fill,
    pub target: bool,
}

impl Paint {
    /// Unstyled text
    pub const BASE: Paint = Paint {
        fill: Fill::Base,
        target: false,
    };

    pub fn new(fill: Fill) -> Self {
        Self { fill, target: false }
    }

    /// Mark colour under this character, if any
    pub fn mark(&self) -> Option<&'static Swatch> {
        match self.fill {
            Fill::Mark(swatch) => Some(swatch),
            _ => None,
        }
    }
}

/// The text currently on screen and where the match sits in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleWindow {
    text: String,
    before_len: usize,
    match_len: usize,
    len: usize,
}

impl VisibleWindow {
    pub fn new(before: &str, matched: &str, after: &str) -> Self {
        let before_len = before.chars().count();
        let match_len = matched.chars().count();
        Self {
            text: format!("{}{}{}", before, matched, after),
            before_len,
            match_len,
            len: before_len + match_len + after.chars().count(),
        }
    }

    /// Window for a record under the given reveal state
    pub fn from_record(record: &MatchRecord, reveal: Reveal) -> Self {
        Self::new(
            record.before(reveal.before),
            &record.matched,
            record.after(reveal.after),
        )
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Characters shown before the match
    pub fn before_len(&self) -> usize {
        self.before_len
    }

    /// Window-relative span of the match
    pub fn match_span(&self) -> Range<usize> {
        self.before_len..self.before_len + self.match_len
    }

    /// Convert a window offset to a match-relative offset (for new marks)
    pub fn to_match_relative(&self, offset: usize) -> i64 {
        offset as i64 - self.before_len as i64
    }

    /// Window-relative span of a mark, or `None` if its start is not visible
    pub fn mark_span(&self, mark: &Mark) -> Option<Range<usize>> {
        let shift = self.before_len as i64;
        let start = mark.start + shift;
        if start < 0 || start > self.len as i64 {
            return None;
        }
        let end = (mark.end + shift).clamp(start, self.len as i64);
        Some(start as usize..end as usize)
    }

    /// Text between two window offsets
    pub fn slice(&self, range: Range<usize>) -> String {
        CharText::new(&self.text)
            .slice(range.start, range.end)
            .to_string()
    }
}

/// Builds a per-character paint assignment for one window
#[derive(Debug, Clone)]
pub struct SpanCompositor {
    window: VisibleWindow,
    paints: Vec<Paint>,
}

impl SpanCompositor {
    pub fn new(window: VisibleWindow) -> Self {
        let paints = vec![Paint::BASE; window.len()];
        Self { window, paints }
    }

    pub fn window(&self) -> &VisibleWindow {
        &self.window
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let end = range.end.min(self.paints.len());
        range.start.min(end)..end
    }

    fn paint(&mut self, range: Range<usize>, fill: Fill) {
        let range = self.clamp(range);
        for paint in &mut self.paints[range] {
            paint.fill = fill;
        }
    }

    fn paint_regex(&mut self, regex: &Regex, fill: Fill) {
        let chars = CharText::new(&self.window.text);
        let spans: Vec<Range<usize>> = regex
            .find_iter(&self.window.text)
            .map(|m| chars.char_offset(m.start())..chars.char_offset(m.end()))
            .collect();
        for span in spans {
            self.paint(span, fill);
        }
    }

    /// Paint every match of every rule; later rules paint over earlier ones
    pub fn apply_pattern_highlights(&mut self, rules: &[HighlightRule]) -> &mut Self {
        for rule in rules {
            let Some(swatch) = palette::lookup(&rule.color) else {
                warn!(color = %rule.color, regex = %rule.regex, "Skipping highlight with unknown colour");
                continue;
            };
            match rule.compile() {
                Ok(regex) => self.paint_regex(&regex, Fill::Pattern(swatch)),
                Err(e) => warn!(regex = %rule.regex, error = %e, "Skipping invalid highlight regex"),
            }
        }
        self
    }

    /// Paint a transient search pattern above the configured rules
    pub fn apply_search(&mut self, pattern: &str) -> &mut Self {
        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(regex) => self.paint_regex(&regex, Fill::Search),
            Err(e) => warn!(pattern, error = %e, "Skipping invalid search regex"),
        }
        self
    }

    /// Paint marks whose start is visible; others are skipped silently
    pub fn apply_marks(&mut self, marks: &[Mark], colors: &BTreeMap<String, String>) -> &mut Self {
        for mark in marks {
            if let Some(span) = self.window.mark_span(mark) {
                self.paint(span, Fill::Mark(mark_swatch(&mark.kind, colors)));
            }
        }
        self
    }

    /// Overlay the target match last; fills underneath are kept
    pub fn apply_target_highlight(&mut self) -> &mut Self {
        let range = self.clamp(self.window.match_span());
        for paint in &mut self.paints[range] {
            paint.target = true;
        }
        self
    }

    pub fn finish(self) -> Composition {
        let target = self.window.match_span();
        Composition {
            window: self.window,
            paints: self.paints,
            target,
        }
    }
}

fn mark_swatch(kind: &MarkKind, colors: &BTreeMap<String, String>) -> &'static Swatch {
    colors
        .get(kind.as_str())
        .and_then(|name| palette::lookup(name))
        .or_else(|| palette::lookup(DEFAULT_MARK_COLOR))
        .unwrap_or(&palette::PALETTE[0])
}

/// Explicit inputs for a composition
#[derive(Debug, Clone, Copy)]
pub struct Layers<'a> {
    pub highlights: &'a [HighlightRule],
    pub mark_colors: &'a BTreeMap<String, String>,
    pub search: Option<&'a str>,
}

/// Compose all layers for a record in the standard order
pub fn compose(record: &MatchRecord, marks: &[Mark], reveal: Reveal, layers: Layers<'_>) -> Composition {
    let mut compositor = SpanCompositor::new(VisibleWindow::from_record(record, reveal));
    compositor.apply_pattern_highlights(layers.highlights);
    if let Some(search) = layers.search {
        compositor.apply_search(search);
    }
    compositor
        .apply_marks(marks, layers.mark_colors)
        .apply_target_highlight();
    compositor.finish()
}

/// A run of characters sharing one paint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub paint: Paint,
}

/// One display line after wrapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayLine {
    pub segments: Vec<Segment>,
    /// Column of the insertion marker for an empty match
    pub marker: Option<usize>,
}

impl DisplayLine {
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    fn push(&mut self, c: char, paint: Paint) {
        match self.segments.last_mut() {
            Some(last) if last.paint == paint => last.text.push(c),
            _ => self.segments.push(Segment {
                text: c.to_string(),
                paint,
            }),
        }
    }
}

/// Final paint assignment for a window
#[derive(Debug, Clone)]
pub struct Composition {
    window: VisibleWindow,
    paints: Vec<Paint>,
    target: Range<usize>,
}

impl Composition {
    pub fn window(&self) -> &VisibleWindow {
        &self.window
    }

    pub fn text(&self) -> &str {
        self.window.text()
    }

    pub fn paints(&self) -> &[Paint] {
        &self.paints
    }

    pub fn paint_at(&self, offset: usize) -> Option<Paint> {
        self.paints.get(offset).copied()
    }

    pub fn target(&self) -> Range<usize> {
        self.target.clone()
    }

    /// Insertion point shown when the match is empty
    pub fn insertion_marker(&self) -> Option<usize> {
        self.target.is_empty().then_some(self.target.start)
    }

    /// Offset of a `(row, column)` position in the unwrapped text
    pub fn to_absolute_offset(&self, row: usize, column: usize) -> Result<usize, OffsetError> {
        LineMap::new(self.text()).to_absolute_offset(row, column)
    }

    /// Split into display lines on `\n`, hard-wrapping at `width` characters (0 = no wrap)
    pub fn wrap(&self, width: usize) -> Vec<DisplayLine> {
        let marker = self.insertion_marker();
        let mut lines = Vec::new();
        let mut line = DisplayLine::default();
        let mut col = 0;

        for (i, (c, paint)) in self.window.text.chars().zip(self.paints.iter()).enumerate() {
            if width > 0 && col == width && c != '\n' {
                lines.push(std::mem::take(&mut line));
                col = 0;
            }
            if marker == Some(i) {
                line.marker = Some(col);
            }
            if c == '\n' {
                lines.push(std::mem::take(&mut line));
                col = 0;
                continue;
            }
            line.push(c, *paint);
            col += 1;
        }

        if marker == Some(self.window.len()) {
            line.marker = Some(col);
        }
        lines.push(line);
        lines
    }
}
