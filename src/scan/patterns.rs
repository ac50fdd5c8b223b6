//! Pattern file loading.
//!
//! One pattern per line in the form `CATEGORY==REGEX`, split on the first
//! separator. Blank lines are ignored. Any other malformed line is a
//! configuration error and stops the scan before it starts.

use std::path::Path;

use regex::{Regex, RegexBuilder};

use super::error::ScanError;

/// Separator between category and regex
pub const PATTERN_SEPARATOR: &str = "==";

/// Compile a regex with scanner semantics (case-insensitive, multiline)
pub fn compile_pattern(regex: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(regex)
        .case_insensitive(true)
        .multi_line(true)
        .build()
}

/// A named, compiled pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    pub category: String,
    pub regex: Regex,
}

/// Patterns in declaration order
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Parse pattern file content
    pub fn parse(content: &str) -> Result<Self, ScanError> {
        let mut patterns = Vec::new();

        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (category, regex) =
                line.split_once(PATTERN_SEPARATOR)
                    .ok_or_else(|| ScanError::MalformedPattern {
                        line: i + 1,
                        content: line.to_string(),
                    })?;

            let regex = compile_pattern(regex).map_err(|source| ScanError::InvalidRegex {
                category: category.to_string(),
                source,
            })?;

            patterns.push(Pattern {
                category: category.to_string(),
                regex,
            });
        }

        Ok(Self { patterns })
    }

    /// Load and parse a pattern file
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_declaration_order() {
        let set = PatternSet::parse("B==beta\n\nA==alpha\n").unwrap();
        let categories: Vec<_> = set.iter().map(|p| p.category.as_str()).collect();
        assert_eq!(categories, ["B", "A"]);
    }

    #[test]
    fn test_split_on_first_separator_only() {
        let set = PatternSet::parse("EQ==a==b").unwrap();
        let pattern = set.iter().next().unwrap();
        assert_eq!(pattern.category, "EQ");
        assert_eq!(pattern.regex.as_str(), "a==b");
    }

    #[test]
    fn test_malformed_line_is_fatal() {
        let err = PatternSet::parse("OK==ok\nno separator here").unwrap_err();
        match err {
            ScanError::MalformedPattern { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "no separator here");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_regex_is_fatal() {
        let err = PatternSet::parse("BAD==(unclosed").unwrap_err();
        assert!(matches!(err, ScanError::InvalidRegex { ref category, .. } if category == "BAD"));
    }

    #[test]
    fn test_compiled_patterns_ignore_case_and_span_lines() {
        let regex = compile_pattern(r"^envy$").unwrap();
        assert!(regex.is_match("first line\nENVY\nlast"));
    }
}
