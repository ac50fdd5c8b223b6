//! Named colour palette for highlights and marks.
//!
//! Each name maps to a background colour and a foreground chosen to stay
//! readable on it.

/// 24-bit colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Background/foreground pair for a named colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub name: &'static str,
    pub background: Rgb,
    pub foreground: Rgb,
}

const BLACK: Rgb = Rgb(0, 0, 0);
const WHITE: Rgb = Rgb(255, 255, 255);

const fn swatch(name: &'static str, background: Rgb, foreground: Rgb) -> Swatch {
    Swatch {
        name,
        background,
        foreground,
    }
}

/// Every colour a highlight rule or mark kind may use
pub const PALETTE: [Swatch; 25] = [
    swatch("red", Rgb(255, 0, 0), BLACK),
    swatch("green", Rgb(0, 128, 0), BLACK),
    swatch("blue", Rgb(0, 0, 255), BLACK),
    swatch("yellow", Rgb(255, 255, 0), BLACK),
    swatch("orange", Rgb(215, 135, 0), BLACK),
    swatch("purple", Rgb(128, 0, 128), BLACK),
    swatch("cyan", Rgb(0, 255, 255), BLACK),
    swatch("magenta", Rgb(255, 0, 255), BLACK),
    swatch("black", BLACK, WHITE),
    swatch("white", WHITE, BLACK),
    swatch("gray", Rgb(127, 127, 127), BLACK),
    swatch("brown", Rgb(188, 143, 143), BLACK),
    swatch("pink", Rgb(215, 135, 175), BLACK),
    swatch("lime", Rgb(95, 255, 95), BLACK),
    swatch("navy", Rgb(0, 0, 95), WHITE),
    swatch("olive", Rgb(215, 255, 95), BLACK),
    swatch("maroon", Rgb(128, 0, 0), WHITE),
    swatch("aqua", Rgb(0, 255, 255), BLACK),
    swatch("silver", Rgb(192, 192, 192), BLACK),
    swatch("gold", Rgb(239, 191, 4), BLACK),
    swatch("indigo", Rgb(75, 0, 130), BLACK),
    swatch("violet", Rgb(215, 135, 255), BLACK),
    swatch("coral", Rgb(255, 127, 80), BLACK),
    swatch("salmon", Rgb(250, 128, 114), BLACK),
    swatch("sky", Rgb(135, 206, 235), BLACK),
];

/// Colour used for marks whose kind has no configured colour
pub const DEFAULT_MARK_COLOR: &str = "green";

/// Look up a colour by name (case-insensitive)
pub fn lookup(name: &str) -> Option<&'static Swatch> {
    PALETTE.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

pub fn is_known(name: &str) -> bool {
    lookup(name).is_some()
}

pub fn names() -> impl Iterator<Item = &'static str> {
    PALETTE.iter().map(|s| s.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("Navy").unwrap().foreground, WHITE);
        assert!(is_known("SKY"));
        assert!(!is_known("chartreuse"));
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = names().collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PALETTE.len());
    }
}
