//! Terminal rendering of a composition with 24-bit ANSI escapes.

use super::layers::{DisplayLine, Fill, Paint};
use super::palette::Rgb;

const RESET: &str = "\x1b[0m";
const MARKER: char = '▌';
const TARGET_BACKGROUND: Rgb = Rgb(255, 0, 0);

fn fg(rgb: Rgb) -> String {
    format!("\x1b[38;2;{};{};{}m", rgb.0, rgb.1, rgb.2)
}

fn bg(rgb: Rgb) -> String {
    format!("\x1b[48;2;{};{};{}m", rgb.0, rgb.1, rgb.2)
}

/// Escape sequence that opens a paint, empty for unstyled text.
///
/// The target replaces the background; a mark under it keeps its
/// underline and colour.
pub fn style(paint: Paint) -> String {
    if paint.target {
        return match paint.mark() {
            Some(swatch) => format!("\x1b[1;4m{}{}", bg(TARGET_BACKGROUND), fg(swatch.background)),
            None => format!("\x1b[1m{}{}", bg(TARGET_BACKGROUND), fg(Rgb(0, 0, 0))),
        };
    }
    match paint.fill {
        Fill::Base => String::new(),
        Fill::Pattern(swatch) => format!("\x1b[1m{}{}", bg(swatch.background), fg(swatch.foreground)),
        Fill::Search => "\x1b[7m".to_string(),
        Fill::Mark(swatch) => format!("\x1b[1;4m{}", fg(swatch.background)),
    }
}

fn push_styled(out: &mut String, text: &str, paint: Paint) {
    if text.is_empty() {
        return;
    }
    let open = style(paint);
    if open.is_empty() {
        out.push_str(text);
    } else {
        out.push_str(&open);
        out.push_str(text);
        out.push_str(RESET);
    }
}

fn push_marker(out: &mut String) {
    out.push_str(&fg(TARGET_BACKGROUND));
    out.push(MARKER);
    out.push_str(RESET);
}

/// Render one display line
pub fn render_line(line: &DisplayLine) -> String {
    let mut out = String::new();
    let mut col = 0;
    let mut marker = line.marker;

    for segment in &line.segments {
        let len = segment.text.chars().count();
        match marker {
            Some(at) if at < col + len => {
                let split = segment
                    .text
                    .char_indices()
                    .nth(at - col)
                    .map_or(segment.text.len(), |(i, _)| i);
                push_styled(&mut out, &segment.text[..split], segment.paint);
                push_marker(&mut out);
                push_styled(&mut out, &segment.text[split..], segment.paint);
                marker = None;
            }
            _ => push_styled(&mut out, &segment.text, segment.paint),
        }
        col += len;
    }

    if marker.is_some() {
        push_marker(&mut out);
    }
    out
}

/// Render display lines joined with newlines
pub fn to_ansi(lines: &[DisplayLine]) -> String {
    lines.iter().map(render_line).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::layers::Segment;
    use crate::compositor::palette;

    fn segment(text: &str, paint: Paint) -> Segment {
        Segment {
            text: text.to_string(),
            paint,
        }
    }

    #[test]
    fn test_base_text_is_unstyled() {
        let line = DisplayLine {
            segments: vec![segment("plain", Paint::BASE)],
            marker: None,
        };
        assert_eq!(render_line(&line), "plain");
    }

    #[test]
    fn test_target_is_wrapped_in_escapes() {
        let line = DisplayLine {
            segments: vec![segment("a ", Paint::BASE), segment("hit", Paint { fill: Fill::Base, target: true })],
            marker: None,
        };
        let out = render_line(&line);
        assert!(out.starts_with("a \x1b["));
        assert!(out.contains("48;2;255;0;0"));
        assert!(out.ends_with("hit\x1b[0m"));
    }

    #[test]
    fn test_mark_under_target_keeps_underline_and_colour() {
        let green = palette::lookup("green").unwrap();
        let out = style(Paint {
            fill: Fill::Mark(green),
            target: true,
        });
        assert!(out.starts_with("\x1b[1;4m"));
        assert!(out.contains("48;2;255;0;0"));
        assert!(out.contains(&fg(green.background)));

        let plain_target = style(Paint {
            fill: Fill::Base,
            target: true,
        });
        assert!(plain_target.starts_with("\x1b[1m"));
    }

    #[test]
    fn test_marker_splits_segment() {
        let line = DisplayLine {
            segments: vec![segment("leftright", Paint::BASE)],
            marker: Some(4),
        };
        let out = render_line(&line);
        let marker_at = out.find(MARKER).unwrap();
        assert_eq!(&out[..marker_at - fg(TARGET_BACKGROUND).len()], "left");
        assert!(out.ends_with("right"));
    }

    #[test]
    fn test_marker_at_end_of_line() {
        let line = DisplayLine {
            segments: vec![segment("tail", Paint::BASE)],
            marker: Some(4),
        };
        assert!(render_line(&line).starts_with("tail"));
        assert!(render_line(&line).contains(MARKER));
    }
}
