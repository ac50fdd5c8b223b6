//! Compositor Integration Tests
//!
//! Tests for mark placement under reveal toggles and highlight layering.

use std::collections::BTreeMap;

use textreview::compositor::{compose, to_absolute_offset, Fill, Layers, OffsetError, Paint, Reveal};
use textreview::{AnnotationRecord, HighlightRule, MarkKind, MatchRecord};

fn record() -> MatchRecord {
    // document: "Honestly she felt jealous of him."
    serde_json::from_value(serde_json::json!({
        "category": "JEALOUS",
        "match": "jealous",
        "precontext": "elt ",
        "postcontext": " of",
        "pretext": "Honestly she felt ",
        "posttext": " of him.",
        "start_index": 18,
        "end_index": 25
    }))
    .unwrap()
}

fn colors() -> BTreeMap<String, String> {
    [("mark", "green"), ("negated", "red")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn layers<'a>(highlights: &'a [HighlightRule], colors: &'a BTreeMap<String, String>) -> Layers<'a> {
    Layers {
        highlights,
        mark_colors: colors,
        search: None,
    }
}

fn is_mark(paint: Option<Paint>) -> bool {
    paint.and_then(|p| p.mark()).is_some()
}

#[test]
fn test_mark_before_match_appears_only_when_revealed() {
    let colors = colors();
    let mut annotation = AnnotationRecord::new(0);
    // "felt je": five characters before the match through two into it
    annotation.add_mark(-5, 2, "felt je", MarkKind::negated());

    let hidden = compose(&record(), annotation.marks(), Reveal::default(), layers(&[], &colors));
    assert_eq!(hidden.text(), "elt jealous of");
    assert!(!hidden.paints().iter().any(|p| p.mark().is_some()));

    let revealed = compose(
        &record(),
        annotation.marks(),
        Reveal {
            before: true,
            after: false,
        },
        layers(&[], &colors),
    );
    assert_eq!(revealed.text(), "Honestly she felt jealous of");
    // pre-window is 18 chars: the mark covers 13..20, the last two under the target
    assert!(!is_mark(revealed.paint_at(12)));
    for i in 13..20 {
        assert_eq!(revealed.paint_at(i).unwrap().mark().map(|s| s.name), Some("red"));
    }
    assert!(!revealed.paint_at(17).unwrap().target);
    assert!(revealed.paint_at(18).unwrap().target);
    assert!(revealed.paint_at(19).unwrap().target);
    assert_eq!(revealed.paint_at(20), Some(Paint { fill: Fill::Base, target: true }));

    assert_eq!((annotation.marks()[0].start, annotation.marks()[0].end), (-5, 2));
}

#[test]
fn test_layer_precedence() {
    let colors = colors();
    let highlights = vec![
        HighlightRule::new("she felt", "yellow"),
        HighlightRule::new("felt jeal", "blue"),
    ];
    let mut annotation = AnnotationRecord::new(0);
    annotation.add_mark(-4, 0, "elt ", MarkKind::mark());

    let composition = compose(
        &record(),
        annotation.marks(),
        Reveal {
            before: true,
            after: true,
        },
        Layers {
            highlights: &highlights,
            mark_colors: &colors,
            search: Some("HONEST"),
        },
    );
    let text = composition.text();
    assert_eq!(text, "Honestly she felt jealous of him.");

    assert_eq!(composition.paint_at(0), Some(Paint::new(Fill::Search)));
    assert!(matches!(composition.paint_at(9).unwrap().fill, Fill::Pattern(s) if s.name == "yellow"));
    // "felt" starts at 13: blue from the later rule, then the mark on top
    assert!(matches!(composition.paint_at(13).unwrap().fill, Fill::Pattern(s) if s.name == "blue"));
    assert!(matches!(composition.paint_at(14).unwrap().fill, Fill::Mark(s) if s.name == "green"));
    // the blue rule reaches into the match and stays under the target
    let hit = composition.paint_at(18).unwrap();
    assert!(hit.target);
    assert!(matches!(hit.fill, Fill::Pattern(s) if s.name == "blue"));
    assert_eq!(composition.paint_at(22), Some(Paint { fill: Fill::Base, target: true }));
    assert_eq!(composition.paint_at(25), Some(Paint::BASE));
}

#[test]
fn test_mark_inside_match_is_visible_under_target() {
    let colors = colors();
    let mut annotation = AnnotationRecord::new(0);
    annotation.add_mark(0, 3, "jea", MarkKind::mark());

    let composition = compose(&record(), annotation.marks(), Reveal::default(), layers(&[], &colors));
    // near window "elt jealous of": the match starts at 4
    let marked: Vec<usize> = (0..composition.paints().len())
        .filter(|&i| is_mark(composition.paint_at(i)))
        .collect();
    assert_eq!(marked, vec![4, 5, 6]);
    assert!(marked.iter().all(|&i| composition.paint_at(i).unwrap().target));

    let rendered = textreview::compositor::to_ansi(&composition.wrap(0));
    assert!(rendered.contains("\x1b[1;4m\x1b[48;2;255;0;0m\x1b[38;2;0;128;0mjea"));
}

#[test]
fn test_end_past_window_is_clamped() {
    let colors = colors();
    let mut annotation = AnnotationRecord::new(0);
    annotation.add_mark(5, 100, "us of him.", MarkKind::mark());

    let composition = compose(&record(), annotation.marks(), Reveal::default(), layers(&[], &colors));
    let len = composition.paints().len();
    assert!(is_mark(composition.paint_at(11)));
    assert!(is_mark(composition.paint_at(len - 1)));
}

#[test]
fn test_empty_match_has_marker() {
    let colors = colors();
    let mut empty = record();
    empty.matched = String::new();
    empty.end_index = empty.start_index;

    let composition = compose(&empty, &[], Reveal::default(), layers(&[], &colors));
    assert_eq!(composition.insertion_marker(), Some(4));
    assert!(composition.paints().iter().all(|p| !p.target));
}

#[test]
fn test_offset_translation_bounds() {
    let text = "first line\nsecond\n";
    assert_eq!(to_absolute_offset(text, 1, 3).unwrap(), 14);
    assert_eq!(to_absolute_offset(text, 2, 0).unwrap(), 18);
    assert!(matches!(
        to_absolute_offset(text, 3, 0),
        Err(OffsetError::RowOutOfBounds { .. })
    ));
    assert!(matches!(
        to_absolute_offset(text, 1, 7),
        Err(OffsetError::ColumnOutOfBounds { .. })
    ));
}
