//! Interactive review loop.
//!
//! One command per line. The loop renders the current row after every
//! command and exports a snapshot when it ends (on `q` or end of input).

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::compositor::to_ansi;
use crate::core::{Boundary, CorpusIndex, ReviewSession};
use crate::domain::{AnnotationRecord, MarkKind};

const HELP: &str = "\
n                  save and next
p                  save and previous
s                  save
g ROW              go to row (unsaved edits are dropped)
t LABEL|N          toggle a response label (by name or option number)
c TEXT             set the comment
k                  list canned responses
k N                use canned response N as the comment
k+ TEXT            add a canned response and use it
u [NAME]           show or set the reviewer name
f                  toggle flag
m START END [KIND] mark window offsets START..END
b / a              reveal text before / after the match
h COLOR REGEX      add a highlight rule
/ REGEX            search (empty clears)
r                  recently reviewed rows
?                  help
q                  save, export and quit";

/// A parsed reviewer command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    Save,
    Goto(i64),
    Toggle(String),
    Comment(String),
    CannedList,
    UseCanned(usize),
    AddCanned(String),
    User(Option<String>),
    Flag,
    Mark { start: usize, end: usize, kind: MarkKind },
    RevealBefore,
    RevealAfter,
    Highlight { color: String, regex: String },
    Search(Option<String>),
    Recent,
    Help,
    Quit,
}

/// Parse one input line; `Ok(None)` for blank lines
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match head {
        "n" => Command::Next,
        "p" => Command::Previous,
        "s" => Command::Save,
        "f" => Command::Flag,
        "b" => Command::RevealBefore,
        "a" => Command::RevealAfter,
        "r" => Command::Recent,
        "?" => Command::Help,
        "q" => Command::Quit,
        "g" => Command::Goto(rest.parse().map_err(|_| format!("Not a row number: {:?}", rest))?),
        "t" if !rest.is_empty() => Command::Toggle(rest.to_string()),
        "c" => Command::Comment(rest.to_string()),
        "k" if rest.is_empty() => Command::CannedList,
        "k" => match rest.parse::<usize>() {
            Ok(n) if n > 0 => Command::UseCanned(n - 1),
            _ => return Err(format!("Not a response number: {:?}", rest)),
        },
        "k+" if !rest.is_empty() => Command::AddCanned(rest.to_string()),
        "u" => Command::User((!rest.is_empty()).then(|| rest.to_string())),
        "/" => Command::Search((!rest.is_empty()).then(|| rest.to_string())),
        "m" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            let (start, end, kind) = match parts.as_slice() {
                [start, end] => (start, end, MarkKind::mark()),
                [start, end, kind] => (start, end, MarkKind::new(*kind)),
                _ => return Err("Usage: m START END [KIND]".to_string()),
            };
            Command::Mark {
                start: start.parse().map_err(|_| format!("Not an offset: {:?}", start))?,
                end: end.parse().map_err(|_| format!("Not an offset: {:?}", end))?,
                kind,
            }
        }
        "h" => match rest.split_once(char::is_whitespace) {
            Some((color, regex)) if !regex.trim().is_empty() => Command::Highlight {
                color: color.to_string(),
                regex: regex.trim().to_string(),
            },
            _ => return Err("Usage: h COLOR REGEX".to_string()),
        },
        _ => return Err(format!("Unknown command: {:?} (? for help)", line)),
    };
    Ok(Some(command))
}

/// Run the review loop until `q` or end of input; returns the export path
pub async fn run<C, R, W>(session: &mut ReviewSession<C>, input: R, out: &mut W, width: usize) -> Result<PathBuf>
where
    C: CorpusIndex,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    render(session, out, width)?;

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "{}", message)?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = apply(session, command, out) {
            writeln!(out, "Error: {:#}", e)?;
        }
        render(session, out, width)?;
    }

    let path = session.finish().context("Failed to export annotations")?;
    writeln!(out, "Exported to {}", path.display())?;
    out.flush()?;
    Ok(path)
}

fn apply<C: CorpusIndex, W: Write>(session: &mut ReviewSession<C>, command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Next => report_boundary(session.next()?.boundary, out)?,
        Command::Previous => report_boundary(session.previous()?.boundary, out)?,
        Command::Goto(row) => report_boundary(session.goto(row)?.boundary, out)?,
        Command::Save => {
            let at = session.save_current()?;
            writeln!(out, "Saved at {}", local_time(at))?;
        }
        Command::Toggle(label) => {
            let label = resolve_label(session.config().options(), &label);
            let on = session.toggle_label(&label);
            writeln!(out, "{} {}", if on { "Selected" } else { "Cleared" }, label)?;
        }
        Command::Comment(text) => session.set_comment(text),
        Command::CannedList => {
            if session.canned_responses().is_empty() {
                writeln!(out, "No canned responses (k+ TEXT adds one)")?;
            }
            for (i, response) in session.canned_responses().iter().enumerate() {
                writeln!(out, "{}: {}", i + 1, response)?;
            }
        }
        Command::UseCanned(index) => {
            if session.use_canned_response(index).is_none() {
                anyhow::bail!("No canned response {}", index + 1);
            }
        }
        Command::AddCanned(text) => {
            session.add_canned_response(&text)?;
        }
        Command::User(Some(name)) => {
            session.set_user(&name)?;
            writeln!(out, "Reviewer: {}", session.config().reviewer())?;
        }
        Command::User(None) => writeln!(out, "Reviewer: {}", session.config().reviewer())?,
        Command::Flag => {
            session.toggle_flag();
        }
        Command::Mark { start, end, kind } => {
            let len = session.composition().window().len();
            if start > len || end > len {
                anyhow::bail!("Offsets must be within 0..={}", len);
            }
            session.add_mark(start, end, kind);
        }
        Command::RevealBefore => {
            session.toggle_reveal_before();
        }
        Command::RevealAfter => {
            session.toggle_reveal_after();
        }
        Command::Highlight { color, regex } => session.add_highlight(&regex, &color)?,
        Command::Search(pattern) => session.search(pattern.as_deref()),
        Command::Recent => {
            let rows = session.recent_reviewed(Some(10))?;
            let rows: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
            writeln!(out, "Recently reviewed: {}", rows.join(", "))?;
        }
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => {}
    }
    Ok(())
}

/// An option number (1-based) selects the configured label
fn resolve_label(options: &[String], input: &str) -> String {
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i))
        .cloned()
        .unwrap_or_else(|| input.to_string())
}

fn report_boundary<W: Write>(boundary: Boundary, out: &mut W) -> Result<()> {
    match boundary {
        Boundary::Within => {}
        Boundary::BeforeFirst => writeln!(out, "Already at the first row")?,
        Boundary::PastLast => writeln!(out, "No more rows")?,
    }
    Ok(())
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn render<C: CorpusIndex, W: Write>(session: &ReviewSession<C>, out: &mut W, width: usize) -> Result<()> {
    let config = session.config();
    let progress = session.progress()?;

    writeln!(out, "\n== {} ==  row {} of {} ({} reviewed)", config.title(), progress.row, progress.total, progress.reviewed)?;
    writeln!(out, "{}", session.record().display_metadata(40).join(" | "))?;
    if let Some(pattern) = session.search_pattern() {
        writeln!(out, "search: {}", pattern)?;
    }
    writeln!(out, "{}", to_ansi(&session.compose(width)))?;
    if !config.options().is_empty() {
        let options: Vec<String> = config
            .options()
            .iter()
            .enumerate()
            .map(|(i, o)| format!("{}:{}", i + 1, o))
            .collect();
        writeln!(out, "options: {}", options.join("  "))?;
    }
    print_annotation(out, session.annotation(), session.last_saved()?)?;
    out.flush()?;
    Ok(())
}

/// Print the annotation summary shown under a row
pub fn print_annotation<W: Write>(out: &mut W, annotation: &AnnotationRecord, saved: Option<DateTime<Utc>>) -> Result<()> {
    writeln!(out, "selected: [{}]", annotation.selected().join(", "))?;
    if !annotation.comment.is_empty() {
        writeln!(out, "comment: {}", annotation.comment)?;
    }
    if annotation.flagged {
        writeln!(out, "flagged")?;
    }
    for mark in annotation.marks() {
        writeln!(out, "mark {} [{}, {}) {:?}", mark.kind, mark.start, mark.end, mark.selection)?;
    }
    match saved {
        Some(at) => writeln!(out, "last saved: {}", local_time(at))?,
        None => writeln!(out, "not saved")?,
    }
    Ok(())
}
