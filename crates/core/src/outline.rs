//! Numbered outline reconstruction from heading-marked text.
//!
//! The PDF renderer emits a markdown-like string in which heading lines are
//! prefixed by a run of `#` characters encoding their nominal depth. This
//! module turns that flat stream into a numbered outline: levels are rebased
//! so the first heading becomes level 1, a singular top-level heading is
//! promoted to a document title, and the remaining headings receive dotted
//! hierarchical labels ("2.3.1") computed by a per-level counter fold.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Returned instead of an outline when the rendered text has no heading lines.
/// Not an error: plenty of documents simply have no detectable headings.
pub const NO_HEADERS_MESSAGE: &str = "No valid headers identified.";

/// Deepest heading level tracked by the numbering counters.
const MAX_DEPTH: u8 = 6;

/// A heading as extracted from the rendered text, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Nominal depth, taken from the length of the leading `#` run.
    pub level: u8,
    /// Heading text with the marker run removed but otherwise untouched.
    pub text: String,
}

/// A heading with its final dotted label, e.g. `{ label: "2.1", text: "Scope" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberedHeading {
    pub label: String,
    pub text: String,
}

/// The reconstructed outline: an optional document title plus numbered entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub title: Option<String>,
    pub entries: Vec<NumberedHeading>,
}

impl Outline {
    /// Render the outline as plain text.
    ///
    /// The title, when present, appears first as `"Title: ..."` preceded by a
    /// blank line; each entry follows as `"{label}. {text}"`.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.entries.len() + 1);
        if let Some(title) = &self.title {
            lines.push(format!("\nTitle: {}", title));
        }
        for entry in &self.entries {
            lines.push(format!("{}. {}", entry.label, entry.text));
        }
        lines.join("\n")
    }
}

/// Per-level heading counters, levels 1..=6. Index 0 is unused.
///
/// Constructed fresh for every numbering pass; the counters never outlive a
/// single invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters([u32; (MAX_DEPTH + 1) as usize]);

impl Counters {
    /// Current count at `level`.
    pub fn get(&self, level: u8) -> u32 {
        self.0[level as usize]
    }

    /// Apply one heading at `level` given the previous heading's level.
    ///
    /// Entering a deeper level restarts its counter at 1; staying at the same
    /// level or returning to a shallower one increments. Every counter deeper
    /// than `level` is zeroed afterwards, so a later descent restarts at ".1".
    fn advance(&mut self, level: u8, previous: u8) {
        let l = level as usize;
        if level > previous {
            self.0[l] = 1;
        } else {
            self.0[l] += 1;
        }
        for deeper in (l + 1)..=MAX_DEPTH as usize {
            self.0[deeper] = 0;
        }
    }

    /// Dot-join the counters for levels `from..=to`.
    fn label(&self, from: u8, to: u8) -> String {
        (from..=to)
            .map(|level| self.0[level as usize].to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// The numbering fold state: counters, the previous effective level, and the
/// shallowest level that participates in labels.
///
/// Exposed separately from [`number_headings`] so the transition function can
/// be exercised on synthetic `(level, text)` sequences without any
/// marker-string parsing involved.
#[derive(Debug, Clone)]
pub struct NumberingState {
    counters: Counters,
    previous_level: u8,
    base_level: u8,
}

impl NumberingState {
    /// Start a numbering pass.
    ///
    /// When a title was detected, labels start at `min_level + 1` (the title
    /// itself is not numbered, and its level never appears in labels);
    /// otherwise labels start at level 1.
    pub fn new(min_level: u8, has_title: bool) -> Self {
        NumberingState {
            counters: Counters::default(),
            previous_level: min_level,
            base_level: if has_title { min_level + 1 } else { 1 },
        }
    }

    /// Process one heading and return its dotted label.
    ///
    /// The heading's level is clamped to at most one deeper than the previous
    /// effective level, so a level-3 heading right after a level-1 heading is
    /// numbered as level 2 rather than opening an unrepresented intermediate
    /// level.
    pub fn step(&mut self, level: u8) -> String {
        let effective = level
            .clamp(1, MAX_DEPTH)
            .min(self.previous_level + 1);
        self.counters.advance(effective, self.previous_level);
        let from = self.base_level.min(effective);
        let label = self.counters.label(from, effective);
        self.previous_level = effective;
        label
    }

    /// Current counter snapshot.
    pub fn counters(&self) -> Counters {
        self.counters
    }
}

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#+)\s*(.*)$").expect("valid heading regex"))
}

/// Extract heading lines from rendered text, in document order.
///
/// A line is a heading when its trimmed form starts with `#`. The marker run
/// length (capped at 6) becomes the nominal level; the remainder of the line
/// becomes the heading text.
pub fn extract_headings(rendered: &str) -> Vec<Heading> {
    let re = heading_regex();
    rendered
        .lines()
        .filter_map(|line| {
            let caps = re.captures(line.trim())?;
            let markers = caps.get(1).map_or(0, |m| m.as_str().len());
            let text = caps.get(2).map_or("", |m| m.as_str()).to_string();
            Some(Heading {
                level: (markers.min(MAX_DEPTH as usize)).max(1) as u8,
                text,
            })
        })
        .collect()
}

/// Rebase heading levels so the FIRST heading becomes level 1.
///
/// The offset comes from the first heading encountered, not the global
/// minimum. A later heading shallower than the first floors at level 1,
/// possibly colliding with true level-1 headings; this is deliberate.
pub fn normalize_levels(headings: &[Heading]) -> Vec<Heading> {
    let Some(first) = headings.first() else {
        return Vec::new();
    };
    let offset = first.level - 1;
    headings
        .iter()
        .map(|h| Heading {
            level: h.level.saturating_sub(offset).max(1),
            text: h.text.clone(),
        })
        .collect()
}

/// Strip marker characters and leading/trailing junk from heading text.
///
/// Removes any leading `#` run, then trims asterisks, digits, periods, and
/// spaces from both ends. Idempotent on already-clean text.
pub fn clean_heading_text(text: &str) -> String {
    text.trim_start_matches('#')
        .trim_matches(|c: char| c == ' ' || c == '*' || c == '.' || c.is_ascii_digit())
        .to_string()
}

/// Promote a singular minimum-level heading to the document title.
///
/// Returns the remaining headings, the cleaned title text (if any), and the
/// minimum level observed. When two or more headings share the minimum level
/// no title exists, however title-like any of them looks.
pub fn detect_title(headings: Vec<Heading>) -> (Vec<Heading>, Option<String>, u8) {
    let Some(min_level) = headings.iter().map(|h| h.level).min() else {
        return (headings, None, 1);
    };

    let at_min: Vec<usize> = headings
        .iter()
        .enumerate()
        .filter(|(_, h)| h.level == min_level)
        .map(|(i, _)| i)
        .collect();

    if at_min.len() == 1 {
        let mut remaining = headings;
        let title = remaining.remove(at_min[0]);
        (remaining, Some(clean_heading_text(&title.text)), min_level)
    } else {
        (headings, None, min_level)
    }
}

/// Number a normalized heading sequence.
///
/// A pure fold over the headings in order: clamp the level, clean the text,
/// advance the counters, emit the label. No failure mode.
pub fn number_headings(
    headings: &[Heading],
    has_title: bool,
    min_level: u8,
) -> Vec<NumberedHeading> {
    let mut state = NumberingState::new(min_level, has_title);
    headings
        .iter()
        .map(|h| {
            let text = clean_heading_text(&h.text);
            let label = state.step(h.level);
            NumberedHeading { label, text }
        })
        .collect()
}

/// Build an [`Outline`] from rendered heading-marked text.
///
/// Returns `None` when the text contains no heading lines.
pub fn build_outline(rendered: &str) -> Option<Outline> {
    let headings = extract_headings(rendered);
    if headings.is_empty() {
        return None;
    }

    let normalized = normalize_levels(&headings);
    let (remaining, title, min_level) = detect_title(normalized);
    let has_title = title.is_some();
    let entries = number_headings(&remaining, has_title, min_level);

    Some(Outline { title, entries })
}

/// The full pipeline as a total text-to-text function.
///
/// Produces either the formatted outline or [`NO_HEADERS_MESSAGE`]; never
/// errors, whatever the input string looks like.
pub fn outline_text(rendered: &str) -> String {
    match build_outline(rendered) {
        Some(outline) => outline.to_text(),
        None => NO_HEADERS_MESSAGE.to_string(),
    }
}
