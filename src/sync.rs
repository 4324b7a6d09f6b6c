//! Replays edits made on a plain-text surface onto a [`Document`].
//!
//! The surface only knows text. After each change its content is diffed
//! character by character against the Document's own text and the difference
//! is applied through `remove_chars_at` / `insert_chars_at`, so every
//! untouched Character (and its formatting) survives.

use log::debug;
use similar::{DiffTag, TextDiff};

use crate::document::Document;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: usize,
    pub removed: usize,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.removed == 0
    }
}

/// Brings `doc` in line with `next` and reports how many characters were
/// inserted and removed.
pub fn sync_text(doc: &mut Document, next: &str) -> SyncReport {
    let current = doc.to_string();
    if current == next {
        return SyncReport::default();
    }

    let incoming: Vec<char> = next.chars().collect();
    let diff = TextDiff::from_chars(current.as_str(), next);
    let mut report = SyncReport::default();

    // Ops come in text order. Everything before an op already matches
    // `next`, so its position in the Document is its start in `next`.
    for op in diff.ops() {
        let old = op.old_range();
        let new = op.new_range();
        match op.tag() {
            DiffTag::Equal => {}
            DiffTag::Delete => {
                let at = flat_index(doc, new.start);
                report.removed += doc.remove_chars_at(at, old.len()).len();
            }
            DiffTag::Insert => {
                let text: String = incoming[new.clone()].iter().collect();
                doc.insert_chars_at(flat_index(doc, new.start), &text);
                report.inserted += new.len();
            }
            DiffTag::Replace => {
                let at = flat_index(doc, new.start);
                report.removed += doc.remove_chars_at(at, old.len()).len();
                let text: String = incoming[new.clone()].iter().collect();
                doc.insert_chars_at(at, &text);
                report.inserted += new.len();
            }
        }
    }

    debug!(
        "synced surface: +{} -{} ({} chars)",
        report.inserted,
        report.removed,
        doc.len()
    );
    report
}

/// Maps an offset into the Document's text onto the flat index, skipping
/// terminators that sit before it.
fn flat_index(doc: &Document, text_offset: usize) -> usize {
    let mut seen = 0;
    for (index, ch) in doc.chars().iter().enumerate() {
        if seen == text_offset {
            return index;
        }
        if doc.character(*ch).is_some_and(|ch| !ch.is_terminator()) {
            seen += 1;
        }
    }
    doc.len()
}
