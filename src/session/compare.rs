use crate::session::types::Attempt;
use serde::{Deserialize, Serialize};

/// Comparison of the two attempts, computed once both have transcripts
/// and cached on the session. The document renderer consumes this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub first_transcript: String,
    pub second_transcript: String,
    /// Word-level diff from first to second attempt
    pub diff: Vec<DiffSegment>,
    pub first_readiness_score: Option<u8>,
    pub second_readiness_score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "text")]
pub enum DiffSegment {
    /// Present in both attempts
    Unchanged(String),
    /// Only in the first attempt
    Removed(String),
    /// Only in the second attempt
    Added(String),
}

impl Comparison {
    pub fn between(first: &Attempt, second: &Attempt) -> Option<Self> {
        let first_transcript = first.transcript.as_ref()?;
        let second_transcript = second.transcript.as_ref()?;

        Some(Self {
            first_transcript: first_transcript.text.clone(),
            second_transcript: second_transcript.text.clone(),
            diff: word_diff(&first_transcript.text, &second_transcript.text),
            first_readiness_score: first.feedback.as_ref().and_then(|f| f.readiness_score),
            second_readiness_score: second.feedback.as_ref().and_then(|f| f.readiness_score),
        })
    }

    /// Whether the two transcripts differ at all.
    pub fn has_changes(&self) -> bool {
        self.diff
            .iter()
            .any(|segment| !matches!(segment, DiffSegment::Unchanged(_)))
    }
}

/// Word-level diff via longest common subsequence. Runs of equal words
/// collapse into one segment; removals are emitted before additions.
pub fn word_diff(first: &str, second: &str) -> Vec<DiffSegment> {
    let a: Vec<&str> = first.split_whitespace().collect();
    let b: Vec<&str> = second.split_whitespace().collect();

    // LCS length table
    let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            table[i][j] = if a[i] == b[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut segments: Vec<DiffSegment> = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            push_word(&mut segments, SegmentKind::Unchanged, a[i]);
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            push_word(&mut segments, SegmentKind::Removed, a[i]);
            i += 1;
        } else {
            push_word(&mut segments, SegmentKind::Added, b[j]);
            j += 1;
        }
    }
    while i < a.len() {
        push_word(&mut segments, SegmentKind::Removed, a[i]);
        i += 1;
    }
    while j < b.len() {
        push_word(&mut segments, SegmentKind::Added, b[j]);
        j += 1;
    }

    segments
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum SegmentKind {
    Unchanged,
    Removed,
    Added,
}

fn push_word(segments: &mut Vec<DiffSegment>, kind: SegmentKind, word: &str) {
    let matches_kind = |segment: &DiffSegment| match (kind, segment) {
        (SegmentKind::Unchanged, DiffSegment::Unchanged(_)) => true,
        (SegmentKind::Removed, DiffSegment::Removed(_)) => true,
        (SegmentKind::Added, DiffSegment::Added(_)) => true,
        _ => false,
    };

    match segments.last_mut() {
        Some(last) if matches_kind(last) => {
            let text = match last {
                DiffSegment::Unchanged(t) | DiffSegment::Removed(t) | DiffSegment::Added(t) => t,
            };
            text.push(' ');
            text.push_str(word);
        }
        _ => {
            let text = word.to_string();
            segments.push(match kind {
                SegmentKind::Unchanged => DiffSegment::Unchanged(text),
                SegmentKind::Removed => DiffSegment::Removed(text),
                SegmentKind::Added => DiffSegment::Added(text),
            });
        }
    }
}
