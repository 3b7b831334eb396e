//! Integrity report over stored transcriptions.
//!
//! Works on exported `(word, transcription)` rows, so it never needs a
//! database connection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enrich::phonetic::{accept_transcription, LIAISON};

/// Samples kept per category.
pub const SAMPLES_PER_CATEGORY: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionRow {
    pub word: String,
    #[serde(default, alias = "IPA_word", alias = "ipa")]
    pub transcription: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Finding {
    Empty,
    NotWrapped,
    Bracketed,
    DoubleDot,
    DotNextToLiaison,
    SpaceNextToLiaison,
    MultiSegment,
}

impl Finding {
    pub fn as_str(self) -> &'static str {
        match self {
            Finding::Empty => "empty",
            Finding::NotWrapped => "not_wrapped",
            Finding::Bracketed => "bracketed",
            Finding::DoubleDot => "double_dot",
            Finding::DotNextToLiaison => "dot_next_to_liaison",
            Finding::SpaceNextToLiaison => "space_next_to_liaison",
            Finding::MultiSegment => "multi_segment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowVerdict {
    pub word: String,
    pub passes: bool,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TranscriptionAudit {
    pub total: usize,
    pub passing: usize,
    pub counts: BTreeMap<Finding, usize>,
    /// Up to [`SAMPLES_PER_CATEGORY`] offending `(word, transcription)` pairs.
    pub samples: BTreeMap<Finding, Vec<(String, String)>>,
    pub rows: Vec<RowVerdict>,
}

impl TranscriptionAudit {
    pub fn count(&self, finding: Finding) -> usize {
        self.counts.get(&finding).copied().unwrap_or(0)
    }
}

fn findings_for(raw: Option<&str>) -> Vec<Finding> {
    let t = raw.map(str::trim).unwrap_or("");
    if t.is_empty() {
        return vec![Finding::Empty];
    }

    let mut found = Vec::new();
    let wrapped = t.len() >= 2 && t.starts_with('/') && t.ends_with('/');
    if !wrapped {
        found.push(Finding::NotWrapped);
    }
    if t.contains(['[', ']']) {
        found.push(Finding::Bracketed);
    }
    if t.contains("..") {
        found.push(Finding::DoubleDot);
    }
    let chars: Vec<char> = t.chars().collect();
    let around_liaison = |pred: fn(char) -> bool| {
        chars
            .windows(2)
            .any(|w| (w[0] == LIAISON && pred(w[1])) || (w[1] == LIAISON && pred(w[0])))
    };
    if around_liaison(|c| c == '.') {
        found.push(Finding::DotNextToLiaison);
    }
    if around_liaison(char::is_whitespace) {
        found.push(Finding::SpaceNextToLiaison);
    }
    if wrapped && t[1..t.len() - 1].contains('/') {
        found.push(Finding::MultiSegment);
    }
    found
}

/// Classify every row and collect per-category counts and samples.
pub fn audit_transcriptions(rows: &[TranscriptionRow]) -> TranscriptionAudit {
    let mut audit = TranscriptionAudit { total: rows.len(), ..Default::default() };
    for row in rows {
        let raw = row.transcription.as_deref();
        let findings = findings_for(raw);
        let passes = raw.and_then(accept_transcription).is_some() && findings.is_empty();
        if passes {
            audit.passing += 1;
        }
        for finding in &findings {
            *audit.counts.entry(*finding).or_insert(0) += 1;
            let samples = audit.samples.entry(*finding).or_default();
            if samples.len() < SAMPLES_PER_CATEGORY {
                samples.push((row.word.clone(), raw.unwrap_or("").to_string()));
            }
        }
        audit.rows.push(RowVerdict { word: row.word.clone(), passes, findings });
    }
    log::info!(
        "Audited {} transcriptions, {} pass",
        audit.total,
        audit.passing
    );
    audit
}
