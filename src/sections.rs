//! Splits a generated markdown reply into the four addressable sections.
//!
//! Flow:
//! 1) Cut the document at every level-2 heading (`## `, not `###`); the
//!    preamble before the first heading is dropped.
//! 2) Classify each trimmed fragment with `SECTION_RULES`, in order. The first
//!    rule whose marker or keyword occurs anywhere in the fragment wins;
//!    unmatched fragments are dropped.
//! 3) Later fragments overwrite earlier ones in the same bucket.
//! 4) When easy, normal and hard are all empty the whole reply goes to `easy`
//!    and the other three get `FALLBACK_PLACEHOLDER`. A partial match leaves
//!    the missing buckets empty.
//!
//! The leading marker emoji of a heading is stripped from the section text;
//! the heading words themselves are kept.

use tracing::{debug, warn};

use crate::domain::GeneratedSections;

/// Shown in the normal/hard/answer-key slots when no heading was recognized.
pub const FALLBACK_PLACEHOLDER: &str = "Zie volledige inhoud bij makkelijke versie";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket {
  Easy,
  Normal,
  Hard,
  AnswerKey,
}

/// One classification rule: a fragment containing `marker`, or `keyword`
/// case-insensitively, belongs to `bucket`. `keyword` is lowercase.
#[derive(Clone, Copy, Debug)]
pub struct SectionRule {
  pub marker: &'static str,
  pub keyword: &'static str,
  pub bucket: Bucket,
}

impl SectionRule {
  fn matches(&self, fragment: &str, lowered: &str) -> bool {
    fragment.contains(self.marker) || lowered.contains(self.keyword)
  }
}

pub const SECTION_RULES: [SectionRule; 4] = [
  SectionRule { marker: "🟢", keyword: "makkelijke", bucket: Bucket::Easy },
  SectionRule { marker: "🟡", keyword: "normale", bucket: Bucket::Normal },
  SectionRule { marker: "🔴", keyword: "moeilijke", bucket: Bucket::Hard },
  SectionRule { marker: "📋", keyword: "antwoordmodel", bucket: Bucket::AnswerKey },
];

/// Which bucket, if any, a trimmed fragment belongs to.
pub fn classify(fragment: &str) -> Option<Bucket> {
  let lowered = fragment.to_lowercase();
  SECTION_RULES
    .iter()
    .find(|rule| rule.matches(fragment, &lowered))
    .map(|rule| rule.bucket)
}

/// Partition a raw markdown reply. Never fails.
pub fn extract_sections(raw: &str) -> GeneratedSections {
  let mut out = GeneratedSections::default();
  let mut unclassified = 0usize;

  for fragment in level_two_fragments(raw) {
    let trimmed = fragment.trim();
    if trimmed.is_empty() {
      continue;
    }
    match classify(trimmed) {
      Some(bucket) => {
        let slot = match bucket {
          Bucket::Easy => &mut out.easy,
          Bucket::Normal => &mut out.normal,
          Bucket::Hard => &mut out.hard,
          Bucket::AnswerKey => &mut out.answer_key,
        };
        *slot = strip_marker(trimmed).to_string();
      }
      None => unclassified += 1,
    }
  }

  if out.easy.is_empty() && out.normal.is_empty() && out.hard.is_empty() {
    warn!(target: "generation", raw_len = raw.len(), "No section headings recognized; using full reply as easy version");
    return GeneratedSections {
      easy: raw.trim().to_string(),
      normal: FALLBACK_PLACEHOLDER.to_string(),
      hard: FALLBACK_PLACEHOLDER.to_string(),
      answer_key: FALLBACK_PLACEHOLDER.to_string(),
    };
  }

  debug!(
    target: "generation",
    easy_len = out.easy.len(),
    normal_len = out.normal.len(),
    hard_len = out.hard.len(),
    answer_key_len = out.answer_key.len(),
    unclassified,
    "Sections extracted"
  );
  out
}

/// Text after each level-2 heading marker, up to the next one.
fn level_two_fragments(raw: &str) -> Vec<&str> {
  let mut starts = Vec::new();
  let mut offset = 0usize;
  for line in raw.split_inclusive('\n') {
    let body = line.trim_start();
    if body.starts_with("##") && !body[2..].starts_with('#') {
      starts.push(offset + (line.len() - body.len()));
    }
    offset += line.len();
  }

  starts
    .iter()
    .enumerate()
    .map(|(i, &start)| {
      let end = starts.get(i + 1).copied().unwrap_or(raw.len());
      &raw[start + 2..end]
    })
    .collect()
}

fn strip_marker(fragment: &str) -> &str {
  SECTION_RULES
    .iter()
    .find_map(|rule| fragment.strip_prefix(rule.marker))
    .map(str::trim_start)
    .unwrap_or(fragment)
}
