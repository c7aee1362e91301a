//! Judge verdict pipeline: fence stripping, strict parsing, de-blinding,
//! and the validity predicate.
//!
//! Judge output is untrusted text. It goes through `parse_verdict` (tagged
//! result, never an error), then `deblind` back into true-side terms, then
//! `is_valid` before it may enter aggregation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::side::{Side, SideMap};

/// A judge's structured verdict as submitted, field names matching the
/// judge prompt. Score and text fields are optional because judges omit
/// them; validity is decided separately by [`ParsedVerdict::is_valid`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedVerdict {
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(rename = "total_score_A", default)]
    pub total_score_a: Option<f64>,
    #[serde(rename = "total_score_B", default)]
    pub total_score_b: Option<f64>,
    #[serde(rename = "detailed_scores_A", default)]
    pub detailed_scores_a: Option<Value>,
    #[serde(rename = "detailed_scores_B", default)]
    pub detailed_scores_b: Option<Value>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub general: Option<String>,
}

impl ParsedVerdict {
    /// Translate a verdict from presentation space into true-side terms.
    ///
    /// The `winner` label is remapped through the side map; labels that are
    /// neither "Side A" nor "Side B" pass through untouched (they fail
    /// validation downstream). When blinding occurred, the per-side score
    /// fields swap as well. `reasoning` and `general` are narrative text
    /// with no side attached and never change.
    pub fn deblind(mut self, map: SideMap) -> Self {
        self.winner = self.winner.map(|label| match Side::from_label(&label) {
            Some(presented) => map.true_side(presented).label().to_string(),
            None => label,
        });

        if !map.is_identity() {
            std::mem::swap(&mut self.total_score_a, &mut self.total_score_b);
            std::mem::swap(&mut self.detailed_scores_a, &mut self.detailed_scores_b);
        }

        self
    }

    /// Whether this verdict may enter aggregation: a recognized winner
    /// label and both total scores present.
    pub fn is_valid(&self) -> bool {
        let winner_ok = self
            .winner
            .as_deref()
            .and_then(Side::from_label)
            .is_some();
        winner_ok && self.total_score_a.is_some() && self.total_score_b.is_some()
    }
}

/// Outcome of parsing raw judge text.
#[derive(Debug, Clone, PartialEq)]
pub enum VerdictParse {
    /// Structured verdict decoded successfully.
    Parsed(ParsedVerdict),
    /// Empty response or undecodable payload; the judge is dropped.
    Malformed,
}

impl VerdictParse {
    /// The verdict, if one was decoded.
    pub fn into_parsed(self) -> Option<ParsedVerdict> {
        match self {
            Self::Parsed(verdict) => Some(verdict),
            Self::Malformed => None,
        }
    }
}

/// Parse raw judge output into a tagged result. Never panics or errors.
///
/// Strips one optional fenced code block (with an optional `json` language
/// tag) before decoding.
pub fn parse_verdict(raw: &str) -> VerdictParse {
    let cleaned = strip_code_fence(raw);
    if cleaned.is_empty() {
        return VerdictParse::Malformed;
    }
    match serde_json::from_str::<ParsedVerdict>(cleaned) {
        Ok(verdict) => VerdictParse::Parsed(verdict),
        Err(_) => VerdictParse::Malformed,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    let inner = inner.trim_start();
    // Opening fences often carry a language tag
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim()
}
