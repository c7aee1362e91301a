//! Winner aggregation across jury verdicts.

use serde::{Deserialize, Serialize};

use crate::side::Side;
use crate::verdict::ParsedVerdict;

/// Vote counts keyed by true-side label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerCounts {
    #[serde(rename = "Side A")]
    pub side_a: usize,
    #[serde(rename = "Side B")]
    pub side_b: usize,
}

/// Aggregated jury decision for one debate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    pub counts: WinnerCounts,
    /// Final winner label, or empty when no verdict carried a winner.
    pub winner: String,
    /// Reasoning from the first verdict agreeing with the final winner.
    pub winning_reason: String,
    /// Summary from the same verdict.
    pub general: String,
}

/// Combine normalized verdicts into a majority decision.
///
/// Only verdicts with a non-empty winner participate. Side A wins ties.
/// Representative text comes from the first verdict, in judge order, whose
/// winner matches the final winner.
pub fn tally(verdicts: &[ParsedVerdict]) -> Tally {
    let winners: Vec<&str> = verdicts
        .iter()
        .filter_map(|v| v.winner.as_deref())
        .filter(|label| !label.is_empty())
        .collect();

    let counts = WinnerCounts {
        side_a: winners.iter().filter(|w| **w == Side::A.label()).count(),
        side_b: winners.iter().filter(|w| **w == Side::B.label()).count(),
    };

    if winners.is_empty() {
        return Tally {
            counts,
            ..Default::default()
        };
    }

    let winner = if counts.side_a >= counts.side_b {
        Side::A.label().to_string()
    } else {
        Side::B.label().to_string()
    };

    let mut winning_reason = String::new();
    let mut general = String::new();
    if let Some(source) = verdicts
        .iter()
        .find(|v| v.winner.as_deref() == Some(winner.as_str()))
    {
        winning_reason = source.reasoning.clone().unwrap_or_default();
        general = source.general.clone().unwrap_or_default();
    }

    Tally {
        counts,
        winner,
        winning_reason,
        general,
    }
}
