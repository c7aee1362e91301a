//! The durable debate record and its id generator.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::side::{Side, SideMap};
use crate::tally::WinnerCounts;
use crate::usage::UsageStats;
use crate::verdict::ParsedVerdict;

/// One debater call: round number, side, rendered prompt, raw reply.
///
/// Immutable once created; a four-round debate emits exactly eight of
/// these in round-major, A-before-B order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundEntry {
    /// Round number, 1 through 4.
    pub id: u32,
    pub side: Side,
    pub prompt: String,
    pub content: String,
    pub usage: UsageStats,
    pub duration_seconds: f64,
}

/// One judge call as it was made: the prompt the judge actually saw
/// (post-blinding) and its raw reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeRecord {
    pub model: String,
    pub prompt: String,
    pub content: String,
    pub usage: UsageStats,
    pub blind: bool,
    pub side_map: SideMap,
}

/// Jury section of the record: accepted judge calls, their normalized
/// verdicts (parallel lists), and the vote counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub juries: Vec<JudgeRecord>,
    pub parsed: Vec<ParsedVerdict>,
    pub winner_counts: WinnerCounts,
}

/// Final outcome block. All fields empty when no judge produced a valid
/// verdict; that is still a successful run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebateOutcome {
    pub general: String,
    pub winner: String,
    pub winning_reason: String,
}

/// The terminal, persisted entity: one line of the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRecord {
    pub id: String,
    pub topic: String,
    pub conditions: String,
    pub lang: String,
    /// Model arguing side A.
    pub proposition: String,
    /// Model arguing side B.
    pub opposition: String,
    pub jury: Vec<String>,
    pub rounds: Vec<RoundEntry>,
    pub evaluation: Evaluation,
    pub result: DebateOutcome,
    pub totals: UsageStats,
    pub total_duration_seconds: f64,
    pub created_at: DateTime<Utc>,
}

/// Alphabet for record ids.
pub const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
/// Record id length in characters.
pub const ID_LENGTH: usize = 16;

/// Mints record ids unique within one process run.
///
/// Collisions are practically impossible at 36^16, but the seen-set retry
/// makes uniqueness a guarantee rather than a probability.
#[derive(Debug, Default)]
pub struct IdGenerator {
    seen: HashSet<String>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a fresh id, retrying until it is unseen in this run.
    pub fn mint(&mut self) -> String {
        loop {
            let id = random_id();
            if self.seen.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Number of ids handed out so far.
    pub fn minted(&self) -> usize {
        self.seen.len()
    }
}

fn random_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
