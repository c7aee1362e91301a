//! Debate Adjudication — Blinding, Verdicts, and Winner Aggregation
//!
//! Pure evaluation logic for two-sided model debates. No network code lives
//! here: the crate takes finished transcripts and raw judge output and turns
//! them into one durable, append-only debate record.
//!
//! # Evaluation Flow
//!
//! ```text
//! transcripts ──► [blind?] ──► judge call (external) ──► raw text
//!                    │                                      │
//!                SideMap                                parse_verdict
//!                    │                                      │
//!                    └───────────► deblind ◄── Parsed ──────┤
//!                                     │         Malformed ──► dropped
//!                                 is_valid?
//!                                     │
//!                          yes ───► tally ───► DebateRecord ───► store
//!                          no  ───► dropped (logged)
//! ```

pub mod record;
pub mod side;
pub mod store;
pub mod tally;
pub mod usage;
pub mod verdict;

pub use record::{DebateOutcome, DebateRecord, Evaluation, IdGenerator, JudgeRecord, RoundEntry};
pub use side::{Side, SideMap};
pub use store::{RecordStore, StoreError};
pub use tally::{tally, Tally, WinnerCounts};
pub use usage::{per_side_totals, UsageStats};
pub use verdict::{parse_verdict, ParsedVerdict, VerdictParse};
