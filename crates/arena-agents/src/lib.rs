//! Debate arena agents — backend clients, prompt rendering, and the
//! four-round orchestration loop.
//!
//! The pure evaluation logic (blinding, verdicts, tallies, records) lives
//! in the `adjudication` crate; this crate owns everything that touches a
//! backend: configuration, chat clients, prompts, and the run loop.

pub mod backend;
pub mod config;
pub mod jury;
pub mod orchestrator;
pub mod prompts;

pub use backend::{ChatBackend, ChatMessage, ChatOutcome, ChatRole, ClientPool, OpenAiClient};
pub use config::{ArenaConfig, BackendKind, ConfigError, EndpointConfig};
pub use orchestrator::Arena;
pub use prompts::PromptLibrary;
