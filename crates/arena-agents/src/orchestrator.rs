//! Round orchestration — drives the four-round exchange end to end.
//!
//! The exchange is strictly sequential: round *i* side A completes before
//! round *i* side B starts, and both before round *i + 1*. Each side's next
//! prompt depends on the other side's most recent output, so there is no
//! parallelism to exploit, and a single call failure identifies exactly one
//! (round, side) pair.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::time::sleep;
use tracing::info;

use adjudication::{
    tally, DebateOutcome, DebateRecord, Evaluation, IdGenerator, RoundEntry, Side, UsageStats,
};

use crate::backend::{ChatBackend, ChatMessage, ClientPool};
use crate::config::{ArenaConfig, EndpointConfig};
use crate::jury;
use crate::prompts::{opponent_variables, render, PromptLibrary, ROUND_SLUGS};

/// Placeholder prefix under which a debater sees its opponent's rounds.
fn opponent_label(side: Side) -> &'static str {
    match side {
        Side::A => "MODEL_B",
        Side::B => "MODEL_A",
    }
}

/// One debater's running conversation thread and round history.
///
/// Owned exclusively by the arena for the duration of a run; never shared
/// between debaters.
struct DebaterThread {
    side: Side,
    model: String,
    backend: Arc<dyn ChatBackend>,
    messages: Vec<ChatMessage>,
    /// Raw content of completed rounds, one entry per round.
    history: Vec<String>,
}

impl DebaterThread {
    fn new(side: Side, model: String, backend: Arc<dyn ChatBackend>, system_prompt: &str) -> Self {
        Self {
            side,
            model,
            backend,
            messages: vec![ChatMessage::system(system_prompt)],
            history: Vec::new(),
        }
    }

    /// Render the round prompt, call the backend, and record the reply.
    ///
    /// A failure here is fatal to the whole run.
    async fn play_round(
        &mut self,
        round: u32,
        template: &str,
        topic: &str,
        conditions: &str,
        opponent_history: &[String],
    ) -> Result<RoundEntry> {
        let mut vars = vec![
            ("TOPIC".to_string(), topic.to_string()),
            ("CONDITIONS".to_string(), conditions.to_string()),
        ];
        vars.extend(opponent_variables(
            round,
            opponent_history,
            opponent_label(self.side),
        ));
        let prompt = render(template, &vars);
        self.messages.push(ChatMessage::user(prompt.clone()));

        info!(side = %self.side, round, model = %self.model, "calling debater");
        let started = Instant::now();
        let outcome = self
            .backend
            .complete(&self.model, &self.messages)
            .await
            .with_context(|| format!("debater {} failed in round {}", self.side, round))?;
        let duration_seconds = started.elapsed().as_secs_f64();
        info!(side = %self.side, round, "debater completed round");

        let usage = UsageStats::from_raw(outcome.usage.as_ref());
        let content = outcome.content.unwrap_or_default();
        self.messages.push(ChatMessage::assistant(content.clone()));
        self.history.push(content.clone());

        Ok(RoundEntry {
            id: round,
            side: self.side,
            prompt,
            content,
            usage,
            duration_seconds,
        })
    }
}

/// The debate arena: two debater threads, a jury, and the record builder.
pub struct Arena {
    config: ArenaConfig,
    prompts: PromptLibrary,
    backend_a: Arc<dyn ChatBackend>,
    backend_b: Arc<dyn ChatBackend>,
    judges: Vec<(EndpointConfig, Arc<dyn ChatBackend>)>,
    ids: IdGenerator,
}

impl Arena {
    /// Wire an arena from resolved config and a shared client pool.
    pub fn new(config: ArenaConfig, prompts: PromptLibrary, pool: &ClientPool) -> Result<Self> {
        let backend_a = pool
            .backend_for(&config.debater_a)
            .context("no client for debater A endpoint")?;
        let backend_b = pool
            .backend_for(&config.debater_b)
            .context("no client for debater B endpoint")?;
        let judges = config
            .judges
            .iter()
            .map(|judge| {
                pool.backend_for(judge)
                    .map(|backend| (judge.clone(), backend))
                    .with_context(|| format!("no client for judge endpoint {}", judge.model))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            prompts,
            backend_a,
            backend_b,
            judges,
            ids: IdGenerator::new(),
        })
    }

    /// Wire an arena with explicit backends (the test seam). Judge backends
    /// pair up with `config.judges` in order.
    pub fn with_backends(
        config: ArenaConfig,
        prompts: PromptLibrary,
        backend_a: Arc<dyn ChatBackend>,
        backend_b: Arc<dyn ChatBackend>,
        judge_backends: Vec<Arc<dyn ChatBackend>>,
    ) -> Self {
        let judges = config
            .judges
            .iter()
            .cloned()
            .zip(judge_backends)
            .collect();
        Self {
            config,
            prompts,
            backend_a,
            backend_b,
            judges,
            ids: IdGenerator::new(),
        }
    }

    /// Run the full debate and build its record.
    ///
    /// The record is returned, not persisted; the caller owns the append.
    pub async fn run(&mut self) -> Result<DebateRecord> {
        let started = Instant::now();
        info!(topic = %self.config.topic, "debate started");
        info!(
            a = %self.config.debater_a.model,
            b = %self.config.debater_b.model,
            judges = %self
                .judges
                .iter()
                .map(|(j, _)| j.model.as_str())
                .collect::<Vec<_>>()
                .join(","),
            "participants"
        );

        let mut debater_a = DebaterThread::new(
            Side::A,
            self.config.debater_a.model.clone(),
            Arc::clone(&self.backend_a),
            &self.prompts.system,
        );
        let mut debater_b = DebaterThread::new(
            Side::B,
            self.config.debater_b.model.clone(),
            Arc::clone(&self.backend_b),
            &self.prompts.system,
        );

        let mut rounds = Vec::with_capacity(8);
        let mut totals = UsageStats::default();

        for round in 1..=4u32 {
            info!(round, name = ROUND_SLUGS[(round - 1) as usize], "round started");

            let entry = debater_a
                .play_round(
                    round,
                    self.prompts.round_template(Side::A, round),
                    &self.config.topic,
                    &self.config.conditions,
                    &debater_b.history,
                )
                .await?;
            totals += entry.usage;
            rounds.push(entry);
            sleep(self.config.round_pause).await;

            let entry = debater_b
                .play_round(
                    round,
                    self.prompts.round_template(Side::B, round),
                    &self.config.topic,
                    &self.config.conditions,
                    &debater_a.history,
                )
                .await?;
            totals += entry.usage;
            rounds.push(entry);
            sleep(self.config.round_pause).await;
        }

        let report = jury::evaluate_all(
            &self.judges,
            &self.prompts,
            &self.config.topic,
            &self.config.conditions,
            &debater_a.history,
            &debater_b.history,
            self.config.blind_jury,
        )
        .await;
        totals += report.usage;

        let decision = tally(&report.verdicts);
        info!(
            valid_verdicts = report.verdicts.len(),
            winner = %decision.winner,
            "jury evaluation complete"
        );

        let record = DebateRecord {
            id: self.ids.mint(),
            topic: self.config.topic.clone(),
            conditions: self.config.conditions.clone(),
            lang: self.config.lang.clone(),
            proposition: self.config.debater_a.model.clone(),
            opposition: self.config.debater_b.model.clone(),
            jury: self.judges.iter().map(|(j, _)| j.model.clone()).collect(),
            rounds,
            evaluation: Evaluation {
                juries: report.juries,
                parsed: report.verdicts,
                winner_counts: decision.counts,
            },
            result: DebateOutcome {
                general: decision.general,
                winner: decision.winner,
                winning_reason: decision.winning_reason,
            },
            totals,
            total_duration_seconds: started.elapsed().as_secs_f64(),
            created_at: Utc::now(),
        };

        info!(id = %record.id, winner = %record.result.winner, "debate finished");
        Ok(record)
    }
}
