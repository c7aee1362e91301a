//! Jury evaluation engine.
//!
//! Each configured judge sees the two finished transcripts (optionally
//! blinded), returns free text, and goes through the adjudication pipeline:
//! parse → deblind → validate. A judge that fails its backend call or
//! returns an unusable verdict is excluded and logged; the run continues.
//! Usage is counted for every judge that answered, accepted or not.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use adjudication::{parse_verdict, JudgeRecord, ParsedVerdict, SideMap, UsageStats};

use crate::backend::{ChatBackend, ChatMessage};
use crate::config::EndpointConfig;
use crate::prompts::{render, PromptLibrary, JUDGE_SYSTEM_PROMPT};

/// Everything the jury phase hands back to the orchestrator.
#[derive(Debug, Default)]
pub struct JuryReport {
    /// Accepted judge calls, in configured judge order.
    pub juries: Vec<JudgeRecord>,
    /// Normalized verdicts, parallel to `juries`.
    pub verdicts: Vec<ParsedVerdict>,
    /// Usage across all judge calls, including rejected ones.
    pub usage: UsageStats,
}

/// Merge one debater's round contents into a single labeled transcript.
pub fn merge_rounds(history: &[String]) -> String {
    history
        .iter()
        .enumerate()
        .map(|(i, content)| format!("Round {}:\n{}", i + 1, content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Run every configured judge over the finished histories.
///
/// Judges execute concurrently but results are collected in configured
/// order, which keeps first-matching-judge resolution deterministic.
pub async fn evaluate_all(
    judges: &[(EndpointConfig, Arc<dyn ChatBackend>)],
    prompts: &PromptLibrary,
    topic: &str,
    conditions: &str,
    history_a: &[String],
    history_b: &[String],
    blind: bool,
) -> JuryReport {
    let side_map = SideMap::for_blind(blind);
    let mut side_a_text = merge_rounds(history_a);
    let mut side_b_text = merge_rounds(history_b);
    if blind {
        std::mem::swap(&mut side_a_text, &mut side_b_text);
    }

    let rendered_prompt = render(
        &prompts.judge,
        &[
            ("TOPIC".to_string(), topic.to_string()),
            ("CONDITIONS".to_string(), conditions.to_string()),
            ("SIDE_A_TEXT".to_string(), side_a_text),
            ("SIDE_B_TEXT".to_string(), side_b_text),
        ],
    );

    let calls = judges.iter().map(|(config, backend)| {
        evaluate_one(config, Arc::clone(backend), &rendered_prompt, side_map, blind)
    });
    let outcomes = join_all(calls).await;

    let mut report = JuryReport::default();
    for outcome in outcomes {
        report.usage += outcome.usage;
        if let Some((record, verdict)) = outcome.accepted {
            report.juries.push(record);
            report.verdicts.push(verdict);
        }
    }
    report
}

struct JudgeOutcome {
    usage: UsageStats,
    accepted: Option<(JudgeRecord, ParsedVerdict)>,
}

async fn evaluate_one(
    config: &EndpointConfig,
    backend: Arc<dyn ChatBackend>,
    rendered_prompt: &str,
    side_map: SideMap,
    blind: bool,
) -> JudgeOutcome {
    info!(model = %config.model, blind, "running jury evaluation");

    let messages = [
        ChatMessage::system(JUDGE_SYSTEM_PROMPT),
        ChatMessage::user(rendered_prompt),
    ];

    let outcome = match backend.complete(&config.model, &messages).await {
        Ok(outcome) => outcome,
        Err(error) => {
            warn!(model = %config.model, %error, "judge call failed — excluded from aggregation");
            return JudgeOutcome {
                usage: UsageStats::default(),
                accepted: None,
            };
        }
    };

    let usage = UsageStats::from_raw(outcome.usage.as_ref());
    let raw_text = outcome.content.unwrap_or_default();

    let verdict = parse_verdict(&raw_text)
        .into_parsed()
        .map(|v| v.deblind(side_map));

    let accepted = match verdict {
        Some(verdict) if verdict.is_valid() => {
            let record = JudgeRecord {
                model: config.model.clone(),
                prompt: rendered_prompt.to_string(),
                content: raw_text,
                usage,
                blind,
                side_map,
            };
            Some((record, verdict))
        }
        _ => {
            warn!(model = %config.model, "skipping invalid jury output");
            None
        }
    };

    JudgeOutcome { usage, accepted }
}
