//! Prompt templates and variable binding.
//!
//! Rendering is literal `{{KEY}}` substitution; unresolved keys pass
//! through unchanged so a template can carry placeholders that only apply
//! in later rounds. Templates can be overridden from a directory using the
//! same file layout the builtin set mirrors:
//!
//! ```text
//! system.txt
//! model_a/round1_opening.txt .. round4_closing.txt
//! model_b/round1_opening.txt .. round4_closing.txt
//! judge/judge_evaluation.txt
//! ```

use std::path::Path;

use anyhow::{Context, Result};

use adjudication::Side;

/// Fixed round sequence of every debate.
pub const ROUND_SLUGS: [&str; 4] = ["opening", "rebuttal", "assumptions", "closing"];

/// System message for every judge conversation.
pub const JUDGE_SYSTEM_PROMPT: &str = "You are a neutral debate judge.";

/// Shared debater system prompt, prepended once to each thread.
pub const SYSTEM: &str = "\
You are a skilled competitive debater taking part in a structured \
four-round debate: opening, rebuttal, assumptions, closing. Argue the \
position you are assigned as persuasively as you can. Stay on the motion, \
engage your opponent's strongest points directly, and keep each answer \
under 600 words.";

const ROUND1_A: &str = "\
The motion is: {{TOPIC}}

Debate conditions: {{CONDITIONS}}

You argue FOR the motion (the proposition). Deliver your opening \
statement: present your two or three strongest arguments, each backed by \
concrete evidence or examples.";

const ROUND2_A: &str = "\
Your opponent's opening statement was:

{{MODEL_B_ROUND_1}}

Deliver your rebuttal. Take their strongest argument apart first, then \
address the rest. Do not introduce entirely new lines of argument; \
reinforce your opening where it was attacked implicitly.";

const ROUND3_A: &str = "\
Your opponent's rebuttal was:

{{MODEL_B_ROUND_2}}

This round is about assumptions. Expose the unstated assumptions your \
opponent's case rests on and explain why they are fragile. Then name the \
assumptions behind your own case and defend them explicitly.";

const ROUND4_A: &str = "\
Your opponent argued in the previous round:

{{MODEL_B_ROUND_3}}

Deliver your closing statement. Weigh the debate as a whole: what \
survived of each side's case, and why the motion should carry. No new \
arguments or evidence.";

const ROUND1_B: &str = "\
The motion is: {{TOPIC}}

Debate conditions: {{CONDITIONS}}

You argue AGAINST the motion (the opposition). Deliver your opening \
statement: present your two or three strongest arguments, each backed by \
concrete evidence or examples.";

const ROUND2_B: &str = "\
Your opponent's opening statement was:

{{MODEL_A_ROUND_1}}

Deliver your rebuttal. Take their strongest argument apart first, then \
address the rest. Do not introduce entirely new lines of argument; \
reinforce your opening where it was attacked implicitly.";

const ROUND3_B: &str = "\
Your opponent's rebuttal was:

{{MODEL_A_ROUND_2}}

This round is about assumptions. Expose the unstated assumptions your \
opponent's case rests on and explain why they are fragile. Then name the \
assumptions behind your own case and defend them explicitly.";

const ROUND4_B: &str = "\
Your opponent argued in the previous round:

{{MODEL_A_ROUND_3}}

Deliver your closing statement. Weigh the debate as a whole: what \
survived of each side's case, and why the motion should fall. No new \
arguments or evidence.";

const JUDGE_EVALUATION: &str = "\
You are judging a completed four-round debate (opening, rebuttal, \
assumptions, closing).

Motion: {{TOPIC}}
Conditions: {{CONDITIONS}}

Side A transcript:
{{SIDE_A_TEXT}}

Side B transcript:
{{SIDE_B_TEXT}}

Score each side from 0 to 5 on each criterion: logic, evidence, \
rebuttal, clarity. Then pick the overall winner.

Respond with ONLY a JSON object in exactly this shape:
{
  \"winner\": \"Side A\" or \"Side B\",
  \"total_score_A\": <number>,
  \"total_score_B\": <number>,
  \"detailed_scores_A\": {\"logic\": <n>, \"evidence\": <n>, \"rebuttal\": <n>, \"clarity\": <n>},
  \"detailed_scores_B\": {\"logic\": <n>, \"evidence\": <n>, \"rebuttal\": <n>, \"clarity\": <n>},
  \"reasoning\": \"why the winner won\",
  \"general\": \"one-paragraph summary of the debate\"
}";

/// Render a template by literal `{{KEY}}` substitution.
pub fn render(template: &str, vars: &[(String, String)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{key}}}}}"), value);
    }
    result
}

/// Variables binding the opponent's previous round into a round template.
///
/// Round 1 has no opponent context; round `i` binds the opponent's round
/// `i - 1` under `{label}_ROUND_{i-1}`. Injection is always exactly one
/// round behind.
pub fn opponent_variables(
    round: u32,
    opponent_history: &[String],
    opponent_label: &str,
) -> Vec<(String, String)> {
    if round <= 1 {
        return Vec::new();
    }
    let target = (round - 2) as usize;
    match opponent_history.get(target) {
        Some(content) => vec![(
            format!("{opponent_label}_ROUND_{}", round - 1),
            content.clone(),
        )],
        None => Vec::new(),
    }
}

/// The full template set for one debate.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    pub system: String,
    rounds_a: [String; 4],
    rounds_b: [String; 4],
    pub judge: String,
}

impl PromptLibrary {
    /// The embedded default templates.
    pub fn builtin() -> Self {
        let own = |s: &str| s.to_string();
        Self {
            system: own(SYSTEM),
            rounds_a: [own(ROUND1_A), own(ROUND2_A), own(ROUND3_A), own(ROUND4_A)],
            rounds_b: [own(ROUND1_B), own(ROUND2_B), own(ROUND3_B), own(ROUND4_B)],
            judge: own(JUDGE_EVALUATION),
        }
    }

    /// Read a template set from a directory in the documented layout.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read = |rel: String| -> Result<String> {
            let path = dir.join(&rel);
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read prompt template {}", path.display()))
        };

        let round_file = |side: &str, i: usize| -> String {
            format!("{side}/round{}_{}.txt", i + 1, ROUND_SLUGS[i])
        };

        Ok(Self {
            system: read("system.txt".to_string())?,
            rounds_a: [
                read(round_file("model_a", 0))?,
                read(round_file("model_a", 1))?,
                read(round_file("model_a", 2))?,
                read(round_file("model_a", 3))?,
            ],
            rounds_b: [
                read(round_file("model_b", 0))?,
                read(round_file("model_b", 1))?,
                read(round_file("model_b", 2))?,
                read(round_file("model_b", 3))?,
            ],
            judge: read("judge/judge_evaluation.txt".to_string())?,
        })
    }

    /// Directory templates when configured, builtin otherwise.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Self::from_dir(dir),
            None => Ok(Self::builtin()),
        }
    }

    /// Template for one side's round (1-indexed).
    pub fn round_template(&self, side: Side, round: u32) -> &str {
        let index = (round.clamp(1, 4) - 1) as usize;
        match side {
            Side::A => &self.rounds_a[index],
            Side::B => &self.rounds_b[index],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_keys() {
        let out = render(
            "Motion: {{TOPIC}} ({{CONDITIONS}})",
            &vars(&[("TOPIC", "X"), ("CONDITIONS", "none")]),
        );
        assert_eq!(out, "Motion: X (none)");
    }

    #[test]
    fn test_render_leaves_unresolved_keys() {
        let out = render("{{TOPIC}} vs {{UNKNOWN}}", &vars(&[("TOPIC", "X")]));
        assert_eq!(out, "X vs {{UNKNOWN}}");
    }

    #[test]
    fn test_opponent_variables_round_one_empty() {
        let history = vec!["opening".to_string()];
        assert!(opponent_variables(1, &history, "MODEL_B").is_empty());
    }

    #[test]
    fn test_opponent_variables_one_round_behind() {
        let history = vec!["their opening".to_string(), "their rebuttal".to_string()];

        let round2 = opponent_variables(2, &history, "MODEL_B");
        assert_eq!(
            round2,
            vec![("MODEL_B_ROUND_1".to_string(), "their opening".to_string())]
        );

        let round3 = opponent_variables(3, &history, "MODEL_A");
        assert_eq!(
            round3,
            vec![("MODEL_A_ROUND_2".to_string(), "their rebuttal".to_string())]
        );
    }

    #[test]
    fn test_opponent_variables_missing_round_empty() {
        assert!(opponent_variables(3, &["only one".to_string()], "MODEL_B").is_empty());
    }

    #[test]
    fn test_builtin_round_templates_reference_opponent() {
        let lib = PromptLibrary::builtin();
        assert!(lib.round_template(Side::A, 1).contains("{{TOPIC}}"));
        assert!(lib
            .round_template(Side::A, 2)
            .contains("{{MODEL_B_ROUND_1}}"));
        assert!(lib
            .round_template(Side::B, 4)
            .contains("{{MODEL_A_ROUND_3}}"));
        assert!(lib.judge.contains("{{SIDE_A_TEXT}}"));
        assert!(lib.judge.contains("{{SIDE_B_TEXT}}"));
    }

    #[test]
    fn test_from_dir_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("model_a")).unwrap();
        std::fs::create_dir_all(root.join("model_b")).unwrap();
        std::fs::create_dir_all(root.join("judge")).unwrap();

        std::fs::write(root.join("system.txt"), "custom system").unwrap();
        for (side, label) in [("model_a", "A"), ("model_b", "B")] {
            for (i, slug) in ROUND_SLUGS.iter().enumerate() {
                std::fs::write(
                    root.join(format!("{side}/round{}_{}.txt", i + 1, slug)),
                    format!("{label} round {}", i + 1),
                )
                .unwrap();
            }
        }
        std::fs::write(root.join("judge/judge_evaluation.txt"), "judge {{TOPIC}}").unwrap();

        let lib = PromptLibrary::from_dir(root).unwrap();
        assert_eq!(lib.system, "custom system");
        assert_eq!(lib.round_template(Side::B, 3), "B round 3");
        assert_eq!(lib.judge, "judge {{TOPIC}}");
    }

    #[test]
    fn test_from_dir_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PromptLibrary::from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("system.txt"));
    }

    #[test]
    fn test_load_without_dir_uses_builtin() {
        let lib = PromptLibrary::load(None).unwrap();
        assert_eq!(lib.system, PromptLibrary::builtin().system);
    }
}
