//! Token and cost accounting across debater and judge calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::RoundEntry;
use crate::side::Side;

/// Usage counters for a single backend call, or a sum of them.
///
/// Derived from the raw usage payload a backend may or may not return;
/// every accessor fails soft to zero, so an absent payload never aborts a
/// debate that already paid for its tokens.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UsageStats {
    pub cost_usd: f64,
    pub completion_tokens: u64,
    pub prompt_tokens: u64,
    pub total_tokens: u64,
    pub reasoning_tokens: u64,
}

impl UsageStats {
    /// Extract counters from a raw usage payload.
    ///
    /// Cost prefers `total_cost` and falls back to `cost`. Missing payload,
    /// missing fields, or non-numeric values all become zero.
    pub fn from_raw(raw: Option<&Value>) -> Self {
        let Some(Value::Object(map)) = raw else {
            return Self::default();
        };

        let cost_usd = map
            .get("total_cost")
            .and_then(Value::as_f64)
            .or_else(|| map.get("cost").and_then(Value::as_f64))
            .unwrap_or(0.0);

        let count = |key: &str| map.get(key).and_then(Value::as_u64).unwrap_or(0);

        Self {
            cost_usd,
            completion_tokens: count("completion_tokens"),
            prompt_tokens: count("prompt_tokens"),
            total_tokens: count("total_tokens"),
            reasoning_tokens: count("reasoning_tokens"),
        }
    }
}

impl std::ops::Add for UsageStats {
    type Output = UsageStats;

    fn add(self, rhs: UsageStats) -> UsageStats {
        UsageStats {
            cost_usd: self.cost_usd + rhs.cost_usd,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
            reasoning_tokens: self.reasoning_tokens + rhs.reasoning_tokens,
        }
    }
}

impl std::ops::AddAssign for UsageStats {
    fn add_assign(&mut self, rhs: UsageStats) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for UsageStats {
    fn sum<I: Iterator<Item = UsageStats>>(iter: I) -> UsageStats {
        iter.fold(UsageStats::default(), |acc, u| acc + u)
    }
}

/// Per-debater subtotals over the round log, in (side A, side B) order.
///
/// Consumed by the report renderer; the core only ever uses the run total.
pub fn per_side_totals(rounds: &[RoundEntry]) -> (UsageStats, UsageStats) {
    let mut a = UsageStats::default();
    let mut b = UsageStats::default();
    for round in rounds {
        match round.side {
            Side::A => a += round.usage,
            Side::B => b += round.usage,
        }
    }
    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_raw_missing_payload() {
        assert_eq!(UsageStats::from_raw(None), UsageStats::default());
        assert_eq!(
            UsageStats::from_raw(Some(&Value::Null)),
            UsageStats::default()
        );
    }

    #[test]
    fn test_from_raw_full_payload() {
        let raw = json!({
            "total_cost": 0.25,
            "completion_tokens": 120,
            "prompt_tokens": 300,
            "total_tokens": 420,
            "reasoning_tokens": 40,
        });
        let usage = UsageStats::from_raw(Some(&raw));
        assert_eq!(usage.cost_usd, 0.25);
        assert_eq!(usage.completion_tokens, 120);
        assert_eq!(usage.prompt_tokens, 300);
        assert_eq!(usage.total_tokens, 420);
        assert_eq!(usage.reasoning_tokens, 40);
    }

    #[test]
    fn test_from_raw_cost_fallback() {
        let raw = json!({"cost": 0.1, "total_tokens": 7});
        let usage = UsageStats::from_raw(Some(&raw));
        assert_eq!(usage.cost_usd, 0.1);
        assert_eq!(usage.total_tokens, 7);
        assert_eq!(usage.completion_tokens, 0);

        // total_cost wins over cost when both are present
        let raw = json!({"total_cost": 0.2, "cost": 0.1});
        assert_eq!(UsageStats::from_raw(Some(&raw)).cost_usd, 0.2);
    }

    #[test]
    fn test_from_raw_null_and_garbage_fields() {
        let raw = json!({
            "total_cost": null,
            "cost": "free",
            "completion_tokens": "many",
            "prompt_tokens": null,
        });
        assert_eq!(UsageStats::from_raw(Some(&raw)), UsageStats::default());
    }

    #[test]
    fn test_sum_is_order_independent() {
        let parts = [
            UsageStats {
                cost_usd: 0.1,
                completion_tokens: 10,
                prompt_tokens: 20,
                total_tokens: 30,
                reasoning_tokens: 1,
            },
            UsageStats {
                cost_usd: 0.2,
                completion_tokens: 5,
                prompt_tokens: 2,
                total_tokens: 7,
                reasoning_tokens: 0,
            },
            UsageStats {
                cost_usd: 0.0,
                completion_tokens: 0,
                prompt_tokens: 0,
                total_tokens: 0,
                reasoning_tokens: 9,
            },
        ];

        let forward: UsageStats = parts.iter().copied().sum();
        let backward: UsageStats = parts.iter().rev().copied().sum();
        assert_eq!(forward, backward);
        assert_eq!(forward.total_tokens, 37);
        assert_eq!(forward.reasoning_tokens, 10);
        assert!((forward.cost_usd - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_per_side_totals() {
        let rounds = vec![
            RoundEntry {
                id: 1,
                side: Side::A,
                prompt: String::new(),
                content: String::new(),
                usage: UsageStats {
                    total_tokens: 10,
                    ..Default::default()
                },
                duration_seconds: 0.0,
            },
            RoundEntry {
                id: 1,
                side: Side::B,
                prompt: String::new(),
                content: String::new(),
                usage: UsageStats {
                    total_tokens: 4,
                    ..Default::default()
                },
                duration_seconds: 0.0,
            },
            RoundEntry {
                id: 2,
                side: Side::A,
                prompt: String::new(),
                content: String::new(),
                usage: UsageStats {
                    total_tokens: 6,
                    ..Default::default()
                },
                duration_seconds: 0.0,
            },
        ];

        let (a, b) = per_side_totals(&rounds);
        assert_eq!(a.total_tokens, 16);
        assert_eq!(b.total_tokens, 4);
    }
}
