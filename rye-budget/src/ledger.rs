//! Per-thread budget accounting and escalation (spec §4.G).

use std::time::{Duration, Instant};

use rust_decimal::Decimal;

use crate::rate::{in_rate, out_rate};

/// Resolved per-thread limits (directive defaults plus optional
/// invoker overrides), already flattened to concrete values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedLimits {
    /// Max LLM turns.
    pub turns: Option<u32>,
    /// Max total tokens, own usage plus cascaded child usage.
    pub tokens: Option<u64>,
    /// Max total spend in USD, own usage plus cascaded child spend.
    pub spend: Option<Decimal>,
    /// Max wall-clock duration.
    pub duration: Option<Duration>,
}

/// Why a ledger escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationReason {
    /// `turns_used >= limits.turns`.
    Turns,
    /// Total tokens (own + cascaded) reached the limit.
    Tokens,
    /// Total spend (own + cascaded) reached the limit.
    Spend,
    /// Wall-clock duration limit reached.
    Duration,
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EscalationReason::Turns => "turn limit reached",
            EscalationReason::Tokens => "token limit reached",
            EscalationReason::Spend => "spend limit reached",
            EscalationReason::Duration => "duration limit reached",
        };
        f.write_str(s)
    }
}

/// A completed child thread's contribution to its parent's ledger (spec
/// §4.G cost cascade).
#[derive(Debug, Clone, Copy)]
pub struct CostDelta {
    /// Spend to add to the parent's cascaded total.
    pub spend_delta: Decimal,
    /// Tokens to add to the parent's cascaded total.
    pub tokens_delta: u64,
}

/// Per-thread turn/token/spend/duration accounting.
pub struct BudgetLedger {
    limits: ResolvedLimits,
    turns_used: u32,
    tokens_used: u64,
    spend_used: Decimal,
    wall_start: Instant,
    cascaded_spend: Decimal,
    cascaded_tokens: u64,
}

impl BudgetLedger {
    /// Start a fresh ledger against `limits`.
    pub fn new(limits: ResolvedLimits) -> Self {
        Self {
            limits,
            turns_used: 0,
            tokens_used: 0,
            spend_used: Decimal::ZERO,
            wall_start: Instant::now(),
            cascaded_spend: Decimal::ZERO,
            cascaded_tokens: 0,
        }
    }

    /// Record one completed LLM turn: tokens, derived cost, and the turn
    /// count.
    pub fn debit_turn(&mut self, model_tier: &str, prompt_tokens: u64, completion_tokens: u64) {
        self.tokens_used += prompt_tokens + completion_tokens;
        let cost = Decimal::from(prompt_tokens) * in_rate(model_tier)
            + Decimal::from(completion_tokens) * out_rate(model_tier);
        self.spend_used += cost;
        self.turns_used += 1;
    }

    /// Apply a completed child thread's cascaded cost.
    pub fn apply_child_delta(&mut self, delta: CostDelta) {
        self.cascaded_spend += delta.spend_delta;
        self.cascaded_tokens += delta.tokens_delta;
    }

    /// This thread's own spend, excluding cascaded children.
    pub fn own_spend(&self) -> Decimal {
        self.spend_used
    }

    /// Own spend plus every completed descendant's cascaded spend.
    pub fn total_spend(&self) -> Decimal {
        self.spend_used + self.cascaded_spend
    }

    /// Own tokens plus cascaded descendant tokens.
    pub fn total_tokens(&self) -> u64 {
        self.tokens_used + self.cascaded_tokens
    }

    /// Turns debited so far.
    pub fn turns_used(&self) -> u32 {
        self.turns_used
    }

    /// The delta this thread should cascade to its own parent, once
    /// terminal.
    pub fn as_cost_delta(&self) -> CostDelta {
        CostDelta {
            spend_delta: self.total_spend(),
            tokens_delta: self.total_tokens(),
        }
    }

    /// Check every limit; the first one that's been reached escalates.
    pub fn check_escalation(&self) -> Option<EscalationReason> {
        if let Some(turns) = self.limits.turns {
            if self.turns_used >= turns {
                return Some(EscalationReason::Turns);
            }
        }
        if let Some(tokens) = self.limits.tokens {
            if self.total_tokens() >= tokens {
                return Some(EscalationReason::Tokens);
            }
        }
        if let Some(spend) = self.limits.spend {
            if self.total_spend() >= spend {
                return Some(EscalationReason::Spend);
            }
        }
        if let Some(duration) = self.limits.duration {
            if self.wall_start.elapsed() >= duration {
                return Some(EscalationReason::Duration);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn turn_limit_escalates_after_exactly_n_turns() {
        let mut ledger = BudgetLedger::new(ResolvedLimits {
            turns: Some(2),
            ..Default::default()
        });
        assert!(ledger.check_escalation().is_none());
        ledger.debit_turn("fast", 100, 50);
        assert!(ledger.check_escalation().is_none());
        ledger.debit_turn("fast", 100, 50);
        assert_eq!(ledger.check_escalation(), Some(EscalationReason::Turns));
    }

    #[test]
    fn spend_limit_escalates_on_first_turn_that_reaches_it() {
        let mut ledger = BudgetLedger::new(ResolvedLimits {
            spend: Some(Decimal::from_str("0.0001").unwrap()),
            ..Default::default()
        });
        ledger.debit_turn("frontier", 100, 100);
        assert_eq!(ledger.check_escalation(), Some(EscalationReason::Spend));
    }

    #[test]
    fn cascaded_child_spend_counts_toward_parent_limit() {
        let mut parent = BudgetLedger::new(ResolvedLimits {
            spend: Some(Decimal::from_str("0.50").unwrap()),
            ..Default::default()
        });
        parent.debit_turn("standard", 1000, 1000); // small own cost
        assert!(parent.check_escalation().is_none());

        parent.apply_child_delta(CostDelta {
            spend_delta: Decimal::from_str("0.49").unwrap(),
            tokens_delta: 10,
        });
        assert_eq!(parent.total_spend(), parent.own_spend() + Decimal::from_str("0.49").unwrap());
    }

    #[test]
    fn zero_duration_limit_escalates_immediately() {
        let ledger = BudgetLedger::new(ResolvedLimits {
            duration: Some(Duration::from_secs(0)),
            ..Default::default()
        });
        assert_eq!(ledger.check_escalation(), Some(EscalationReason::Duration));
    }
}
