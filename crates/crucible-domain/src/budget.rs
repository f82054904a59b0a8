//! State budget module - per-jurisdiction token ledger and credibility

/// Per-jurisdiction economic and credibility ledger
///
/// Token budgets are debited per cycle and credited on survival events; a
/// debit can never take the budget below zero. Credibility is the ratio of
/// survived claims to total claims put through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct StateBudget {
    /// Jurisdiction name (primary key in storage)
    pub state_name: String,

    /// Knowledge domain this state works in
    pub domain: String,

    /// Methodological approach within the domain (e.g. empirical, formal)
    pub domain_type: String,

    /// Remaining token budget; never negative
    pub token_budget: u64,

    /// Name of the rival state in the same domain
    pub rival_name: String,

    /// Cycle at which this ledger row was created
    pub cycle: u32,

    /// Claims that survived judging
    pub claims_survived: u32,

    /// Total claims put through the pipeline
    pub claims_total: u32,
}

impl StateBudget {
    /// Create a fresh ledger for a state with zeroed pipeline counters
    pub fn new(
        state_name: impl Into<String>,
        domain: impl Into<String>,
        domain_type: impl Into<String>,
        token_budget: u64,
        rival_name: impl Into<String>,
        cycle: u32,
    ) -> Self {
        Self {
            state_name: state_name.into(),
            domain: domain.into(),
            domain_type: domain_type.into(),
            token_budget,
            rival_name: rival_name.into(),
            cycle,
            claims_survived: 0,
            claims_total: 0,
        }
    }

    /// Debit the token budget, floored at zero
    ///
    /// Oversized debits clamp rather than error; running out of tokens is a
    /// governance condition, not a fault.
    pub fn debit(&mut self, amount: u64) {
        self.token_budget = self.token_budget.saturating_sub(amount);
    }

    /// Credit the token budget
    pub fn credit(&mut self, amount: u64) {
        self.token_budget = self.token_budget.saturating_add(amount);
    }

    /// Record one pipeline outcome
    pub fn record_outcome(&mut self, survived: bool) {
        self.claims_total += 1;
        if survived {
            self.claims_survived += 1;
        }
    }

    /// Survived-claim ratio; zero while no claims have been recorded
    pub fn credibility(&self) -> f64 {
        if self.claims_total == 0 {
            0.0
        } else {
            f64::from(self.claims_survived) / f64::from(self.claims_total)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> StateBudget {
        StateBudget::new("Axiom", "physics", "empirical", 100, "Rival", 1)
    }

    #[test]
    fn test_debit_floors_at_zero() {
        let mut b = ledger();
        b.debit(30);
        assert_eq!(b.token_budget, 70);
        b.debit(1_000);
        assert_eq!(b.token_budget, 0);
        b.debit(5);
        assert_eq!(b.token_budget, 0);
    }

    #[test]
    fn test_credibility_ratio() {
        let mut b = ledger();
        assert_eq!(b.credibility(), 0.0);

        for survived in [true, true, true, false, false] {
            b.record_outcome(survived);
        }
        assert_eq!(b.claims_survived, 3);
        assert_eq!(b.claims_total, 5);
        assert_eq!(b.credibility(), 0.6);
    }
}
