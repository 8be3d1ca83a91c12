//! Multi-instrument container: one ledger per traded symbol under a profile.

use chrono::FixedOffset;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::LedgerError;
use super::ledger::Ledger;
use super::performance::{self, Performance};
use super::trade::OrderSequence;

/// The trading account / strategy a portfolio belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub account: String,
}

impl Profile {
    pub fn new(name: impl Into<String>, account: impl Into<String>) -> Self {
        Profile {
            name: name.into(),
            account: account.into(),
        }
    }
}

#[derive(Debug)]
pub struct Portfolio {
    pub profile: Profile,
    order_group: Vec<Ledger>,
    sequence: Arc<OrderSequence>,
    display_offset: FixedOffset,
}

impl Portfolio {
    pub fn new(profile: Profile) -> Self {
        Self::with_sequence(profile, Arc::new(OrderSequence::new()))
    }

    /// All ledgers added to this portfolio draw order ids from `sequence`.
    pub fn with_sequence(profile: Profile, sequence: Arc<OrderSequence>) -> Self {
        Portfolio {
            profile,
            order_group: Vec::new(),
            sequence,
            display_offset: performance::default_display_offset(),
        }
    }

    pub fn set_display_offset(&mut self, offset: FixedOffset) {
        self.display_offset = offset;
        for ledger in &mut self.order_group {
            ledger.set_display_offset(offset);
        }
    }

    pub fn add_ledger(
        &mut self,
        symbol: &str,
        digits: u32,
        volume: f64,
    ) -> Result<&mut Ledger, LedgerError> {
        if self.ledger(symbol).is_some() {
            return Err(LedgerError::DuplicateSymbol {
                symbol: symbol.to_string(),
            });
        }
        let mut ledger = Ledger::with_sequence(symbol, digits, volume, Arc::clone(&self.sequence));
        ledger.set_display_offset(self.display_offset);
        self.order_group.push(ledger);
        let last = self.order_group.len() - 1;
        Ok(&mut self.order_group[last])
    }

    pub fn ledger(&self, symbol: &str) -> Option<&Ledger> {
        self.order_group.iter().find(|l| l.symbol() == symbol)
    }

    pub fn ledger_mut(&mut self, symbol: &str) -> Option<&mut Ledger> {
        self.order_group.iter_mut().find(|l| l.symbol() == symbol)
    }

    pub fn ledgers(&self) -> &[Ledger] {
        &self.order_group
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.order_group.iter().map(|l| l.symbol()).collect()
    }

    /// Evaluate every ledger; a degenerate ledger does not stop the others.
    pub fn eval_all(&mut self) -> BTreeMap<String, Result<Performance, LedgerError>> {
        self.order_group
            .iter_mut()
            .map(|ledger| {
                let result = ledger.eval_performance().cloned();
                (ledger.symbol().to_string(), result)
            })
            .collect()
    }
}
