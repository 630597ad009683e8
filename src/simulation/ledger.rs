//! Per-run fund unit ledger

use std::collections::HashMap;

/// Owned per-run unit balances keyed by scheme code.
///
/// Every simulation run allocates a fresh ledger and mutates only its own;
/// ledgers are never shared across runs or exposed to callers.
#[derive(Debug, Clone, Default)]
pub struct UnitLedger {
    units: HashMap<u32, f64>,
}

impl UnitLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Purchase units for `amount` at `nav`; returns the units credited
    pub fn credit(&mut self, scheme_code: u32, amount: f64, nav: f64) -> f64 {
        let units = amount / nav;
        *self.units.entry(scheme_code).or_insert(0.0) += units;
        units
    }

    /// Redeem units worth `amount` at `nav`; returns the units debited.
    /// Strategy plans never redeem beyond a fund's value, so anything the
    /// balance dips below zero is float dust and is clamped away.
    pub fn debit(&mut self, scheme_code: u32, amount: f64, nav: f64) -> f64 {
        let units = amount / nav;
        let balance = self.units.entry(scheme_code).or_insert(0.0);
        *balance -= units;
        if *balance < 0.0 {
            *balance = 0.0;
        }
        units
    }

    pub fn units(&self, scheme_code: u32) -> f64 {
        self.units.get(&scheme_code).copied().unwrap_or(0.0)
    }

    /// Value of one fund's balance at the given NAV
    pub fn value_at(&self, scheme_code: u32, nav: f64) -> f64 {
        self.units(scheme_code) * nav
    }
}
