//! Per-organization cached billing state (spec §4.G, §3 invariant 6).

use gentable_core::UsageKind;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A cached organization billing record.
///
/// Quota checks are O(1) against this record rather than a database
/// round trip; the record is the registry's in-memory cache and the
/// source of truth for this deployment (a production system would back
/// it with a durable ledger and refresh this cache from it, but that
/// ledger is outside this engine's scope).
#[derive(Debug, Clone, PartialEq)]
pub struct OrgAccount {
    /// The billing plan this organization is on.
    pub plan: String,
    /// Remaining prepaid credit, in USD. Can go negative only between a
    /// `record_event` write and its next precheck; a precheck never
    /// admits usage that would take the balance below zero.
    pub credit_balance_usd: f64,
    /// Cumulative units consumed this billing period, by kind. Strictly
    /// non-decreasing (invariant 6).
    pub usage: HashMap<UsageKind, u64>,
}

impl OrgAccount {
    /// A fresh account on `plan` with `starting_credit_usd` prepaid and no
    /// usage recorded.
    pub fn new(plan: String, starting_credit_usd: f64) -> Self {
        Self { plan, credit_balance_usd: starting_credit_usd, usage: HashMap::new() }
    }

    /// Units consumed so far for `kind`.
    pub fn used(&self, kind: UsageKind) -> u64 {
        self.usage.get(&kind).copied().unwrap_or(0)
    }

    /// Record `additional_units` of `kind` usage costing `cost_usd`,
    /// advancing the counter and debiting the balance.
    pub fn apply(&mut self, kind: UsageKind, additional_units: u64, cost_usd: f64) {
        *self.usage.entry(kind).or_insert(0) += additional_units;
        self.credit_balance_usd -= cost_usd;
    }
}

/// Registry of cached organization accounts, keyed by organization id.
#[derive(Clone)]
pub struct OrgRegistry {
    accounts: Arc<Mutex<HashMap<String, OrgAccount>>>,
    default_plan: String,
    default_starting_credit_usd: f64,
}

impl OrgRegistry {
    /// Create a registry that provisions unseen organizations on
    /// `default_plan` with `default_starting_credit_usd` prepaid.
    pub fn new(default_plan: String, default_starting_credit_usd: f64) -> Self {
        Self {
            accounts: Arc::new(Mutex::new(HashMap::new())),
            default_plan,
            default_starting_credit_usd,
        }
    }

    /// Insert or overwrite the record for `org_id`. Used to seed
    /// known organizations with a specific plan/balance.
    pub fn upsert(&self, org_id: &str, account: OrgAccount) {
        self.accounts.lock().expect("org registry mutex poisoned").insert(org_id.to_string(), account);
    }

    /// A snapshot of `org_id`'s current record, provisioning it on the
    /// default plan if this is the first time it's been seen.
    pub fn snapshot(&self, org_id: &str) -> OrgAccount {
        let mut accounts = self.accounts.lock().expect("org registry mutex poisoned");
        accounts
            .entry(org_id.to_string())
            .or_insert_with(|| OrgAccount::new(self.default_plan.clone(), self.default_starting_credit_usd))
            .clone()
    }

    /// Apply `kind` usage of `additional_units` costing `cost_usd` to
    /// `org_id`'s record, provisioning it if unseen.
    pub fn apply(&self, org_id: &str, kind: UsageKind, additional_units: u64, cost_usd: f64) {
        let mut accounts = self.accounts.lock().expect("org registry mutex poisoned");
        let account = accounts
            .entry(org_id.to_string())
            .or_insert_with(|| OrgAccount::new(self.default_plan.clone(), self.default_starting_credit_usd));
        account.apply(kind, additional_units, cost_usd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_counter_is_monotonic_across_applies() {
        let account_registry = OrgRegistry::new("free".to_string(), 0.0);
        account_registry.apply("org_1", UsageKind::Llm, 10, 0.0);
        account_registry.apply("org_1", UsageKind::Llm, 5, 0.0);
        assert_eq!(account_registry.snapshot("org_1").used(UsageKind::Llm), 15);
    }

    #[test]
    fn unseen_org_is_provisioned_on_default_plan() {
        let account_registry = OrgRegistry::new("free".to_string(), 2.50);
        let account = account_registry.snapshot("org_new");
        assert_eq!(account.plan, "free");
        assert_eq!(account.credit_balance_usd, 2.50);
    }
}
