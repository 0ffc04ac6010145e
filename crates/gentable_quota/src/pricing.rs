//! Tiered pricing plans loaded from TOML (spec §4.G).
//!
//! Generalizes the same tier shape as provider rate-limit tiers (a
//! bounded free allowance, then a per-unit overage cost) to the
//! organization's billing plan rather than a single vendor's RPM/TPM
//! limits: a `Free` plan hard-caps usage and requires an upgrade past its
//! allowance, while paid plans meter overage against the org's credit
//! balance instead of refusing outright.

use gentable_error::{ConfigError, GentableError, GentableResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// One tier of a piecewise-linear pricing curve: a per-unit cost that
/// applies to usage up to `up_to` cumulative units this billing period.
/// `up_to = None` marks the final, open-ended tier.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PricingTier {
    /// Cost in USD per unit while cumulative usage is within this tier.
    pub unit_cost: f64,
    /// Cumulative units at which this tier ends and the next begins.
    /// `None` for the last tier in the list.
    #[serde(default)]
    pub up_to: Option<u64>,
}

/// Billing terms for one product (LLM tokens, embed tokens, rerank
/// searches, egress/db/file gibibytes): an ordered list of tiers — the
/// first an `included` tier (typically `unit_cost = 0.0`), the rest
/// priced overage — plus an optional hard cap.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProductPricing {
    /// Tiers in ascending `up_to` order; the last tier's `up_to` is
    /// `None`. Loaded config is trusted to be in order — `load()` does
    /// not re-sort.
    pub tiers: Vec<PricingTier>,
    /// If set, usage may never exceed this many units on this plan; a
    /// precheck that would cross it raises `UpgradeTier` regardless of
    /// credit balance. `None` means usage is unbounded and only gated by
    /// credits and the tier list itself.
    #[serde(default)]
    pub hard_cap: Option<u64>,
}

impl ProductPricing {
    /// Marginal USD cost of consuming `additional_units` given
    /// `already_used` units consumed so far this billing period,
    /// integrating the piecewise-linear unit cost across every tier the
    /// `[already_used, already_used + additional_units)` range crosses.
    pub fn marginal_cost(&self, already_used: u64, additional_units: u64) -> f64 {
        let mut position = already_used;
        let mut remaining = additional_units;
        let mut cost = 0.0;
        for tier in &self.tiers {
            if remaining == 0 {
                break;
            }
            let tier_ceiling = tier.up_to.unwrap_or(u64::MAX);
            if position >= tier_ceiling {
                continue;
            }
            let capacity_in_tier = tier_ceiling - position;
            let billed_in_tier = remaining.min(capacity_in_tier);
            cost += billed_in_tier as f64 * tier.unit_cost;
            position += billed_in_tier;
            remaining -= billed_in_tier;
        }
        cost
    }

    /// `true` if consuming `additional_units` on top of `already_used`
    /// would cross this plan's hard cap.
    pub fn exceeds_hard_cap(&self, already_used: u64, additional_units: u64) -> bool {
        match self.hard_cap {
            Some(cap) => already_used + additional_units > cap,
            None => false,
        }
    }
}

/// One named billing plan, with terms for every metered product.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PricingPlan {
    /// Display name, e.g. `"Free"`, `"Pay-as-you-go"`.
    pub name: String,
    /// LLM prompt + completion tokens.
    pub llm: ProductPricing,
    /// Embedding tokens.
    pub embed: ProductPricing,
    /// Reranker searches.
    pub rerank: ProductPricing,
    /// Network egress, in gibibytes.
    pub egress: ProductPricing,
    /// Durable storage writes, in gibibytes.
    pub db: ProductPricing,
    /// File storage, in gibibytes.
    pub file: ProductPricing,
}

/// Every billing plan known to this deployment, keyed by plan name.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct PricingConfig {
    /// Plan name to plan terms.
    #[serde(default)]
    pub plans: HashMap<String, PricingPlan>,
    /// The plan assigned to an organization with no explicit assignment.
    #[serde(default = "default_plan_name")]
    pub default_plan: String,
}

fn default_plan_name() -> String {
    "free".to_string()
}

impl PricingConfig {
    /// Load configuration with precedence: current directory override >
    /// home directory override > bundled defaults. User config files are
    /// optional and silently skipped if absent.
    #[instrument]
    pub fn load() -> GentableResult<Self> {
        debug!("loading pricing configuration: cwd > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../gentable.toml");

        let mut builder = ::config::Config::builder()
            .add_source(::config::File::from_str(DEFAULT_CONFIG, ::config::FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/gentable/gentable.toml");
            builder = builder.add_source(::config::File::from(home_config).required(false));
        }
        builder = builder.add_source(::config::File::with_name("gentable").required(false));

        builder
            .build()
            .map_err(|e| GentableError::from(ConfigError::new(format!("failed to build pricing configuration: {e}"))))?
            .try_deserialize()
            .map_err(|e| GentableError::from(ConfigError::new(format!("failed to parse pricing configuration: {e}"))))
    }

    /// The plan an organization with no explicit assignment falls back to.
    pub fn default_plan(&self) -> Option<&PricingPlan> {
        self.plans.get(&self.default_plan)
    }

    /// Look up a plan by name.
    pub fn plan(&self, name: &str) -> Option<&PricingPlan> {
        self.plans.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(unit_cost: f64, up_to: Option<u64>) -> PricingTier {
        PricingTier { unit_cost, up_to }
    }

    /// A two-tier product: a zero-cost included tier up to `free_allowance`,
    /// then a single open-ended overage tier at `overage` per unit.
    fn included_plus_overage_product(free_allowance: u64, overage: f64, hard_cap: Option<u64>) -> ProductPricing {
        ProductPricing {
            tiers: vec![tier(0.0, Some(free_allowance)), tier(overage, None)],
            hard_cap,
        }
    }

    #[test]
    fn marginal_cost_only_bills_units_past_allowance() {
        let pricing = included_plus_overage_product(1_000, 0.01, None);
        assert_eq!(pricing.marginal_cost(0, 500), 0.0);
        assert_eq!(pricing.marginal_cost(900, 200), 1.0);
        assert_eq!(pricing.marginal_cost(2_000, 100), 1.0);
    }

    #[test]
    fn marginal_cost_integrates_across_three_tiers() {
        // included: 0 cost up to 1_000; then $0.01/unit up to 2_000; then $0.005/unit.
        let pricing = ProductPricing {
            tiers: vec![tier(0.0, Some(1_000)), tier(0.01, Some(2_000)), tier(0.005, None)],
            hard_cap: None,
        };
        // Entirely inside the included tier.
        assert_eq!(pricing.marginal_cost(0, 500), 0.0);
        // Crosses from the included tier into the first overage tier: 100 free + 400 @ 0.01.
        assert_eq!(pricing.marginal_cost(900, 500), 4.0);
        // Spans all three tiers: 100 @ 0.0 + 1_000 @ 0.01 + 400 @ 0.005.
        let cost = pricing.marginal_cost(900, 1_500);
        assert!((cost - (0.0 + 1_000.0 * 0.01 + 400.0 * 0.005)).abs() < 1e-9);
        // Entirely inside the open-ended final tier.
        assert_eq!(pricing.marginal_cost(5_000, 200), 1.0);
    }

    #[test]
    fn hard_cap_blocks_usage_past_hard_cap() {
        let pricing = included_plus_overage_product(250_000, 0.0, Some(250_000));
        assert!(!pricing.exceeds_hard_cap(0, 250_000));
        assert!(pricing.exceeds_hard_cap(0, 250_001));
        assert!(pricing.exceeds_hard_cap(249_999, 2));
    }

    #[test]
    fn unbounded_plan_never_exceeds_hard_cap() {
        let pricing = included_plus_overage_product(0, 0.075, None);
        assert!(!pricing.exceeds_hard_cap(10_000_000, 10_000_000));
    }
}
