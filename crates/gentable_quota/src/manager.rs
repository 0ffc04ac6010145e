//! The per-request `QuotaManager` implementation (spec §4.G).

use crate::account::OrgRegistry;
use crate::pricing::{PricingConfig, ProductPricing};
use async_trait::async_trait;
use gentable_cache::UsageBuffer;
use gentable_core::{UsageEvent, UsageKind};
use gentable_error::{AuthError, AuthErrorKind, GentableResult};
use gentable_interface::QuotaManager;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

fn gib_to_units(gib: f64) -> u64 {
    (gib * 1024.0).round().max(0.0) as u64
}

/// Quota manager constructed once per request, accumulating that
/// request's usage and flushing it to the durable buffer on
/// `process_all`.
pub struct RequestQuotaManager {
    org_id: String,
    project_id: String,
    accounts: OrgRegistry,
    pricing: Arc<PricingConfig>,
    usage_buffer: Arc<UsageBuffer>,
    pending: Mutex<Vec<UsageEvent>>,
    processed: AtomicBool,
}

impl RequestQuotaManager {
    /// Construct a manager for one request against `org_id`/`project_id`.
    pub fn new(
        org_id: String,
        project_id: String,
        accounts: OrgRegistry,
        pricing: Arc<PricingConfig>,
        usage_buffer: Arc<UsageBuffer>,
    ) -> Self {
        Self { org_id, project_id, accounts, pricing, usage_buffer, pending: Mutex::new(Vec::new()), processed: AtomicBool::new(false) }
    }

    fn plan_for_org(&self) -> GentableResult<crate::pricing::PricingPlan> {
        let account = self.accounts.snapshot(&self.org_id);
        self.pricing
            .plan(&account.plan)
            .cloned()
            .or_else(|| self.pricing.default_plan().cloned())
            .ok_or_else(|| {
                AuthError::new(AuthErrorKind::UpgradeTier {
                    category: "account".to_string(),
                    reason: format!("organization {} has no billing plan configured", self.org_id),
                })
                .into()
            })
    }

    fn check(&self, category: &str, kind: UsageKind, product: &ProductPricing, additional_units: u64) -> GentableResult<()> {
        let account = self.accounts.snapshot(&self.org_id);
        let already_used = account.used(kind);

        if product.exceeds_hard_cap(already_used, additional_units) {
            return Err(AuthError::new(AuthErrorKind::UpgradeTier {
                category: category.to_string(),
                reason: format!("{} plan allows {:?} units of {category}", account.plan, product.hard_cap),
            })
            .into());
        }

        let projected_cost = product.marginal_cost(already_used, additional_units);
        if account.credit_balance_usd < projected_cost {
            return Err(AuthError::new(AuthErrorKind::InsufficientCredits {
                category: category.to_string(),
                reason: format!("estimated cost ${projected_cost:.4} exceeds remaining balance ${:.4}", account.credit_balance_usd),
            })
            .into());
        }
        Ok(())
    }

    fn cost_and_units(&self, plan: &crate::pricing::PricingPlan, event: &UsageEvent) -> Option<(UsageKind, u64, ProductPricing)> {
        match event.kind {
            UsageKind::Llm => {
                let units = event.prompt_tokens.unwrap_or(0) + event.completion_tokens.unwrap_or(0);
                Some((UsageKind::Llm, units, plan.llm.clone()))
            }
            UsageKind::Embed => Some((UsageKind::Embed, event.prompt_tokens.unwrap_or(0), plan.embed.clone())),
            UsageKind::Rerank => Some((UsageKind::Rerank, event.searches.unwrap_or(0) as u64, plan.rerank.clone())),
            UsageKind::Egress => Some((UsageKind::Egress, gib_to_units(event.gib.unwrap_or(0.0)), plan.egress.clone())),
            UsageKind::Db => Some((UsageKind::Db, gib_to_units(event.gib.unwrap_or(0.0)), plan.db.clone())),
            UsageKind::File => Some((UsageKind::File, gib_to_units(event.gib.unwrap_or(0.0)), plan.file.clone())),
            UsageKind::Image => None,
        }
    }
}

#[async_trait]
impl QuotaManager for RequestQuotaManager {
    async fn check_llm_quota(&self, model: &str, estimated_prompt_tokens: u64) -> GentableResult<()> {
        let plan = self.plan_for_org()?;
        debug!(org = %self.org_id, model, estimated_prompt_tokens, "llm quota precheck");
        self.check("llm", UsageKind::Llm, &plan.llm, estimated_prompt_tokens)
    }

    async fn check_embed_quota(&self, model: &str, estimated_tokens: u64) -> GentableResult<()> {
        let plan = self.plan_for_org()?;
        debug!(org = %self.org_id, model, estimated_tokens, "embed quota precheck");
        self.check("embed", UsageKind::Embed, &plan.embed, estimated_tokens)
    }

    async fn check_rerank_quota(&self, model: &str) -> GentableResult<()> {
        let plan = self.plan_for_org()?;
        debug!(org = %self.org_id, model, "rerank quota precheck");
        self.check("rerank", UsageKind::Rerank, &plan.rerank, 1)
    }

    async fn check_egress_quota(&self, gib: f64) -> GentableResult<()> {
        let plan = self.plan_for_org()?;
        self.check("egress", UsageKind::Egress, &plan.egress, gib_to_units(gib))
    }

    async fn check_db_quota(&self, gib: f64) -> GentableResult<()> {
        let plan = self.plan_for_org()?;
        self.check("db", UsageKind::Db, &plan.db, gib_to_units(gib))
    }

    async fn check_file_quota(&self, gib: f64) -> GentableResult<()> {
        let plan = self.plan_for_org()?;
        self.check("file", UsageKind::File, &plan.file, gib_to_units(gib))
    }

    fn record_event(&self, event: UsageEvent) {
        if let Ok(plan) = self.plan_for_org() {
            if let Some((kind, units, product)) = self.cost_and_units(&plan, &event) {
                let already_used = self.accounts.snapshot(&self.org_id).used(kind);
                let cost = product.marginal_cost(already_used, units);
                self.accounts.apply(&self.org_id, kind, units, cost);
            } else {
                warn!(kind = %event.kind, "usage event kind has no pricing terms; recorded without billing");
            }
        }
        self.pending.lock().expect("pending usage mutex poisoned").push(event);
    }

    async fn process_all(&self) -> GentableResult<()> {
        if self.processed.swap(true, Ordering::SeqCst) {
            debug!(org = %self.org_id, project = %self.project_id, "process_all already ran for this request");
            return Ok(());
        }
        let events = std::mem::take(&mut *self.pending.lock().expect("pending usage mutex poisoned"));
        for event in events {
            self.usage_buffer.push(event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricingPlan;
    use std::collections::HashMap;

    fn test_plan() -> PricingPlan {
        let free = ProductPricing {
            tiers: vec![crate::pricing::PricingTier { unit_cost: 0.0, up_to: None }],
            hard_cap: Some(100),
        };
        PricingPlan {
            name: "free".to_string(),
            llm: free.clone(),
            embed: free.clone(),
            rerank: free.clone(),
            egress: free.clone(),
            db: free.clone(),
            file: free,
        }
    }

    fn test_pricing() -> Arc<PricingConfig> {
        let mut plans = HashMap::new();
        plans.insert("free".to_string(), test_plan());
        Arc::new(PricingConfig { plans, default_plan: "free".to_string() })
    }

    fn manager() -> RequestQuotaManager {
        RequestQuotaManager::new(
            "org_1".to_string(),
            "proj_1".to_string(),
            OrgRegistry::new("free".to_string(), 0.0),
            test_pricing(),
            Arc::new(UsageBuffer::new()),
        )
    }

    #[tokio::test]
    async fn precheck_within_allowance_succeeds() {
        let manager = manager();
        assert!(manager.check_llm_quota("model", 50).await.is_ok());
    }

    #[tokio::test]
    async fn precheck_past_hard_cap_raises_upgrade_tier() {
        let manager = manager();
        let err = manager.check_llm_quota("model", 101).await.unwrap_err();
        assert!(format!("{err}").contains("Upgrade"));
    }

    #[tokio::test]
    async fn process_all_is_idempotent() {
        let manager = manager();
        manager.record_event(UsageEvent::llm("org_1".to_string(), "proj_1".to_string(), "m".to_string(), 10, 5, 0));
        manager.process_all().await.unwrap();
        assert_eq!(manager.usage_buffer.len(), 1);
        manager.process_all().await.unwrap();
        assert_eq!(manager.usage_buffer.len(), 1);
    }

    #[tokio::test]
    async fn record_event_debits_running_counter() {
        let manager = manager();
        manager.record_event(UsageEvent::llm("org_1".to_string(), "proj_1".to_string(), "m".to_string(), 40, 10, 0));
        assert_eq!(manager.accounts.snapshot("org_1").used(UsageKind::Llm), 50);
    }
}
