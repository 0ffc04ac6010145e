//! Quota and billing manager (spec §4.G).
//!
//! Pre-flight checks gate a dispatch before it spends provider money;
//! usage events are billed against a cached per-organization record as
//! they're recorded, then flushed into the durable usage buffer
//! (`gentable_cache::UsageBuffer`) by `process_all`, called exactly once
//! per request.

#![warn(missing_docs)]

mod account;
mod admission;
mod manager;
mod pricing;

pub use account::{OrgAccount, OrgRegistry};
pub use admission::{AdmissionPermit, AdmissionQueue};
pub use manager::RequestQuotaManager;
pub use pricing::{PricingConfig, PricingPlan, PricingTier, ProductPricing};
