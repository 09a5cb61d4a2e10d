//! The three-tier cache hierarchy (C2): ephemeral per-run memory (Tier E),
//! semi-permanent scheduled-refresh DB (Tier S), and persistent
//! observability-purged DB (Tier P).

pub mod tier_e;
pub mod tier_p;
pub mod tier_s;

pub use tier_e::TierECache;
pub use tier_p::TierPStore;
pub use tier_s::TierSStore;
