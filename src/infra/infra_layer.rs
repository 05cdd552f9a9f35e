// The infra module contains implementations of core traits.
// Each external service gets its own submodule.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "google/mod.rs"]
pub mod google;

#[path = "mail/mod.rs"]
pub mod mail;
