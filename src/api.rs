//! High-level interfaces to external services.
//!
//! Actors here intermediate calls to the networking actor and speak the URL
//! layout, headers and payload shapes of one backend each.

pub mod crm;

pub use crm::{ApiSource, CrmApi};
