//! Core domain types for the pull request dependency tracker.

pub mod ids;

pub use ids::{DeliveryId, InvalidPrKey, PrKey, PrNumber};
