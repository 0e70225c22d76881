//! Core business logic for bacefook-rs.
//!
//! Graph mutations (registration, profile changes, friendships) and the
//! derived metrics kept alongside them: referral points, which only ever
//! grow, and network strength, which is recomputed from scratch.

pub mod services;
pub mod views;

pub use services::*;
