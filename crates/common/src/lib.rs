//! Common utilities and shared types for bacefook-rs.
//!
//! This crate provides foundational components used across all bacefook-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Dates**: Inclusive UTC ranges and calendar-day bucketing via [`DateRange`]
//! - **Pagination**: Page clamping shared by every paginated listing via [`PageWindow`]
//!
//! # Example
//!
//! ```no_run
//! use bacefook_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {} on port {}", id, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod date;
pub mod error;
pub mod id;
pub mod pagination;

pub use config::{Config, LimitConfig};
pub use date::{DateRange, DayCount, day_series};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use pagination::{PageWindow, Paginated};
