//! Business logic services.

pub mod analytics;
pub mod event_log;
pub mod friendship;
pub mod network_strength;
pub mod referral_point;
pub mod user;

pub use analytics::AnalyticsService;
pub use event_log::EventLogService;
pub use friendship::FriendshipService;
pub use network_strength::NetworkStrengthService;
pub use referral_point::ReferralPointService;
pub use user::{CreateUserInput, UpdateUserInput, UserService};
