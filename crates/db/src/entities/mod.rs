//! Database entities.

pub mod event;
pub mod friendship;
pub mod network_strength;
pub mod referral_point;
pub mod user;

pub use event::Entity as Event;
pub use friendship::Entity as Friendship;
pub use network_strength::Entity as NetworkStrength;
pub use referral_point::Entity as ReferralPoint;
pub use user::Entity as User;
