//! Repositories over the graph store and the event log.

mod event;
mod friendship;
mod network_strength;
mod referral_point;
mod user;

pub use event::EventRepository;
pub use friendship::FriendshipRepository;
pub use network_strength::NetworkStrengthRepository;
pub use referral_point::ReferralPointRepository;
pub use user::UserRepository;

use bacefook_common::DateRange;
use sea_orm::{ColumnTrait, QueryFilter};

/// Restrict `column` to the inclusive bounds of `range`.
fn within<Q, C>(query: Q, column: C, range: &DateRange) -> Q
where
    Q: QueryFilter,
    C: ColumnTrait,
{
    let query = match range.from {
        Some(from) => query.filter(column.gte(from)),
        None => query,
    };

    match range.to {
        Some(to) => query.filter(column.lte(to)),
        None => query,
    }
}
