//! Status transition rules
//!
//! One table drives every status change. A transition is a (from, to, actor)
//! triple; anything not in the table is rejected before any side effect runs.

use shared::error::{AppError, AppResult, ErrorCode};
use shared::order::{ActorRole, OrderStatus};

/// Allowed edges of the lifecycle graph
const TRANSITIONS: &[(OrderStatus, OrderStatus, ActorRole)] = &[
    (OrderStatus::Pending, OrderStatus::Accepted, ActorRole::Restaurant),
    (OrderStatus::Pending, OrderStatus::Cancelled, ActorRole::Customer),
    (OrderStatus::Pending, OrderStatus::Cancelled, ActorRole::Restaurant),
    (OrderStatus::Accepted, OrderStatus::Preparing, ActorRole::Restaurant),
    (OrderStatus::Preparing, OrderStatus::Ready, ActorRole::Restaurant),
    (OrderStatus::Ready, OrderStatus::PickedUp, ActorRole::Driver),
    (OrderStatus::PickedUp, OrderStatus::Delivering, ActorRole::Driver),
    (OrderStatus::Delivering, OrderStatus::Delivered, ActorRole::Driver),
];

/// Check that `actor` may move an order from `from` to `to`
///
/// The edge is checked before the actor, so an unknown (from, to) pair
/// answers `InvalidTransition` no matter who asks; only a real edge driven
/// by the wrong role answers `ActorNotAllowed`.
pub fn check_transition(from: OrderStatus, to: OrderStatus, actor: ActorRole) -> AppResult<()> {
    let edge_exists = TRANSITIONS.iter().any(|(f, t, _)| *f == from && *t == to);
    if !edge_exists {
        return Err(AppError::invalid_transition(from, to));
    }

    let actor_allowed = TRANSITIONS
        .iter()
        .any(|(f, t, a)| *f == from && *t == to && *a == actor);
    if !actor_allowed {
        return Err(AppError::new(ErrorCode::ActorNotAllowed)
            .with_detail("actor", actor.as_str())
            .with_detail("from", from.as_str())
            .with_detail("to", to.as_str()));
    }

    Ok(())
}
