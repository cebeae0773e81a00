//! Conversions between Docker wire types and Foundry domain types.

use bollard::models::EventMessage;

use foundry_core::{ContainerEvent, ContainerStatus};

/// Convert one decoded Docker event frame into a container notification.
///
/// Returns `None` for frames with no action at all — there is nothing to
/// classify, so the caller drops them. Unknown actions are preserved as
/// [`ContainerStatus::Other`] rather than dropped here.
pub fn notification_from(msg: EventMessage) -> Option<ContainerEvent> {
    let status = ContainerStatus::from(msg.action.as_deref()?);
    let attributes = msg
        .actor
        .and_then(|actor| actor.attributes)
        .unwrap_or_default();
    Some(ContainerEvent::new(status, attributes))
}
