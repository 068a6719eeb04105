use crate::domain::directory::Address;
use crate::domain::message::OutgoingMessage;
use crate::domain::ports::Messenger;

/// Sends `message` to every address, best effort.
///
/// A failed delivery is logged and skipped; the remaining addresses are still
/// tried. Returns the addresses that could not be reached.
pub async fn broadcast(
    messenger: &dyn Messenger,
    audience: &[Address],
    message: &OutgoingMessage,
) -> Vec<Address> {
    let mut undelivered = Vec::new();
    for &address in audience {
        if let Err(e) = messenger.send(address, message.clone()).await {
            tracing::warn!(%address, error = %e, "Failed to notify operator");
            undelivered.push(address);
        }
    }
    undelivered
}
