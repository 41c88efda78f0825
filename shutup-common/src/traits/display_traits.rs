use async_trait::async_trait;

use crate::error::Error;
use crate::models::{ConversationId, DisplayLabel};

/// Capability of a platform to read and write the bot's per-conversation display label
/// (for example a QQ group card).
///
/// Hosts that cannot do this simply never hand one out; see
/// [`MessageEvent::display_decoration`](crate::traits::MessageEvent::display_decoration).
#[async_trait]
pub trait DisplayDecoration: Send + Sync {
    /// Reads the labels currently applied to the bot in `conversation`.
    async fn get_label(&self, conversation: &ConversationId) -> Result<DisplayLabel, Error>;

    /// Sets the bot's per-conversation label. An empty string resets it.
    async fn set_label(&self, conversation: &ConversationId, label: &str) -> Result<(), Error>;
}
