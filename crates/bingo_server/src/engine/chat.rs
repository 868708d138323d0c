//! Room chat.

use super::{Ignored, Outcome, SessionEngine, lock};
use crate::EngineError;
use crate::events::ServerEvent;
use crate::rooms::Broadcaster;
use crate::session::ChatMessage;
use crate::store::SessionStore;
use tracing::{debug, instrument};

impl<S: SessionStore, B: Broadcaster> SessionEngine<S, B> {
    /// Posts a chat line to the room.
    ///
    /// Allowed in any round state. Empty or overlong text and senders outside
    /// the session are silent no-ops.
    #[instrument(skip(self, content), fields(len = content.len()))]
    pub fn send_chat(
        &self,
        session_id: &str,
        player_id: &str,
        content: &str,
    ) -> Result<Outcome, EngineError> {
        let gate = self.gate(session_id);
        let _guard = lock(&gate);
        let mut session = self.load(session_id)?;
        let Some(sender) = session.player(player_id) else {
            return self.ignore(Ignored::NotMember);
        };
        if !ChatMessage::is_valid_content(content) {
            return self.ignore(Ignored::BadMessage);
        }

        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            player_id: sender.id.clone(),
            player_name: sender.name.clone(),
            content: content.to_string(),
            sent_at: self.now(),
        };
        session.chat.push(message.clone());
        debug!(message_id = %message.id, "Chat message posted");
        self.commit(&session, vec![ServerEvent::ChatMessage(message)])
    }
}
