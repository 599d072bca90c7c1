//! Message types for model communication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a provider request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMessage {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ModelMessage {
    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Some(Utc::now()),
        }
    }
}

/// A single inbound conversational turn.
///
/// `prior_history` is supplied by the conversation manager, oldest first,
/// and is placed verbatim ahead of the new turn in the provider request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prior_history: Vec<ModelMessage>,
}

impl ConversationTurn {
    /// A user turn with no history.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            prior_history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ModelMessage>) -> Self {
        self.prior_history = history;
        self
    }

    /// Flatten into the provider message list: history, then this turn.
    pub fn to_messages(&self) -> Vec<ModelMessage> {
        let mut messages = Vec::with_capacity(self.prior_history.len() + 1);
        messages.extend(self.prior_history.iter().cloned());
        messages.push(ModelMessage::new(self.role, self.text.clone()));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_precedes_new_turn() {
        let turn = ConversationTurn::user("third").with_history(vec![
            ModelMessage::user("first"),
            ModelMessage::assistant("second"),
        ]);

        let texts: Vec<_> = turn.to_messages().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(turn.to_messages()[1].role, Role::Assistant);
    }
}
