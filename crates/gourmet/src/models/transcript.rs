use std::collections::HashSet;

use super::message::Message;
use super::role::Role;

/// The ordered, append-only record of one conversation.
///
/// A transcript belongs to exactly one agent reply; messages can be appended
/// but never edited or removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// Check that every tool result answers a request of the closest preceding
    /// assistant message, exactly once.
    ///
    /// Returns the id of the first tool result that breaks the rule.
    pub fn check_tool_links(&self) -> Result<(), String> {
        let mut open: HashSet<&str> = HashSet::new();
        for message in &self.messages {
            match message.role {
                Role::Assistant => {
                    open = message
                        .tool_requests()
                        .into_iter()
                        .map(|r| r.id.as_str())
                        .collect();
                }
                Role::Tool => {
                    for content in &message.content {
                        if let Some(response) = content.as_tool_response() {
                            if !open.remove(response.id.as_str()) {
                                return Err(response.id.clone());
                            }
                        }
                    }
                }
                Role::System | Role::User => open.clear(),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::Content;
    use crate::models::tool::ToolCall;
    use serde_json::json;

    fn request(id: &str) -> Message {
        Message::assistant().with_tool_request(id, Ok(ToolCall::new("add", json!({}))))
    }

    fn result(id: &str) -> Message {
        Message::tool().with_tool_response(id, "add", Ok(vec![Content::text("1")]))
    }

    #[test]
    fn test_linked_results_pass() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user().with_text("hi"));
        transcript.push(request("1"));
        transcript.push(result("1"));
        transcript.push(Message::assistant().with_text("done"));

        assert_eq!(transcript.len(), 4);
        assert!(transcript.check_tool_links().is_ok());
    }

    #[test]
    fn test_result_for_older_turn_fails() {
        let mut transcript = Transcript::new();
        transcript.push(request("1"));
        transcript.push(result("1"));
        transcript.push(request("2"));
        transcript.push(result("1"));

        assert_eq!(transcript.check_tool_links(), Err("1".to_string()));
    }

    #[test]
    fn test_duplicate_result_fails() {
        let mut transcript = Transcript::new();
        transcript.push(request("1"));
        transcript.push(result("1"));
        transcript.push(result("1"));

        assert!(transcript.check_tool_links().is_err());
    }
}
