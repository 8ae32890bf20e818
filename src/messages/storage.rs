use super::types::ChatMessage;
use parking_lot::RwLock;
use std::sync::Arc;

/// Append-only conversation transcript
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn append(&self, message: ChatMessage) {
        self.messages.write().push(message);
    }

    pub fn get_all(&self) -> Vec<ChatMessage> {
        self.messages.read().clone()
    }

    pub fn get(&self, index: usize) -> Option<ChatMessage> {
        self.messages.read().get(index).cloned()
    }

    /// Messages appended at or after `index`
    pub fn since(&self, index: usize) -> Vec<ChatMessage> {
        let messages = self.messages.read();
        messages.get(index..).map(<[_]>::to_vec).unwrap_or_default()
    }

    pub fn clear(&self) {
        self.messages.write().clear();
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let transcript = Transcript::new();
        transcript.append(ChatMessage::user("one"));
        transcript.append(ChatMessage::assistant("two"));

        let contents: Vec<_> = transcript.get_all().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["one", "two"]);
    }

    #[test]
    fn test_since_past_end_is_empty() {
        let transcript = Transcript::new();
        transcript.append(ChatMessage::user("one"));
        assert_eq!(transcript.since(1).len(), 0);
        assert_eq!(transcript.since(5).len(), 0);
        assert_eq!(transcript.since(0).len(), 1);
    }
}
