//! Message entity - one immutable chat message

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ConversationKey, UserId};

/// Chat message as stored under a conversation push key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Millisecond timestamp at send time, as a string
    pub id: String,
    pub text: String,
    pub sender: UserId,
    pub receiver: UserId,
    /// RFC 3339 timestamp
    pub date: DateTime<Utc>,
}

impl Message {
    /// Create a new Message stamped with `sent_at`
    pub fn new(
        sender: UserId,
        receiver: UserId,
        text: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: sent_at.timestamp_millis().to_string(),
            text: text.into(),
            sender,
            receiver,
            date: sent_at,
        }
    }

    /// Conversation this message belongs to
    pub fn conversation_key(&self) -> ConversationKey {
        ConversationKey::resolve(&self.sender, &self.receiver)
    }

    /// Whether `user` sent this message
    #[inline]
    pub fn is_mine(&self, user: &UserId) -> bool {
        &self.sender == user
    }

    /// Calendar date of the message in the given display offset
    pub fn calendar_date(&self, offset: FixedOffset) -> NaiveDate {
        self.date.with_timezone(&offset).date_naive()
    }

    /// Time of day for rendering next to the bubble
    pub fn time_label(&self, offset: FixedOffset) -> String {
        self.date.with_timezone(&offset).format("%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn id(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[test]
    fn test_message_creation() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        let msg = Message::new(id("1"), id("2"), "Hello", at);

        assert_eq!(msg.id, at.timestamp_millis().to_string());
        assert!(msg.is_mine(&id("1")));
        assert!(!msg.is_mine(&id("2")));
        assert_eq!(msg.conversation_key().as_str(), "21");
    }

    #[test]
    fn test_conversation_key_is_symmetric() {
        let at = Utc::now();
        let a_to_b = Message::new(id("a"), id("b"), "x", at);
        let b_to_a = Message::new(id("b"), id("a"), "y", at);
        assert_eq!(a_to_b.conversation_key(), b_to_a.conversation_key());
    }

    #[test]
    fn test_calendar_date_uses_offset() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 23, 30, 0).unwrap();
        let msg = Message::new(id("1"), id("2"), "late", at);

        let utc = FixedOffset::east_opt(0).unwrap();
        let tunis = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(msg.calendar_date(utc), NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(msg.calendar_date(tunis), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert_eq!(msg.time_label(tunis), "00:30:00");
    }

    #[test]
    fn test_wire_format() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let msg = Message::new(id("1"), id("2"), "hi", at);
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["sender"], "1");
        assert_eq!(value["receiver"], "2");
        assert_eq!(value["date"], "2026-01-02T03:04:05Z");

        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }
}
