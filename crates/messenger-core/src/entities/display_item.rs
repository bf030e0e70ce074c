//! Display items - the render-ready projection of a conversation
//!
//! Derived fresh from every full-list delivery and never persisted.

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

use super::Message;

/// One row of a rendered conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DisplayItem {
    /// Synthetic separator opening a calendar date
    Date { date: NaiveDate },
    Message(Message),
}

impl DisplayItem {
    /// Stable list key for renderers
    pub fn list_key(&self) -> String {
        match self {
            Self::Date { date } => format!("date-{date}"),
            Self::Message(message) => message.id.clone(),
        }
    }

    /// Separator text, e.g. `Sun Oct 18 2026`
    pub fn label(&self) -> Option<String> {
        match self {
            Self::Date { date } => Some(date.format("%a %b %d %Y").to_string()),
            Self::Message(_) => None,
        }
    }

    #[inline]
    pub fn is_separator(&self) -> bool {
        matches!(self, Self::Date { .. })
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(message) => Some(message),
            Self::Date { .. } => None,
        }
    }
}

/// Interleave date separators into an ordered message list
///
/// A separator precedes the first message of every calendar date, so the
/// first message is always preceded by one. Dates are computed in `offset`.
/// A run that goes back to an earlier date opens a new separator.
pub fn with_date_separators(messages: &[Message], offset: FixedOffset) -> Vec<DisplayItem> {
    let mut items = Vec::with_capacity(messages.len() * 2);
    let mut last_date: Option<NaiveDate> = None;

    for message in messages {
        let date = message.calendar_date(offset);
        if last_date != Some(date) {
            items.push(DisplayItem::Date { date });
            last_date = Some(date);
        }
        items.push(DisplayItem::Message(message.clone()));
    }

    items
}

/// Reverse a display sequence for renderers that draw bottom-up
///
/// Separators then follow their date group, which places them above the
/// group once the list is drawn inverted.
pub fn newest_first(mut items: Vec<DisplayItem>) -> Vec<DisplayItem> {
    items.reverse();
    items
}
