//! Demo conversations for a first run without any history.

use crate::types::{Conversation, Message};
use chrono::{DateTime, Duration, Utc};

/// Two sample conversations timestamped relative to `now`.
pub fn demo_conversations(now: DateTime<Utc>) -> Vec<Conversation> {
    let asked = now - Duration::minutes(30);
    let answered = now - Duration::minutes(29);
    let earlier = now - Duration::hours(2);
    vec![
        Conversation {
            id: "1".to_string(),
            title: "Tax and Transaction Records".to_string(),
            messages: vec![
                Message::user(
                    "1".to_string(),
                    "Show me companies with transaction amount above 100.",
                    asked,
                ),
                Message::assistant(
                    "2".to_string(),
                    "There are 6 companies with a transaction amount above 100.",
                    answered,
                ),
            ],
            last_message: answered,
        },
        Conversation {
            id: "2".to_string(),
            title: "Highest Tax Payers".to_string(),
            messages: vec![
                Message::user("3".to_string(), "Who paid the highest tax?", earlier),
                Message::assistant(
                    "4".to_string(),
                    "David Wilson Inc paid the highest tax.",
                    earlier,
                ),
            ],
            last_message: earlier,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::demo_conversations;
    use crate::payload::format_time_ago;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    #[test]
    fn demo_conversations_are_ordered_newest_first() {
        let now = Utc::now();
        let conversations = demo_conversations(now);
        assert_eq!(conversations.len(), 2);
        assert!(conversations[0].last_message > conversations[1].last_message);
        assert_eq!(format_time_ago(conversations[0].last_message, now), "29m");
        assert_eq!(format_time_ago(conversations[1].last_message, now), "2h");
    }
}
