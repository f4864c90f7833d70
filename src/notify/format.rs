// src/notify/format.rs
//! Telegram MarkdownV2 rendering.
//!
//! Template literals below are written already escaped; only values that come
//! from upstream content go through [`escape_markdown`].

use chrono::{DateTime, TimeZone};

use crate::marketplace::{Reaction, ReactionKind};

/// `parse_mode` value sent with every message.
pub const PARSE_MODE: &str = "MarkdownV2";

/// Characters that MarkdownV2 treats as markup.
pub const RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

const STAR: &str = "⭐";

/// Prefix every reserved character with a backslash.
pub fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 4);
    for c in s.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `YYYY-MM-DD HH:MM:SS` in the timestamp's own offset.
pub fn format_timestamp<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Star glyph repeated `rating` times.
pub fn stars(rating: u8) -> String {
    STAR.repeat(usize::from(rating))
}

pub fn summary_message(questions: usize, feedbacks: usize) -> String {
    let mut out = String::new();
    out.push_str("🔔 *Пользователи ждут вашего ответа\\!* 🔔\n\n");
    out.push_str("*🗓️ На данный момент у вас:*\n\n");
    out.push_str(&format!("❔ Неотвеченных *вопросов*: {questions}\n"));
    out.push_str(&format!("💬 Неотвеченных *отзывов*: {feedbacks}\n\n"));
    out.push_str("📃 Полный список в сообщениях ниже:\n");
    out
}

pub fn detail_message(reaction: &Reaction) -> String {
    let header = match reaction.kind() {
        ReactionKind::Question => format!(
            "*❔ Неотвеченный вопрос на {}:*\n\n",
            reaction.marketplace().display_name()
        ),
        ReactionKind::Feedback => format!(
            "*💬 Неотвеченный отзыв на {}:*\n\n",
            reaction.marketplace().display_name()
        ),
    };
    header + &reaction.format_markdown()
}

/// Used by the `send_test_message` tool to verify chat delivery.
pub fn test_message(note: &str) -> String {
    format!("✅ *Тестовое сообщение*\n\n{}", escape_markdown(note))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::wb::{ProductDetails, Question};

    #[test]
    fn escapes_every_reserved_char() {
        let input: String = RESERVED.iter().collect();
        let out = escape_markdown(&input);
        let expected: String = RESERVED.iter().flat_map(|c| ['\\', *c]).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(escape_markdown("Привет, мир: 42"), "Привет, мир: 42");
        assert_eq!(escape_markdown(""), "");
    }

    #[test]
    fn escaping_twice_escapes_the_backslashes() {
        // a second pass treats the inserted backslashes as content
        assert_eq!(escape_markdown("a.b"), "a\\.b");
        assert_eq!(escape_markdown("a\\.b"), "a\\\\\\.b");
    }

    #[test]
    fn summary_keeps_template_punctuation_unescaped() {
        let s = summary_message(2, 0);
        assert!(s.contains("вопросов*: 2\n"));
        assert!(s.contains("отзывов*: 0\n"));
        assert_eq!(s.matches("\\!").count(), 1);
        assert!(!s.contains("\\*"));
        assert!(!s.contains("\\\\"));
    }

    #[test]
    fn stars_repeat_rating() {
        assert_eq!(stars(0), "");
        assert_eq!(stars(3), "⭐⭐⭐");
    }

    #[test]
    fn detail_message_has_kind_header() {
        let q = Question {
            id: "abc".into(),
            text: "*жирный?*".into(),
            product: ProductDetails {
                article: 1,
                name: "Шапка".into(),
            },
            created_at: chrono::DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z").unwrap(),
        };
        let msg = detail_message(&Reaction::WbQuestion(q));
        assert!(msg.starts_with("*❔ Неотвеченный вопрос на WB:*\n\n"), "{msg}");
        assert!(msg.contains("\\*жирный?\\*"), "{msg}");
    }
}
