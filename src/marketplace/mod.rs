// src/marketplace/mod.rs
//! Reactions (questions/feedbacks) as fetched from the marketplaces.
//!
//! The set of variants is closed: every marketplace payload we understand is a
//! [`Reaction`] variant and renders itself through [`Reaction::format_markdown`].

pub mod wb;
pub mod yandex;

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Question,
    Feedback,
}

impl ReactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Question => "question",
            ReactionKind::Feedback => "feedback",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marketplace {
    Wb,
    Yandex,
}

impl Marketplace {
    /// Short name used in message headers. Contains no MarkdownV2 reserved characters.
    pub fn display_name(self) -> &'static str {
        match self {
            Marketplace::Wb => "WB",
            Marketplace::Yandex => "Yandex",
        }
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One fetched user reaction awaiting a seller response.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    WbQuestion(wb::Question),
    WbFeedback(wb::Feedback),
    YandexFeedback(yandex::Feedback),
}

impl Reaction {
    pub fn kind(&self) -> ReactionKind {
        match self {
            Reaction::WbQuestion(_) => ReactionKind::Question,
            Reaction::WbFeedback(_) | Reaction::YandexFeedback(_) => ReactionKind::Feedback,
        }
    }

    pub fn marketplace(&self) -> Marketplace {
        match self {
            Reaction::WbQuestion(_) | Reaction::WbFeedback(_) => Marketplace::Wb,
            Reaction::YandexFeedback(_) => Marketplace::Yandex,
        }
    }

    pub fn id(&self) -> String {
        match self {
            Reaction::WbQuestion(q) => q.id.clone(),
            Reaction::WbFeedback(f) => f.id.clone(),
            Reaction::YandexFeedback(f) => f.id.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Reaction::WbQuestion(q) => &q.text,
            Reaction::WbFeedback(f) => &f.text,
            Reaction::YandexFeedback(f) => &f.description.text,
        }
    }

    /// Star rating; questions carry none.
    pub fn rating(&self) -> Option<u8> {
        match self {
            Reaction::WbQuestion(_) => None,
            Reaction::WbFeedback(f) => Some(f.stars),
            Reaction::YandexFeedback(f) => Some(f.statistics.rating),
        }
    }

    pub fn created_at(&self) -> DateTime<FixedOffset> {
        match self {
            Reaction::WbQuestion(q) => q.created_at,
            Reaction::WbFeedback(f) => f.created_at,
            Reaction::YandexFeedback(f) => f.created_at,
        }
    }

    /// MarkdownV2 body of the detail message (without the header line).
    pub fn format_markdown(&self) -> String {
        match self {
            Reaction::WbQuestion(q) => q.format_markdown(),
            Reaction::WbFeedback(f) => f.format_markdown(),
            Reaction::YandexFeedback(f) => f.format_markdown(),
        }
    }
}

/// Upstream sends `null` for empty optional fields; read it as the type's default.
pub(crate) fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Option::unwrap_or_default)
}
