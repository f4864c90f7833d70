// src/marketplace/yandex.rs
//! Yandex Market partner API payloads and push notifications.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::notify::format::{escape_markdown, format_timestamp, stars};

/// Push notification type for a newly created goods feedback.
pub const FEEDBACK_CREATED: &str = "GOODS_FEEDBACK_CREATED";

/// Discriminant shared by every push notification.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationBase {
    #[serde(rename = "notificationType")]
    pub notification_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackCreated {
    pub business_id: u64,
    pub feedback_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Description {
    #[serde(rename = "advantages", default, deserialize_with = "super::null_as_default")]
    pub pros: String,
    #[serde(rename = "disadvantages", default, deserialize_with = "super::null_as_default")]
    pub cons: String,
    #[serde(rename = "comment", default, deserialize_with = "super::null_as_default")]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Statistics {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub rating: u8,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub recommended: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Identifiers {
    #[serde(rename = "orderId", default, deserialize_with = "super::null_as_default")]
    pub order_id: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Feedback {
    #[serde(rename = "feedbackId")]
    pub id: u64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<FixedOffset>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: Description,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub statistics: Statistics,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub identifiers: Identifiers,
}

#[derive(Debug, Serialize)]
pub(crate) struct FeedbackQuery {
    #[serde(rename = "feedbackIds")]
    pub feedback_ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedbacksResponse {
    pub result: FeedbacksResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedbacksResult {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub feedbacks: Vec<Feedback>,
}

impl Feedback {
    pub fn format_markdown(&self) -> String {
        let mut out = format!("📦  *Заказ с id: {}*\n\n", self.identifiers.order_id);
        out.push_str(&format!(
            "📝  *Количество звёзд:* {}\n\n",
            stars(self.statistics.rating)
        ));
        out.push_str(&format!(
            "👍  *Достоинства:* {}\n",
            escape_markdown(&self.description.pros)
        ));
        out.push_str(&format!(
            "👎  *Недостатки:* {}\n",
            escape_markdown(&self.description.cons)
        ));
        out.push_str(&format!(
            "💬  *Текст отзыва:* {}\n\n",
            escape_markdown(&self.description.text)
        ));
        out.push_str(&format!("🆔  *ID отзыва:* {}\n", self.id));
        out.push_str(&format!(
            "⌚  *Время создания:* {}\n",
            escape_markdown(&format_timestamp(&self.created_at))
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feedback_created_notification() {
        let raw = r#"{
            "notificationType": "GOODS_FEEDBACK_CREATED",
            "businessId": 777,
            "feedbackId": 555,
            "createdAt": "2025-04-01T12:00:00+03:00"
        }"#;
        let base: NotificationBase = serde_json::from_str(raw).unwrap();
        assert_eq!(base.notification_type, FEEDBACK_CREATED);
        let ev: FeedbackCreated = serde_json::from_str(raw).unwrap();
        assert_eq!(
            ev,
            FeedbackCreated {
                business_id: 777,
                feedback_id: 555
            }
        );
    }

    #[test]
    fn feedback_markdown_keeps_source_offset() {
        let raw = r#"{
            "feedbackId": 555,
            "createdAt": "2025-04-01T12:00:00+03:00",
            "description": {"advantages": "Быстро", "disadvantages": "Нет", "comment": "5+"},
            "statistics": {"rating": 5, "recommended": true},
            "identifiers": {"orderId": 9001}
        }"#;
        let fb: Feedback = serde_json::from_str(raw).unwrap();
        let md = fb.format_markdown();
        assert!(md.starts_with("📦  *Заказ с id: 9001*"), "{md}");
        assert!(md.contains("⭐⭐⭐⭐⭐"), "{md}");
        assert!(md.contains("5\\+"), "{md}");
        assert!(md.contains("2025\\-04\\-01 12:00:00"), "{md}");
    }

    #[test]
    fn null_description_parts_read_as_empty() {
        let raw = r#"{
            "feedbackId": 556,
            "createdAt": "2025-04-01T12:00:00+03:00",
            "description": {"advantages": null, "disadvantages": null, "comment": "Норм"},
            "statistics": null,
            "identifiers": {"orderId": null}
        }"#;
        let fb: Feedback = serde_json::from_str(raw).unwrap();
        assert_eq!(fb.description.pros, "");
        assert_eq!(fb.description.text, "Норм");
        assert_eq!(fb.statistics, Statistics::default());
        assert_eq!(fb.identifiers.order_id, 0);
    }
}
