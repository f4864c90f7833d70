// src/marketplace/wb.rs
//! Wildberries feedbacks API payloads.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::notify::format::{escape_markdown, format_timestamp, stars};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductDetails {
    #[serde(rename = "nmId", default, deserialize_with = "super::null_as_default")]
    pub article: u64,
    #[serde(rename = "productName", default, deserialize_with = "super::null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub text: String,
    #[serde(rename = "productDetails", default, deserialize_with = "super::null_as_default")]
    pub product: ProductDetails,
    #[serde(rename = "createdDate")]
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Feedback {
    pub id: String,
    #[serde(rename = "productValuation", default, deserialize_with = "super::null_as_default")]
    pub stars: u8,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub pros: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub cons: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub text: String,
    #[serde(rename = "productDetails", default, deserialize_with = "super::null_as_default")]
    pub product: ProductDetails,
    #[serde(rename = "createdDate")]
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionsResponse {
    pub data: QuestionsData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionsData {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedbacksResponse {
    pub data: FeedbacksData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedbacksData {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub feedbacks: Vec<Feedback>,
}

fn product_line(product: &ProductDetails) -> String {
    format!(
        "📦  *Товар \\(артикул: {}\\):* {}\n\n",
        product.article,
        escape_markdown(&product.name)
    )
}

impl Question {
    pub fn format_markdown(&self) -> String {
        let mut out = product_line(&self.product);
        out.push_str(&format!("💬  *Текст вопроса:* {}\n\n", escape_markdown(&self.text)));
        out.push_str(&format!("🆔  *ID вопроса:* {}\n", escape_markdown(&self.id)));
        out.push_str(&format!(
            "⌚  *Время создания:* {}\n",
            escape_markdown(&format_timestamp(&self.created_at))
        ));
        out
    }
}

impl Feedback {
    pub fn format_markdown(&self) -> String {
        let mut out = product_line(&self.product);
        out.push_str(&format!("📝  *Количество звёзд:* {}\n\n", stars(self.stars)));
        out.push_str(&format!("👍  *Достоинства:* {}\n", escape_markdown(&self.pros)));
        out.push_str(&format!("👎  *Недостатки:* {}\n", escape_markdown(&self.cons)));
        out.push_str(&format!("💬  *Текст отзыва:* {}\n\n", escape_markdown(&self.text)));
        out.push_str(&format!("🆔  *ID отзыва:* {}\n", escape_markdown(&self.id)));
        out.push_str(&format!(
            "⌚  *Время создания:* {}\n",
            escape_markdown(&format_timestamp(&self.created_at))
        ));
        out
    }
}
