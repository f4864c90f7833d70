// src/source/client.rs
//! HTTP client for the WB feedbacks API (polling) and the Yandex Market partner API
//! (single feedback lookups). Each marketplace has its own token bucket.

use reqwest::{Client, Response};
use serde::de::Error as _;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::ReactionSource;
use crate::config::{MarketplacesConfig, WbConfig, YandexConfig};
use crate::error::{Error, Result};
use crate::marketplace::{wb, yandex, Reaction, ReactionKind};
use crate::ratelimit::TokenBucket;

pub struct MarketplaceClient {
    http: Client,
    wb: WbConfig,
    yandex: YandexConfig,
    wb_limiter: TokenBucket,
    yandex_limiter: TokenBucket,
    shutdown: CancellationToken,
}

impl MarketplaceClient {
    pub fn new(cfg: &MarketplacesConfig) -> Result<Self> {
        let http = Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            http,
            wb_limiter: TokenBucket::new(cfg.wb.rate),
            yandex_limiter: TokenBucket::new(cfg.yandex.rate),
            wb: cfg.wb.clone(),
            yandex: cfg.yandex.clone(),
            shutdown: CancellationToken::new(),
        })
    }

    /// Token whose cancellation aborts pending rate-limit waits (process shutdown).
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    async fn fetch_wb(&self, kind: ReactionKind) -> Result<Vec<u8>> {
        self.wb_limiter.acquire(&self.shutdown).await?;

        let (url, take) = match kind {
            ReactionKind::Question => (self.wb.questions_url(), self.wb.max_new_questions),
            ReactionKind::Feedback => (self.wb.feedbacks_url(), self.wb.max_new_feedbacks),
        };
        let take = take.to_string();

        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.wb.jwt)
            .query(&[("isAnswered", "false"), ("take", take.as_str()), ("skip", "0")])
            .send()
            .await?;
        read_success(resp).await
    }
}

async fn read_success(resp: Response) -> Result<Vec<u8>> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        return Err(Error::upstream(status, &body));
    }
    Ok(body.to_vec())
}

#[async_trait::async_trait]
impl ReactionSource for MarketplaceClient {
    async fn fetch_new(&self, kind: ReactionKind) -> Result<Vec<Reaction>> {
        let body = self.fetch_wb(kind).await?;
        let reactions: Vec<Reaction> = match kind {
            ReactionKind::Question => serde_json::from_slice::<wb::QuestionsResponse>(&body)?
                .data
                .questions
                .into_iter()
                .map(Reaction::WbQuestion)
                .collect(),
            ReactionKind::Feedback => serde_json::from_slice::<wb::FeedbacksResponse>(&body)?
                .data
                .feedbacks
                .into_iter()
                .map(Reaction::WbFeedback)
                .collect(),
        };
        debug!(%kind, count = reactions.len(), "fetched WB reactions");
        Ok(reactions)
    }

    async fn fetch_feedback(&self, business_id: u64, feedback_id: u64) -> Result<Reaction> {
        let token = self
            .yandex
            .api_token
            .as_deref()
            .ok_or(Error::NotConfigured("Yandex Market API token"))?;

        self.yandex_limiter.acquire(&self.shutdown).await?;

        let resp = self
            .http
            .post(self.yandex.feedbacks_url(business_id))
            .header("Api-Key", token)
            .json(&yandex::FeedbackQuery {
                feedback_ids: vec![feedback_id],
            })
            .send()
            .await?;
        let body = read_success(resp).await?;

        let parsed: yandex::FeedbacksResponse = serde_json::from_slice(&body)?;
        parsed
            .result
            .feedbacks
            .into_iter()
            .find(|f| f.id == feedback_id)
            .map(Reaction::YandexFeedback)
            .ok_or_else(|| {
                Error::Decode(serde_json::Error::custom(format!(
                    "feedback {feedback_id} not found in response"
                )))
            })
    }
}
