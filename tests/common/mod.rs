// tests/common/mod.rs
//
// Scripted fakes shared by the integration tests: a reaction source and a
// message sender that records every attempt.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use parking_lot::Mutex;
use tokio::sync::Notify;

use marketplace_notifier::config::MonitorConfig;
use marketplace_notifier::marketplace::{wb, yandex};
use marketplace_notifier::{
    Dispatcher, Error, MessageSender, Monitor, Reaction, ReactionKind, ReactionSource, Result,
};

pub fn ts(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

pub fn wb_question(id: &str, text: &str) -> Reaction {
    Reaction::WbQuestion(wb::Question {
        id: id.to_string(),
        text: text.to_string(),
        product: wb::ProductDetails {
            article: 123456,
            name: "Кружка".to_string(),
        },
        created_at: ts("2024-05-01T10:00:00+03:00"),
    })
}

pub fn wb_feedback(id: &str, stars: u8) -> Reaction {
    Reaction::WbFeedback(wb::Feedback {
        id: id.to_string(),
        stars,
        pros: "удобная".to_string(),
        cons: String::new(),
        text: "Всё хорошо".to_string(),
        product: wb::ProductDetails::default(),
        created_at: ts("2024-05-02T12:30:00+03:00"),
    })
}

pub fn yandex_feedback(id: u64, created_at: &str) -> Reaction {
    Reaction::YandexFeedback(yandex::Feedback {
        id,
        created_at: ts(created_at),
        description: yandex::Description {
            pros: String::new(),
            cons: String::new(),
            text: "Пришло быстро".to_string(),
        },
        statistics: yandex::Statistics {
            rating: 5,
            recommended: true,
        },
        identifiers: yandex::Identifiers { order_id: 77 },
    })
}

fn upstream_down() -> Error {
    Error::UpstreamStatus {
        code: 503,
        body: "unavailable".to_string(),
    }
}

/// Parks a fetch until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

/// `None` for a kind makes its fetch fail.
pub struct FakeSource {
    pub questions: Mutex<Option<Vec<Reaction>>>,
    pub feedbacks: Mutex<Option<Vec<Reaction>>>,
    pub by_id: Mutex<Option<Reaction>>,
    pub question_calls: AtomicUsize,
    pub feedback_calls: AtomicUsize,
    pub by_id_calls: AtomicUsize,
    pub question_gate: Mutex<Option<Arc<Gate>>>,
    pub by_id_gate: Mutex<Option<Arc<Gate>>>,
}

impl FakeSource {
    pub fn new(questions: Option<Vec<Reaction>>, feedbacks: Option<Vec<Reaction>>) -> Arc<Self> {
        Arc::new(Self {
            questions: Mutex::new(questions),
            feedbacks: Mutex::new(feedbacks),
            by_id: Mutex::new(None),
            question_calls: AtomicUsize::new(0),
            feedback_calls: AtomicUsize::new(0),
            by_id_calls: AtomicUsize::new(0),
            question_gate: Mutex::new(None),
            by_id_gate: Mutex::new(None),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(Some(vec![]), Some(vec![]))
    }

    pub fn with_feedback(self: Arc<Self>, reaction: Reaction) -> Arc<Self> {
        *self.by_id.lock() = Some(reaction);
        self
    }

    /// Question fetches park on `gate` until it is released.
    pub fn gate_questions(&self, gate: Arc<Gate>) {
        *self.question_gate.lock() = Some(gate);
    }

    /// Single-feedback fetches park on `gate` until it is released.
    pub fn gate_by_id(&self, gate: Arc<Gate>) {
        *self.by_id_gate.lock() = Some(gate);
    }

    pub fn calls(&self) -> (usize, usize) {
        (
            self.question_calls.load(Ordering::SeqCst),
            self.feedback_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait::async_trait]
impl ReactionSource for FakeSource {
    async fn fetch_new(&self, kind: ReactionKind) -> Result<Vec<Reaction>> {
        let slot = match kind {
            ReactionKind::Question => {
                self.question_calls.fetch_add(1, Ordering::SeqCst);
                let gate = self.question_gate.lock().clone();
                if let Some(gate) = gate {
                    gate.pass().await;
                }
                &self.questions
            }
            ReactionKind::Feedback => {
                self.feedback_calls.fetch_add(1, Ordering::SeqCst);
                &self.feedbacks
            }
        };
        slot.lock().clone().ok_or_else(upstream_down)
    }

    async fn fetch_feedback(&self, _business_id: u64, feedback_id: u64) -> Result<Reaction> {
        self.by_id_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.by_id_gate.lock().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        match self.by_id.lock().clone() {
            Some(r) if r.id() == feedback_id.to_string() => Ok(r),
            _ => Err(upstream_down()),
        }
    }
}

/// Records `(chat_id, text)` for each attempt; chats in `failing` reject.
#[derive(Default)]
pub struct RecordingSender {
    pub failing: Mutex<HashSet<String>>,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_chat(&self, chat_id: &str) {
        self.failing.lock().insert(chat_id.to_string());
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, t)| t.clone()).collect()
    }
}

#[async_trait::async_trait]
impl MessageSender for RecordingSender {
    async fn send_to(&self, chat_id: &str, text: &str) -> Result<()> {
        self.sent.lock().push((chat_id.to_string(), text.to_string()));
        if self.failing.lock().contains(chat_id) {
            return Err(Error::UpstreamStatus {
                code: 400,
                body: "chat not found".to_string(),
            });
        }
        Ok(())
    }
}

pub fn monitor_with(
    source: Arc<FakeSource>,
    sender: Arc<RecordingSender>,
    chats: &[&str],
    check_interval: Duration,
) -> Monitor {
    let dispatcher = Dispatcher::new(chats.iter().map(|s| s.to_string()).collect(), sender);
    Monitor::new(&MonitorConfig { check_interval }, source, dispatcher)
}
