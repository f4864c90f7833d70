// src/config/mod.rs
//! Process configuration, read once at start-up from the environment (and `.env`).

pub mod allowlist;
pub mod env;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::inbound::{IpAllowlist, IpRange, YANDEX_RANGES};
use crate::monitor::MAX_CHECK_INTERVAL;
use crate::ratelimit::RateBudget;
use env::EnvReader;

pub const DEFAULT_WB_BASE_URL: &str = "https://feedbacks-api.wildberries.ru/api/v1/";
pub const DEFAULT_YANDEX_BASE_URL: &str = "https://api.partner.market.yandex.ru/";
pub const DEFAULT_TELEGRAM_BASE_URL: &str = "https://api.telegram.org";

pub const ENV_ALLOWLIST_PATH: &str = "INBOUND_ALLOWLIST_PATH";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub monitor: MonitorConfig,
    pub marketplaces: MarketplacesConfig,
    pub telegram: TelegramConfig,
    pub inbound: InboundConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub control_token: String,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub check_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct MarketplacesConfig {
    pub wb: WbConfig,
    pub yandex: YandexConfig,
    /// Request timeout for every marketplace call.
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct WbConfig {
    pub jwt: String,
    pub base_url: String,
    pub rate: RateBudget,
    pub max_new_questions: u32,
    pub max_new_feedbacks: u32,
}

impl WbConfig {
    pub fn questions_url(&self) -> String {
        join_url(&self.base_url, "questions")
    }

    pub fn feedbacks_url(&self) -> String {
        join_url(&self.base_url, "feedbacks")
    }
}

#[derive(Debug, Clone)]
pub struct YandexConfig {
    /// Without a token inbound feedback events cannot be resolved.
    pub api_token: Option<String>,
    pub base_url: String,
    pub rate: RateBudget,
}

impl YandexConfig {
    pub fn feedbacks_url(&self, business_id: u64) -> String {
        join_url(
            &self.base_url,
            &format!("businesses/{business_id}/goods-feedback"),
        )
    }
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_ids: Vec<String>,
    pub api_base_url: String,
    pub timeout: Duration,
    pub rate: RateBudget,
}

#[derive(Debug, Clone)]
pub struct InboundConfig {
    pub allowlist: Vec<IpRange>,
    /// Take the caller address from `X-Forwarded-For` / `X-Real-IP`.
    pub trust_forwarded_for: bool,
}

impl InboundConfig {
    pub fn to_allowlist(&self) -> IpAllowlist {
        IpAllowlist::new(self.allowlist.clone())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader::new(get);

        let cfg = Config {
            server: ServerConfig {
                port: env.parse("SERVER_PORT", 8080u16),
                control_token: env.string("CONTROL_TOKEN", ""),
            },
            monitor: MonitorConfig {
                check_interval: env.duration("CHECK_INTERVAL", Duration::from_secs(120)),
            },
            marketplaces: MarketplacesConfig {
                wb: WbConfig {
                    jwt: env.string("WB_JWT", ""),
                    base_url: env.string("WB_BASE_URL", DEFAULT_WB_BASE_URL),
                    rate: RateBudget::new(env.parse("WB_RPS", 3.0), env.parse("WB_BURST", 6u32)),
                    max_new_questions: env.parse("MAX_NEW_QUESTIONS_TO_FETCH", 20u32),
                    max_new_feedbacks: env.parse("MAX_NEW_FEEDBACKS_TO_FETCH", 20u32),
                },
                yandex: YandexConfig {
                    api_token: env.opt("YANDEX_API_TOKEN"),
                    base_url: env.string("YANDEX_BASE_URL", DEFAULT_YANDEX_BASE_URL),
                    rate: RateBudget::new(
                        env.parse("YANDEX_RPS", 3.0),
                        env.parse("YANDEX_BURST", 6u32),
                    ),
                },
                timeout: env.duration("MARKETPLACE_API_TIMEOUT", Duration::from_secs(30)),
            },
            telegram: TelegramConfig {
                bot_token: env.string("TELEGRAM_BOT_TOKEN", ""),
                chat_ids: env
                    .list("TELEGRAM_CHAT_IDS")
                    .or_else(|| env.list("TELEGRAM_CHAT_ID"))
                    .unwrap_or_default(),
                api_base_url: env.string("TELEGRAM_API_BASE_URL", DEFAULT_TELEGRAM_BASE_URL),
                timeout: env.duration("TELEGRAM_API_TIMEOUT", Duration::from_secs(30)),
                rate: RateBudget::new(
                    env.parse("TELEGRAM_RPS", 1.0),
                    env.parse("TELEGRAM_BURST", 1u32),
                ),
            },
            inbound: InboundConfig {
                allowlist: load_allowlist(&env)?,
                trust_forwarded_for: env.flag("TRUST_FORWARDED_FOR"),
            },
        };

        cfg.validate().context("error loading config")?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.server.control_token.is_empty() {
            bail!("missing CONTROL_TOKEN");
        }
        if self.marketplaces.wb.jwt.is_empty() {
            bail!("missing WB_JWT");
        }
        if self.telegram.bot_token.is_empty() {
            bail!("missing TELEGRAM_BOT_TOKEN");
        }
        if self.telegram.chat_ids.is_empty() {
            bail!("missing TELEGRAM_CHAT_IDS");
        }
        if self.monitor.check_interval.is_zero() {
            bail!("CHECK_INTERVAL must be greater than zero");
        }
        if self.monitor.check_interval > MAX_CHECK_INTERVAL {
            bail!("CHECK_INTERVAL must not exceed {MAX_CHECK_INTERVAL:?}");
        }
        for (name, rate) in [
            ("WB", self.marketplaces.wb.rate),
            ("YANDEX", self.marketplaces.yandex.rate),
            ("TELEGRAM", self.telegram.rate),
        ] {
            if !(rate.per_second > 0.0) || rate.burst == 0 {
                bail!("{name}_RPS and {name}_BURST must be positive");
            }
        }
        Ok(())
    }
}

/// Allowlist source, first match wins:
/// 1) file at $INBOUND_ALLOWLIST_PATH
/// 2) $INBOUND_ALLOWED_CIDRS
/// 3) published Yandex ranges
fn load_allowlist<F>(env: &EnvReader<F>) -> Result<Vec<IpRange>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(p) = env.opt(ENV_ALLOWLIST_PATH) {
        let path = PathBuf::from(p);
        if !path.exists() {
            bail!("{ENV_ALLOWLIST_PATH} points to non-existent path");
        }
        return allowlist::load_ranges_from(&path);
    }
    if let Some(list) = env.list("INBOUND_ALLOWED_CIDRS") {
        return allowlist::parse_ranges(list).context("parsing INBOUND_ALLOWED_CIDRS");
    }
    allowlist::parse_ranges(YANDEX_RANGES.iter())
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
