// src/config/env.rs
//! Typed reads over a key/value lookup (the process environment in production).

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub struct EnvReader<F> {
    get: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(get: F) -> Self {
        Self { get }
    }

    /// Trimmed value; empty counts as unset.
    pub fn opt(&self, key: &str) -> Option<String> {
        (self.get)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn string(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    /// Parsed value, or `default` (with a warning) when the value does not parse.
    pub fn parse<T: FromStr + Copy + std::fmt::Debug>(&self, key: &str, default: T) -> T {
        match self.opt(key) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(key, value = %raw, ?default, "invalid config value, using default");
                default
            }),
        }
    }

    pub fn duration(&self, key: &str, default: Duration) -> Duration {
        match self.opt(key) {
            None => default,
            Some(raw) => parse_duration(&raw).unwrap_or_else(|| {
                warn!(key, value = %raw, ?default, "invalid duration, using default");
                default
            }),
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.opt(key).map(|v| v.to_ascii_lowercase()).as_deref(),
            Some("1" | "true" | "yes" | "on")
        )
    }

    /// Comma-separated list; blanks dropped, order and duplicates kept.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        let raw = self.opt(key)?;
        let items: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        (!items.is_empty()).then_some(items)
    }
}

/// Parse durations like `90s`, `2m`, `1h30m`, `1.5h`, `500ms`; a bare integer is seconds.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let is_num = |c: char| c.is_ascii_digit() || c == '.';
    let mut total_secs = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_end = rest.find(|c: char| !is_num(c)).unwrap_or(rest.len());
        if num_end == 0 {
            return None;
        }
        let value: f64 = rest[..num_end].parse().ok()?;
        rest = &rest[num_end..];

        let unit_end = rest.find(is_num).unwrap_or(rest.len());
        let factor = match &rest[..unit_end] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return None,
        };
        total_secs += value * factor;
        rest = &rest[unit_end..];
    }
    Duration::try_from_secs_f64(total_secs).ok()
}
