// src/inbound.rs
//! Push notifications from Yandex Market: origin allow-list and routing into the monitor.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::error::{Error, Result};
use crate::monitor::{InboundOutcome, Monitor};

/// Address ranges Yandex publishes for its outgoing requests.
pub const YANDEX_RANGES: &[&str] = &[
    "5.45.192.0/18",
    "5.255.192.0/18",
    "37.9.64.0/18",
    "37.140.128.0/18",
    "77.88.0.0/18",
    "84.252.160.0/19",
    "87.250.224.0/19",
    "90.156.176.0/22",
    "93.158.128.0/18",
    "95.108.128.0/17",
    "141.8.128.0/18",
    "178.154.128.0/18",
    "185.32.187.0/24",
    "2a02:6b8::/29",
];

#[derive(Debug, Error)]
#[error("invalid address range `{0}`")]
pub struct InvalidRange(pub String);

/// CIDR block (`10.0.0.0/8`, `2a02:6b8::/29`); a bare address is a single-host range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRange {
    network: IpAddr,
    prefix: u8,
}

impl IpRange {
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = canonical(ip);
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(addr)) => {
                let mask = prefix_mask_u32(self.prefix);
                u32::from(net) & mask == u32::from(addr) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(addr)) => {
                let mask = prefix_mask_u128(self.prefix);
                u128::from(net) & mask == u128::from(addr) & mask
            }
            _ => false,
        }
    }
}

impl FromStr for IpRange {
    type Err = InvalidRange;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || InvalidRange(s.to_string());
        let (addr, prefix) = match s.split_once('/') {
            Some((a, p)) => (a, Some(p.parse::<u8>().map_err(|_| invalid())?)),
            None => (s, None),
        };
        let network: IpAddr = addr.parse().map_err(|_| invalid())?;
        let max = if network.is_ipv4() { 32 } else { 128 };
        let prefix = prefix.unwrap_or(max);
        if prefix > max {
            return Err(invalid());
        }
        Ok(Self { network, prefix })
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

fn prefix_mask_u32(prefix: u8) -> u32 {
    match prefix {
        0 => 0,
        p => u32::MAX << (32 - u32::from(p)),
    }
}

fn prefix_mask_u128(prefix: u8) -> u128 {
    match prefix {
        0 => 0,
        p => u128::MAX << (128 - u32::from(p)),
    }
}

/// IPv4-mapped IPv6 callers (`::ffff:a.b.c.d`) are matched as IPv4.
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        v4 => v4,
    }
}

#[derive(Debug, Clone, Default)]
pub struct IpAllowlist {
    ranges: Vec<IpRange>,
}

impl IpAllowlist {
    pub fn new(ranges: Vec<IpRange>) -> Self {
        Self { ranges }
    }

    pub fn yandex() -> Self {
        Self::new(
            YANDEX_RANGES
                .iter()
                .filter_map(|r| r.parse().ok())
                .collect(),
        )
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.ranges.iter().any(|r| r.contains(ip))
    }

    pub fn ranges(&self) -> &[IpRange] {
        &self.ranges
    }
}

/// Entry point for inbound pushes: checks the caller's origin, then hands the
/// raw payload to the monitor.
#[derive(Clone)]
pub struct InboundHandler {
    allowlist: Arc<IpAllowlist>,
    monitor: Monitor,
}

impl InboundHandler {
    pub fn new(allowlist: IpAllowlist, monitor: Monitor) -> Self {
        Self {
            allowlist: Arc::new(allowlist),
            monitor,
        }
    }

    /// Fails with [`Error::Forbidden`] unless `origin` is allow-listed.
    pub fn check_origin(&self, origin: IpAddr) -> Result<()> {
        if !self.allowlist.contains(origin) {
            tracing::warn!(%origin, "inbound notification from address outside the allowlist");
            return Err(Error::Forbidden(origin));
        }
        Ok(())
    }

    pub async fn handle(&self, origin: IpAddr, raw: &[u8]) -> Result<InboundOutcome> {
        self.check_origin(origin)?;
        self.monitor.handle_inbound_notification(raw).await
    }
}
