//! Heuristic separating security scanners and link checkers from humans.
//!
//! Mail security gateways, link preview services and crawlers routinely open
//! tracking pixels and follow links seconds after delivery. Counting those as
//! victims would inflate campaign results, so every tracking event goes
//! through [`BotDetector::classify`] before touching the counters.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

use crate::domain::tracking::{AutomationReason, Classification};
use crate::models::config::ServerConfig;

const USER_AGENT_PATTERNS: &[&str] = &[
    r"(?i)(?:sqlmap|nikto|nessus|openvas|nmap|masscan|zmap|qualys|nuclei)",
    r"(?i)(?:burp\s*suite|owasp\s*zap|w3af|acunetix|appscan)",
    r"(?i)(?:proofpoint|mimecast|barracuda|ironport|safelinks|forcepoint|fireeye|trendmicro|symantec|sophos)",
    r"(?i)(?:microsoft office protection|office365 link|outlook-ios-linkpreview)",
    r"(?i)(?:bot\b|crawler|spider|slurp|facebookexternalhit|linkcheck|link-check|validator)",
    r"(?i)(?:python-requests|python-urllib|aiohttp|go-http-client|java/\d|curl/\d|wget/\d|libwww-perl|okhttp|axios|node-fetch|httpclient)",
    r"(?i)(?:scrapy|phantomjs|headless|selenium|puppeteer|playwright)",
];

/// Mail security gateways and crawler networks known to prefetch links.
const VENDOR_RANGES: &[&str] = &[
    // Microsoft Exchange Online Protection
    "40.92.0.0/15",
    "40.107.0.0/16",
    "52.100.0.0/14",
    "104.47.0.0/17",
    // Google crawlers and mail image proxy
    "66.249.64.0/19",
    "209.85.128.0/17",
    // Proofpoint
    "67.231.144.0/20",
    "148.163.128.0/17",
    // Mimecast
    "205.139.110.0/24",
    "207.211.30.0/24",
    // Barracuda
    "64.235.144.0/20",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IpRangeError {
    #[error("invalid network address in {0}")]
    InvalidAddress(String),
    #[error("invalid prefix length in {0}")]
    InvalidPrefix(String),
}

/// An IPv4 or IPv6 network in CIDR notation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IpRange {
    network: IpAddr,
    prefix: u8,
}

impl IpRange {
    /// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) match IPv4 ranges.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip.to_canonical()) {
            (IpAddr::V4(network), IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix)).unwrap_or(0);
                u32::from(network) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(network), IpAddr::V6(ip)) => {
                let mask = u128::MAX
                    .checked_shl(128 - u32::from(self.prefix))
                    .unwrap_or(0);
                u128::from(network) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

impl FromStr for IpRange {
    type Err = IpRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (address, prefix) = match s.split_once('/') {
            Some((address, prefix)) => (address, Some(prefix)),
            None => (s, None),
        };

        let network =
            IpAddr::from_str(address).map_err(|_| IpRangeError::InvalidAddress(s.to_string()))?;
        let max_prefix = if network.is_ipv4() { 32 } else { 128 };
        let prefix = match prefix {
            Some(prefix) => prefix
                .parse::<u8>()
                .ok()
                .filter(|prefix| *prefix <= max_prefix)
                .ok_or_else(|| IpRangeError::InvalidPrefix(s.to_string()))?,
            None => max_prefix,
        };

        Ok(Self { network, prefix })
    }
}

/// Parses a client address as reported by the HTTP layer, with or without port.
pub fn parse_client_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    IpAddr::from_str(raw)
        .ok()
        .or_else(|| SocketAddr::from_str(raw).ok().map(|addr| addr.ip()))
}

#[derive(Clone, Debug)]
pub struct BotDetector {
    user_agent_patterns: Vec<Regex>,
    ip_ranges: Vec<IpRange>,
    min_human_delay_secs: i64,
}

impl BotDetector {
    /// Builds the detector from the built-in rules plus extra CIDR ranges.
    ///
    /// Extra ranges that fail to parse are skipped with a warning.
    pub fn new(min_human_delay_secs: i64, extra_ranges: &[String]) -> Self {
        let user_agent_patterns = USER_AGENT_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        let mut ip_ranges: Vec<IpRange> = VENDOR_RANGES
            .iter()
            .filter_map(|range| range.parse().ok())
            .collect();

        for range in extra_ranges {
            match range.parse::<IpRange>() {
                Ok(parsed) => ip_ranges.push(parsed),
                Err(err) => log::warn!("Ignoring bot IP range: {err}"),
            }
        }

        Self {
            user_agent_patterns,
            ip_ranges,
            min_human_delay_secs,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.min_human_click_delay_secs, &config.bot_ip_ranges)
    }

    fn is_scanner_user_agent(&self, user_agent: &str) -> bool {
        self.user_agent_patterns
            .iter()
            .any(|pattern| pattern.is_match(user_agent))
    }

    fn is_vendor_ip(&self, ip: &str) -> bool {
        parse_client_ip(ip)
            .is_some_and(|ip| self.ip_ranges.iter().any(|range| range.contains(ip)))
    }

    /// Classifies one tracking event.
    ///
    /// `seconds_since_sent` is the delay between delivery and the event;
    /// `None` skips the timing rule.
    pub fn classify(
        &self,
        user_agent: Option<&str>,
        ip: Option<&str>,
        seconds_since_sent: Option<i64>,
    ) -> Classification {
        let user_agent = user_agent.map(str::trim).unwrap_or_default();

        if user_agent.is_empty() {
            return Classification::Automated(AutomationReason::MissingUserAgent);
        }
        if self.is_scanner_user_agent(user_agent) {
            return Classification::Automated(AutomationReason::ScannerUserAgent);
        }
        if ip.is_some_and(|ip| self.is_vendor_ip(ip)) {
            return Classification::Automated(AutomationReason::SecurityVendorIp);
        }
        if seconds_since_sent.is_some_and(|elapsed| elapsed < self.min_human_delay_secs) {
            return Classification::Automated(AutomationReason::TooFast);
        }

        Classification::Human
    }

    pub fn is_automated_scan(&self, user_agent: Option<&str>, ip: Option<&str>) -> bool {
        self.classify(user_agent, ip, None).is_automated()
    }
}

impl Default for BotDetector {
    fn default() -> Self {
        Self::new(3, &[])
    }
}
