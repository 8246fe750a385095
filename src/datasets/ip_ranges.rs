//! Cloud provider IP range documents
//!
//! The document format follows the AWS `ip-ranges.json` publication:
//!
//! ```json
//! {
//!   "syncToken": "1700000000",
//!   "createDate": "2023-11-14-22-13-20",
//!   "prefixes": [
//!     {"ip_prefix": "3.5.140.0/22", "region": "ap-northeast-2",
//!      "service": "AMAZON", "network_border_group": "ap-northeast-2"}
//!   ],
//!   "ipv6_prefixes": [ ... ]
//! }
//! ```
//!
//! Only the IPv4 `ip_prefix` field of the `prefixes` list is turned into
//! matchable [`Prefix`] values. Entries without it are skipped silently and
//! entries with an unparsable CIDR are skipped with a warning.

use crate::error::{BlocklensError, BlocklensResult};
use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Default AWS IP ranges publication
pub const AWS_IP_RANGES_URL: &str = "https://ip-ranges.amazonaws.com/ip-ranges.json";

const CREATE_DATE_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// One metadata entry of the ranges document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpRangeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_prefix: Option<String>,
    pub region: String,
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_border_group: Option<String>,
}

/// The full ranges document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpRanges {
    #[serde(rename = "syncToken", default)]
    pub sync_token: String,
    #[serde(rename = "createDate", default)]
    pub create_date: String,
    #[serde(default)]
    pub prefixes: Vec<IpRangeEntry>,
    #[serde(default)]
    pub ipv6_prefixes: Vec<IpRangeEntry>,
}

/// A provider-owned network prefix with its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prefix {
    /// Parsed network, used for containment tests
    pub network: IpNet,
    /// CIDR text exactly as published
    pub cidr: String,
    pub region: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_border_group: Option<String>,
}

/// Result of turning a document's entries into prefixes
#[derive(Debug, Default)]
pub struct ParsedPrefixes {
    /// Usable prefixes in document order
    pub prefixes: Vec<Prefix>,
    /// Entries without an IPv4 CIDR
    pub skipped_absent: usize,
    /// Entries whose CIDR did not parse
    pub skipped_invalid: Vec<BlocklensError>,
}

/// Restricts prefixes to a set of regions and/or services.
///
/// An empty list matches everything. Comparison ignores ASCII case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrefixFilter {
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
}

impl PrefixFilter {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.services.is_empty()
    }

    pub fn matches(&self, prefix: &Prefix) -> bool {
        let region_ok = self.regions.is_empty()
            || self
                .regions
                .iter()
                .any(|r| r.eq_ignore_ascii_case(&prefix.region));
        let service_ok = self.services.is_empty()
            || self
                .services
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&prefix.service));
        region_ok && service_ok
    }
}

/// Turn a single metadata entry into a prefix.
///
/// Returns `Ok(None)` when the entry carries no IPv4 CIDR.
pub fn parse_prefix(entry: &IpRangeEntry) -> BlocklensResult<Option<Prefix>> {
    let cidr = match entry.ip_prefix.as_deref().map(str::trim) {
        None | Some("") => return Ok(None),
        Some(c) => c,
    };

    let network = cidr
        .parse::<IpNet>()
        .map_err(|e| BlocklensError::InvalidPrefix {
            cidr: cidr.to_string(),
            reason: e.to_string(),
        })?;

    Ok(Some(Prefix {
        network,
        cidr: cidr.to_string(),
        region: entry.region.clone(),
        service: entry.service.clone(),
        network_border_group: entry.network_border_group.clone(),
    }))
}

impl IpRanges {
    pub fn from_json_str(content: &str) -> BlocklensResult<Self> {
        serde_json::from_str(content).map_err(|e| BlocklensError::Document {
            path: "<string>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Load a ranges document from a local path or URL
    pub fn from_path(path: &str) -> Result<Self> {
        let content = oneio::read_to_string(path).map_err(|e| BlocklensError::Fetch {
            url: path.to_string(),
            reason: e.to_string(),
        })?;
        let ranges: IpRanges =
            serde_json::from_str(&content).map_err(|e| BlocklensError::Document {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        info!(
            "loaded {} prefix entries from {} (syncToken {})",
            ranges.prefixes.len(),
            path,
            ranges.sync_token
        );
        Ok(ranges)
    }

    /// Parsed `createDate`, if it follows the provider's format
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.create_date, CREATE_DATE_FORMAT)
            .ok()
            .map(|dt| dt.and_utc())
    }

    /// Parse every entry into a prefix, skipping the ones that cannot be used
    pub fn prefixes(&self) -> ParsedPrefixes {
        let mut parsed = ParsedPrefixes::default();
        for entry in &self.prefixes {
            match parse_prefix(entry) {
                Ok(Some(prefix)) => parsed.prefixes.push(prefix),
                Ok(None) => parsed.skipped_absent += 1,
                Err(e) => {
                    warn!("skipping {}/{} entry: {}", entry.region, entry.service, e);
                    parsed.skipped_invalid.push(e);
                }
            }
        }
        parsed
    }

    /// Parse entries and keep only those accepted by `filter`
    pub fn filtered_prefixes(&self, filter: &PrefixFilter) -> ParsedPrefixes {
        let mut parsed = self.prefixes();
        if !filter.is_empty() {
            parsed.prefixes.retain(|p| filter.matches(p));
        }
        parsed
    }

    /// Distinct region names, sorted
    pub fn regions(&self) -> Vec<String> {
        self.all_entries()
            .map(|e| e.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct service names, sorted
    pub fn services(&self) -> Vec<String> {
        self.all_entries()
            .map(|e| e.service.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn all_entries(&self) -> impl Iterator<Item = &IpRangeEntry> {
        self.prefixes.iter().chain(self.ipv6_prefixes.iter())
    }
}
