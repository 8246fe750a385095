//! Cross-reference lens: blocked addresses against provider prefixes
//!
//! This module provides the `XrefLens`, the matching engine of blocklens.
//! Given the prefixes parsed from a ranges document and the addresses parsed
//! from a blocklist, it produces one [`MatchRecord`] per (prefix, address)
//! pair where the prefix contains the address.
//!
//! Records come out in prefix order and, within a prefix, in blocklist order.
//! Overlapping prefixes yield one record each; nothing is deduplicated.
//!
//! # Example
//!
//! ```rust,ignore
//! use blocklens::datasets::{parse_blocklist, IpRanges};
//! use blocklens::lens::xref::XrefLens;
//!
//! let ranges = IpRanges::from_path("ip-ranges.json")?;
//! let prefixes = ranges.prefixes().prefixes;
//! let blocklist = parse_blocklist(&std::fs::read_to_string("ips.txt")?);
//!
//! let lens = XrefLens::new();
//! let records = lens.match_all(&prefixes, &blocklist.addresses);
//! ```

use crate::datasets::Prefix;
use crate::lens::utils::OutputFormat;
use ipnet::IpNet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;

// =============================================================================
// Types
// =============================================================================

/// One blocked address found inside one provider prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "display", derive(tabled::Tabled))]
pub struct MatchRecord {
    pub region: String,
    pub service: String,
    /// Prefix text as published by the provider
    pub prefix: String,
    pub address: IpAddr,
}

impl MatchRecord {
    fn new(prefix: &Prefix, address: IpAddr) -> Self {
        Self {
            region: prefix.region.clone(),
            service: prefix.service.clone(),
            prefix: prefix.cidr.clone(),
            address,
        }
    }

    /// Render the record as a delimited line without trailing newline
    pub fn to_delimited(&self, separator: char) -> String {
        format!(
            "{}{sep}{}{sep}{}{sep}{}",
            self.region,
            self.service,
            self.prefix,
            self.address,
            sep = separator
        )
    }
}

/// Counters describing one cross-reference run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub prefix_entries: usize,
    pub prefixes_used: usize,
    pub prefixes_without_cidr: usize,
    pub prefixes_invalid: usize,
    pub addresses: usize,
    pub addresses_invalid: usize,
    pub matches: usize,
    pub matched_addresses: usize,
}

impl std::fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "prefixes:  {} entries, {} used, {} without IPv4 CIDR, {} invalid",
            self.prefix_entries,
            self.prefixes_used,
            self.prefixes_without_cidr,
            self.prefixes_invalid
        )?;
        writeln!(
            f,
            "addresses: {} parsed, {} invalid",
            self.addresses, self.addresses_invalid
        )?;
        write!(
            f,
            "matches:   {} records, {} distinct addresses",
            self.matches, self.matched_addresses
        )
    }
}

// =============================================================================
// Args
// =============================================================================

/// Arguments controlling a cross-reference run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct XrefArgs {
    /// Only consider prefixes in these regions (repeatable)
    #[cfg_attr(feature = "cli", clap(long = "region", value_name = "REGION"))]
    #[serde(default)]
    pub regions: Vec<String>,

    /// Only consider prefixes of these services (repeatable)
    #[cfg_attr(feature = "cli", clap(long = "service", value_name = "SERVICE"))]
    #[serde(default)]
    pub services: Vec<String>,

    /// Split the matching work across threads
    #[cfg_attr(feature = "cli", clap(long))]
    #[serde(default)]
    pub parallel: bool,
}

impl XrefArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.regions.push(region.into());
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.services.push(service.into());
        self
    }

    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    pub fn filter(&self) -> crate::datasets::PrefixFilter {
        crate::datasets::PrefixFilter {
            regions: self.regions.clone(),
            services: self.services.clone(),
        }
    }
}

// =============================================================================
// Containment
// =============================================================================

/// Whether `network` contains `addr`.
///
/// Both sides are masked to the network's prefix length and compared.
/// Addresses of the other family are never contained.
pub fn contains(network: &IpNet, addr: &IpAddr) -> bool {
    match (network, addr) {
        (IpNet::V4(net), IpAddr::V4(a)) => {
            let mask = u32::from(net.netmask());
            u32::from(*a) & mask == u32::from(net.addr()) & mask
        }
        (IpNet::V6(net), IpAddr::V6(a)) => {
            let mask = u128::from(net.netmask());
            u128::from(*a) & mask == u128::from(net.addr()) & mask
        }
        _ => false,
    }
}

// =============================================================================
// Lens
// =============================================================================

/// Matching engine for blocked addresses and provider prefixes
#[derive(Debug, Clone, Copy, Default)]
pub struct XrefLens;

impl XrefLens {
    pub fn new() -> Self {
        Self
    }

    /// Run matching according to `args` (filtering is done by the caller
    /// when parsing prefixes, see [`XrefArgs::filter`])
    pub fn run(
        &self,
        args: &XrefArgs,
        prefixes: &[Prefix],
        addresses: &[IpAddr],
    ) -> Vec<MatchRecord> {
        if args.parallel {
            self.match_all_parallel(prefixes, addresses)
        } else {
            self.match_all(prefixes, addresses)
        }
    }

    /// Match every prefix against every address, sequentially
    pub fn match_all(&self, prefixes: &[Prefix], addresses: &[IpAddr]) -> Vec<MatchRecord> {
        let mut records = Vec::new();
        for prefix in prefixes {
            records.extend(Self::matches_for(prefix, addresses));
        }
        records
    }

    /// Same output as [`XrefLens::match_all`], with prefixes spread over the
    /// rayon thread pool. Each prefix's list is built by a single worker and
    /// the lists are concatenated in prefix order.
    pub fn match_all_parallel(
        &self,
        prefixes: &[Prefix],
        addresses: &[IpAddr],
    ) -> Vec<MatchRecord> {
        prefixes
            .par_iter()
            .map(|prefix| Self::matches_for(prefix, addresses))
            .collect::<Vec<Vec<MatchRecord>>>()
            .into_iter()
            .flatten()
            .collect()
    }

    /// All prefixes containing a single address, in prefix order
    pub fn lookup<'p>(&self, prefixes: &'p [Prefix], addr: &IpAddr) -> Vec<&'p Prefix> {
        prefixes
            .iter()
            .filter(|p| contains(&p.network, addr))
            .collect()
    }

    /// Build run counters from the parse results and the produced records
    pub fn summarize(
        &self,
        parsed_prefixes: &crate::datasets::ParsedPrefixes,
        prefix_entries: usize,
        blocklist: &crate::datasets::ParsedBlocklist,
        records: &[MatchRecord],
    ) -> MatchSummary {
        let matched: HashSet<&IpAddr> = records.iter().map(|r| &r.address).collect();
        MatchSummary {
            prefix_entries,
            prefixes_used: parsed_prefixes.prefixes.len(),
            prefixes_without_cidr: parsed_prefixes.skipped_absent,
            prefixes_invalid: parsed_prefixes.skipped_invalid.len(),
            addresses: blocklist.addresses.len(),
            addresses_invalid: blocklist.rejected.len(),
            matches: records.len(),
            matched_addresses: matched.len(),
        }
    }

    fn matches_for(prefix: &Prefix, addresses: &[IpAddr]) -> Vec<MatchRecord> {
        addresses
            .iter()
            .filter(|addr| contains(&prefix.network, addr))
            .map(|addr| MatchRecord::new(prefix, *addr))
            .collect()
    }

    // =========================================================================
    // Formatting
    // =========================================================================

    /// Format records for terminal display
    pub fn format_records(&self, records: &[MatchRecord], format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => serde_json::to_string(records).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(records).unwrap_or_default(),
            OutputFormat::JsonLine => records
                .iter()
                .filter_map(|r| serde_json::to_string(r).ok())
                .collect::<Vec<_>>()
                .join("\n"),
            #[cfg(feature = "display")]
            OutputFormat::Table => {
                use tabled::settings::Style;
                use tabled::Table;
                Table::new(records).with(Style::rounded()).to_string()
            }
            #[cfg(feature = "display")]
            OutputFormat::Markdown => {
                use tabled::settings::Style;
                use tabled::Table;
                Table::new(records).with(Style::markdown()).to_string()
            }
            other => {
                let sep = other.separator().unwrap_or('\t');
                let mut lines = vec![crate::report::REPORT_HEADER.join(&sep.to_string())];
                lines.extend(records.iter().map(|r| r.to_delimited(sep)));
                lines.join("\n")
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(cidr: &str, region: &str, service: &str) -> Prefix {
        Prefix {
            network: cidr.parse().unwrap(),
            cidr: cidr.to_string(),
            region: region.to_string(),
            service: service.to_string(),
            network_border_group: None,
        }
    }

    fn addrs(list: &[&str]) -> Vec<IpAddr> {
        list.iter().map(|a| a.parse().unwrap()).collect()
    }

    #[test]
    fn test_contains_v4() {
        let net: IpNet = "203.0.113.0/24".parse().unwrap();
        assert!(contains(&net, &"203.0.113.0".parse().unwrap()));
        assert!(contains(&net, &"203.0.113.255".parse().unwrap()));
        assert!(!contains(&net, &"203.0.114.1".parse().unwrap()));
        assert!(!contains(&net, &"203.0.112.255".parse().unwrap()));
    }

    #[test]
    fn test_contains_host_bits_in_base() {
        let net: IpNet = "203.0.113.77/24".parse().unwrap();
        assert!(contains(&net, &"203.0.113.5".parse().unwrap()));
    }

    #[test]
    fn test_contains_family_mismatch() {
        let v4: IpNet = "0.0.0.0/0".parse().unwrap();
        let v6: IpNet = "::/0".parse().unwrap();
        assert!(!contains(&v4, &"::1".parse().unwrap()));
        assert!(!contains(&v6, &"10.0.0.1".parse().unwrap()));
        assert!(contains(&v4, &"10.0.0.1".parse().unwrap()));
        assert!(contains(&v6, &"::1".parse().unwrap()));
    }

    #[test]
    fn test_full_length_is_equality() {
        let net: IpNet = "198.51.100.7/32".parse().unwrap();
        assert!(contains(&net, &"198.51.100.7".parse().unwrap()));
        assert!(!contains(&net, &"198.51.100.6".parse().unwrap()));
        assert!(!contains(&net, &"198.51.100.8".parse().unwrap()));

        let net: IpNet = "2001:db8::7/128".parse().unwrap();
        assert!(contains(&net, &"2001:db8::7".parse().unwrap()));
        assert!(!contains(&net, &"2001:db8::8".parse().unwrap()));
    }

    #[test]
    fn test_contains_agrees_with_masking_law() {
        // every /N between 0 and 32 around a fixed base
        let addr: IpAddr = "10.20.30.40".parse().unwrap();
        for len in 0..=32u8 {
            let net: IpNet = format!("10.20.0.0/{}", len).parse().unwrap();
            let mask: u32 = if len == 0 { 0 } else { u32::MAX << (32 - len) };
            let expected = (u32::from_be_bytes([10, 20, 30, 40]) & mask)
                == (u32::from_be_bytes([10, 20, 0, 0]) & mask);
            assert_eq!(contains(&net, &addr), expected, "/{len}");
        }
    }

    #[test]
    fn test_single_match() {
        let prefixes = vec![prefix("203.0.113.0/24", "eu-west-1", "EC2")];
        let addresses = addrs(&["203.0.113.5", "203.0.114.1"]);

        let records = XrefLens::new().match_all(&prefixes, &addresses);
        assert_eq!(
            records,
            vec![MatchRecord {
                region: "eu-west-1".to_string(),
                service: "EC2".to_string(),
                prefix: "203.0.113.0/24".to_string(),
                address: "203.0.113.5".parse().unwrap(),
            }]
        );
    }

    #[test]
    fn test_order_and_overlap() {
        let prefixes = vec![
            prefix("10.0.0.0/8", "us-east-1", "AMAZON"),
            prefix("10.1.0.0/16", "us-east-1", "EC2"),
        ];
        let addresses = addrs(&["10.1.2.3", "192.0.2.1", "10.9.9.9", "10.1.0.1"]);

        let records = XrefLens::new().match_all(&prefixes, &addresses);
        let got: Vec<(String, String)> = records
            .iter()
            .map(|r| (r.prefix.clone(), r.address.to_string()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("10.0.0.0/8".to_string(), "10.1.2.3".to_string()),
                ("10.0.0.0/8".to_string(), "10.9.9.9".to_string()),
                ("10.0.0.0/8".to_string(), "10.1.0.1".to_string()),
                ("10.1.0.0/16".to_string(), "10.1.2.3".to_string()),
                ("10.1.0.0/16".to_string(), "10.1.0.1".to_string()),
            ]
        );
    }

    #[test]
    fn test_deterministic_and_parallel_identical() {
        let prefixes: Vec<Prefix> = (0..64u8)
            .map(|i| prefix(&format!("10.{}.0.0/16", i), "r", "s"))
            .collect();
        let addresses: Vec<IpAddr> = (0..200u32)
            .map(|i| IpAddr::from([10, (i % 70) as u8, (i / 7) as u8, 1]))
            .collect();

        let lens = XrefLens::new();
        let first = lens.match_all(&prefixes, &addresses);
        let second = lens.match_all(&prefixes, &addresses);
        let parallel = lens.match_all_parallel(&prefixes, &addresses);
        assert!(!first.is_empty());
        assert_eq!(first, second);
        assert_eq!(first, parallel);

        let args = XrefArgs::new().parallel();
        assert_eq!(lens.run(&args, &prefixes, &addresses), first);
    }

    #[test]
    fn test_empty_inputs() {
        let lens = XrefLens::new();
        let prefixes = vec![prefix("10.0.0.0/8", "r", "s")];
        assert!(lens.match_all(&prefixes, &[]).is_empty());
        assert!(lens.match_all(&[], &addrs(&["10.0.0.1"])).is_empty());
    }

    #[test]
    fn test_lookup() {
        let prefixes = vec![
            prefix("10.0.0.0/8", "us-east-1", "AMAZON"),
            prefix("192.0.2.0/24", "eu-west-1", "S3"),
            prefix("10.1.0.0/16", "us-east-1", "EC2"),
        ];
        let found = XrefLens::new().lookup(&prefixes, &"10.1.1.1".parse().unwrap());
        let cidrs: Vec<&str> = found.iter().map(|p| p.cidr.as_str()).collect();
        assert_eq!(cidrs, vec!["10.0.0.0/8", "10.1.0.0/16"]);
    }

    #[test]
    fn test_format_records_delimited() {
        let prefixes = vec![prefix("203.0.113.0/24", "eu-west-1", "EC2")];
        let records = XrefLens::new().match_all(&prefixes, &addrs(&["203.0.113.5"]));

        let tsv = XrefLens::new().format_records(&records, OutputFormat::Tsv);
        assert_eq!(
            tsv,
            "region\tservice\tip_prefix\tip\neu-west-1\tEC2\t203.0.113.0/24\t203.0.113.5"
        );

        let psv = XrefLens::new().format_records(&records, OutputFormat::Psv);
        assert!(psv.ends_with("eu-west-1|EC2|203.0.113.0/24|203.0.113.5"));
    }

    #[test]
    fn test_format_records_json() {
        let prefixes = vec![prefix("203.0.113.0/24", "eu-west-1", "EC2")];
        let records = XrefLens::new().match_all(&prefixes, &addrs(&["203.0.113.5"]));

        let json = XrefLens::new().format_records(&records, OutputFormat::Json);
        assert!(json.contains("\"address\":\"203.0.113.5\""));

        let lines = XrefLens::new().format_records(&records, OutputFormat::JsonLine);
        assert_eq!(lines.lines().count(), 1);
    }
}
