#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Blocklens - cross-reference blocked IP addresses against cloud IP ranges
//!
//! Blocklens reads a cloud provider's published IP range document (AWS
//! `ip-ranges.json` by default) and a list of blocked addresses, and reports
//! every blocked address that falls inside a provider prefix together with
//! the prefix's region and service.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | `display` | Table formatting with `tabled` | `tabled` |
//! | `cli` | CLI binary | `clap`, `tracing-subscriber`, `indicatif` |
//!
//! # Architecture
//!
//! - **[`datasets`]**: parsing of the two inputs
//!   - blocklist text into addresses, one `InvalidAddress` per bad token
//!   - ranges document into prefixes, bad or missing CIDRs skipped
//! - **[`lens`]**: the matching engine and output formatting
//! - **[`report`]**: the tab-separated report and the `ReportSink` trait
//! - **[`cache`]**: on-disk cache for the fetched datasets
//! - **[`config`]**: configuration management
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use blocklens::datasets::{parse_blocklist, IpRanges};
//! use blocklens::lens::xref::XrefLens;
//! use blocklens::report::{open_report, write_report};
//!
//! let ranges = IpRanges::from_path("https://ip-ranges.amazonaws.com/ip-ranges.json")?;
//! let prefixes = ranges.prefixes();
//! let blocklist = parse_blocklist(&oneio::read_to_string("ips.txt")?);
//!
//! let records = XrefLens::new().match_all(&prefixes.prefixes, &blocklist.addresses);
//!
//! let mut report = open_report("amazon.csv")?;
//! write_report(&records, &mut report)?;
//! ```

pub mod cache;
pub mod config;
pub mod datasets;
pub mod error;
pub mod lens;
pub mod report;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{cache_size, CachedFileInfo, DataFile, DataFileCache, DEFAULT_CACHE_TTL};
pub use config::{format_size, BlocklensConfig};
pub use datasets::{
    parse_address, parse_blocklist, parse_prefix, IpRangeEntry, IpRanges, ParsedBlocklist,
    ParsedPrefixes, Prefix, PrefixFilter,
};
pub use error::{BlocklensError, BlocklensResult};
pub use lens::utils::OutputFormat;
pub use lens::xref::{contains, MatchRecord, MatchSummary, XrefArgs, XrefLens};
pub use report::{open_report, write_report, ReportSink, TsvReport};
