//! Blocked address list parsing
//!
//! The upstream registry publishes its list as a single quoted blob with
//! addresses joined by `;`:
//!
//! ```text
//! "198.51.100.1;198.51.100.2;2001:db8::1;"
//! ```
//!
//! Every token is parsed independently. Empty tokens (leading, trailing or
//! doubled delimiters) are skipped. Malformed tokens are reported back as
//! `InvalidAddress` values instead of being turned into a zero address.

use crate::error::{BlocklensError, BlocklensResult};
use anyhow::Result;
use std::net::IpAddr;
use tracing::{debug, warn};

/// Delimiter used by the blocklist registry
pub const DEFAULT_DELIMITER: char = ';';

/// Quote character wrapping the whole blocklist blob
const OUTER_QUOTE: char = '"';

/// Addresses parsed from a blocklist, in input order
#[derive(Debug, Default)]
pub struct ParsedBlocklist {
    pub addresses: Vec<IpAddr>,
    pub rejected: Vec<BlocklensError>,
}

impl ParsedBlocklist {
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Parse a single address token.
pub fn parse_address(token: &str) -> BlocklensResult<IpAddr> {
    let trimmed = token.trim();
    trimmed
        .parse::<IpAddr>()
        .map_err(|e| BlocklensError::InvalidAddress {
            token: trimmed.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a blocklist blob using the default `;` delimiter.
pub fn parse_blocklist(text: &str) -> ParsedBlocklist {
    parse_blocklist_with(text, DEFAULT_DELIMITER)
}

/// Parse a blocklist blob with a custom delimiter.
///
/// Line breaks always act as delimiters as well, so a plain one-per-line
/// file parses the same way as the registry blob.
pub fn parse_blocklist_with(text: &str, delimiter: char) -> ParsedBlocklist {
    let body = text.trim().trim_matches(OUTER_QUOTE);

    let mut parsed = ParsedBlocklist::default();
    for token in body.split(|c| c == delimiter || c == '\n' || c == '\r') {
        if token.trim().is_empty() {
            continue;
        }
        match parse_address(token) {
            Ok(addr) => parsed.addresses.push(addr),
            Err(e) => {
                debug!("skipping blocklist token: {}", e);
                parsed.rejected.push(e);
            }
        }
    }

    if !parsed.rejected.is_empty() {
        warn!(
            "{} blocklist token(s) rejected as invalid addresses",
            parsed.rejected.len()
        );
    }

    parsed
}

/// Read a blocklist from a local path or URL and parse it.
pub fn load_blocklist(path: &str) -> Result<ParsedBlocklist> {
    let text = oneio::read_to_string(path).map_err(|e| BlocklensError::Fetch {
        url: path.to_string(),
        reason: e.to_string(),
    })?;
    Ok(parse_blocklist(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_parse_address_v4() {
        let addr = parse_address("203.0.113.5").unwrap();
        assert_eq!(addr, IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)));
    }

    #[test]
    fn test_parse_address_v6() {
        let addr = parse_address("2001:db8::1").unwrap();
        assert_eq!(
            addr,
            IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1))
        );
    }

    #[test]
    fn test_parse_address_invalid() {
        for token in ["not-an-ip", "256.1.1.1", "10.0.0", "10.0.0.0/8"] {
            let err = parse_address(token).unwrap_err();
            assert!(
                matches!(err, BlocklensError::InvalidAddress { ref token, .. } if !token.is_empty()),
                "expected InvalidAddress for {token}"
            );
        }
    }

    #[test]
    fn test_ipv4_round_trip() {
        for text in ["0.0.0.0", "10.1.2.3", "192.168.0.255", "255.255.255.255"] {
            assert_eq!(parse_address(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_empty_tokens_skipped() {
        let parsed = parse_blocklist("\"198.51.100.1;;198.51.100.2;\"");
        assert_eq!(parsed.len(), 2);
        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.addresses[0].to_string(), "198.51.100.1");
        assert_eq!(parsed.addresses[1].to_string(), "198.51.100.2");
    }

    #[test]
    fn test_invalid_token_rejected_not_zeroed() {
        let parsed = parse_blocklist("\"198.51.100.1;garbage;198.51.100.2\"");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.rejected.len(), 1);
        assert!(!parsed
            .addresses
            .contains(&IpAddr::V4(Ipv4Addr::UNSPECIFIED)));
    }

    #[test]
    fn test_preserves_input_order() {
        let parsed = parse_blocklist("\"10.0.0.3;10.0.0.1;10.0.0.2\"");
        let texts: Vec<String> = parsed.addresses.iter().map(|a| a.to_string()).collect();
        assert_eq!(texts, vec!["10.0.0.3", "10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn test_unquoted_and_multiline() {
        let parsed = parse_blocklist("10.0.0.1\n10.0.0.2\r\n\n");
        assert_eq!(parsed.len(), 2);

        let parsed = parse_blocklist_with("10.0.0.1,10.0.0.2", ',');
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_empty_blob() {
        assert!(parse_blocklist("").is_empty());
        assert!(parse_blocklist("\"\"").is_empty());
        assert!(parse_blocklist("\";;;\"").is_empty());
    }
}
