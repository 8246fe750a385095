//! Lens module
//!
//! Lenses combine business logic with output formatting so the same
//! operations can be driven from the CLI or used as a library.
//!
//! - `utils`: shared [`OutputFormat`](utils::OutputFormat)
//! - `xref`: the matching engine ([`XrefLens`](xref::XrefLens))
//!
//! ```rust,ignore
//! use blocklens::lens::xref::{XrefArgs, XrefLens, MatchRecord};
//! use blocklens::lens::utils::OutputFormat;
//! ```

pub mod utils;

// XrefLens - blocked addresses against provider prefixes
pub mod xref;
