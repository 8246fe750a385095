mod blocklist;
mod ip_ranges;

pub use crate::datasets::blocklist::*;
pub use crate::datasets::ip_ranges::*;
