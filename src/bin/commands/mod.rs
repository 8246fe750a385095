pub mod config;
pub mod fetch;
pub mod lookup;
pub mod xref;

use anyhow::Result;
use blocklens::{BlocklensConfig, DataFile};

/// Resolve where a dataset is read from.
///
/// An explicit path or URL is used as-is; otherwise the configured source is
/// fetched through the file cache.
pub(crate) fn resolve_input(
    config: &BlocklensConfig,
    file: DataFile,
    explicit: Option<&str>,
    refresh: bool,
) -> Result<String> {
    if let Some(path) = explicit {
        return Ok(path.to_string());
    }

    let url = match file {
        DataFile::IpRanges => config.ranges_url.as_str(),
        DataFile::Blocklist => config.blocklist_url.as_str(),
    };
    let cache = config.file_cache()?;
    let path = cache.ensure(file, url, config.cache_ttl(), refresh)?;
    Ok(path.to_string_lossy().to_string())
}

/// Spinner on stderr while a long step runs
pub(crate) fn spinner(message: &str) -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
