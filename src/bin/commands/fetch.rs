use blocklens::lens::utils::OutputFormat;
use blocklens::{format_size, BlocklensConfig, CachedFileInfo, DataFile};
use clap::Args;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Arguments for the Fetch command
#[derive(Args)]
pub struct FetchArgs {
    /// Download again even if the cached copies are fresh
    #[clap(short, long)]
    pub force: bool,

    /// Remove cached files instead of fetching
    #[clap(long, conflicts_with = "force")]
    pub clear: bool,
}

#[derive(Tabled)]
struct FileRow {
    name: String,
    path: String,
    size: String,
    age: String,
}

impl From<&CachedFileInfo> for FileRow {
    fn from(info: &CachedFileInfo) -> Self {
        FileRow {
            name: info.name.clone(),
            path: info.path.clone(),
            size: info.size_bytes.map(format_size).unwrap_or_else(|| "-".to_string()),
            age: info
                .age_secs
                .map(|s| format!("{}s", s))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

pub fn run(config: &BlocklensConfig, args: FetchArgs, output_format: OutputFormat) {
    let FetchArgs { force, clear } = args;

    let cache = match config.file_cache() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            std::process::exit(1);
        }
    };

    if clear {
        if let Err(e) = cache.clear() {
            eprintln!("ERROR: {:#}", e);
            std::process::exit(1);
        }
        eprintln!("cache cleared");
        return;
    }

    let mut failed = false;
    for file in DataFile::all() {
        let url = match file {
            DataFile::IpRanges => config.ranges_url.as_str(),
            DataFile::Blocklist => config.blocklist_url.as_str(),
        };
        if let Err(e) = cache.ensure(file, url, config.cache_ttl(), force) {
            eprintln!("ERROR: unable to fetch {}: {:#}", file, e);
            failed = true;
        }
    }

    let infos = cache.list();
    if output_format.is_json() {
        println!("{}", serde_json::to_string_pretty(&infos).unwrap_or_default());
    } else {
        let rows: Vec<FileRow> = infos.iter().map(FileRow::from).collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    if failed {
        std::process::exit(1);
    }
}
