use blocklens::lens::utils::OutputFormat;
use blocklens::BlocklensConfig;
use clap::Args;
use serde::Serialize;

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Also list the cached dataset files
    #[clap(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Serialize)]
struct ConfigInfo<'a> {
    config_file: String,
    #[serde(flatten)]
    config: &'a BlocklensConfig,
    cache_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<Vec<blocklens::CachedFileInfo>>,
}

pub fn run(config: &BlocklensConfig, args: ConfigArgs, output_format: OutputFormat) {
    let ConfigArgs { verbose } = args;

    let files = if verbose {
        config.file_cache().ok().map(|c| c.list())
    } else {
        None
    };

    if output_format.is_json() {
        let info = ConfigInfo {
            config_file: BlocklensConfig::config_file_path(),
            config,
            cache_dir: config.cache_dir(),
            files,
        };
        println!("{}", serde_json::to_string_pretty(&info).unwrap_or_default());
        return;
    }

    println!("Config File:        {}", BlocklensConfig::config_file_path());
    println!("{}", config.summary());

    if let Some(files) = files {
        println!();
        for f in files {
            match f.size_bytes {
                Some(size) => println!(
                    "  {:<10} {} ({}, {}s old)",
                    f.name,
                    f.path,
                    blocklens::format_size(size),
                    f.age_secs.unwrap_or(0)
                ),
                None => println!("  {:<10} {} (not cached)", f.name, f.path),
            }
        }
    }
}
