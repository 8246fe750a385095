use blocklens::lens::utils::OutputFormat;
use blocklens::BlocklensConfig;
use clap::{Parser, Subcommand};
use tracing::Level;

mod commands;

use commands::config::ConfigArgs;
use commands::fetch::FetchArgs;
use commands::lookup::LookupArgs;
use commands::xref::XrefCmdArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.blocklens/blocklens.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Output format: tsv (default), table, markdown, json, json-pretty, json-line, psv
    #[clap(short, long, global = true, default_value = "tsv")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cross-reference blocked addresses against provider IP ranges and write the report.
    Xref(XrefCmdArgs),

    /// Show which provider prefixes contain the given IP addresses.
    Lookup(LookupArgs),

    /// Download or refresh the cached datasets.
    Fetch(FetchArgs),

    /// Show the effective configuration.
    Config(ConfigArgs),
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            // filter spans/events with level TRACE or higher.
            .with_max_level(Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match BlocklensConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: unable to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Xref(args) => commands::xref::run(&config, args, cli.format),
        Commands::Lookup(args) => commands::lookup::run(&config, args, cli.format),
        Commands::Fetch(args) => commands::fetch::run(&config, args, cli.format),
        Commands::Config(args) => commands::config::run(&config, args, cli.format),
    }
}
