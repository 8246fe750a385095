use anyhow::Result;
use blocklens::datasets::load_blocklist;
use blocklens::lens::utils::OutputFormat;
use blocklens::lens::xref::{XrefArgs, XrefLens};
use blocklens::report::{open_report, write_report};
use blocklens::{BlocklensConfig, DataFile, IpRanges};
use clap::Args;
use tracing::info;

use super::{resolve_input, spinner};

/// Arguments for the Xref command
#[derive(Args)]
pub struct XrefCmdArgs {
    /// IP ranges document, local path or URL. Defaults to the cached provider file.
    #[clap(long)]
    pub ranges: Option<String>,

    /// Blocked address list, local path or URL. Defaults to the cached registry file.
    #[clap(long)]
    pub blocklist: Option<String>,

    /// Report output path, by default the configured `report_path`
    #[clap(short, long)]
    pub output: Option<String>,

    /// Force refresh of cached datasets even if they are fresh
    #[clap(short, long)]
    pub refresh: bool,

    /// Print records to stdout in the selected format instead of writing the report file
    #[clap(long)]
    pub stdout: bool,

    #[clap(flatten)]
    pub xref: XrefArgs,
}

pub fn run(config: &BlocklensConfig, args: XrefCmdArgs, output_format: OutputFormat) {
    if let Err(e) = execute(config, args, output_format) {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}

fn execute(
    config: &BlocklensConfig,
    args: XrefCmdArgs,
    output_format: OutputFormat,
) -> Result<()> {
    let XrefCmdArgs {
        ranges,
        blocklist,
        output,
        refresh,
        stdout,
        xref,
    } = args;

    let ranges_path = resolve_input(config, DataFile::IpRanges, ranges.as_deref(), refresh)?;
    let blocklist_path =
        resolve_input(config, DataFile::Blocklist, blocklist.as_deref(), refresh)?;

    let ranges = IpRanges::from_path(&ranges_path)?;
    eprintln!("Provider prefixes: {}", ranges.prefixes.len());

    let parsed_prefixes = ranges.filtered_prefixes(&xref.filter());
    let blocklist = load_blocklist(&blocklist_path)?;
    eprintln!("Blocked addresses: {}", blocklist.len());

    // open the sink before matching so an unusable destination fails fast
    let mut report = if stdout {
        None
    } else {
        let path = output.unwrap_or_else(|| config.report_path.clone());
        Some(open_report(&path)?)
    };

    let lens = XrefLens::new();
    let pb = spinner("matching blocked addresses against prefixes");
    let records = lens.run(&xref, &parsed_prefixes.prefixes, &blocklist.addresses);
    pb.finish_and_clear();
    info!("matching produced {} records", records.len());

    match report.as_mut() {
        Some(report) => {
            write_report(&records, report)?;
        }
        None => println!("{}", lens.format_records(&records, output_format)),
    }

    let summary = lens.summarize(
        &parsed_prefixes,
        ranges.prefixes.len(),
        &blocklist,
        &records,
    );
    eprintln!("{}", summary);

    Ok(())
}
