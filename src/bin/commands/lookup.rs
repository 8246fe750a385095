use blocklens::lens::utils::OutputFormat;
use blocklens::lens::xref::XrefLens;
use blocklens::{BlocklensConfig, DataFile, IpRanges};
use clap::Args;
use serde::Serialize;
use std::net::IpAddr;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::resolve_input;

/// Arguments for the Lookup command
#[derive(Args)]
pub struct LookupArgs {
    /// IP addresses to look up
    #[clap(required = true)]
    pub ips: Vec<IpAddr>,

    /// IP ranges document, local path or URL. Defaults to the cached provider file.
    #[clap(long)]
    pub ranges: Option<String>,

    /// Force refresh of the cached ranges document
    #[clap(short, long)]
    pub refresh: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct LookupRow {
    ip: IpAddr,
    prefix: String,
    region: String,
    service: String,
    network_border_group: String,
}

pub fn run(config: &BlocklensConfig, args: LookupArgs, output_format: OutputFormat) {
    let LookupArgs {
        ips,
        ranges,
        refresh,
    } = args;

    let ranges_path = match resolve_input(config, DataFile::IpRanges, ranges.as_deref(), refresh)
    {
        Ok(p) => p,
        Err(e) => {
            eprintln!("ERROR: unable to get ranges document: {:#}", e);
            std::process::exit(1);
        }
    };

    let ranges = match IpRanges::from_path(&ranges_path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            std::process::exit(1);
        }
    };
    let prefixes = ranges.prefixes().prefixes;

    let lens = XrefLens::new();
    let rows: Vec<LookupRow> = ips
        .iter()
        .flat_map(|ip| {
            lens.lookup(&prefixes, ip).into_iter().map(move |p| LookupRow {
                ip: *ip,
                prefix: p.cidr.clone(),
                region: p.region.clone(),
                service: p.service.clone(),
                network_border_group: p.network_border_group.clone().unwrap_or_default(),
            })
        })
        .collect();

    if rows.is_empty() && !output_format.is_json() {
        eprintln!("no provider prefix contains the given address(es)");
        return;
    }

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&rows).unwrap_or_default()),
        OutputFormat::JsonPretty => {
            println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default())
        }
        OutputFormat::JsonLine => {
            for row in &rows {
                if let Ok(line) = serde_json::to_string(row) {
                    println!("{}", line);
                }
            }
        }
        OutputFormat::Table => println!("{}", Table::new(&rows).with(Style::rounded())),
        OutputFormat::Markdown => println!("{}", Table::new(&rows).with(Style::markdown())),
        OutputFormat::Tsv | OutputFormat::Psv => {
            let sep = output_format.separator().unwrap_or('\t');
            println!(
                "{}",
                ["ip", "ip_prefix", "region", "service"].join(&sep.to_string())
            );
            for row in &rows {
                println!(
                    "{}{sep}{}{sep}{}{sep}{}",
                    row.ip,
                    row.prefix,
                    row.region,
                    row.service,
                    sep = sep
                );
            }
        }
    }
}
