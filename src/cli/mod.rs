//! CLI argument parsing and validation module
//!
//! Handles command-line interface using clap, including:
//! - Snapshot file selection
//! - Search, filter and sort options
//! - Output format selection (human/JSON)
//! - Watch mode, verbosity and quiet modes
//! - Help and version commands

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::filter::{FilterKey, FilterOptions};
use crate::models::ListingConfig;
use crate::sort::SortMode;

const VERSION: &str = concat!(env!("PERMLENS_VERSION"), " (", env!("GIT_HASH"), ")");

/// Build the clap command definition
pub fn command() -> Command {
    Command::new("permlens")
        .version(VERSION)
        .about("Filter, search and sort application permission snapshots")
        .long_about(
            "Reads a JSON snapshot of installed applications and their permission grants, \
             then prints the applications matching the given search term and filters in the \
             chosen order.",
        )
        .arg(
            Arg::new("snapshot")
                .value_name("SNAPSHOT")
                .help("JSON snapshot file (array of application records)")
                .required(true),
        )
        .arg(
            Arg::new("search")
                .short('s')
                .long("search")
                .value_name("TERM")
                .help("Keep applications whose package id or label contains TERM"),
        )
        .arg(
            Arg::new("filter")
                .short('f')
                .long("filter")
                .value_name("KEY")
                .help(
                    "Enable a filter (repeatable): internet, no-internet, declares, all-granted, \
                     has-denied, requests:<permission or glob>",
                )
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("sort")
                .short('o')
                .long("sort")
                .value_name("MODE")
                .help("Sort order: label, package, permissions, granted, internet"),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .help("Output in JSON format")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("watch")
                .short('w')
                .long("watch")
                .help("Re-render whenever the snapshot file changes (Ctrl+C to stop)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Configuration file (default: <config dir>/permlens/config.toml)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log pipeline activity to stderr")
                .action(ArgAction::SetTrue),
        )
}

/// Parse process arguments and return configuration
pub fn parse_args() -> Result<ListingConfig> {
    config_from_matches(&command().get_matches())
}

/// Parse an explicit argument list
pub fn parse_from<I, T>(args: I) -> Result<ListingConfig>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    config_from_matches(&matches)
}

fn config_from_matches(matches: &ArgMatches) -> Result<ListingConfig> {
    let snapshot_path = matches
        .get_one::<String>("snapshot")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("Missing snapshot file"))?;
    if !snapshot_path.exists() {
        return Err(anyhow!("Snapshot file does not exist: {}", snapshot_path.display()));
    }

    // Filter keys and glob patterns are validated before any work starts
    let mut filters = FilterOptions::new();
    if let Some(values) = matches.get_many::<String>("filter") {
        for value in values {
            let key: FilterKey = value
                .parse()
                .with_context(|| format!("Invalid --filter value '{}'", value))?;
            filters = filters.enabled(key);
        }
    }

    let sort = matches
        .get_one::<String>("sort")
        .map(|value| value.parse::<SortMode>())
        .transpose()
        .context("Invalid --sort value")?;

    let search = matches
        .get_one::<String>("search")
        .filter(|term| !term.is_empty())
        .cloned();

    Ok(ListingConfig {
        snapshot_path,
        search,
        filters,
        sort,
        json_output: matches.get_flag("json"),
        watch: matches.get_flag("watch"),
        config_path: matches.get_one::<String>("config").map(PathBuf::from),
        quiet_mode: matches.get_flag("quiet"),
        verbose: matches.get_flag("verbose"),
    })
}
