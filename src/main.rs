#![forbid(unsafe_code)]

use anyhow::{anyhow, Context, Result};
use log::{info, LevelFilter};
use tokio::sync::watch;

use permlens::apps::AppSnapshot;
use permlens::config::Configuration;
use permlens::models::{ListingConfig, ListingOutput};
use permlens::pipeline::DisplayList;
use permlens::session::{AppsSession, SessionSettings};
use permlens::sort::SortOptions;
use permlens::source::{parse_snapshot, spawn_snapshot_poller, stop_snapshot_poller, SnapshotPublisher};
use permlens::{cli, logging, output};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse_args()?;
    let config = Configuration::load_or_default(args.config_path.as_deref())?;

    let level = if args.quiet_mode {
        LevelFilter::Error
    } else if args.verbose {
        LevelFilter::Debug
    } else {
        config.log_level()?
    };
    logging::init_logger(level)?;

    let contents = tokio::fs::read_to_string(&args.snapshot_path)
        .await
        .with_context(|| format!("Failed to read snapshot {}", args.snapshot_path.display()))?;
    let records = parse_snapshot(&contents)
        .with_context(|| format!("Malformed snapshot {}", args.snapshot_path.display()))?;
    info!("Loaded {} application(s) from {}", records.len(), args.snapshot_path.display());

    let publisher = SnapshotPublisher::new(records);
    let apps = publisher.subscribe();

    // Command line filters replace the configured defaults rather than adding to them
    let initial_filter = if args.filters.is_pass_through() {
        config.default_filter_options()
    } else {
        args.filters.clone()
    };
    let initial_sort = args
        .sort
        .map(SortOptions::new)
        .unwrap_or_else(|| config.default_sort_options());

    let settings = SessionSettings {
        pipeline: config.pipeline_settings(),
        strings: config.strings.clone(),
        initial_search: args.search.clone(),
        initial_filter,
        initial_sort,
    };
    let (session, _channels) = AppsSession::start(publisher.subscribe(), settings);

    if args.watch {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poller = spawn_snapshot_poller(
            args.snapshot_path.clone(),
            config.poll_duration(),
            publisher,
            Some(contents),
            shutdown_rx,
        );

        if !args.quiet_mode && !args.json_output {
            eprintln!("Watching {} (Ctrl+C to stop)", args.snapshot_path.display());
        }
        let watched = watch_listing(&session, &args, &apps).await;

        stop_snapshot_poller(&shutdown_tx, poller).await;
        session.shutdown().await?;
        watched
    } else {
        let mut items = session.items();
        let first = items.wait_for(|list| list.generation >= 1).await.map(|list| list.clone());
        match first {
            Ok(list) => {
                print_listing(&list, &session, &args, &apps, false)?;
                session.shutdown().await?;
                Ok(())
            }
            Err(_) => {
                // The runner ended before publishing; its error explains why
                session.shutdown().await?;
                Err(anyhow!("Pipeline stopped before producing a listing"))
            }
        }
    }
}

/// Re-render on every published list until Ctrl+C or the pipeline stops
async fn watch_listing(session: &AppsSession, args: &ListingConfig, apps: &watch::Receiver<AppSnapshot>) -> Result<()> {
    let mut items = session.items();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received interrupt, stopping");
                return Ok(());
            }
            changed = items.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let list = items.borrow_and_update().clone();
                if list.generation > 0 {
                    print_listing(&list, session, args, apps, true)?;
                }
            }
        }
    }
}

fn print_listing(
    list: &DisplayList,
    session: &AppsSession,
    args: &ListingConfig,
    apps: &watch::Receiver<AppSnapshot>,
    with_header: bool,
) -> Result<()> {
    let total = apps.borrow().len();
    let listing = ListingOutput::new(
        list,
        total,
        &session.filter_options(),
        session.sort_options().main_sort,
        session.search_term(),
    );

    if args.json_output {
        // One document per line in watch mode
        if with_header {
            println!("{}", serde_json::to_string(&listing)?);
        } else {
            println!("{}", output::format_json(&listing)?);
        }
    } else {
        if with_header {
            println!("{}", output::watch_header(list.generation)?);
        }
        print!("{}", output::format_human(&listing));
    }
    Ok(())
}
