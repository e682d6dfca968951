//! Snapshot file polling
//!
//! Re-reads the snapshot file on a fixed interval and publishes a new snapshot
//! whenever its contents change. A read or parse failure is logged once per
//! distinct failure and the last good snapshot stays current.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::apps::ApplicationRecord;
use crate::errors::SourceError;
use crate::source::{parse_snapshot, SnapshotPublisher};

/// Poll `path` every `interval` until `shutdown` flips to true.
/// `last_contents` is the text the publisher's current snapshot came from.
pub fn spawn_snapshot_poller(
    path: PathBuf,
    interval: Duration,
    publisher: SnapshotPublisher,
    last_contents: Option<String>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Polling {} every {:.1}s", path.display(), interval.as_secs_f64());

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately
        ticker.tick().await;

        let mut state = PollState {
            accepted: last_contents,
            ..PollState::default()
        };
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match poll_once(&path, &mut state).await {
                        Ok(Some(records)) => {
                            info!("Snapshot {} changed ({} application(s))", path.display(), records.len());
                            publisher.publish(records);
                        }
                        Ok(None) => {}
                        Err(e) => warn!("Keeping previous snapshot: {}", e),
                    }
                }
            }
        }
        debug!("Stopped polling {}", path.display());
    })
}

/// Signal a poller to stop and wait for it. Returns false if the poller
/// task did not end cleanly; the failure is logged, not propagated.
pub async fn stop_snapshot_poller(shutdown: &watch::Sender<bool>, poller: JoinHandle<()>) -> bool {
    shutdown.send_replace(true);
    match poller.await {
        Ok(()) => true,
        Err(e) => {
            warn!("Snapshot poller ended abnormally: {}", e);
            false
        }
    }
}

/// What the poller has already seen of the file
#[derive(Debug, Default)]
struct PollState {
    /// Contents behind the published snapshot
    accepted: Option<String>,
    /// Last contents that failed to parse
    rejected: Option<String>,
    /// Last read failure reported
    read_error: Option<String>,
}

/// One poll cycle: `None` when there is nothing new to publish or report.
/// Each distinct bad contents or read failure is reported once.
async fn poll_once(path: &Path, state: &mut PollState) -> Result<Option<Vec<ApplicationRecord>>, SourceError> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => {
            state.read_error = None;
            contents
        }
        Err(source) => {
            let message = source.to_string();
            if state.read_error.as_deref() == Some(message.as_str()) {
                return Ok(None);
            }
            state.read_error = Some(message);
            return Err(SourceError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if state.accepted.as_deref() == Some(contents.as_str()) || state.rejected.as_deref() == Some(contents.as_str()) {
        return Ok(None);
    }

    match parse_snapshot(&contents) {
        Ok(records) => {
            state.accepted = Some(contents);
            state.rejected = None;
            Ok(Some(records))
        }
        Err(source) => {
            state.rejected = Some(contents);
            Err(SourceError::Parse {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}
