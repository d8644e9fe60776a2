#![forbid(unsafe_code)]

use std::time::Duration;

use log::info;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::utils::greeting_utils::timestamp_str;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// How long each wait for the cancellation signal lasts.
pub const HEARTBEAT_INTERVAL_MS: u64 = 5000;

// ***************************************************************************
//                              HeartbeatTask
// ***************************************************************************
// ---------------------------------------------------------------------------
// HeartbeatTask:
// ---------------------------------------------------------------------------
/** The supervised background activity of the server.  On start the task
 * logs one record containing the current time, then repeatedly waits up to
 * the configured interval for a cancellation signal.  The task never exits
 * on its own; it terminates only when the signal is raised or its sender is
 * dropped, and it does so within one wait granularity without writing any
 * further log records.
 */
#[derive(Debug)]
pub struct HeartbeatTask {
    interval: Duration,
}

impl HeartbeatTask {
    // ---------------------------------------------------------------------------
    // new:
    // ---------------------------------------------------------------------------
    pub fn new() -> Self {
        Self::with_interval(Duration::from_millis(HEARTBEAT_INTERVAL_MS))
    }

    // ---------------------------------------------------------------------------
    // with_interval:
    // ---------------------------------------------------------------------------
    /** Create a task with an explicit wait interval. */
    pub fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }

    // ---------------------------------------------------------------------------
    // run:
    // ---------------------------------------------------------------------------
    /** Run until cancelled.  Cancellation is cooperative and is not an
     * error:  the future completes normally once the supervisor raises the
     * signal.  The wait step is interruptible, so a signal raised mid-wait
     * is observed immediately rather than at the next interval boundary.
     */
    pub async fn run(self, mut cancel: watch::Receiver<bool>) {
        info!("Heartbeat task running at: {}", timestamp_str());

        loop {
            tokio::select! {
                // A changed signal or a dropped sender both mean shutdown.
                _ = cancel.changed() => break,
                _ = sleep(self.interval) => {}
            }
        }
    }
}

impl Default for HeartbeatTask {
    fn default() -> Self {
        Self::new()
    }
}
