//! Tracker handle - lifecycle management for the poll loop
//!
//! Spawns the input state tracker as a tokio task ticking at the configured
//! rate and exposes the public queries against the roster published after
//! every tick.

use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::tracker::poller::{DeviceRoster, Idle, InputStateTracker, TrackerError};
use crate::tracker::source::RawDeviceState;

/// Handle to a running poll loop.
///
/// Dropping the handle does not stop polling; call [`TrackerHandle::stop`].
/// Stopping is cooperative: the in-flight tick (and every event handler it
/// invokes) completes, only the next tick is never scheduled.
pub struct TrackerHandle {
    cancel: CancellationToken,
    roster: watch::Receiver<DeviceRoster>,
}

impl TrackerHandle {
    /// Start the tracker and spawn its poll loop.
    ///
    /// Subscribers must be registered on the tracker before calling this;
    /// the tracker moves into the spawned task. Fails with
    /// [`TrackerError::UnsupportedPlatform`] when the device source reports
    /// no enumeration capability, in which case no task is spawned.
    pub fn spawn(tracker: InputStateTracker<Idle>) -> Result<Self, TrackerError> {
        let polls_per_second = tracker.settings().polls_per_second.max(1);
        let interval = Duration::from_secs_f64(1.0 / f64::from(polls_per_second));

        let mut tracker = tracker.start()?;

        let (roster_sender, roster_receiver) = watch::channel(DeviceRoster::default());
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();

        tokio::spawn(async move {
            info!(
                "Poll loop started, {} ms between ticks",
                interval.as_millis()
            );

            // Throughput stats, logged periodically
            let mut ticks: u64 = 0;
            let mut last_stats = Local::now();
            let stats_interval = chrono::Duration::seconds(10);

            loop {
                tracker.tick();
                let _ = roster_sender.send(tracker.roster());

                ticks += 1;
                let now = Local::now();
                if now - last_stats > stats_interval {
                    debug!(
                        "Poll loop stats: {} ticks in the last {} seconds ({} devices active)",
                        ticks,
                        stats_interval.num_seconds(),
                        tracker.num_devices()
                    );
                    ticks = 0;
                    last_stats = now;
                }

                tokio::select! {
                    _ = loop_cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }

            info!("Poll loop stopped");
        });

        Ok(Self {
            cancel,
            roster: roster_receiver,
        })
    }

    /// Request the poll loop to stop after the in-flight tick. Idempotent.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!("Stop requested, poll loop will not schedule another tick");
        }
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Number of active devices as of the last completed tick.
    pub fn num_devices(&self) -> usize {
        self.roster.borrow().devices.len()
    }

    /// Latest snapshot of the device at `index`, if any.
    pub fn device_at(&self, index: usize) -> Option<RawDeviceState> {
        self.roster.borrow().devices.get(index).cloned()
    }

    /// Watch the roster published after every tick.
    pub fn subscribe_roster(&self) -> watch::Receiver<DeviceRoster> {
        self.roster.clone()
    }
}
