use std::time::Duration;

use chained_hotstuff_common_types::{Epoch, Height, Level};
use log::*;
use tokio::sync::mpsc;

const LOG_TARGET: &str = "chained_hotstuff::timer_service";

/// The SMR phase a timer fire is reported against, so a stale fire from a phase the driver has
/// already left behind can be recognized and filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmrPhase {
    NewHeight,
    Propose,
    Vote,
    Precommit,
    Pacemaker,
}

#[derive(Debug)]
enum TimerRequest {
    Schedule {
        phase: SmrPhase,
        height: Height,
        level: Level,
        epoch_id: Epoch,
        last_committed_level: Level,
    },
    Cancel,
}

/// One fired timer, carrying enough of the state it was armed for that the driver can tell
/// whether it's still relevant (spec §4.5 "events for stale (epoch, level) are filtered by the
/// driver").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub phase: SmrPhase,
    pub height: Height,
    pub level: Level,
    pub epoch_id: Epoch,
    pub duration: Duration,
}

#[derive(Clone)]
pub struct TimerServiceHandle {
    request_tx: mpsc::Sender<TimerRequest>,
}

impl TimerServiceHandle {
    /// Cancels any in-flight timer whose `(epoch, level)` differs from this one and arms a fresh
    /// one. Calling `schedule` for the same `(epoch, level)` twice is a no-op restart, not a
    /// second concurrent timer — there is only ever one logical timer per level.
    pub async fn schedule(
        &self,
        phase: SmrPhase,
        height: Height,
        level: Level,
        epoch_id: Epoch,
        last_committed_level: Level,
    ) -> Result<(), mpsc::error::SendError<()>> {
        self.request_tx
            .send(TimerRequest::Schedule {
                phase,
                height,
                level,
                epoch_id,
                last_committed_level,
            })
            .await
            .map_err(|_| mpsc::error::SendError(()))
    }

    pub async fn cancel(&self) -> Result<(), mpsc::error::SendError<()>> {
        self.request_tx
            .send(TimerRequest::Cancel)
            .await
            .map_err(|_| mpsc::error::SendError(()))
    }
}

/// Single logical timer per `(epochId, level)`, with exponential-ish backoff (C5). Runs as its
/// own loop so the driver's main select doesn't have to poll a sleep future directly.
pub struct TimerService {
    request_rx: mpsc::Receiver<TimerRequest>,
    fired_tx: mpsc::Sender<TimerFired>,
    base: Duration,
    interval: Duration,
    max: Duration,
}

impl TimerService {
    pub fn new(base: Duration, interval: Duration, max: Duration, fired_tx: mpsc::Sender<TimerFired>) -> (Self, TimerServiceHandle) {
        let (request_tx, request_rx) = mpsc::channel(16);
        (
            Self {
                request_rx,
                fired_tx,
                base,
                interval,
                max,
            },
            TimerServiceHandle { request_tx },
        )
    }

    /// `base + (level - lastCommittedLevel) * interval`, clamped to `max` (spec §4.5).
    fn timeout_for(&self, level: Level, last_committed_level: Level) -> Duration {
        let behind = level.saturating_sub(last_committed_level).as_u64();
        let additive = self.interval.saturating_mul(behind as u32);
        self.base.saturating_add(additive).min(self.max)
    }

    pub async fn run(mut self) {
        let sleep = tokio::time::sleep(Duration::MAX);
        tokio::pin!(sleep);
        let mut armed: Option<(SmrPhase, Height, Level, Epoch, Duration)> = None;

        loop {
            tokio::select! {
                biased;
                maybe_req = self.request_rx.recv() => {
                    match maybe_req {
                        Some(TimerRequest::Schedule { phase, height, level, epoch_id, last_committed_level }) => {
                            let duration = self.timeout_for(level, last_committed_level);
                            debug!(target: LOG_TARGET, "arming timer for (height={height}, level={level}, epoch={epoch_id}) in {duration:.2?}");
                            armed = Some((phase, height, level, epoch_id, duration));
                            sleep.as_mut().reset(tokio::time::Instant::now() + duration);
                        }
                        Some(TimerRequest::Cancel) => {
                            armed = None;
                            sleep.as_mut().reset(tokio::time::Instant::now() + Duration::MAX);
                        }
                        None => {
                            info!(target: LOG_TARGET, "timer service shutting down, request channel closed");
                            return;
                        }
                    }
                }
                () = &mut sleep, if armed.is_some() => {
                    let (phase, height, level, epoch_id, duration) = armed.take().expect("armed checked above");
                    warn!(target: LOG_TARGET, "round timer fired at (height={height}, level={level}, epoch={epoch_id})");
                    if self
                        .fired_tx
                        .send(TimerFired { phase, height, level, epoch_id, duration })
                        .await
                        .is_err()
                    {
                        info!(target: LOG_TARGET, "timer service shutting down, fired channel closed");
                        return;
                    }
                    sleep.as_mut().reset(tokio::time::Instant::now() + Duration::MAX);
                }
            }
        }
    }
}
