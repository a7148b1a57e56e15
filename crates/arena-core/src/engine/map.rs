use std::{collections::HashMap, future::Future};

use serde::{Serialize, de::DeserializeOwned};
use tokio::{
    sync::mpsc,
    task::{Id, JoinError, JoinSet},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::{Engine, ResultSlots, SlotError, panic_message, wire};

/// How an instance ended, as seen by the reaper.
enum Exit {
    /// Result frame was sent on the channel.
    Sent { index: usize },
    Crashed { index: usize, reason: String },
    Unencodable { index: usize, reason: String },
}

impl Engine {
    /// Run `f` over `items` with at most `limit` instances in flight.
    ///
    /// The returned vector has one entry per item, in input order. Items whose
    /// instance panicked, whose result could not be transported, or that were
    /// never dispatched because of cancellation come back as [`SlotError`]s.
    ///
    /// With a configured limit of one the items run one after another, each
    /// awaited by the caller before the next starts.
    pub async fn map<I, T, F, Fut>(&self, items: Vec<I>, f: F) -> Vec<Result<T, SlotError>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn(I, CancellationToken) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let total = items.len();
        let limit = self.cfg.effective_limit(total);
        debug!(target: "arena.core.map", total, limit, "map started");

        if self.cfg.limit == 1 {
            return self.map_inline(items, f).await;
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let mut slots: ResultSlots<T> = ResultSlots::new(total);
        let mut running: JoinSet<Exit> = JoinSet::new();
        let mut in_flight: HashMap<Id, usize> = HashMap::new();
        let mut pending = items.into_iter().enumerate();

        loop {
            while in_flight.len() < limit && !self.cancel.is_cancelled() {
                let Some((index, item)) = pending.next() else {
                    break;
                };
                let fut = f(item, self.cancel.child_token());
                let handle = running.spawn(instance(index, fut, tx.clone()));
                in_flight.insert(handle.id(), index);
                trace!(target: "arena.core.map", index, in_flight = in_flight.len(), "dispatched");
            }

            if in_flight.is_empty() {
                break;
            }

            let reaped = tokio::time::timeout(self.cfg.reap_interval, running.join_next_with_id()).await;
            match reaped {
                // Nothing finished within the interval; loop to re-check cancellation.
                Err(_) => continue,
                Ok(Some(Ok((id, exit)))) => {
                    in_flight.remove(&id);
                    drain_frames(&mut rx, &mut slots);
                    settle(exit, &mut slots);
                }
                Ok(Some(Err(join_err))) => {
                    drain_frames(&mut rx, &mut slots);
                    release_failed(join_err, &mut in_flight, &mut slots);
                }
                Ok(None) => {
                    warn!(
                        target: "arena.core.map",
                        outstanding = in_flight.len(),
                        "no instances left to reap; marking outstanding slots lost"
                    );
                    drain_frames(&mut rx, &mut slots);
                    mark_lost(in_flight.drain().map(|(_, index)| index), &mut slots);
                }
            }
        }
        drain_frames(&mut rx, &mut slots);

        let mut skipped = 0usize;
        for (index, _) in pending {
            let _ = slots.fill(index, Err(SlotError::Skipped { index }));
            skipped += 1;
        }
        if skipped > 0 {
            warn!(target: "arena.core.map", skipped, "run cancelled before every item was dispatched");
        }

        debug!(target: "arena.core.map", total, filled = slots.filled(), "map finished");
        slots.into_results()
    }

    async fn map_inline<I, T, F, Fut>(&self, items: Vec<I>, f: F) -> Vec<Result<T, SlotError>>
    where
        T: Send + 'static,
        F: Fn(I, CancellationToken) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                out.push(Err(SlotError::Skipped { index }));
                continue;
            }
            let slot = match tokio::spawn(f(item, self.cancel.child_token())).await {
                Ok(value) => Ok(value),
                Err(e) => {
                    let reason = crash_reason(e);
                    error!(target: "arena.core.map", index, %reason, "instance crashed");
                    Err(SlotError::Crashed { index, reason })
                }
            };
            out.push(slot);
        }
        out
    }
}

fn crash_reason(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(&*err.into_panic())
    } else {
        err.to_string()
    }
}

/// Runs one item in its own task so a panic stays contained, then ships the
/// result back as a frame.
async fn instance<T, Fut>(index: usize, fut: Fut, tx: mpsc::UnboundedSender<Vec<u8>>) -> Exit
where
    T: Serialize + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let value = match tokio::spawn(fut).await {
        Ok(value) => value,
        Err(e) => {
            return Exit::Crashed {
                index,
                reason: crash_reason(e),
            };
        }
    };

    match wire::encode(index, &value) {
        Ok(frame) => {
            if tx.send(frame).is_err() {
                return Exit::Crashed {
                    index,
                    reason: "coordinator went away".into(),
                };
            }
            Exit::Sent { index }
        }
        Err(e) => Exit::Unencodable {
            index,
            reason: e.to_string(),
        },
    }
}

fn drain_frames<T: DeserializeOwned>(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>, slots: &mut ResultSlots<T>) {
    while let Ok(frame) = rx.try_recv() {
        let (index, value) = match wire::decode::<T>(&frame) {
            Ok((index, value)) => (index, Ok(value)),
            Err(e) => match wire::peek_index(&frame) {
                Ok(index) => {
                    let reason = e.to_string();
                    (index, Err(SlotError::Corrupt { index, reason }))
                }
                Err(_) => {
                    error!(target: "arena.core.map", error = %e, "dropping unreadable result frame");
                    continue;
                }
            },
        };
        if let Err(e) = slots.fill(index, value) {
            error!(target: "arena.core.map", error = %e, "result frame rejected");
        }
    }
}

/// Record the exit of one instance.
fn settle<T>(exit: Exit, slots: &mut ResultSlots<T>) {
    match exit {
        Exit::Sent { index } => {
            if !slots.is_filled(index) {
                let _ = slots.fill(
                    index,
                    Err(SlotError::Corrupt {
                        index,
                        reason: "result frame missing".into(),
                    }),
                );
            }
            trace!(target: "arena.core.map", index, "reaped");
        }
        Exit::Crashed { index, reason } => {
            error!(target: "arena.core.map", index, %reason, "instance crashed");
            let _ = slots.fill(index, Err(SlotError::Crashed { index, reason }));
        }
        Exit::Unencodable { index, reason } => {
            error!(target: "arena.core.map", index, %reason, "instance result could not be framed");
            let _ = slots.fill(index, Err(SlotError::Corrupt { index, reason }));
        }
    }
}

/// The instance wrapper itself died. Free its index right away so dispatch
/// keeps the full limit.
fn release_failed<T>(err: JoinError, in_flight: &mut HashMap<Id, usize>, slots: &mut ResultSlots<T>) {
    let Some(index) = in_flight.remove(&err.id()) else {
        error!(target: "arena.core.map", error = %err, "unknown instance failed");
        return;
    };
    let reason = crash_reason(err);
    error!(target: "arena.core.map", index, %reason, "instance wrapper failed");
    if !slots.is_filled(index) {
        let _ = slots.fill(index, Err(SlotError::Crashed { index, reason }));
    }
}

/// Fill every outstanding slot that never produced anything with `Lost`.
fn mark_lost<T>(outstanding: impl IntoIterator<Item = usize>, slots: &mut ResultSlots<T>) {
    for index in outstanding {
        if !slots.is_filled(index) {
            let _ = slots.fill(index, Err(SlotError::Lost { index }));
        }
    }
}
