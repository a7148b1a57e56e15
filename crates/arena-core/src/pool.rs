//! Fixed worker pool over scoped threads.
//!
//! Workers pull the next unclaimed index from a shared cursor, so every index
//! in `0..items.len()` is processed exactly once no matter how uneven the
//! per-item cost is. Work runs in-process; a panic in one worker is reported
//! as [`CoreError::WorkerPanicked`] after the remaining workers finish.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Mutex,
    thread,
};

use tracing::{debug, error};

use crate::{CoreError, ResultSlots, panic_message};

/// Call `g(index, &item)` for every item using up to `workers` threads.
///
/// `workers == 0` means one thread per item. With a single worker the items
/// are processed in order on the calling thread, and a panic there is
/// reported as worker `0`.
pub fn each<I, G>(items: &[I], workers: usize, g: G) -> Result<(), CoreError>
where
    I: Sync,
    G: Fn(usize, &I) + Sync,
{
    let total = items.len();
    let workers = effective_workers(workers, total);
    debug!(target: "arena.core.pool", total, workers, "pool started");

    if workers <= 1 {
        let run = catch_unwind(AssertUnwindSafe(|| {
            for (index, item) in items.iter().enumerate() {
                g(index, item);
            }
        }));
        return run.map_err(|payload| {
            let reason = panic_message(&*payload);
            error!(target: "arena.core.pool", worker = 0, %reason, "pool worker panicked");
            CoreError::WorkerPanicked { worker: 0, reason }
        });
    }

    let cursor = Mutex::new(0usize);
    let claim = || {
        let mut next = cursor.lock().unwrap_or_else(|p| p.into_inner());
        if *next >= total {
            return None;
        }
        let index = *next;
        *next += 1;
        Some(index)
    };

    let mut failure = None;
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    while let Some(index) = claim() {
                        g(index, &items[index]);
                    }
                })
            })
            .collect();

        for (worker, handle) in handles.into_iter().enumerate() {
            if let Err(payload) = handle.join() {
                let reason = panic_message(&*payload);
                error!(target: "arena.core.pool", worker, %reason, "pool worker panicked");
                failure.get_or_insert(CoreError::WorkerPanicked { worker, reason });
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Like [`each`], but collects `g`'s return values in input order.
pub fn map<I, T, G>(items: &[I], workers: usize, g: G) -> Result<Vec<T>, CoreError>
where
    I: Sync,
    T: Send,
    G: Fn(usize, &I) -> T + Sync,
{
    let slots = Mutex::new(ResultSlots::new(items.len()));
    let store = |index: usize, value: T| -> Result<(), CoreError> {
        slots.lock().unwrap_or_else(|p| p.into_inner()).fill(index, Ok(value))
    };
    let rejected = Mutex::new(None);

    each(items, workers, |index, item| {
        let value = g(index, item);
        if let Err(e) = store(index, value) {
            rejected.lock().unwrap_or_else(|p| p.into_inner()).get_or_insert(e);
        }
    })?;

    if let Some(e) = rejected.into_inner().unwrap_or_else(|p| p.into_inner()) {
        return Err(e);
    }

    slots
        .into_inner()
        .unwrap_or_else(|p| p.into_inner())
        .into_results()
        .into_iter()
        .map(|r| r.map_err(CoreError::from))
        .collect()
}

fn effective_workers(workers: usize, total: usize) -> usize {
    if workers == 0 || workers > total {
        total
    } else {
        workers
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeSet,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;

    #[test]
    fn every_index_claimed_exactly_once() {
        for (n, w) in [(50, 4), (3, 8), (10, 1), (7, 0), (0, 3)] {
            let seen = Mutex::new(Vec::new());
            let items: Vec<usize> = (0..n).collect();
            each(&items, w, |index, item| {
                assert_eq!(index, *item);
                seen.lock().unwrap().push(index);
            })
            .unwrap();

            let seen = seen.into_inner().unwrap();
            assert_eq!(seen.len(), n, "n={n} w={w}");
            let unique: BTreeSet<_> = seen.into_iter().collect();
            assert_eq!(unique, (0..n).collect::<BTreeSet<_>>());
        }
    }

    #[test]
    fn single_worker_keeps_order() {
        let seen = Mutex::new(Vec::new());
        each(&["x", "y", "z"], 1, |i, s| seen.lock().unwrap().push((i, *s))).unwrap();
        assert_eq!(seen.into_inner().unwrap(), vec![(0, "x"), (1, "y"), (2, "z")]);
    }

    #[test]
    fn uneven_work_is_balanced_by_the_cursor() {
        let live = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let items: Vec<u64> = vec![40, 1, 1, 1, 1, 1, 1, 1];
        each(&items, 3, |_, ms| {
            let now = live.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(*ms));
            live.fetch_sub(1, Ordering::SeqCst);
        })
        .unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn map_returns_in_input_order() {
        let out = map(&["a", "b", "c", "d", "e"], 2, |_, s| s.to_uppercase()).unwrap();
        assert_eq!(out, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn worker_panic_is_reported() {
        let items: Vec<u32> = (0..6).collect();
        let err = each(&items, 2, |_, i| {
            if *i == 3 {
                panic!("bad test file");
            }
        })
        .unwrap_err();
        match err {
            CoreError::WorkerPanicked { reason, .. } => assert_eq!(reason, "bad test file"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lone_item_panic_is_reported_not_raised() {
        let err = each(&[1u8], 4, |_, _| panic!("solver crashed")).unwrap_err();
        match err {
            CoreError::WorkerPanicked { worker: 0, reason } => assert_eq!(reason, "solver crashed"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn single_worker_map_panic_is_reported() {
        let res = map(&[1u8, 2, 3], 1, |_, n| {
            if *n == 2 {
                panic!("bad position");
            }
            *n
        });
        assert!(matches!(res, Err(CoreError::WorkerPanicked { worker: 0, .. })));
    }
}
