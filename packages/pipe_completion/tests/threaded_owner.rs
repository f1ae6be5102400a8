//! Integration tests for an owner that shares the completion signal across threads.
//!
//! The owner guards the signal with an `RwLock`: attaching and completing happen under the write
//! lock, while callbacks are invoked under the read lock once the write lock has been released.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use pipe_completion::{CompletionSignal, Error};

#[derive(Debug, Eq, PartialEq)]
struct PipeError(&'static str);

type SharedSignal = Arc<RwLock<CompletionSignal<PipeError, Arc<AtomicUsize>>>>;

fn count_invocation(_error: Option<&PipeError>, invocations: &Arc<AtomicUsize>) {
    invocations.fetch_add(1, Ordering::Relaxed);
}

fn complete_and_notify(signal: &SharedSignal, error: Option<PipeError>) {
    let must_invoke = {
        let mut guard = signal.write().unwrap();
        !guard.is_completed() && guard.try_complete(error)
    };

    if must_invoke {
        signal.read().unwrap().invoke_callbacks();
    }
}

#[cfg_attr(miri, ignore)] // Slow under Miri and adds nothing over the single-threaded tests.
#[test]
fn callbacks_attached_from_many_threads_all_fire_once() {
    const THREADS: usize = 8;
    const CALLBACKS_PER_THREAD: usize = 16;

    let signal = SharedSignal::default();
    let invocations = Arc::new(AtomicUsize::new(0));

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                for _ in 0..CALLBACKS_PER_THREAD {
                    signal
                        .write()
                        .unwrap()
                        .attach_callback(count_invocation, Arc::clone(&invocations))
                        .unwrap();
                }
            });
        }
    });

    complete_and_notify(&signal, None);

    assert_eq!(
        invocations.load(Ordering::Relaxed),
        THREADS * CALLBACKS_PER_THREAD
    );
    assert_eq!(signal.read().unwrap().is_completed_or_err(), Ok(true));
}

#[cfg_attr(miri, ignore)] // Slow under Miri and adds nothing over the single-threaded tests.
#[test]
fn attach_racing_with_completion_fires_every_accepted_callback() {
    const ATTEMPTS: usize = 256;

    let signal = SharedSignal::default();
    let invocations = Arc::new(AtomicUsize::new(0));
    let accepted = AtomicUsize::new(0);
    let rejected = AtomicUsize::new(0);

    thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..ATTEMPTS {
                let result = signal
                    .write()
                    .unwrap()
                    .attach_callback(count_invocation, Arc::clone(&invocations));

                match result {
                    Ok(()) => accepted.fetch_add(1, Ordering::Relaxed),
                    Err(Error::AlreadyCompleted) => rejected.fetch_add(1, Ordering::Relaxed),
                    Err(other) => panic!("unexpected error: {other}"),
                };
            }
        });

        scope.spawn(|| {
            thread::yield_now();
            complete_and_notify(&signal, Some(PipeError("writer faulted")));
        });
    });

    assert_eq!(
        accepted.load(Ordering::Relaxed) + rejected.load(Ordering::Relaxed),
        ATTEMPTS
    );
    assert_eq!(
        invocations.load(Ordering::Relaxed),
        accepted.load(Ordering::Relaxed)
    );
    assert_eq!(
        signal.read().unwrap().is_completed_or_err(),
        Err(&PipeError("writer faulted"))
    );
}

#[cfg_attr(miri, ignore)] // Slow under Miri and adds nothing over the single-threaded tests.
#[test]
fn competing_completions_keep_the_first_outcome_and_notify_once() {
    let signal = SharedSignal::default();
    let invocations = Arc::new(AtomicUsize::new(0));

    signal
        .write()
        .unwrap()
        .attach_callback(count_invocation, Arc::clone(&invocations))
        .unwrap();

    thread::scope(|scope| {
        for message in ["first", "second", "third", "fourth"] {
            let signal = &signal;
            scope.spawn(move || complete_and_notify(signal, Some(PipeError(message))));
        }
    });

    assert_eq!(invocations.load(Ordering::Relaxed), 1);
    assert!(signal.read().unwrap().is_completed_or_err().is_err());
}
