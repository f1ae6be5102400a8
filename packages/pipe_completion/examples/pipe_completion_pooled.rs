//! Demonstrates a pooled pipe writer that notifies its observers when it completes.
//!
//! The subscriber is configured at `TRACE` level, so the log output of the signal itself is
//! interleaved with the output of the observers.

use std::cell::RefCell;

use pipe_completion::{CompletionSignal, Error};
use tracing::Level;

#[derive(Debug)]
struct WriteFault {
    bytes_lost: usize,
}

#[derive(Default)]
struct PipeWriter {
    completion: RefCell<CompletionSignal<WriteFault, &'static str>>,
    pending: RefCell<Vec<u8>>,
}

impl PipeWriter {
    fn subscribe(&self, observer: &'static str) -> Result<(), Error> {
        self.completion.borrow_mut().attach_callback(
            |fault, observer| match fault {
                Some(fault) => println!("{observer}: writer faulted, {} bytes lost", fault.bytes_lost),
                None => println!("{observer}: writer finished"),
            },
            observer,
        )
    }

    fn write(&self, bytes: &[u8]) -> Result<(), String> {
        if self
            .completion
            .borrow()
            .is_completed_or_err()
            .map_err(|fault| format!("{fault:?}"))?
        {
            return Err("writer already completed".to_string());
        }

        self.pending.borrow_mut().extend_from_slice(bytes);
        Ok(())
    }

    fn complete(&self, fault: Option<WriteFault>) {
        let must_invoke = {
            let mut completion = self.completion.borrow_mut();
            !completion.is_completed() && completion.try_complete(fault)
        };

        // Observers run after the exclusive borrow is released.
        if must_invoke {
            self.completion.borrow().invoke_callbacks();
        }
    }

    fn recycle(&self) {
        self.completion.borrow_mut().reset();
        self.pending.borrow_mut().clear();
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .init();

    let mut pool = vec![PipeWriter::default()];

    for cycle in 0..2 {
        let writer = pool.pop().unwrap_or_default();

        writer.subscribe("flusher").unwrap();
        writer.subscribe("metrics").unwrap();

        writer.write(b"hello").unwrap();

        if cycle == 0 {
            writer.complete(None);
        } else {
            let bytes_lost = writer.pending.borrow().len();
            writer.complete(Some(WriteFault { bytes_lost }));
        }

        println!("after cycle {cycle}: {}", writer.completion.borrow());

        match writer.write(b"too late") {
            Ok(()) => unreachable!("completed writers reject writes"),
            Err(reason) => println!("write rejected: {reason}"),
        }

        if let Err(error) = writer.subscribe("latecomer") {
            println!("subscription rejected: {error}");
        }

        writer.recycle();
        pool.push(writer);
    }
}
