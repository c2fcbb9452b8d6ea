//! The single-thread notification queue owned by each store.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};
use parking_lot::Mutex;

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs listener jobs one at a time, in submission order, on a dedicated
/// thread. Closing drops the sender and joins the thread once the queue
/// has drained.
pub(crate) struct Notifier {
    sender: Mutex<Option<Sender<Job>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    thread: ThreadId,
}

impl Notifier {
    pub(crate) fn spawn(name: &str) -> std::io::Result<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || drain(receiver))?;
        Ok(Self {
            thread: handle.thread().id(),
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        })
    }

    pub(crate) fn submit(&self, job: Job) {
        match self.sender.lock().as_ref() {
            Some(sender) => {
                if sender.send(job).is_err() {
                    warn!("Notification worker is gone; dropping listener call");
                }
            }
            None => debug!("Store is closed; dropping listener call"),
        }
    }

    /// Block until every job submitted so far has run.
    ///
    /// Called from a listener (i.e. on the worker itself) this returns at
    /// once, since waiting would deadlock.
    pub(crate) fn flush(&self) {
        if self.on_worker() {
            return;
        }
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
        self.submit(Box::new(move || {
            let _ = done_tx.send(());
        }));
        // A closed store drops the marker job, which disconnects the channel.
        let _ = done_rx.recv();
    }

    pub(crate) fn close(&self) {
        drop(self.sender.lock().take());
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if self.on_worker() {
                return;
            }
            if handle.join().is_err() {
                warn!("Notification worker exited abnormally");
            }
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    fn on_worker(&self) -> bool {
        thread::current().id() == self.thread
    }
}

fn drain(receiver: Receiver<Job>) {
    for job in receiver {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            warn!("Option listener panicked: {}", panic_message(payload.as_ref()));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn jobs_run_in_submission_order() {
        let notifier = Notifier::spawn("test-notifier").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..20 {
            let seen = seen.clone();
            notifier.submit(Box::new(move || seen.lock().push(i)));
        }
        notifier.flush();
        assert_eq!(*seen.lock(), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn panicking_job_does_not_stop_the_worker() {
        let notifier = Notifier::spawn("test-notifier").unwrap();
        let seen = Arc::new(Mutex::new(0));
        notifier.submit(Box::new(|| panic!("boom")));
        let counter = seen.clone();
        notifier.submit(Box::new(move || *counter.lock() += 1));
        notifier.flush();
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn close_drains_then_drops_new_jobs() {
        let notifier = Notifier::spawn("test-notifier").unwrap();
        let seen = Arc::new(Mutex::new(0));
        let counter = seen.clone();
        notifier.submit(Box::new(move || *counter.lock() += 1));
        notifier.close();
        assert!(notifier.is_closed());
        assert_eq!(*seen.lock(), 1);

        let counter = seen.clone();
        notifier.submit(Box::new(move || *counter.lock() += 1));
        notifier.flush();
        assert_eq!(*seen.lock(), 1);
    }
}
