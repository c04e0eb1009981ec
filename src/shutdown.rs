//! Interrupt signalling for the main path
//!
//! The trigger side is handed to the Ctrl-C handler; the signal side is
//! polled by the emitter. Timed waits select on the signal so an interrupt
//! abandons the wait immediately.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Fires the shutdown signal; cheap to clone
#[derive(Clone)]
pub struct ShutdownTrigger {
    tx: Sender<()>,
    triggered: Arc<AtomicBool>,
}

/// Observes the shutdown signal
pub struct ShutdownSignal {
    rx: Receiver<()>,
    triggered: Arc<AtomicBool>,
}

/// Create a connected trigger/signal pair
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = bounded(1);
    let triggered = Arc::new(AtomicBool::new(false));
    (
        ShutdownTrigger {
            tx,
            triggered: Arc::clone(&triggered),
        },
        ShutdownSignal { rx, triggered },
    )
}

impl ShutdownTrigger {
    /// Request shutdown; repeated calls are no-ops
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        // A full channel means a wake-up is already pending
        let _ = self.tx.try_send(());
    }
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` unless shutdown is requested first
    ///
    /// Returns `true` if the wait ended because of a shutdown request.
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        match self.rx.recv_timeout(duration) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) => self.is_triggered(),
            Err(RecvTimeoutError::Disconnected) => {
                // Every trigger is gone, so nothing can interrupt this wait
                std::thread::sleep(duration);
                self.is_triggered()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_wait_times_out() {
        let (_trigger, signal) = shutdown_channel();
        let start = Instant::now();
        assert!(!signal.wait(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_trigger_interrupts_wait() {
        let (trigger, signal) = shutdown_channel();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            trigger.trigger();
        });

        let start = Instant::now();
        assert!(signal.wait(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(signal.is_triggered());
        handle.join().unwrap();
    }

    #[test]
    fn test_trigger_is_sticky_and_repeatable() {
        let (trigger, signal) = shutdown_channel();
        trigger.trigger();
        trigger.trigger();

        assert!(signal.wait(Duration::from_millis(1)));
        // The channel wake-up was consumed, the flag still reports shutdown
        assert!(signal.wait(Duration::from_millis(1)));
    }

    #[test]
    fn test_dropped_trigger_still_sleeps() {
        let (trigger, signal) = shutdown_channel();
        drop(trigger);
        let start = Instant::now();
        assert!(!signal.wait(Duration::from_millis(10)));
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
