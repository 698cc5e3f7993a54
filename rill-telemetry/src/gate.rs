//! Stream completion gate.
//!
//! A one-shot, multi-waiter signal used to hold a span open while a
//! background stream parse is still running. The write side is a guard
//! whose drop closes the gate, so a task releases its waiters however it
//! exits, unwinding included.

use tokio::sync::watch;

/// Read side of the gate. Cloneable; any number of tasks may
/// [`wait`](StreamGate::wait) on it.
#[derive(Clone)]
pub struct StreamGate {
    rx: watch::Receiver<()>,
}

/// Write side of the gate. Closing is dropping: move the guard into the
/// task whose completion the gate tracks and let ownership do the rest.
pub struct GateGuard {
    _tx: watch::Sender<()>,
}

impl StreamGate {
    /// Create a gate and its closing guard.
    pub fn new() -> (StreamGate, GateGuard) {
        let (tx, rx) = watch::channel(());
        (StreamGate { rx }, GateGuard { _tx: tx })
    }

    /// Block the calling task until the guard is dropped. Returns
    /// immediately if the gate is already closed.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        // The sender never publishes a value; the only observable event is
        // its drop, which surfaces here as a closed channel.
        while rx.changed().await.is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_wait_returns_once_guard_drops() {
        let (gate, guard) = StreamGate::new();
        let waiter = tokio::spawn(async move { gate.wait().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);
        timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should unblock")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_after_close_returns_immediately() {
        let (gate, guard) = StreamGate::new();
        drop(guard);
        timeout(Duration::from_millis(50), gate.wait())
            .await
            .expect("closed gate should not block");
    }

    #[tokio::test]
    async fn test_multiple_waiters_all_unblock() {
        let (gate, guard) = StreamGate::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.wait().await })
            })
            .collect();
        drop(guard);
        for waiter in waiters {
            timeout(Duration::from_secs(1), waiter)
                .await
                .expect("all waiters should unblock")
                .unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_panicking_task_still_closes_gate() {
        let (gate, guard) = StreamGate::new();
        let task = tokio::spawn(async move {
            let _guard = guard;
            panic!("parse blew up");
        });
        assert!(task.await.is_err());
        timeout(Duration::from_millis(200), gate.wait())
            .await
            .expect("gate must close when its task panics");
    }
}
