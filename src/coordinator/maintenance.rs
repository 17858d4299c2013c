// ABOUTME: Background maintenance loops driven by a ticker and a shutdown channel.
// ABOUTME: A failing iteration is logged and the loop keeps going.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error};

use crate::error::OrchestrationError;

/// Handle to running maintenance loops.
///
/// Dropping the handle closes the shutdown channel, which also stops the
/// loops at their next wakeup.
#[derive(Debug)]
pub struct MaintenanceHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl MaintenanceHandle {
    pub(crate) fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown,
            tasks: Vec::new(),
        }
    }

    /// Start a loop that runs `tick` every `period`, first after one full period.
    ///
    /// A zero period is refused and logged.
    pub fn spawn<F, Fut>(&mut self, name: &'static str, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), OrchestrationError>> + Send + 'static,
    {
        if period.is_zero() {
            error!(task = name, "maintenance period must be non-zero, loop not started");
            return;
        }

        let mut shutdown = self.shutdown.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = tick().await {
                            error!(task = name, error = %e, "maintenance iteration failed");
                        }
                    }
                }
            }

            debug!(task = name, "maintenance loop stopped");
        });

        self.tasks.push(handle);
    }

    /// Number of loops that have not exited.
    pub fn running(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Signal every loop to stop and wait for them to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_loop_waits_one_period_before_first_tick() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut handle = MaintenanceHandle::new();

        let c = count.clone();
        handle.spawn("counter", Duration::from_secs(10), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_survives_failing_iterations() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut handle = MaintenanceHandle::new();

        let c = count.clone();
        handle.spawn("flaky", Duration::from_secs(1), move || {
            let c = c.clone();
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n % 2 == 0 {
                    Err(OrchestrationError::AgentNotFound(format!("iteration-{}", n)))
                } else {
                    Ok(())
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert_eq!(handle.running(), 1);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_zero_period_is_refused() {
        let mut handle = MaintenanceHandle::new();
        handle.spawn("never", Duration::ZERO, || async { Ok(()) });
        assert_eq!(handle.running(), 0);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_all_loops() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut handle = MaintenanceHandle::new();

        for name in ["first", "second"] {
            let c = count.clone();
            handle.spawn(name, Duration::from_secs(1), move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });
        }

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        handle.shutdown().await;
        let after_shutdown = count.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_shutdown);
    }
}
