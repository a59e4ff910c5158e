use crate::config::AppConfig;
use crate::core::{Reconcile, ReconcileOutcome};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Renewing three times per lease leaves two spare ticks before a mapping expires.
pub fn tick_interval(lease: Duration) -> Duration {
    lease / 3
}

pub struct Scheduler<R: Reconcile> {
    reconciler: R,
    interval: Duration,
}

impl<R: Reconcile> Scheduler<R> {
    pub fn new(reconciler: R, config: &AppConfig) -> Self {
        Self::with_lease(reconciler, config.period)
    }

    pub fn with_lease(reconciler: R, lease: Duration) -> Self {
        Self {
            reconciler,
            interval: tick_interval(lease),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.interval
    }

    /// Runs one pass and logs its result. Errors never leave this function.
    pub async fn run_pass(&self) -> bool {
        match self.reconciler.reconcile().await {
            Ok(ReconcileOutcome::Unchanged { port }) => {
                tracing::debug!("Peer port {} already up to date", port);
                true
            }
            Ok(ReconcileOutcome::Updated { from, to }) => {
                tracing::info!("Peer port updated from {} to {}", from, to);
                true
            }
            Err(e) => {
                tracing::error!("failed to map ports: {}", e);
                tracing::debug!("Recovery suggestion: {}", e.recovery_suggestion());
                false
            }
        }
    }

    /// First pass runs immediately, then one per tick until the process is killed.
    pub async fn run_forever(self) -> ! {
        tracing::info!(
            "Reconciling every {:?} (lease {:?})",
            self.interval,
            self.interval * 3
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.run_pass().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Result;
    use crate::domain::model::Protocol;
    use crate::utils::error::{GatewayFailure, SyncError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fails the first pass, succeeds afterwards.
    struct FlakyReconciler {
        passes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Reconcile for FlakyReconciler {
        async fn reconcile(&self) -> Result<ReconcileOutcome> {
            let pass = self.passes.fetch_add(1, Ordering::SeqCst) + 1;
            if pass == 1 {
                return Err(SyncError::GatewayError {
                    protocol: Protocol::Tcp,
                    source: GatewayFailure::Timeout(Duration::from_secs(4)),
                });
            }
            Ok(ReconcileOutcome::Unchanged { port: 51413 })
        }
    }

    /// Takes longer than one tick and records how many passes overlap.
    #[derive(Default)]
    struct SlowReconciler {
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
        started: Arc<AtomicUsize>,
        finished: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Reconcile for SlowReconciler {
        async fn reconcile(&self) -> Result<ReconcileOutcome> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_secs(30)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(ReconcileOutcome::Unchanged { port: 51413 })
        }
    }

    #[test]
    fn test_tick_interval_is_a_third_of_lease() {
        assert_eq!(tick_interval(Duration::from_secs(60)), Duration::from_secs(20));
        assert_eq!(tick_interval(Duration::from_secs(90)), Duration::from_secs(30));

        let scheduler = Scheduler::with_lease(
            FlakyReconciler {
                passes: Arc::new(AtomicUsize::new(0)),
            },
            Duration::from_secs(60),
        );
        assert_eq!(scheduler.tick_interval(), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_run_pass_swallows_errors() {
        let passes = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::with_lease(
            FlakyReconciler {
                passes: passes.clone(),
            },
            Duration::from_secs(60),
        );

        assert!(!scheduler.run_pass().await);
        assert!(scheduler.run_pass().await);
        assert_eq!(passes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keeps_running_after_failed_pass() {
        let passes = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::with_lease(
            FlakyReconciler {
                passes: passes.clone(),
            },
            Duration::from_secs(60),
        );

        let handle = tokio::spawn(async move {
            scheduler.run_forever().await;
        });

        // first pass fires immediately
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(passes.load(Ordering::SeqCst), 1);
        assert!(!handle.is_finished());

        // second pass one tick later
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(passes.load(Ordering::SeqCst), 2);
        assert!(!handle.is_finished());

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(passes.load(Ordering::SeqCst), 3);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_pass_delays_next_tick() {
        let reconciler = SlowReconciler::default();
        let max_in_flight = reconciler.max_in_flight.clone();
        let started = reconciler.started.clone();
        let finished = reconciler.finished.clone();

        // 20s ticks, 30s passes
        let scheduler = Scheduler::with_lease(reconciler, Duration::from_secs(60));
        let handle = tokio::spawn(async move {
            scheduler.run_forever().await;
        });

        // the tick due at 20s waits for the first pass
        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 0);

        // and fires as soon as it finishes at 30s
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(started.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);

        handle.abort();
    }
}
