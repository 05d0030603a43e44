//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every endpoint, each on its own schedule
//! - Bound the number of probes in flight
//! - Report each round's outcome to the availability sink

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinSet;
use tokio::time;
use tracing::Instrument;

use crate::backend::{BackendPair, Role};
use crate::config::HealthCheckConfig;
use crate::health::probe::{probe_with_retries, ProbeOutcome, ProbeTarget};
use crate::health::AvailabilitySink;
use crate::lifecycle::Shutdown;

pub struct HealthMonitor {
    targets: Vec<ProbeTarget>,
    sink: Arc<dyn AvailabilitySink>,
    config: HealthCheckConfig,
    /// One permit per probe worker, created up front.
    workers: Arc<Semaphore>,
    started: AtomicBool,
}

impl HealthMonitor {
    pub fn new(
        targets: Vec<ProbeTarget>,
        sink: Arc<dyn AvailabilitySink>,
        config: HealthCheckConfig,
    ) -> Self {
        let workers = Arc::new(Semaphore::new(config.thread_count.max(1)));
        Self {
            targets,
            sink,
            config,
            workers,
            started: AtomicBool::new(false),
        }
    }

    /// Monitor every endpoint of a pair and report back into it.
    pub fn for_pair(pair: Arc<BackendPair>, config: HealthCheckConfig) -> Self {
        let targets = pair
            .endpoints()
            .map(|endpoint| ProbeTarget::new(endpoint.role(), endpoint.factory().clone()))
            .collect();
        Self::new(targets, pair, config)
    }

    pub fn targets(&self) -> &[ProbeTarget] {
        &self.targets
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Spawn one probe loop per endpoint on the current runtime.
    ///
    /// Only the first call spawns; later calls return false. Loops stop when
    /// the shutdown signal fires or the `Shutdown` is dropped.
    pub fn start(&self, shutdown: &Shutdown) -> bool {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Health monitor already started");
            return false;
        }

        tracing::info!(
            endpoints = self.targets.len(),
            initial_delay_ms = self.config.initial_delay_ms,
            period_ms = self.config.monitor_period_ms,
            recheck_times = self.config.recheck_times,
            workers = self.config.thread_count,
            "Health monitor starting"
        );

        for target in &self.targets {
            let task = ProbeLoop {
                target: target.clone(),
                sink: self.sink.clone(),
                config: self.config.clone(),
                workers: self.workers.clone(),
            };
            let span = tracing::info_span!("health_probe", endpoint = %target.role);
            tokio::spawn(task.run(shutdown.subscribe()).instrument(span));
        }
        true
    }

    /// Probe every endpoint once, concurrently, and report the outcomes.
    pub async fn check_all(&self) -> Vec<(Role, ProbeOutcome)> {
        let mut probes = JoinSet::new();
        for target in &self.targets {
            let task = ProbeLoop {
                target: target.clone(),
                sink: self.sink.clone(),
                config: self.config.clone(),
                workers: self.workers.clone(),
            };
            probes.spawn(async move { (task.target.role, task.tick().await) });
        }

        let mut outcomes = Vec::with_capacity(self.targets.len());
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!(error = %e, "Health probe task failed"),
            }
        }
        outcomes.sort_by_key(|(role, _)| *role == Role::Slave);
        outcomes
    }
}

/// Probe schedule for one endpoint.
struct ProbeLoop {
    target: ProbeTarget,
    sink: Arc<dyn AvailabilitySink>,
    config: HealthCheckConfig,
    workers: Arc<Semaphore>,
}

impl ProbeLoop {
    // Fixed delay: the period is measured from the end of one round.
    async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut delay = self.config.initial_delay();
        loop {
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Health probe received shutdown signal, exiting loop");
                    break;
                }
            }
            self.tick().await;
            delay = self.config.monitor_period();
        }
    }

    async fn tick(&self) -> ProbeOutcome {
        let outcome = match self.workers.clone().acquire_owned().await {
            Ok(_permit) => probe_with_retries(&self.target, &self.config).await,
            Err(_) => {
                tracing::error!("Health check workers closed");
                return ProbeOutcome::Unavailable;
            }
        };

        match outcome {
            ProbeOutcome::Available => self.sink.on_available(self.target.role),
            ProbeOutcome::Unavailable => self.sink.on_unavailable(self.target.role),
        }
        outcome
    }
}
