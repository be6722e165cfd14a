// Scheduling Engine - Drives monitoring passes on the configured schedule

use crate::certificates::fetcher::CertificateFetcher;
use crate::monitor::alerts::Notifier;
use crate::monitor::evaluator::{ExpiryEvaluator, Finding};
use crate::monitor::registry::{Site, SiteRegistry};
use crate::monitor::schedule::ScheduleExpr;
use crate::utils::duration::format_duration;
use crate::{MonitorError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

/// Result of checking one site during a pass
#[derive(Debug, Clone)]
pub enum SiteOutcome {
    /// Every certificate is outside the lead time
    Healthy,
    /// A finding was produced; `delivered` is false when the notifier failed
    Finding { finding: Finding, delivered: bool },
    /// The chain could not be fetched; nothing was evaluated
    FetchFailed { error: String },
}

/// Summary of a finished pass
#[derive(Debug, Clone, Default)]
pub struct PassSummary {
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed: Duration,
    pub sites_checked: usize,
    pub healthy: usize,
    pub findings: Vec<Finding>,
    pub undelivered: usize,
    /// (site name, error) for every site whose fetch failed
    pub fetch_failures: Vec<(String, String)>,
}

impl PassSummary {
    fn record(&mut self, site_name: &str, outcome: SiteOutcome) {
        self.sites_checked += 1;
        match outcome {
            SiteOutcome::Healthy => self.healthy += 1,
            SiteOutcome::Finding { finding, delivered } => {
                if !delivered {
                    self.undelivered += 1;
                }
                self.findings.push(finding);
            }
            SiteOutcome::FetchFailed { error } => {
                self.fetch_failures.push((site_name.to_string(), error));
            }
        }
    }
}

/// Owns the schedule and runs passes over the site registry
pub struct Scheduler {
    schedule: ScheduleExpr,
    registry: Arc<SiteRegistry>,
    fetcher: Arc<dyn CertificateFetcher>,
    notifier: Arc<dyn Notifier>,
    evaluator: ExpiryEvaluator,
    timeout: Duration,
    check_semaphore: Arc<Semaphore>,
    check_on_startup: bool,
    passes_completed: AtomicU64,
    last_pass: Mutex<Option<PassSummary>>,
}

impl Scheduler {
    pub fn new(
        schedule: ScheduleExpr,
        registry: Arc<SiteRegistry>,
        fetcher: Arc<dyn CertificateFetcher>,
        notifier: Arc<dyn Notifier>,
        evaluator: ExpiryEvaluator,
        timeout: Duration,
        max_concurrent_checks: usize,
    ) -> Self {
        Self {
            schedule,
            registry,
            fetcher,
            notifier,
            evaluator,
            timeout,
            check_semaphore: Arc::new(Semaphore::new(max_concurrent_checks.max(1))),
            check_on_startup: false,
            passes_completed: AtomicU64::new(0),
            last_pass: Mutex::new(None),
        }
    }

    /// Run one pass before waiting for the first tick
    pub fn with_check_on_startup(mut self, enabled: bool) -> Self {
        self.check_on_startup = enabled;
        self
    }

    pub fn schedule(&self) -> &ScheduleExpr {
        &self.schedule
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    pub fn passes_completed(&self) -> u64 {
        self.passes_completed.load(Ordering::SeqCst)
    }

    /// Summary of the most recent pass, if any ran
    pub async fn last_pass(&self) -> Option<PassSummary> {
        self.last_pass.lock().await.clone()
    }

    /// Run passes forever. Fails if the schedule runs out of ticks.
    pub async fn start(&self) -> Result<()> {
        if self.check_on_startup {
            tracing::info!("Running startup check");
            self.run_pass().await;
        }

        let mut previous = Utc::now();

        loop {
            let now = Utc::now();
            let Some(next) = next_tick(&self.schedule, previous, now) else {
                return Err(MonitorError::Schedule {
                    expression: self.schedule.to_string(),
                    reason: "schedule has no further ticks".to_string(),
                });
            };

            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tracing::debug!("Next pass at {} (in {})", next, format_duration(wait));
            tokio::time::sleep(wait).await;

            self.run_pass().await;
            previous = next;
        }
    }

    /// Check every registered site once and deliver findings as they appear
    pub async fn run_pass(&self) -> PassSummary {
        let started_at = Utc::now();
        let clock = Instant::now();

        tracing::info!("Checking {} sites", self.registry.len());

        let mut tasks = Vec::with_capacity(self.registry.len());

        for site in self.registry.iter() {
            let site = site.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let notifier = Arc::clone(&self.notifier);
            let semaphore = Arc::clone(&self.check_semaphore);
            let evaluator = self.evaluator;
            let timeout = self.timeout;

            let name = site.name.clone();
            let task = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                Self::check_site(site, fetcher, notifier, evaluator, timeout).await
            });

            tasks.push((name, task));
        }

        let mut summary = PassSummary {
            started_at: Some(started_at),
            ..PassSummary::default()
        };

        for (name, task) in tasks {
            match task.await {
                Ok(outcome) => summary.record(&name, outcome),
                Err(e) => {
                    tracing::error!("Check task for {} failed: {}", name, e);
                    summary.record(&name, SiteOutcome::FetchFailed { error: e.to_string() });
                }
            }
        }

        summary.elapsed = clock.elapsed();
        self.passes_completed.fetch_add(1, Ordering::SeqCst);

        tracing::info!(
            "Pass complete in {}: {} checked, {} healthy, {} findings, {} fetch failures",
            format_duration(summary.elapsed),
            summary.sites_checked,
            summary.healthy,
            summary.findings.len(),
            summary.fetch_failures.len()
        );

        *self.last_pass.lock().await = Some(summary.clone());
        summary
    }

    /// Fetch, evaluate and notify for one site (static for spawned tasks)
    pub async fn check_site(
        site: Site,
        fetcher: Arc<dyn CertificateFetcher>,
        notifier: Arc<dyn Notifier>,
        evaluator: ExpiryEvaluator,
        timeout: Duration,
    ) -> SiteOutcome {
        tracing::info!("Checking {} ({})", site.name, site.address);

        let fetch = fetcher.fetch(&site.address, timeout);
        let fetched = match tokio::time::timeout(timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(MonitorError::Timeout { duration: timeout }),
        };

        let chain = match fetched {
            Ok(chain) => chain,
            Err(e) => {
                tracing::warn!("Skipping {} ({}): {}", site.name, site.address, e);
                return SiteOutcome::FetchFailed { error: e.to_string() };
            }
        };

        let Some(finding) = evaluator.evaluate(&site, &chain, Utc::now()) else {
            tracing::debug!("{}: {} certificates within validity", site.name, chain.len());
            return SiteOutcome::Healthy;
        };

        tracing::warn!("{}", finding.message);

        let delivered = match notifier.notify(&finding).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to deliver finding for {}: {}", site.name, e);
                false
            }
        };

        SiteOutcome::Finding { finding, delivered }
    }
}

/// First tick after `previous` that is still ahead of `now`. Ticks that
/// passed while a pass was running are skipped.
pub fn next_tick(
    schedule: &ScheduleExpr,
    previous: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let mut next = schedule.next_after(previous)?;
    if next > now {
        return Some(next);
    }

    let skipped = match schedule.interval() {
        // Fixed intervals jump straight past `now`
        Some(every) => {
            let every = chrono::Duration::from_std(every).ok()?;
            let behind = (now - next).num_milliseconds() / every.num_milliseconds().max(1);
            let steps = i32::try_from(behind.checked_add(1)?).ok()?;
            next = next.checked_add_signed(every.checked_mul(steps)?)?;
            while next <= now {
                next = next.checked_add_signed(every)?;
            }
            i64::from(steps)
        }
        None => {
            let mut skipped = 0u64;
            while next <= now {
                skipped += 1;
                next = schedule.next_after(next)?;
            }
            skipped as i64
        }
    };

    tracing::warn!("Skipped {} missed tick(s) of {}", skipped, schedule);
    Some(next)
}
