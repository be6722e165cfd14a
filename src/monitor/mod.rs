// Certificate Expiry Monitoring
//
// Periodically connects to each configured site, inspects the presented
// certificate chain and reports certificates that have expired or will
// expire within the configured lead time:
// - SiteRegistry holds the fixed list of monitored sites
// - Scheduler fires passes on a cron or `@every` schedule
// - ExpiryEvaluator turns a fetched chain into at most one Finding
// - AlertManager delivers findings through webhook and Slack channels

pub mod alerts;
pub mod config;
pub mod daemon;
pub mod evaluator;
pub mod registry;
pub mod schedule;
pub mod scheduler;

// Re-export commonly used types
pub use alerts::{Alert, AlertChannel, AlertManager, AlertType, CallbackNotifier, Notifier};
pub use config::MonitorConfig;
pub use daemon::{DaemonStats, MonitorDaemon};
pub use evaluator::{ExpiryEvaluator, Finding, FindingKind, Severity, evaluate};
pub use registry::{Site, SiteRegistry};
pub use schedule::ScheduleExpr;
pub use scheduler::{PassSummary, Scheduler, SiteOutcome};
