// Schedule expressions - when a monitoring pass fires

use crate::utils::duration::parse_duration;
use crate::{MonitorError, Result};
use chrono::{DateTime, Local, Utc};
use std::str::FromStr;
use std::time::Duration;

/// Shortest `@every` interval; anything below is rounded up
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Parsed schedule expression
///
/// Supported forms:
/// ```text
/// @every 1h            fixed interval, first tick one interval after start
/// @every 1h30m        intervals under one second are rounded up to 1s
/// @hourly @daily @midnight @weekly @monthly @yearly @annually
/// 0 0 */6 * * *        cron with seconds (6 or 7 fields)
/// */15 * * * *         classic 5-field cron, seconds fixed at 0
/// ```
/// Cron expressions are evaluated in local time.
#[derive(Debug, Clone)]
pub struct ScheduleExpr {
    expression: String,
    kind: ScheduleKind,
}

#[derive(Debug, Clone)]
enum ScheduleKind {
    Every(Duration),
    Cron(Box<cron::Schedule>),
}

impl ScheduleExpr {
    pub fn parse(expression: &str) -> Result<Self> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(schedule_error(expression, "expression is empty"));
        }

        if let Some(interval) = trimmed.strip_prefix("@every") {
            let interval = interval.trim();
            if interval.is_empty() {
                return Err(schedule_error(
                    expression,
                    "@every needs a duration, e.g. @every 1h",
                ));
            }
            let every = parse_duration(interval)
                .map_err(|e| schedule_error(expression, &e.to_string()))?;
            if every.is_zero() {
                return Err(schedule_error(expression, "interval must be greater than zero"));
            }
            return Self {
                expression: trimmed.to_string(),
                kind: ScheduleKind::Every(every.max(MIN_INTERVAL)),
            }
            .ensure_fires(expression);
        }

        let cron_source = if trimmed.starts_with('@') {
            descriptor(trimmed)
                .ok_or_else(|| schedule_error(expression, "unknown descriptor"))?
                .to_string()
        } else {
            match trimmed.split_whitespace().count() {
                5 => format!("0 {}", trimmed),
                6 | 7 => trimmed.to_string(),
                n => {
                    return Err(schedule_error(
                        expression,
                        &format!("expected 5, 6 or 7 fields, found {}", n),
                    ));
                }
            }
        };

        let schedule = cron::Schedule::from_str(&cron_source)
            .map_err(|e| schedule_error(expression, &e.to_string()))?;

        Self {
            expression: trimmed.to_string(),
            kind: ScheduleKind::Cron(Box::new(schedule)),
        }
        .ensure_fires(expression)
    }

    /// Reject schedules with no tick after the current time
    fn ensure_fires(self, expression: &str) -> Result<Self> {
        if self.next_after(Utc::now()).is_none() {
            return Err(schedule_error(expression, "schedule never fires"));
        }
        Ok(self)
    }

    /// The expression as written in the configuration
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Fixed interval for `@every` schedules
    pub fn interval(&self) -> Option<Duration> {
        match &self.kind {
            ScheduleKind::Every(every) => Some(*every),
            ScheduleKind::Cron(_) => None,
        }
    }

    /// First tick strictly after `after`; `None` when the schedule never fires again
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match &self.kind {
            ScheduleKind::Every(every) => {
                let every = chrono::Duration::from_std(*every).ok()?;
                after.checked_add_signed(every)
            }
            ScheduleKind::Cron(schedule) => schedule
                .after(&after.with_timezone(&Local))
                .next()
                .map(|next| next.with_timezone(&Utc)),
        }
    }
}

impl FromStr for ScheduleExpr {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ScheduleExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expression)
    }
}

fn descriptor(name: &str) -> Option<&'static str> {
    match name {
        "@yearly" | "@annually" => Some("0 0 0 1 1 *"),
        "@monthly" => Some("0 0 0 1 * *"),
        "@weekly" => Some("0 0 0 * * Sun"),
        "@daily" | "@midnight" => Some("0 0 0 * * *"),
        "@hourly" => Some("0 0 * * * *"),
        _ => None,
    }
}

fn schedule_error(expression: &str, reason: &str) -> MonitorError {
    MonitorError::Schedule {
        expression: expression.to_string(),
        reason: reason.to_string(),
    }
}
