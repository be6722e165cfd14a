// Expiry Evaluator - Decide whether a presented chain needs an alert

use crate::certificates::parser::{CertificateChain, CertificateInfo};
use crate::monitor::registry::Site;
use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in expiry messages (local time, second precision)
pub const EXPIRY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

/// What was wrong with the certificate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FindingKind {
    Expired {
        not_after: DateTime<Utc>,
    },
    ExpiringSoon {
        not_after: DateTime<Utc>,
        remaining_hours: f64,
    },
}

impl FindingKind {
    pub fn label(&self) -> &'static str {
        match self {
            FindingKind::Expired { .. } => "expired",
            FindingKind::ExpiringSoon { .. } => "expiring_soon",
        }
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        match self {
            FindingKind::Expired { not_after } | FindingKind::ExpiringSoon { not_after, .. } => {
                *not_after
            }
        }
    }
}

/// Expired or expiring certificate detected for one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub site_name: String,
    pub address: String,
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
    pub certificate_subject: String,
    pub detected_at: DateTime<Utc>,
}

impl Finding {
    fn expired(site: &Site, cert: &CertificateInfo, now: DateTime<Utc>) -> Self {
        let local = cert.not_after.with_timezone(&Local);
        let message = format!(
            "Website [{}]({}) certificate has expired: {}",
            site.name,
            site.address,
            local.format(EXPIRY_TIME_FORMAT)
        );

        Self {
            site_name: site.name.clone(),
            address: site.address.clone(),
            kind: FindingKind::Expired {
                not_after: cert.not_after,
            },
            severity: Severity::Critical,
            message,
            certificate_subject: cert.display_name().to_string(),
            detected_at: now,
        }
    }

    fn expiring_soon(
        site: &Site,
        cert: &CertificateInfo,
        remaining: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let remaining_hours = hours(remaining);
        let message = format!(
            "Website [{}]({}) certificate will expire, remaining time: {:.6}h",
            site.name, site.address, remaining_hours
        );

        Self {
            site_name: site.name.clone(),
            address: site.address.clone(),
            kind: FindingKind::ExpiringSoon {
                not_after: cert.not_after,
                remaining_hours,
            },
            severity: Severity::Warning,
            message,
            certificate_subject: cert.display_name().to_string(),
            detected_at: now,
        }
    }
}

/// Applies the expiry rule with a fixed lead time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryEvaluator {
    lead_time: Duration,
}

impl ExpiryEvaluator {
    /// Lead times too large for chrono saturate, flagging every valid certificate
    pub fn new(lead_time: std::time::Duration) -> Self {
        Self {
            lead_time: Duration::from_std(lead_time).unwrap_or(Duration::MAX),
        }
    }

    pub fn lead_time(&self) -> Duration {
        self.lead_time
    }

    pub fn evaluate(
        &self,
        site: &Site,
        chain: &CertificateChain,
        now: DateTime<Utc>,
    ) -> Option<Finding> {
        evaluate(site, chain, now, self.lead_time)
    }
}

/// Walk the chain in presented order and report the first certificate that is
/// expired (`not_after <= now`) or closer to expiry than `lead_time`.
///
/// Later certificates are not inspected once one fails. An empty chain yields
/// no finding.
pub fn evaluate(
    site: &Site,
    chain: &CertificateChain,
    now: DateTime<Utc>,
    lead_time: Duration,
) -> Option<Finding> {
    for cert in chain {
        let remaining = cert.remaining(now);

        if remaining <= Duration::zero() {
            return Some(Finding::expired(site, cert, now));
        }

        if remaining < lead_time {
            return Some(Finding::expiring_soon(site, cert, remaining, now));
        }
    }

    None
}

fn hours(duration: Duration) -> f64 {
    duration.as_seconds_f64() / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn site() -> Site {
        Site::new("bleem", "Blog", "https://mritd.com")
    }

    fn cert(subject: &str, not_after: DateTime<Utc>) -> CertificateInfo {
        CertificateInfo {
            subject: format!("CN={}", subject),
            common_name: Some(subject.to_string()),
            issuer: "CN=Test CA".to_string(),
            serial_number: "01".to_string(),
            not_before: not_after - Duration::days(90),
            not_after,
            san: vec![subject.to_string()],
            is_ca: false,
        }
    }

    fn chain(certs: Vec<CertificateInfo>) -> CertificateChain {
        CertificateChain::new(certs)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    /// Single-certificate chain against a seven day lead time
    fn check(not_after: DateTime<Utc>) -> Option<Finding> {
        evaluate(&site(), &chain(vec![cert("mritd.com", not_after)]), now(), Duration::days(7))
    }

    #[test]
    fn test_expired_one_second_ago() {
        let not_after = now() - Duration::seconds(1);
        let finding = check(not_after).unwrap();

        assert!(matches!(finding.kind, FindingKind::Expired { .. }));
        assert_eq!(finding.severity, Severity::Critical);
        assert!(finding.message.contains("bleem"));
        assert!(finding.message.contains("https://mritd.com"));

        let formatted = not_after.with_timezone(&Local).format(EXPIRY_TIME_FORMAT).to_string();
        assert!(finding.message.ends_with(&formatted));
    }

    #[test]
    fn test_expires_exactly_now_counts_as_expired() {
        let finding = check(now()).unwrap();
        assert_eq!(finding.kind, FindingKind::Expired { not_after: now() });
    }

    #[test]
    fn test_expiring_within_lead_time() {
        let not_after = now() + Duration::days(3);
        let finding = check(not_after).unwrap();

        match finding.kind {
            FindingKind::ExpiringSoon { remaining_hours, .. } => {
                assert!((remaining_hours - 72.0).abs() < 1e-9);
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(finding.severity, Severity::Warning);
        assert!(finding.message.ends_with("remaining time: 72.000000h"));
    }

    #[test]
    fn test_remaining_hours_keep_sub_millisecond_precision() {
        let not_after = now() + Duration::hours(1) + Duration::microseconds(900);
        let finding = check(not_after).unwrap();

        match finding.kind {
            FindingKind::ExpiringSoon { remaining_hours, .. } => {
                assert!(remaining_hours > 1.0);
                assert!((remaining_hours - (1.0 + 0.0009 / 3600.0)).abs() < 1e-12);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_outside_lead_time_no_finding() {
        let not_after = now() + Duration::days(30);
        assert!(check(not_after).is_none());
    }

    #[test]
    fn test_remaining_equal_to_lead_time_no_finding() {
        let not_after = now() + Duration::days(7);
        assert!(check(not_after).is_none());
    }

    #[test]
    fn test_zero_lead_time_only_reports_expired() {
        let evaluator = ExpiryEvaluator::new(std::time::Duration::ZERO);
        let valid = chain(vec![cert("mritd.com", now() + Duration::seconds(1))]);
        assert!(evaluator.evaluate(&site(), &valid, now()).is_none());

        let expired = chain(vec![cert("mritd.com", now() - Duration::seconds(1))]);
        assert!(evaluator.evaluate(&site(), &expired, now()).is_some());
    }

    #[test]
    fn test_empty_chain_no_finding() {
        let empty = CertificateChain::default();
        assert!(evaluate(&site(), &empty, now(), Duration::days(7)).is_none());
    }

    #[test]
    fn test_first_failing_certificate_wins() {
        let certs = vec![
            cert("leaf", now() + Duration::days(60)),
            cert("intermediate", now() + Duration::days(2)),
            cert("root", now() - Duration::days(1)),
        ];

        let finding = evaluate(&site(), &chain(certs), now(), Duration::days(7)).unwrap();

        assert_eq!(finding.certificate_subject, "intermediate");
        assert!(matches!(finding.kind, FindingKind::ExpiringSoon { .. }));
    }

    #[test]
    fn test_expired_leaf_masks_later_certificates() {
        let certs = vec![
            cert("leaf", now() - Duration::hours(1)),
            cert("intermediate", now() - Duration::days(3)),
        ];

        let finding = evaluate(&site(), &chain(certs), now(), Duration::days(7)).unwrap();
        assert_eq!(finding.certificate_subject, "leaf");
        assert_eq!(finding.kind.not_after(), now() - Duration::hours(1));
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let evaluator = ExpiryEvaluator::new(std::time::Duration::from_secs(7 * 86400));
        let c = chain(vec![cert("mritd.com", now() + Duration::hours(30))]);

        let first = evaluator.evaluate(&site(), &c, now());
        let second = evaluator.evaluate(&site(), &c, now());
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn test_huge_lead_time_saturates() {
        let evaluator = ExpiryEvaluator::new(std::time::Duration::from_secs(u64::MAX));
        assert_eq!(evaluator.lead_time(), Duration::MAX);

        let c = chain(vec![cert("mritd.com", now() + Duration::days(3650))]);
        assert!(evaluator.evaluate(&site(), &c, now()).is_some());
    }

    #[test]
    fn test_finding_kind_labels() {
        let expired = FindingKind::Expired { not_after: now() };
        let soon = FindingKind::ExpiringSoon {
            not_after: now(),
            remaining_hours: 1.0,
        };
        assert_eq!(expired.label(), "expired");
        assert_eq!(soon.label(), "expiring_soon");
        assert_eq!(Severity::Critical.to_string(), "Critical");
    }
}
