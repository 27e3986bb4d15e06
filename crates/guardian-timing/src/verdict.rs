//! Per-commit timing verdicts.

use chrono::{DateTime, FixedOffset};
use guardian_core::{GuardianError, Signal, Status};
use serde::{Deserialize, Serialize};

use crate::schedule::{PhaseSlot, PhaseWindow, Schedule};

/// Timing verdict for a single commit.
///
/// Computed fresh for every timestamp and never persisted.
///
/// # Examples
///
/// ```
/// use guardian_core::GuardianConfig;
/// use guardian_timing::schedule::Schedule;
/// use guardian_timing::verdict::evaluate_timestamp;
///
/// let config = GuardianConfig::from_json(r#"{
///     "class_days": ["Saturday"],
///     "timezone": "Asia/Kolkata",
///     "milestones": [{"phase": "Phase 1", "deadline": "2026-03-01"}]
/// }"#).unwrap();
/// let schedule = Schedule::from_config(&config).unwrap();
/// let verdict = evaluate_timestamp(&schedule, "2026-02-28T10:30:00+05:30").unwrap();
/// assert!(verdict.passed);
/// assert!(verdict.is_class_day);
/// assert_eq!(verdict.current_phase.as_deref(), Some("Phase 1"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingVerdict {
    /// `false` only when the commit is late.
    pub passed: bool,
    /// Where the commit fell on the schedule.
    pub slot: PhaseSlot,
    /// Label of the resolved phase (the last one when past all deadlines).
    pub current_phase: Option<String>,
    /// Whether the commit fell inside a phase window.
    pub is_within_milestone: bool,
    /// Committed after the deadline and after its grace period.
    pub is_late: bool,
    /// Committed after the deadline but inside the grace period.
    pub is_within_grace: bool,
    /// Calendar days from the commit's local date to the deadline date
    /// (negative once the deadline has passed).
    pub days_until_deadline: Option<i64>,
    /// Local weekday name, e.g. `"Saturday"`.
    pub commit_day: String,
    /// Commit time in the team's zone, RFC 3339.
    pub commit_local_time: Option<String>,
    /// Whether the weekday is a configured class day.
    pub is_class_day: bool,
    /// Display status.
    pub status: Status,
    /// One-line summary.
    pub detail: String,
}

impl TimingVerdict {
    /// Neutral verdict used when no usable commit timestamp is available.
    ///
    /// # Examples
    ///
    /// ```
    /// use guardian_timing::verdict::TimingVerdict;
    ///
    /// let verdict = TimingVerdict::unavailable("Commit timestamp not available");
    /// assert!(verdict.passed);
    /// assert!(verdict.current_phase.is_none());
    /// ```
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            slot: PhaseSlot::Unconfigured,
            current_phase: None,
            is_within_milestone: false,
            is_late: false,
            is_within_grace: false,
            days_until_deadline: None,
            commit_day: "Unknown".into(),
            commit_local_time: None,
            is_class_day: false,
            status: Status::Warn,
            detail: detail.into(),
        }
    }
}

impl Signal for TimingVerdict {
    fn passed(&self) -> bool {
        self.passed
    }

    fn status(&self) -> Status {
        self.status
    }

    fn detail(&self) -> &str {
        &self.detail
    }
}

/// Evaluate a commit moment against the schedule.
///
/// The commit is converted to the team's zone, resolved to a phase, and
/// compared with that phase's deadline. Commits past every deadline are
/// always late and are measured against the last milestone.
pub fn evaluate(schedule: &Schedule, commit: DateTime<FixedOffset>) -> TimingVerdict {
    let local = commit.with_timezone(&schedule.timezone());
    let commit_day = local.format("%A").to_string();
    let is_class_day = schedule.is_class_day(&commit_day);
    let slot = schedule.resolve(&local);
    tracing::debug!(?slot, local = %local, "resolved commit phase");

    let Some(window) = schedule.window_for(slot) else {
        return TimingVerdict {
            passed: true,
            slot,
            current_phase: None,
            is_within_milestone: false,
            is_late: false,
            is_within_grace: false,
            days_until_deadline: None,
            commit_day,
            commit_local_time: Some(local.to_rfc3339()),
            is_class_day,
            status: Status::Pass,
            detail: "No milestone configured".into(),
        };
    };

    let (is_late, is_within_grace) = match slot {
        PhaseSlot::PastAllDeadlines => (true, false),
        _ => lateness(window, &local),
    };
    let days_until_deadline = (window.deadline_date - local.date_naive()).num_days();

    let detail = if days_until_deadline >= 0 {
        format!(
            "{} - {} days before deadline",
            window.label, days_until_deadline
        )
    } else {
        format!(
            "{} - {} days past deadline",
            window.label,
            days_until_deadline.abs()
        )
    };

    TimingVerdict {
        passed: !is_late,
        slot,
        current_phase: Some(window.label.clone()),
        is_within_milestone: matches!(slot, PhaseSlot::Phase { .. }),
        is_late,
        is_within_grace,
        days_until_deadline: Some(days_until_deadline),
        commit_day,
        commit_local_time: Some(local.to_rfc3339()),
        is_class_day,
        status: if is_late { Status::Fail } else { Status::Pass },
        detail,
    }
}

/// Parse an ISO-8601 timestamp with offset and evaluate it.
///
/// # Errors
///
/// Returns [`GuardianError::Parse`] if the timestamp is not valid RFC 3339.
pub fn evaluate_timestamp(schedule: &Schedule, iso: &str) -> Result<TimingVerdict, GuardianError> {
    let commit = DateTime::parse_from_rfc3339(iso.trim())
        .map_err(|e| GuardianError::Parse(format!("invalid commit timestamp '{iso}': {e}")))?;
    Ok(evaluate(schedule, commit))
}

/// `(is_late, is_within_grace)` for a moment relative to one window.
fn lateness<Tz: chrono::TimeZone>(window: &PhaseWindow, at: &DateTime<Tz>) -> (bool, bool) {
    let past_deadline = *at > window.deadline;
    let past_grace = *at > window.grace_end;
    (past_deadline && past_grace, past_deadline && !past_grace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_core::Milestone;

    fn sample_schedule() -> Schedule {
        Schedule::new(
            "Asia/Kolkata",
            2.0,
            &["Monday".to_string(), "Saturday".to_string()],
            &[
                Milestone {
                    phase: "Phase 1 - Setup".into(),
                    deadline: "2026-03-01".parse().unwrap(),
                },
                Milestone {
                    phase: "Phase 2 - Core".into(),
                    deadline: "2026-03-15".parse().unwrap(),
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn on_time_before_deadline_on_class_day() {
        let verdict = evaluate_timestamp(&sample_schedule(), "2026-02-28T10:30:00+05:30").unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.current_phase.as_deref(), Some("Phase 1 - Setup"));
        assert!(verdict.is_class_day);
        assert!(!verdict.is_late);
        assert!(!verdict.is_within_grace);
        assert_eq!(verdict.days_until_deadline, Some(1));
        assert_eq!(verdict.commit_day, "Saturday");
        assert_eq!(verdict.status, Status::Pass);
    }

    #[test]
    fn between_deadlines_resolves_to_next_phase() {
        let verdict = evaluate_timestamp(&sample_schedule(), "2026-03-10T10:30:00+05:30").unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.current_phase.as_deref(), Some("Phase 2 - Core"));
        assert_eq!(verdict.days_until_deadline, Some(5));
        assert_eq!(verdict.detail, "Phase 2 - Core - 5 days before deadline");
    }

    #[test]
    fn within_grace_period_is_on_time() {
        let verdict = evaluate_timestamp(&sample_schedule(), "2026-03-01T01:30:00+05:30").unwrap();
        assert!(verdict.passed);
        assert!(!verdict.is_late);
        assert!(verdict.is_within_grace);
        assert_eq!(verdict.current_phase.as_deref(), Some("Phase 1 - Setup"));
        assert_eq!(verdict.days_until_deadline, Some(0));
    }

    #[test]
    fn past_all_deadlines_is_late() {
        let verdict = evaluate_timestamp(&sample_schedule(), "2026-04-01T10:30:00+05:30").unwrap();
        assert!(!verdict.passed);
        assert!(verdict.is_late);
        assert!(!verdict.is_within_milestone);
        assert_eq!(verdict.slot, PhaseSlot::PastAllDeadlines);
        assert_eq!(verdict.current_phase.as_deref(), Some("Phase 2 - Core"));
        assert_eq!(verdict.days_until_deadline, Some(-17));
        assert_eq!(verdict.detail, "Phase 2 - Core - 17 days past deadline");
        assert_eq!(verdict.status, Status::Fail);
    }

    #[test]
    fn wednesday_is_not_a_class_day() {
        let verdict = evaluate_timestamp(&sample_schedule(), "2026-02-25T10:30:00+05:30").unwrap();
        assert!(!verdict.is_class_day);
        assert_eq!(verdict.commit_day, "Wednesday");
    }

    #[test]
    fn no_milestones_always_passes() {
        let schedule = Schedule::new("UTC", 2.0, &["Monday".to_string()], &[]).unwrap();
        for iso in ["1999-01-01T00:00:00Z", "2026-03-01T10:00:00Z", "2099-12-31T23:59:59Z"] {
            let verdict = evaluate_timestamp(&schedule, iso).unwrap();
            assert!(verdict.passed);
            assert!(verdict.current_phase.is_none());
            assert!(verdict.days_until_deadline.is_none());
            assert_eq!(verdict.detail, "No milestone configured");
        }
    }

    #[test]
    fn utc_timestamp_is_converted_to_team_zone() {
        let verdict = evaluate_timestamp(&sample_schedule(), "2026-02-28T05:00:00Z").unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.commit_day, "Saturday");
        assert_eq!(
            verdict.commit_local_time.as_deref(),
            Some("2026-02-28T10:30:00+05:30")
        );
    }

    #[test]
    fn day_count_uses_local_calendar_dates() {
        // 23:59 local on Feb 28 is still one calendar day before the deadline.
        let verdict = evaluate_timestamp(&sample_schedule(), "2026-02-28T18:29:00Z").unwrap();
        assert_eq!(verdict.days_until_deadline, Some(1));
    }

    #[test]
    fn malformed_timestamp_is_a_parse_error() {
        let err = evaluate_timestamp(&sample_schedule(), "last tuesday").unwrap_err();
        assert!(matches!(err, GuardianError::Parse(_)));
    }

    #[test]
    fn repeated_evaluation_is_identical() {
        let schedule = sample_schedule();
        let a = evaluate_timestamp(&schedule, "2026-03-01T01:30:00+05:30").unwrap();
        let b = evaluate_timestamp(&schedule, "2026-03-01T01:30:00+05:30").unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn unavailable_verdict_is_neutral() {
        let verdict = TimingVerdict::unavailable("Commit timestamp not available");
        assert!(Signal::passed(&verdict));
        assert_eq!(verdict.status, Status::Warn);
    }
}
