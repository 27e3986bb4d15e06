//! Milestone schedule: time zone, grace period, class days, and phase windows.

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use chrono_tz::Tz;
use guardian_core::{GuardianConfig, GuardianError, Milestone};
use serde::{Deserialize, Serialize};

/// One milestone phase with its deadline resolved in the team's time zone.
///
/// The phase covers `(previous deadline, deadline + grace]`; the first phase
/// is open-ended towards the past.
#[derive(Debug, Clone)]
pub struct PhaseWindow {
    /// Phase label from the configuration.
    pub label: String,
    /// Deadline as a calendar date.
    pub deadline_date: NaiveDate,
    /// Local midnight at the start of the deadline date.
    pub deadline: DateTime<Tz>,
    /// `deadline + grace`.
    pub grace_end: DateTime<Tz>,
}

/// Where a commit moment falls on the milestone schedule.
///
/// # Examples
///
/// ```
/// use guardian_timing::schedule::PhaseSlot;
///
/// let slot = PhaseSlot::Phase { index: 0 };
/// assert_eq!(slot.index(), Some(0));
/// assert_eq!(PhaseSlot::Unconfigured.index(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PhaseSlot {
    /// No milestones are configured.
    Unconfigured,
    /// Inside the window of the phase at `index`.
    Phase {
        /// Position in the milestone list.
        index: usize,
    },
    /// After the last deadline plus grace.
    PastAllDeadlines,
}

impl PhaseSlot {
    /// Index of the matched phase, if the commit is inside one.
    pub fn index(self) -> Option<usize> {
        match self {
            PhaseSlot::Phase { index } => Some(index),
            PhaseSlot::Unconfigured | PhaseSlot::PastAllDeadlines => None,
        }
    }
}

/// The resolved milestone schedule for a team.
///
/// Built once from [`GuardianConfig`]; evaluation never reads ambient state.
///
/// # Examples
///
/// ```
/// use guardian_core::GuardianConfig;
/// use guardian_timing::schedule::Schedule;
///
/// let config = GuardianConfig::from_json(r#"{
///     "timezone": "UTC",
///     "milestones": [{"phase": "P1", "deadline": "2026-03-01"}]
/// }"#).unwrap();
/// let schedule = Schedule::from_config(&config).unwrap();
/// assert_eq!(schedule.phases().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Schedule {
    tz: Tz,
    grace: Duration,
    class_days: Vec<String>,
    phases: Vec<PhaseWindow>,
}

impl Schedule {
    /// Build a schedule from the team configuration.
    ///
    /// An empty milestone list is valid and yields a schedule that never
    /// reports a commit as late.
    ///
    /// # Errors
    ///
    /// Returns [`GuardianError::TimeZone`] if the zone is not a known IANA
    /// identifier, and [`GuardianError::Config`] if the grace period is
    /// negative or deadlines are not strictly increasing.
    pub fn from_config(config: &GuardianConfig) -> Result<Self, GuardianError> {
        Self::new(
            &config.timezone,
            config.grace_period_hours,
            &config.class_days,
            &config.milestones,
        )
    }

    /// Build a schedule from its individual parts.
    ///
    /// # Errors
    ///
    /// Same as [`Schedule::from_config`].
    pub fn new(
        timezone: &str,
        grace_hours: f64,
        class_days: &[String],
        milestones: &[Milestone],
    ) -> Result<Self, GuardianError> {
        let tz: Tz = timezone
            .trim()
            .parse()
            .map_err(|_| GuardianError::TimeZone(timezone.to_string()))?;

        if !grace_hours.is_finite() || grace_hours < 0.0 {
            return Err(GuardianError::Config(format!(
                "grace_period_hours must be a non-negative number, got {grace_hours}"
            )));
        }
        let grace = Duration::try_milliseconds((grace_hours * 3_600_000.0).round() as i64)
            .ok_or_else(|| grace_out_of_range(grace_hours))?;

        for pair in milestones.windows(2) {
            if pair[1].deadline <= pair[0].deadline {
                return Err(GuardianError::Config(format!(
                    "milestone deadlines must be strictly increasing: '{}' ({}) is not after '{}' ({})",
                    pair[1].phase, pair[1].deadline, pair[0].phase, pair[0].deadline
                )));
            }
        }

        let phases = milestones
            .iter()
            .map(|m| {
                let deadline = local_midnight(&tz, m.deadline);
                let grace_end = deadline
                    .checked_add_signed(grace)
                    .ok_or_else(|| grace_out_of_range(grace_hours))?;
                Ok(PhaseWindow {
                    label: m.phase.clone(),
                    deadline_date: m.deadline,
                    deadline,
                    grace_end,
                })
            })
            .collect::<Result<Vec<_>, GuardianError>>()?;

        let class_days = class_days
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        Ok(Self {
            tz,
            grace,
            class_days,
            phases,
        })
    }

    /// The team's time zone.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Grace period applied after every deadline.
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Phase windows in deadline order.
    pub fn phases(&self) -> &[PhaseWindow] {
        &self.phases
    }

    /// Whether `weekday` (any case) is one of the configured class days.
    pub fn is_class_day(&self, weekday: &str) -> bool {
        let weekday = weekday.to_lowercase();
        self.class_days.iter().any(|d| *d == weekday)
    }

    /// Resolve the phase a local moment belongs to.
    ///
    /// Grace ends are strictly increasing, so the first window whose grace
    /// end is not before `at` is found by binary search. That window's lower
    /// bound holds automatically: `at` is past the previous grace end, which
    /// is at or after the previous deadline.
    pub fn resolve(&self, at: &DateTime<Tz>) -> PhaseSlot {
        if self.phases.is_empty() {
            return PhaseSlot::Unconfigured;
        }
        let index = self.phases.partition_point(|w| w.grace_end < *at);
        if index < self.phases.len() {
            PhaseSlot::Phase { index }
        } else {
            PhaseSlot::PastAllDeadlines
        }
    }

    /// The window a slot refers to for deadline arithmetic.
    ///
    /// Past-all-deadlines commits are measured against the last milestone.
    pub fn window_for(&self, slot: PhaseSlot) -> Option<&PhaseWindow> {
        match slot {
            PhaseSlot::Unconfigured => None,
            PhaseSlot::Phase { index } => self.phases.get(index),
            PhaseSlot::PastAllDeadlines => self.phases.last(),
        }
    }
}

fn grace_out_of_range(grace_hours: f64) -> GuardianError {
    GuardianError::Config(format!(
        "grace_period_hours out of range: {grace_hours} pushes a deadline past the supported calendar"
    ))
}

/// Midnight at the start of `date` in `tz`.
///
/// Where a DST transition skips local midnight, the first instant of the day
/// after the gap is used.
fn local_midnight(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return dt;
    }
    let mut probe = naive;
    for _ in 0..96 {
        probe += Duration::minutes(15);
        if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
            return dt;
        }
    }
    tz.from_utc_datetime(&naive)
}
