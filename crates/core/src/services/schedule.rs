//! Schedule policy resolution and the generation decision engine.

use beacon_common::{AppError, AppResult};
use beacon_db::repositories::{ReportScheduleRepository, UpsertScheduleInput};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use validator::Validate;

/// Scheduling mode for a company's report generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    /// Reports are only generated when explicitly triggered.
    Manual,
    /// A report is generated every day.
    Daily,
    /// A report is generated on selected local days of the week.
    Weekly,
    /// A report is generated on explicitly listed local calendar dates.
    Custom,
    /// Unrecognized persisted value; the decision engine fails open.
    Unknown,
}

impl ScheduleMode {
    /// Parse a persisted mode string, leniently.
    ///
    /// The mode column is free text so that schema/enum drift never stops
    /// report generation: anything unrecognized maps to [`Self::Unknown`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "MANUAL" => Self::Manual,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "CUSTOM" => Self::Custom,
            _ => Self::Unknown,
        }
    }

    /// The canonical persisted form. Only valid modes are ever written.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Custom => "CUSTOM",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// A company's effective generation policy.
///
/// Companies without a persisted schedule get the default-open policy:
/// daily generation evaluated in UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulePolicy {
    /// Scheduling mode.
    pub mode: ScheduleMode,
    /// IANA timezone name the policy is evaluated in.
    pub timezone: String,
    /// Local days of week (0 = Sunday .. 6 = Saturday), WEEKLY mode only.
    pub weekly_days: Vec<u8>,
    /// Explicit local calendar dates, CUSTOM mode only.
    pub custom_dates: Vec<NaiveDate>,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            mode: ScheduleMode::Daily,
            timezone: "UTC".to_string(),
            weekly_days: Vec::new(),
            custom_dates: Vec::new(),
        }
    }
}

/// Decide whether a report should be generated "today" under the policy.
///
/// "Today" is the calendar date of `now_utc` in the policy's timezone,
/// resolved with a real timezone conversion so the answer stays correct
/// across DST boundaries. Pure and side-effect free.
///
/// Malformed policy data (unparseable timezone, unknown mode) fails open
/// to `true`: over-generation is preferred to silently stopping reports.
#[must_use]
pub fn should_generate_today(policy: &SchedulePolicy, now_utc: DateTime<Utc>) -> bool {
    match policy.mode {
        ScheduleMode::Manual => false,
        ScheduleMode::Daily => true,
        ScheduleMode::Unknown => {
            tracing::warn!("Unknown schedule mode, failing open to generate");
            true
        }
        ScheduleMode::Weekly | ScheduleMode::Custom => {
            let Ok(tz) = policy.timezone.parse::<Tz>() else {
                tracing::warn!(
                    timezone = %policy.timezone,
                    "Unparseable schedule timezone, failing open to generate"
                );
                return true;
            };

            let local = now_utc.with_timezone(&tz);

            if policy.mode == ScheduleMode::Weekly {
                let local_dow = local.weekday().num_days_from_sunday() as u8;
                policy.weekly_days.contains(&local_dow)
            } else {
                policy.custom_dates.contains(&local.date_naive())
            }
        }
    }
}

/// Input for replacing a company's schedule.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdateInput {
    pub mode: String,
    #[serde(default = "default_timezone")]
    #[validate(length(min = 1, max = 64))]
    pub timezone: String,
    #[serde(default)]
    #[validate(length(max = 7))]
    pub weekly_days: Vec<u8>,
    #[serde(default)]
    #[validate(length(max = 366))]
    pub custom_dates: Vec<NaiveDate>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Service for managing and resolving schedule policies.
#[derive(Clone)]
pub struct ScheduleService {
    schedule_repo: ReportScheduleRepository,
}

impl ScheduleService {
    /// Create a new schedule service.
    #[must_use]
    pub const fn new(schedule_repo: ReportScheduleRepository) -> Self {
        Self { schedule_repo }
    }

    /// Resolve the effective policy for a company.
    ///
    /// No persisted schedule yields the default-open policy. A schedule
    /// row whose `weekly_days` column cannot be decoded is treated as
    /// malformed and resolved to [`ScheduleMode::Unknown`], which the
    /// decision engine fails open on.
    pub async fn effective_policy(&self, company_id: &str) -> AppResult<SchedulePolicy> {
        let Some(schedule) = self.schedule_repo.find_by_company(company_id).await? else {
            return Ok(SchedulePolicy::default());
        };

        let mode = ScheduleMode::parse(&schedule.mode);

        let Some(weekly_days) = parse_weekly_days(&schedule.weekly_days) else {
            tracing::warn!(
                company_id = %company_id,
                "Malformed weekly_days on schedule, failing open"
            );
            return Ok(SchedulePolicy {
                mode: ScheduleMode::Unknown,
                timezone: schedule.timezone,
                weekly_days: Vec::new(),
                custom_dates: Vec::new(),
            });
        };

        let custom_dates = if mode == ScheduleMode::Custom {
            self.schedule_repo
                .find_dates_by_company(company_id)
                .await?
                .into_iter()
                .map(|row| row.date)
                .collect()
        } else {
            Vec::new()
        };

        Ok(SchedulePolicy {
            mode,
            timezone: schedule.timezone,
            weekly_days,
            custom_dates,
        })
    }

    /// Replace a company's schedule policy.
    ///
    /// The explicit date list is replaced atomically (delete-then-insert);
    /// weekly days are validated to 0-6 and deduplicated.
    pub async fn update_schedule(
        &self,
        company_id: &str,
        input: ScheduleUpdateInput,
    ) -> AppResult<SchedulePolicy> {
        input.validate()?;

        let mode = ScheduleMode::parse(&input.mode);
        if mode == ScheduleMode::Unknown {
            return Err(AppError::Validation(format!(
                "Unknown schedule mode: {}",
                input.mode
            )));
        }

        input
            .timezone
            .parse::<Tz>()
            .map_err(|_| AppError::Validation(format!("Invalid timezone: {}", input.timezone)))?;

        if let Some(day) = input.weekly_days.iter().find(|day| **day > 6) {
            return Err(AppError::Validation(format!(
                "weekly_days entries must be 0-6 (Sunday-Saturday), got {day}"
            )));
        }
        if mode == ScheduleMode::Weekly && input.weekly_days.is_empty() {
            return Err(AppError::Validation(
                "WEEKLY schedules require at least one weekly day".to_string(),
            ));
        }

        let mut weekly_days = input.weekly_days;
        weekly_days.sort_unstable();
        weekly_days.dedup();

        let mut custom_dates = input.custom_dates;
        custom_dates.sort_unstable();
        custom_dates.dedup();

        self.schedule_repo
            .upsert(
                company_id,
                UpsertScheduleInput {
                    mode: mode.as_str().to_string(),
                    timezone: input.timezone.clone(),
                    weekly_days: weekly_days.clone(),
                },
            )
            .await?;

        self.schedule_repo
            .replace_dates(company_id, &custom_dates)
            .await?;

        Ok(SchedulePolicy {
            mode,
            timezone: input.timezone,
            weekly_days,
            custom_dates,
        })
    }
}

/// Decode the persisted weekly-days JSON array, keeping only 0-6 entries.
fn parse_weekly_days(value: &serde_json::Value) -> Option<Vec<u8>> {
    let entries = value.as_array()?;
    let mut days = Vec::with_capacity(entries.len());
    for entry in entries {
        let day = entry.as_u64()?;
        if day > 6 {
            return None;
        }
        days.push(day as u8);
    }
    Some(days)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn policy(mode: ScheduleMode, timezone: &str) -> SchedulePolicy {
        SchedulePolicy {
            mode,
            timezone: timezone.to_string(),
            weekly_days: Vec::new(),
            custom_dates: Vec::new(),
        }
    }

    fn instant(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_manual_never_generates() {
        let policy = policy(ScheduleMode::Manual, "UTC");
        assert!(!should_generate_today(&policy, instant(2024, 1, 1, 0, 0)));
        assert!(!should_generate_today(&policy, instant(2024, 6, 15, 12, 30)));
        assert!(!should_generate_today(&policy, instant(2024, 12, 31, 23, 59)));
    }

    #[test]
    fn test_daily_always_generates() {
        let policy = policy(ScheduleMode::Daily, "UTC");
        assert!(should_generate_today(&policy, instant(2024, 1, 1, 0, 0)));
        assert!(should_generate_today(&policy, instant(2024, 6, 15, 12, 30)));
        assert!(should_generate_today(&policy, instant(2024, 12, 31, 23, 59)));
    }

    #[test]
    fn test_default_policy_is_daily_utc() {
        let policy = SchedulePolicy::default();
        assert_eq!(policy.mode, ScheduleMode::Daily);
        assert_eq!(policy.timezone, "UTC");
        assert!(should_generate_today(&policy, instant(2024, 3, 3, 4, 0)));
    }

    #[test]
    fn test_weekly_matches_local_day_of_week() {
        let mut policy = policy(ScheduleMode::Weekly, "America/New_York");
        policy.weekly_days = vec![1, 3, 5]; // Mon/Wed/Fri

        // Tuesday 09:00 New York == 13:00 UTC
        assert!(!should_generate_today(&policy, instant(2024, 6, 11, 13, 0)));
        // Wednesday 09:00 New York == 13:00 UTC
        assert!(should_generate_today(&policy, instant(2024, 6, 12, 13, 0)));
    }

    #[test]
    fn test_weekly_uses_local_date_not_utc_date() {
        let mut policy = policy(ScheduleMode::Weekly, "America/New_York");
        policy.weekly_days = vec![0]; // Sunday only

        // 2024-03-10 04:30 UTC is still Saturday 23:30 EST in New York
        assert!(!should_generate_today(&policy, instant(2024, 3, 10, 4, 30)));
        // 2024-03-10 12:00 UTC is Sunday 08:00 EDT (DST began that morning)
        assert!(should_generate_today(&policy, instant(2024, 3, 10, 12, 0)));
    }

    #[test]
    fn test_weekly_across_dst_transition() {
        let mut policy = policy(ScheduleMode::Weekly, "America/New_York");
        policy.weekly_days = vec![1]; // Monday only

        // Monday 2024-03-11, the first day on EDT (UTC-4):
        // 03:30 UTC is Sunday 23:30 EDT, 04:30 UTC is Monday 00:30 EDT.
        assert!(!should_generate_today(&policy, instant(2024, 3, 11, 3, 30)));
        assert!(should_generate_today(&policy, instant(2024, 3, 11, 4, 30)));
    }

    #[test]
    fn test_weekly_with_empty_days_never_generates() {
        let policy = policy(ScheduleMode::Weekly, "UTC");
        assert!(!should_generate_today(&policy, instant(2024, 6, 12, 13, 0)));
    }

    #[test]
    fn test_custom_matches_local_calendar_date() {
        let mut policy = policy(ScheduleMode::Custom, "Asia/Tokyo");
        policy.custom_dates = vec![NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()];

        // 2024-05-14 16:00 UTC is already 2024-05-15 01:00 in Tokyo
        assert!(should_generate_today(&policy, instant(2024, 5, 14, 16, 0)));
        // 2024-05-14 14:00 UTC is still 2024-05-14 23:00 in Tokyo
        assert!(!should_generate_today(&policy, instant(2024, 5, 14, 14, 0)));
        // The day after the stored date
        assert!(!should_generate_today(&policy, instant(2024, 5, 15, 16, 0)));
    }

    #[test]
    fn test_unknown_mode_fails_open() {
        assert_eq!(ScheduleMode::parse("BIWEEKLY"), ScheduleMode::Unknown);
        let policy = policy(ScheduleMode::Unknown, "UTC");
        assert!(should_generate_today(&policy, instant(2024, 6, 11, 13, 0)));
    }

    #[test]
    fn test_unparseable_timezone_fails_open() {
        let mut policy = policy(ScheduleMode::Weekly, "Not/AZone");
        policy.weekly_days = vec![2];
        assert!(should_generate_today(&policy, instant(2024, 6, 11, 13, 0)));
    }

    #[test]
    fn test_mode_parse_is_lenient() {
        assert_eq!(ScheduleMode::parse("daily"), ScheduleMode::Daily);
        assert_eq!(ScheduleMode::parse(" Weekly "), ScheduleMode::Weekly);
        assert_eq!(ScheduleMode::parse("CUSTOM"), ScheduleMode::Custom);
        assert_eq!(ScheduleMode::parse("manual"), ScheduleMode::Manual);
    }

    #[test]
    fn test_parse_weekly_days() {
        assert_eq!(
            parse_weekly_days(&serde_json::json!([0, 3, 6])),
            Some(vec![0, 3, 6])
        );
        assert_eq!(parse_weekly_days(&serde_json::json!([])), Some(vec![]));
        assert_eq!(parse_weekly_days(&serde_json::json!([7])), None);
        assert_eq!(parse_weekly_days(&serde_json::json!("mon")), None);
    }
}
