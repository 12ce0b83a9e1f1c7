//! Recurrence rules and window expansion.
//!
//! Expands recurring masters into concrete instances within a date window,
//! respecting per-date exceptions, `count`/`end_date` bounds and a hard
//! instance cap. Expansion is a pure function of its inputs: the same
//! template and window always produce the same instances.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ScheduleError, ScheduleResult};
use crate::event::{EventInstance, EventTemplate};

/// Hard ceiling on instances emitted by a single expansion call.
pub const EXPANSION_CAP: usize = 10_000;

/// Cadence steps tolerated without a single valid occurrence before a
/// series is considered exhausted (e.g. a monthly rule on day 31 anchored
/// in a month that never has one).
const MAX_BARREN_STEPS: u32 = 200;

/// How often a recurring event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// The supported subset of calendar recurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Repeat every `interval` days/weeks/months/years. Must be >= 1.
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Weekdays for weekly rules, 0 = Sunday. Empty means the master's
    /// own weekday.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub days_of_week: BTreeSet<u8>,
    /// Day of month for monthly rules. Defaults to the master's start day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    /// Month for yearly rules (1-12). Defaults to the master's start month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_of_year: Option<u32>,
    /// Exclusive upper bound on occurrence dates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Maximum number of occurrences in the series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

fn default_interval() -> u32 {
    1
}

impl RecurrenceRule {
    fn with_frequency(frequency: Frequency) -> Self {
        RecurrenceRule {
            frequency,
            interval: 1,
            days_of_week: BTreeSet::new(),
            day_of_month: None,
            month_of_year: None,
            end_date: None,
            count: None,
        }
    }

    pub fn daily() -> Self {
        Self::with_frequency(Frequency::Daily)
    }

    pub fn weekly() -> Self {
        Self::with_frequency(Frequency::Weekly)
    }

    /// Weekly on specific days, 0 = Sunday.
    pub fn weekly_on(days: impl IntoIterator<Item = u8>) -> Self {
        let mut rule = Self::with_frequency(Frequency::Weekly);
        rule.days_of_week = days.into_iter().collect();
        rule
    }

    pub fn monthly() -> Self {
        Self::with_frequency(Frequency::Monthly)
    }

    pub fn yearly() -> Self {
        Self::with_frequency(Frequency::Yearly)
    }

    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    /// Bound the series to at most `count` occurrences.
    pub fn times(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Bound the series to dates strictly before `end_date`.
    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Check the rule parameters, returning a human-readable reason on
    /// failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.interval == 0 {
            return Err("interval must be at least 1".to_string());
        }
        if let Some(day) = self.days_of_week.iter().find(|&&d| d > 6) {
            return Err(format!("day of week {} out of range 0-6", day));
        }
        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(format!("day of month {} out of range 1-31", day));
            }
        }
        if let Some(month) = self.month_of_year {
            if !(1..=12).contains(&month) {
                return Err(format!("month {} out of range 1-12", month));
            }
        }
        if self.end_date.is_some() && self.count.is_some() {
            return Err("endDate and count are mutually exclusive".to_string());
        }
        Ok(())
    }
}

/// Result of expanding one or more templates over a window.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    pub instances: Vec<EventInstance>,
    /// True when the expansion cap cut the result short.
    pub truncated: bool,
}

/// Expand a template into the instances visible in
/// `[window_start, window_end]`.
///
/// Standalone templates yield themselves when their start falls in the
/// window. Recurring masters are stepped from their first occurrence;
/// `count` is consumed from the start of the series (exceptions included),
/// so the same rule materializes identically for any window.
pub fn expand(
    template: &EventTemplate,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> ScheduleResult<Expansion> {
    if !template.is_recurring {
        let mut instances = Vec::new();
        if template.starts_at >= window_start && template.starts_at <= window_end {
            instances.push(EventInstance::standalone(template));
        }
        return Ok(Expansion {
            instances,
            truncated: false,
        });
    }

    let rule = template
        .recurrence
        .as_ref()
        .ok_or_else(|| ScheduleError::InvalidRule {
            id: template.id.clone(),
            reason: "recurring event has no recurrence rule".to_string(),
        })?;
    rule.validate().map_err(|reason| ScheduleError::InvalidRule {
        id: template.id.clone(),
        reason,
    })?;

    let start_date = template.starts_at.date_naive();
    let time_of_day = template.starts_at.time();
    let window_end_date = window_end.date_naive();

    let mut expansion = Expansion::default();
    let mut occurrences: u32 = 0;

    for date in OccurrenceDates::new(rule, start_date) {
        if date > window_end_date {
            break;
        }
        if let Some(end) = rule.end_date {
            if date >= end {
                break;
            }
        }
        if let Some(count) = rule.count {
            if occurrences >= count {
                break;
            }
        }
        // An excepted date still consumes its slot in the series.
        occurrences += 1;
        if template.recurrence_exceptions.contains(&date) {
            continue;
        }

        let starts_at = date.and_time(time_of_day).and_utc();
        if starts_at < window_start || starts_at > window_end {
            continue;
        }

        if expansion.instances.len() == EXPANSION_CAP {
            warn!(
                event = %template.id,
                cap = EXPANSION_CAP,
                "expansion cap reached, returning partial result"
            );
            expansion.truncated = true;
            break;
        }
        expansion
            .instances
            .push(EventInstance::occurrence(template, starts_at));
    }

    Ok(expansion)
}

/// Expand every template over the window in a single pass.
///
/// Templates with invalid rules are logged and skipped, never failing the
/// whole window. The returned instance set is the one shared by conflict
/// detection and layout; recompute it once per window change and reuse it.
pub fn expand_window(
    templates: &[EventTemplate],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Expansion {
    let mut all = Expansion::default();

    for template in templates {
        match expand(template, window_start, window_end) {
            Ok(mut expansion) => {
                all.truncated |= expansion.truncated;
                all.instances.append(&mut expansion.instances);
            }
            Err(err) => {
                warn!(event = %template.id, error = %err, "skipping event");
            }
        }
    }

    all.instances
        .sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then_with(|| a.id.cmp(&b.id)));
    debug!(
        templates = templates.len(),
        instances = all.instances.len(),
        truncated = all.truncated,
        "expanded window"
    );
    all
}

/// Candidate occurrence dates for a rule, in chronological order starting
/// at the series start. Unbounded for open-ended rules; callers stop at
/// their window, `count` or `end_date`.
struct OccurrenceDates<'a> {
    rule: &'a RecurrenceRule,
    start: NaiveDate,
    /// Effective weekday set for weekly rules.
    weekdays: BTreeSet<u8>,
    step: u32,
    barren_steps: u32,
    pending: VecDeque<NaiveDate>,
}

impl<'a> OccurrenceDates<'a> {
    fn new(rule: &'a RecurrenceRule, start: NaiveDate) -> Self {
        let mut weekdays = rule.days_of_week.clone();
        if rule.frequency == Frequency::Weekly && weekdays.is_empty() {
            // A weekly rule without explicit days repeats on the master's
            // own weekday.
            weekdays.insert(start.weekday().num_days_from_sunday() as u8);
        }
        OccurrenceDates {
            rule,
            start,
            weekdays,
            step: 0,
            barren_steps: 0,
            pending: VecDeque::new(),
        }
    }

    /// Push the candidates of cadence step `k` onto the queue. Steps may
    /// legitimately produce nothing (short months, non-leap years).
    fn fill_step(&mut self, k: u32) {
        let interval = self.rule.interval;
        match self.rule.frequency {
            Frequency::Daily => {
                let days = i64::from(k) * i64::from(interval);
                self.pending.push_back(self.start + Duration::days(days));
            }
            Frequency::Weekly => {
                let week_anchor = self.start
                    - Duration::days(i64::from(self.start.weekday().num_days_from_sunday()))
                    + Duration::weeks(i64::from(k) * i64::from(interval));
                for &dow in &self.weekdays {
                    self.pending
                        .push_back(week_anchor + Duration::days(i64::from(dow)));
                }
            }
            Frequency::Monthly => {
                let day = self.rule.day_of_month.unwrap_or_else(|| self.start.day());
                let months = i64::from(self.start.year()) * 12
                    + i64::from(self.start.month0())
                    + i64::from(k) * i64::from(interval);
                let year = months.div_euclid(12) as i32;
                let month = months.rem_euclid(12) as u32 + 1;
                // Short months are skipped outright, never clamped.
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    self.pending.push_back(date);
                }
            }
            Frequency::Yearly => {
                let month = self.rule.month_of_year.unwrap_or_else(|| self.start.month());
                let day = self.rule.day_of_month.unwrap_or_else(|| self.start.day());
                let year = self.start.year() + (k * interval) as i32;
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    self.pending.push_back(date);
                }
            }
        }
    }
}

impl Iterator for OccurrenceDates<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            if let Some(date) = self.pending.pop_front() {
                self.barren_steps = 0;
                // Candidates within step 0 can predate the series start
                // (e.g. a Mon/Wed/Fri rule anchored on Wednesday).
                if date >= self.start {
                    return Some(date);
                }
                continue;
            }
            if self.barren_steps >= MAX_BARREN_STEPS {
                return None;
            }
            let k = self.step;
            self.step += 1;
            self.barren_steps += 1;
            self.fill_step(k);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn standup() -> EventTemplate {
        // Mon/Wed/Fri 09:00-09:30 starting Monday 2024-01-01
        EventTemplate::new(
            "Standup",
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
        )
        .with_rule(RecurrenceRule::weekly_on([1, 3, 5]))
    }

    fn window(from: (i32, u32, u32), to: (i32, u32, u32)) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(from.0, from.1, from.2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(to.0, to.1, to.2, 23, 59, 59).unwrap(),
        )
    }

    fn dates(expansion: &Expansion) -> Vec<NaiveDate> {
        expansion.instances.iter().map(|i| i.date()).collect()
    }

    #[test]
    fn test_weekly_standup_two_weeks() {
        let (ws, we) = window((2024, 1, 1), (2024, 1, 14));
        let expansion = expand(&standup(), ws, we).unwrap();

        let expected: Vec<NaiveDate> = [1, 3, 5, 8, 10, 12]
            .iter()
            .map(|&d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        assert_eq!(dates(&expansion), expected);
        assert!(!expansion.truncated);
    }

    #[test]
    fn test_exception_date_never_emitted() {
        let mut template = standup();
        template
            .recurrence_exceptions
            .insert(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());

        let (ws, we) = window((2024, 1, 1), (2024, 1, 14));
        let expansion = expand(&template, ws, we).unwrap();

        assert_eq!(expansion.instances.len(), 5);
        assert!(!dates(&expansion).contains(&NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()));
    }

    #[test]
    fn test_monthly_day_31_skips_short_months() {
        let template = EventTemplate::new(
            "Rent review",
            Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 31, 11, 0, 0).unwrap(),
        )
        .with_rule(RecurrenceRule::monthly());

        let (ws, we) = window((2024, 1, 1), (2024, 5, 31));
        let expansion = expand(&template, ws, we).unwrap();

        // Feb and Apr have no day 31
        let expected: Vec<NaiveDate> = [(1, 31), (3, 31), (5, 31)]
            .iter()
            .map(|&(m, d)| NaiveDate::from_ymd_opt(2024, m, d).unwrap())
            .collect();
        assert_eq!(dates(&expansion), expected);
    }

    #[test]
    fn test_daily_interval() {
        let template = EventTemplate::new(
            "Medication",
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 5, 0).unwrap(),
        )
        .with_rule(RecurrenceRule::daily().every(3));

        let (ws, we) = window((2024, 1, 1), (2024, 1, 10));
        let expansion = expand(&template, ws, we).unwrap();

        let expected: Vec<NaiveDate> = [1, 4, 7, 10]
            .iter()
            .map(|&d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        assert_eq!(dates(&expansion), expected);
    }

    #[test]
    fn test_count_is_stable_across_windows() {
        let template = EventTemplate::new(
            "Course session",
            Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 19, 0, 0).unwrap(),
        )
        .with_rule(RecurrenceRule::daily().times(5));

        // Whole series: Jan 1-5
        let (ws, we) = window((2024, 1, 1), (2024, 1, 31));
        let expansion = expand(&template, ws, we).unwrap();
        assert_eq!(expansion.instances.len(), 5);

        // A later window sees only the tail, never extra occurrences
        let (ws, we) = window((2024, 1, 4), (2024, 1, 31));
        let expansion = expand(&template, ws, we).unwrap();
        let expected: Vec<NaiveDate> = [4, 5]
            .iter()
            .map(|&d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        assert_eq!(dates(&expansion), expected);
    }

    #[test]
    fn test_end_date_is_exclusive() {
        let template = EventTemplate::new(
            "Daily check-in",
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 15, 0).unwrap(),
        )
        .with_rule(RecurrenceRule::daily().until(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()));

        let (ws, we) = window((2024, 1, 1), (2024, 1, 31));
        let expansion = expand(&template, ws, we).unwrap();

        assert_eq!(expansion.instances.len(), 3);
        assert!(!dates(&expansion).contains(&NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()));
    }

    #[test]
    fn test_weekly_defaults_to_start_weekday() {
        // 2024-01-02 is a Tuesday
        let template = EventTemplate::new(
            "Yoga",
            Utc.with_ymd_and_hms(2024, 1, 2, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap(),
        )
        .with_rule(RecurrenceRule::weekly());

        let (ws, we) = window((2024, 1, 1), (2024, 1, 21));
        let expansion = expand(&template, ws, we).unwrap();

        let expected: Vec<NaiveDate> = [2, 9, 16]
            .iter()
            .map(|&d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        assert_eq!(dates(&expansion), expected);
    }

    #[test]
    fn test_biweekly_jumps_whole_weeks() {
        let (_, we) = window((2024, 1, 1), (2024, 1, 28));
        let template = EventTemplate::new(
            "Sprint review",
            Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 16, 0, 0).unwrap(),
        )
        .with_rule(RecurrenceRule::weekly_on([1, 5]).every(2));

        let ws = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let expansion = expand(&template, ws, we).unwrap();

        // Weeks of Jan 1 and Jan 15 only
        let expected: Vec<NaiveDate> = [1, 5, 15, 19]
            .iter()
            .map(|&d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        assert_eq!(dates(&expansion), expected);
    }

    #[test]
    fn test_yearly_leap_day_skips_common_years() {
        let template = EventTemplate::new(
            "Leap day",
            Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 13, 0, 0).unwrap(),
        )
        .with_rule(RecurrenceRule::yearly());

        let (ws, we) = window((2024, 1, 1), (2029, 12, 31));
        let expansion = expand(&template, ws, we).unwrap();

        let expected: Vec<NaiveDate> = [2024, 2028]
            .iter()
            .map(|&y| NaiveDate::from_ymd_opt(y, 2, 29).unwrap())
            .collect();
        assert_eq!(dates(&expansion), expected);
    }

    #[test]
    fn test_unbounded_rule_hits_cap() {
        let template = EventTemplate::new(
            "Forever",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap(),
        )
        .with_rule(RecurrenceRule::daily());

        let ws = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let we = ws + Duration::days(EXPANSION_CAP as i64 + 500);
        let expansion = expand(&template, ws, we).unwrap();

        assert_eq!(expansion.instances.len(), EXPANSION_CAP);
        assert!(expansion.truncated);
    }

    #[test]
    fn test_instance_ids_are_unique() {
        let (ws, we) = window((2024, 1, 1), (2024, 3, 31));
        let expansion = expand(&standup(), ws, we).unwrap();

        let mut ids: Vec<&str> = expansion.instances.iter().map(|i| i.id.as_str()).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn test_duration_preserved_for_all_instances() {
        let template = standup();
        let (ws, we) = window((2024, 1, 1), (2024, 2, 29));
        let expansion = expand(&template, ws, we).unwrap();

        assert!(!expansion.instances.is_empty());
        for instance in &expansion.instances {
            assert_eq!(instance.duration(), template.duration());
        }
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let end = start + Duration::hours(1);
        let (ws, we) = window((2024, 1, 1), (2024, 1, 31));

        let zero_interval =
            EventTemplate::new("Bad", start, end).with_rule(RecurrenceRule::daily().every(0));
        assert!(matches!(
            expand(&zero_interval, ws, we),
            Err(ScheduleError::InvalidRule { .. })
        ));

        let both_bounds = EventTemplate::new("Bad", start, end).with_rule(
            RecurrenceRule::daily()
                .times(3)
                .until(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
        );
        assert!(matches!(
            expand(&both_bounds, ws, we),
            Err(ScheduleError::InvalidRule { .. })
        ));

        let mut no_rule = EventTemplate::new("Bad", start, end);
        no_rule.is_recurring = true;
        assert!(matches!(
            expand(&no_rule, ws, we),
            Err(ScheduleError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_standalone_outside_window_is_empty() {
        let template = EventTemplate::new(
            "One-off",
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap(),
        );
        let (ws, we) = window((2024, 1, 1), (2024, 1, 31));
        assert!(expand(&template, ws, we).unwrap().instances.is_empty());
    }

    #[test]
    fn test_expand_window_skips_invalid_and_sorts() {
        let start = Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap();
        let good = EventTemplate::new("Good", start, start + Duration::hours(1));
        let bad = EventTemplate::new(
            "Bad",
            start - Duration::hours(2),
            start - Duration::hours(1),
        )
        .with_rule(RecurrenceRule::daily().every(0));
        let earlier = EventTemplate::new(
            "Earlier",
            start - Duration::hours(3),
            start - Duration::hours(2),
        );

        let (ws, we) = window((2024, 1, 1), (2024, 1, 31));
        let expansion = expand_window(&[good, bad, earlier], ws, we);

        let titles: Vec<&str> = expansion.instances.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Earlier", "Good"]);
    }

    #[test]
    fn test_barren_series_terminates() {
        // Monthly on day 31 anchored in February: no month of this series
        // ever has the day, because the anchor pins day_of_month to 31 and
        // an interval of 12 revisits February forever.
        let template = EventTemplate::new(
            "Impossible",
            Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap(),
        )
        .with_rule({
            let mut rule = RecurrenceRule::monthly().every(12);
            rule.day_of_month = Some(31);
            rule
        });

        let ws = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let we = Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0).unwrap();
        let expansion = expand(&template, ws, we).unwrap();
        assert!(expansion.instances.is_empty());
    }
}
