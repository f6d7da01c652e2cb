use crate::types::{
    DailyTrendRow, HourlyLoadRow, Kpi, MonthlySummary, Segment, SegmentShareRow, VisitRecord,
    VisitType,
};
use crate::util::{average, format_number};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashMap;
use std::fmt;

/// A calendar month used to filter and compare records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn of(date: NaiveDate) -> Period {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The immediately preceding calendar month.
    pub fn prev(&self) -> Period {
        if self.month == 1 {
            Period {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Period {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

fn rows_in(data: &[VisitRecord], period: Period) -> Vec<&VisitRecord> {
    data.iter().filter(|r| period.contains(r.date)).collect()
}

/// Relative percentage change with the zero-denominator policy: an empty
/// or zero previous period reports 0, never NaN or infinity.
fn pct_delta(curr: f64, prev: f64) -> f64 {
    if prev > 0.0 {
        (curr - prev) / prev * 100.0
    } else {
        0.0
    }
}

fn first_visit_rate(rows: &[&VisitRecord]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let firsts = rows
        .iter()
        .filter(|r| r.visit_type == VisitType::FirstVisit)
        .count();
    firsts as f64 / rows.len() as f64 * 100.0
}

/// Period KPIs, each compared against the immediately preceding month.
pub fn monthly_summary(data: &[VisitRecord], period: Period) -> MonthlySummary {
    let curr = rows_in(data, period);
    let prev = rows_in(data, period.prev());

    let revenue: f64 = curr.iter().map(|r| r.revenue as f64).sum();
    let prev_revenue: f64 = prev.iter().map(|r| r.revenue as f64).sum();

    let visits = curr.len() as f64;
    let prev_visits = prev.len() as f64;

    let wait = average(&curr.iter().map(|r| r.wait_time as f64).collect::<Vec<_>>());
    let prev_wait = average(&prev.iter().map(|r| r.wait_time as f64).collect::<Vec<_>>());

    let first_rate = first_visit_rate(&curr);
    let prev_first_rate = first_visit_rate(&prev);

    MonthlySummary {
        revenue: Kpi {
            value: revenue,
            delta: pct_delta(revenue, prev_revenue),
        },
        visits: Kpi {
            value: visits,
            delta: pct_delta(visits, prev_visits),
        },
        wait_time: Kpi {
            value: wait,
            delta: pct_delta(wait, prev_wait),
        },
        first_visit_rate: Kpi {
            value: first_rate,
            delta: pct_delta(first_rate, prev_first_rate),
        },
    }
}

/// Per-day visit count and revenue sum within the period, ordered by date.
pub fn daily_trend(data: &[VisitRecord], period: Period) -> Vec<DailyTrendRow> {
    let mut by_day: HashMap<NaiveDate, (usize, i64)> = HashMap::new();
    for r in rows_in(data, period) {
        let e = by_day.entry(r.date).or_insert((0, 0));
        e.0 += 1;
        e.1 += r.revenue;
    }
    let mut rows: Vec<DailyTrendRow> = by_day
        .into_iter()
        .map(|(date, (visits, revenue))| DailyTrendRow {
            date,
            visits,
            revenue,
        })
        .collect();
    rows.sort_by_key(|row| row.date);
    rows
}

/// Hour-by-weekday count grid over the clinic's six-day week. Every
/// configured opening hour gets a row even when no visit fell there.
pub fn hourly_load(data: &[VisitRecord], period: Period, opening_hours: &[u32]) -> Vec<HourlyLoadRow> {
    let mut grid: HashMap<(u32, Weekday), usize> = HashMap::new();
    for r in rows_in(data, period) {
        *grid.entry((r.hour, r.weekday)).or_insert(0) += 1;
    }

    let mut hours: Vec<u32> = opening_hours.to_vec();
    hours.sort_unstable();
    hours.dedup();

    let cell = |grid: &HashMap<(u32, Weekday), usize>, hour: u32, wd: Weekday| {
        grid.get(&(hour, wd)).copied().unwrap_or(0)
    };

    hours
        .into_iter()
        .map(|hour| HourlyLoadRow {
            hour,
            mon: cell(&grid, hour, Weekday::Mon),
            tue: cell(&grid, hour, Weekday::Tue),
            wed: cell(&grid, hour, Weekday::Wed),
            thu: cell(&grid, hour, Weekday::Thu),
            fri: cell(&grid, hour, Weekday::Fri),
            sat: cell(&grid, hour, Weekday::Sat),
        })
        .collect()
}

/// Visit counts per segment with display labels, largest share first.
pub fn segment_distribution(data: &[VisitRecord], period: Period) -> Vec<SegmentShareRow> {
    let mut counts: HashMap<Segment, usize> = HashMap::new();
    for r in rows_in(data, period) {
        *counts.entry(r.segment).or_insert(0) += 1;
    }
    let total: usize = counts.values().sum();

    let mut rows: Vec<(usize, SegmentShareRow)> = counts
        .into_iter()
        .map(|(segment, visits)| {
            let share = if total > 0 {
                visits as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            (
                visits,
                SegmentShareRow {
                    segment: segment.label().to_string(),
                    visits,
                    share_pct: format_number(share, 1),
                },
            )
        })
        .collect();
    rows.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.segment.cmp(&b.1.segment)));
    rows.into_iter().map(|(_, row)| row).collect()
}

/// The raw age column restricted to the period. Binning happens downstream.
pub fn age_distribution(data: &[VisitRecord], period: Period) -> Vec<u32> {
    rows_in(data, period).iter().map(|r| r.age).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::generator::generate;
    use crate::types::Gender;

    fn record(
        date: (i32, u32, u32),
        segment: Segment,
        visit_type: VisitType,
        revenue: i64,
        wait_time: u32,
        hour: u32,
        age: u32,
    ) -> VisitRecord {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        VisitRecord {
            date,
            segment,
            visit_type,
            age,
            gender: Some(Gender::Female),
            revenue,
            hour,
            weekday: date.weekday(),
            wait_time,
        }
    }

    fn june() -> Period {
        Period {
            year: 2025,
            month: 6,
        }
    }

    #[test]
    fn period_prev_wraps_the_year() {
        let jan = Period {
            year: 2025,
            month: 1,
        };
        assert_eq!(
            jan.prev(),
            Period {
                year: 2024,
                month: 12
            }
        );
        assert_eq!(june().prev().month, 5);
        assert_eq!(format!("{}", june()), "2025-06");
    }

    #[test]
    fn summary_compares_against_previous_month() {
        let data = vec![
            // June 2025, 2 visits, one first visit.
            record((2025, 6, 2), Segment::Acute, VisitType::FirstVisit, 100, 10, 9, 40),
            record((2025, 6, 3), Segment::Acute, VisitType::FollowUp, 200, 20, 10, 50),
            // May 2025, 1 follow-up.
            record((2025, 5, 5), Segment::Lifestyle, VisitType::FollowUp, 150, 10, 11, 60),
        ];
        let summary = monthly_summary(&data, june());

        assert_eq!(summary.revenue.value, 300.0);
        assert_eq!(summary.revenue.delta, 100.0);
        assert_eq!(summary.visits.value, 2.0);
        assert_eq!(summary.visits.delta, 100.0);
        assert_eq!(summary.wait_time.value, 15.0);
        assert_eq!(summary.wait_time.delta, 50.0);
        assert_eq!(summary.first_visit_rate.value, 50.0);
        // Previous month's rate is zero, so the delta is guarded to zero.
        assert_eq!(summary.first_visit_rate.delta, 0.0);
    }

    #[test]
    fn summary_with_empty_previous_month_has_zero_deltas() {
        let data = vec![record(
            (2025, 6, 2),
            Segment::Acute,
            VisitType::FollowUp,
            100,
            10,
            9,
            40,
        )];
        let summary = monthly_summary(&data, june());
        assert_eq!(summary.revenue.delta, 0.0);
        assert_eq!(summary.visits.delta, 0.0);
        assert_eq!(summary.wait_time.delta, 0.0);
        assert_eq!(summary.first_visit_rate.delta, 0.0);
    }

    #[test]
    fn summary_over_empty_period_is_all_zeros_and_finite() {
        let data: Vec<VisitRecord> = Vec::new();
        let summary = monthly_summary(&data, june());
        for kpi in [
            summary.revenue,
            summary.visits,
            summary.wait_time,
            summary.first_visit_rate,
        ] {
            assert_eq!(kpi.value, 0.0);
            assert_eq!(kpi.delta, 0.0);
            assert!(kpi.value.is_finite() && kpi.delta.is_finite());
        }
    }

    #[test]
    fn daily_trend_is_ordered_and_scoped_to_the_period() {
        let data = vec![
            record((2025, 6, 3), Segment::Acute, VisitType::FollowUp, 200, 10, 9, 40),
            record((2025, 6, 2), Segment::Acute, VisitType::FollowUp, 100, 10, 9, 40),
            record((2025, 6, 2), Segment::Lifestyle, VisitType::FollowUp, 50, 10, 10, 55),
            record((2025, 5, 30), Segment::Acute, VisitType::FollowUp, 999, 10, 9, 40),
        ];
        let rows = daily_trend(&data, june());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(rows[0].visits, 2);
        assert_eq!(rows[0].revenue, 150);
        assert_eq!(rows[1].visits, 1);
        assert_eq!(rows[1].revenue, 200);
    }

    #[test]
    fn hourly_load_grid_is_complete_and_zero_filled() {
        let data = vec![
            // 2025-06-02 is a Monday.
            record((2025, 6, 2), Segment::Acute, VisitType::FollowUp, 100, 10, 9, 40),
            record((2025, 6, 2), Segment::Acute, VisitType::FollowUp, 100, 10, 9, 40),
            record((2025, 6, 7), Segment::Checkup, VisitType::Screening, 12000, 10, 10, 45),
        ];
        let rows = hourly_load(&data, june(), &[9, 10, 11]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].hour, 9);
        assert_eq!(rows[0].mon, 2);
        assert_eq!(rows[0].sat, 0);
        assert_eq!(rows[1].hour, 10);
        assert_eq!(rows[1].sat, 1);
        // No visits at 11 at all, but the row still exists.
        assert_eq!(rows[2].hour, 11);
        let empty = rows[2].mon + rows[2].tue + rows[2].wed + rows[2].thu + rows[2].fri + rows[2].sat;
        assert_eq!(empty, 0);
    }

    #[test]
    fn segment_distribution_labels_and_orders_by_count() {
        let data = vec![
            record((2025, 6, 2), Segment::Lifestyle, VisitType::FollowUp, 100, 10, 9, 55),
            record((2025, 6, 3), Segment::Lifestyle, VisitType::FollowUp, 100, 10, 9, 56),
            record((2025, 6, 4), Segment::Lifestyle, VisitType::FollowUp, 100, 10, 9, 57),
            record((2025, 6, 5), Segment::Acute, VisitType::FirstVisit, 100, 10, 9, 30),
        ];
        let rows = segment_distribution(&data, june());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].segment, Segment::Lifestyle.label());
        assert_eq!(rows[0].visits, 3);
        assert_eq!(rows[0].share_pct, "75.0");
        assert_eq!(rows[1].segment, Segment::Acute.label());
        assert_eq!(rows[1].share_pct, "25.0");
    }

    #[test]
    fn age_distribution_returns_raw_period_ages() {
        let data = vec![
            record((2025, 6, 2), Segment::Acute, VisitType::FollowUp, 100, 10, 9, 31),
            record((2025, 6, 3), Segment::Acute, VisitType::FollowUp, 100, 10, 9, 62),
            record((2025, 5, 3), Segment::Acute, VisitType::FollowUp, 100, 10, 9, 44),
        ];
        assert_eq!(age_distribution(&data, june()), vec![31, 62]);
    }

    #[test]
    fn one_month_scenario_is_reproducible_and_seed_sensitive() {
        let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let config = GeneratorConfig {
            months_back: 1,
            ..GeneratorConfig::default()
        };
        let period = Period::of(end);

        let first = monthly_summary(&generate(&config, end).unwrap(), period);
        let second = monthly_summary(&generate(&config, end).unwrap(), period);
        assert!(first.visits.value > 0.0);
        assert_eq!(first.visits.value, second.visits.value);
        assert_eq!(first.revenue.value, second.revenue.value);

        let other_seed = GeneratorConfig {
            seed: 43,
            ..config.clone()
        };
        let third = monthly_summary(&generate(&other_seed, end).unwrap(), period);
        assert_ne!(first.revenue.value, third.revenue.value);
    }
}
