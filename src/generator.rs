// Deterministic synthetic visit generation.
//
// The whole table is a pure function of (config, end_date): every random
// draw flows from one owned ChaCha8 generator seeded from the config, so
// re-running with the same inputs reproduces the table byte for byte.
use crate::config::{GeneratorConfig, SegmentProfile, WaitModel};
use crate::types::{Gender, Segment, VisitRecord, VisitType};
use chrono::{Datelike, Duration, NaiveDate};
use rand::distributions::WeightedIndex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, Poisson};
use std::collections::HashMap;
use std::error::Error;

struct SegmentDists {
    revenue: Normal<f64>,
    age: Normal<f64>,
}

fn segment_dists(profile: &SegmentProfile) -> Result<SegmentDists, Box<dyn Error>> {
    Ok(SegmentDists {
        revenue: Normal::new(profile.revenue_mean, profile.revenue_sd)?,
        age: Normal::new(profile.age_mean, profile.age_sd)?,
    })
}

/// Generate the full visit table for the trailing window ending at
/// `end_date`. The caller establishes "now"; nothing here reads a clock.
pub fn generate(
    config: &GeneratorConfig,
    end_date: NaiveDate,
) -> Result<Vec<VisitRecord>, Box<dyn Error>> {
    config.validate()?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let start_date = end_date - Duration::days(30 * config.months_back as i64);

    let base_mix = WeightedIndex::new(config.segment_mix.iter().map(|(_, w)| *w))?;
    let seasonal_mix = WeightedIndex::new(config.seasonal_segment_mix.iter().map(|(_, w)| *w))?;
    let hour_mix = WeightedIndex::new(config.opening_hours.iter().map(|(_, w)| *w))?;
    let lifestyle = segment_dists(&config.lifestyle)?;
    let acute = segment_dists(&config.acute)?;
    let checkup = segment_dists(&config.checkup)?;

    let mut records: Vec<VisitRecord> = Vec::new();
    let mut day = start_date;
    while day <= end_date {
        let weekday = day.weekday();
        if weekday == config.closed_weekday {
            day = day + Duration::days(1);
            continue;
        }

        let in_season = config.is_seasonal(day.month());
        let adverse = rng.gen::<f64>() < config.adverse_day_chance;
        let mut mean = config.base_daily_mean * config.weekday_factor(weekday);
        if adverse {
            mean *= config.adverse_day_factor;
        }
        if in_season {
            mean *= config.seasonal_factor;
        }
        let nominal =
            (Poisson::new(mean)?.sample(&mut rng) as u32).clamp(config.daily_min, config.daily_max);

        let (mix, mix_dist) = if in_season {
            (&config.seasonal_segment_mix, &seasonal_mix)
        } else {
            (&config.segment_mix, &base_mix)
        };

        for _ in 0..nominal {
            let segment = mix[mix_dist.sample(&mut rng)].0;
            if segment == Segment::Checkup && weekday != config.checkup_weekday {
                // Dropped, not resampled: the day's realized count may fall
                // below its nominal draw.
                continue;
            }
            let profile = config.profile(segment);
            let dists = match segment {
                Segment::Lifestyle => &lifestyle,
                Segment::Acute => &acute,
                Segment::Checkup => &checkup,
            };

            let revenue = (dists.revenue.sample(&mut rng).round() as i64)
                .clamp(profile.revenue_min, profile.revenue_max);
            let visit_type = if segment == Segment::Checkup {
                VisitType::Screening
            } else if rng.gen::<f64>() < profile.first_visit_chance {
                VisitType::FirstVisit
            } else {
                VisitType::FollowUp
            };
            let age = (dists.age.sample(&mut rng).round() as i64)
                .clamp(config.age_min as i64, config.age_max as i64) as u32;
            let gender = if rng.gen::<f64>() < config.female_share {
                Gender::Female
            } else {
                Gender::Male
            };
            let hour = config.opening_hours[hour_mix.sample(&mut rng)].0;

            records.push(VisitRecord {
                date: day,
                segment,
                visit_type,
                age,
                gender: Some(gender),
                revenue,
                hour,
                weekday,
                wait_time: 0,
            });
        }

        day = day + Duration::days(1);
    }

    apply_wait_times(&mut records, &config.wait);
    Ok(records)
}

/// Derived wait for one day's realized visit count.
pub fn wait_minutes(day_count: usize, model: &WaitModel) -> u32 {
    let load = day_count as f64 / model.capacity as f64;
    let minutes = (load * load * model.scale).round() as i64;
    minutes.clamp(model.min_minutes as i64, model.max_minutes as i64) as u32
}

/// Assign every record its day's congestion wait. Must run only after the
/// table is complete, since the wait depends on the day's final count.
pub(crate) fn apply_wait_times(records: &mut [VisitRecord], model: &WaitModel) {
    let mut day_counts: HashMap<NaiveDate, usize> = HashMap::new();
    for r in records.iter() {
        *day_counts.entry(r.date).or_insert(0) += 1;
    }
    for r in records.iter_mut() {
        let count = day_counts.get(&r.date).copied().unwrap_or(0);
        r.wait_time = wait_minutes(count, model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn fixed_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn one_month_config(seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            months_back: 1,
            seed,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn same_seed_reproduces_identical_table() {
        let config = one_month_config(42);
        let a = generate(&config, fixed_end()).unwrap();
        let b = generate(&config, fixed_end()).unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_changes_totals() {
        let a = generate(&one_month_config(42), fixed_end()).unwrap();
        let b = generate(&one_month_config(43), fixed_end()).unwrap();
        let revenue_a: i64 = a.iter().map(|r| r.revenue).sum();
        let revenue_b: i64 = b.iter().map(|r| r.revenue).sum();
        assert_ne!(revenue_a, revenue_b);
    }

    #[test]
    fn no_records_on_closed_weekday() {
        let config = one_month_config(42);
        let records = generate(&config, fixed_end()).unwrap();
        assert!(records.iter().all(|r| r.weekday != config.closed_weekday));
        assert!(records.iter().all(|r| r.date.weekday() == r.weekday));
    }

    #[test]
    fn checkups_only_on_designated_weekday() {
        let config = GeneratorConfig {
            months_back: 2,
            ..GeneratorConfig::default()
        };
        let records = generate(&config, fixed_end()).unwrap();
        let checkups: Vec<_> = records
            .iter()
            .filter(|r| r.segment == Segment::Checkup)
            .collect();
        assert!(!checkups.is_empty());
        assert!(checkups.iter().all(|r| r.weekday == Weekday::Sat));
    }

    #[test]
    fn sampled_fields_stay_in_bounds() {
        let config = one_month_config(42);
        let hours = config.opening_hour_list();
        let records = generate(&config, fixed_end()).unwrap();
        for r in &records {
            assert!(r.age >= config.age_min && r.age <= config.age_max);
            assert!(r.wait_time >= config.wait.min_minutes);
            assert!(r.wait_time <= config.wait.max_minutes);
            assert!(hours.contains(&r.hour));
            let profile = config.profile(r.segment);
            assert!(r.revenue >= profile.revenue_min && r.revenue <= profile.revenue_max);
        }
    }

    #[test]
    fn records_cover_only_the_window() {
        let config = one_month_config(42);
        let end = fixed_end();
        let start = end - Duration::days(30);
        let records = generate(&config, end).unwrap();
        assert!(records.iter().all(|r| r.date >= start && r.date <= end));
    }

    #[test]
    fn daily_counts_stay_within_configured_band() {
        let config = one_month_config(42);
        let records = generate(&config, fixed_end()).unwrap();
        let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
        for r in &records {
            *counts.entry(r.date).or_insert(0) += 1;
        }
        // Checkup drops can only reduce a day below its nominal draw, so
        // only the upper bound is a hard cap.
        assert!(counts.values().all(|c| *c <= config.daily_max as usize));
    }

    #[test]
    fn wait_time_is_monotonic_in_daily_count() {
        let model = GeneratorConfig::default().wait;
        let mut last = 0;
        for count in 0..200 {
            let w = wait_minutes(count, &model);
            assert!(w >= last, "wait dropped at count {}", count);
            last = w;
        }
        assert_eq!(wait_minutes(0, &model), model.min_minutes);
        assert_eq!(wait_minutes(10_000, &model), model.max_minutes);
    }

    #[test]
    fn wait_time_matches_day_counts() {
        let config = one_month_config(42);
        let records = generate(&config, fixed_end()).unwrap();
        let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
        for r in &records {
            *counts.entry(r.date).or_insert(0) += 1;
        }
        for r in &records {
            assert_eq!(r.wait_time, wait_minutes(counts[&r.date], &config.wait));
        }
    }

    #[test]
    fn invalid_configuration_fails_before_sampling() {
        let mut config = one_month_config(42);
        config.wait.capacity = 0;
        let err = generate(&config, fixed_end()).unwrap_err().to_string();
        assert!(err.contains("invalid configuration"));

        let mut config = one_month_config(42);
        config.months_back = 0;
        assert!(generate(&config, fixed_end()).is_err());
    }
}
