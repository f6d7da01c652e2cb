// Generation policy as data.
//
// Every coefficient the sampling loop consumes lives here as a named,
// swappable table rather than an inline conditional, so the clinic's
// operating policy (closed day, checkup slot, seasonal mix, clamp bands)
// can change without touching the generator itself.
use crate::types::Segment;
use chrono::Weekday;
use std::error::Error;

/// Sampling profile for one case-mix segment.
#[derive(Debug, Clone)]
pub struct SegmentProfile {
    /// Normal distribution over per-visit revenue, in integer currency units.
    pub revenue_mean: f64,
    pub revenue_sd: f64,
    /// Revenue clamp band applied after sampling.
    pub revenue_min: i64,
    pub revenue_max: i64,
    /// Normal distribution over patient age.
    pub age_mean: f64,
    pub age_sd: f64,
    /// Probability that a non-checkup visit is a first visit.
    pub first_visit_chance: f64,
}

/// Convex congestion model: minutes grow quadratically once the day's
/// volume approaches per-provider capacity.
#[derive(Debug, Clone)]
pub struct WaitModel {
    pub capacity: u32,
    pub scale: f64,
    pub min_minutes: u32,
    pub max_minutes: u32,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Fixed seed; the entire table is a pure function of this and the window.
    pub seed: u64,
    /// Trailing window length, counted as 30-day months back from the end date.
    pub months_back: u32,
    /// Poisson mean for a plain weekday before any modulation.
    pub base_daily_mean: f64,
    /// Clamp band for the realized daily visit count.
    pub daily_min: u32,
    pub daily_max: u32,
    /// The clinic's fixed closed day; no records ever fall on it.
    pub closed_weekday: Weekday,
    /// The designated checkup slot; checkup visits exist only on this day.
    pub checkup_weekday: Weekday,
    /// Per-weekday multipliers on the daily mean. Missing weekdays count as 1.0.
    pub weekday_factors: Vec<(Weekday, f64)>,
    /// Low-probability adverse-day reduction (e.g. heavy rain).
    pub adverse_day_chance: f64,
    pub adverse_day_factor: f64,
    /// Months that get the seasonal boost and the seasonal segment mix.
    pub seasonal_months: Vec<u32>,
    pub seasonal_factor: f64,
    /// Categorical segment weights outside and inside the season.
    pub segment_mix: Vec<(Segment, f64)>,
    pub seasonal_segment_mix: Vec<(Segment, f64)>,
    pub lifestyle: SegmentProfile,
    pub acute: SegmentProfile,
    pub checkup: SegmentProfile,
    /// Shared human-age clamp band across all segments.
    pub age_min: u32,
    pub age_max: u32,
    /// Clinic opening hours with their draw weights.
    pub opening_hours: Vec<(u32, f64)>,
    pub female_share: f64,
    pub wait: WaitModel,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            seed: 42,
            months_back: 6,
            base_daily_mean: 60.0,
            daily_min: 10,
            daily_max: 100,
            closed_weekday: Weekday::Sun,
            checkup_weekday: Weekday::Sat,
            // Monday rush, Thursday and Saturday half-days.
            weekday_factors: vec![
                (Weekday::Mon, 1.2),
                (Weekday::Thu, 0.6),
                (Weekday::Sat, 0.6),
            ],
            adverse_day_chance: 0.05,
            adverse_day_factor: 0.8,
            seasonal_months: vec![12, 1, 2],
            seasonal_factor: 1.5,
            segment_mix: vec![
                (Segment::Lifestyle, 0.4),
                (Segment::Acute, 0.5),
                (Segment::Checkup, 0.1),
            ],
            // Winter shifts weight toward acute cases.
            seasonal_segment_mix: vec![
                (Segment::Lifestyle, 0.3),
                (Segment::Acute, 0.6),
                (Segment::Checkup, 0.1),
            ],
            lifestyle: SegmentProfile {
                revenue_mean: 5000.0,
                revenue_sd: 1000.0,
                revenue_min: 3000,
                revenue_max: 8000,
                age_mean: 55.0,
                age_sd: 10.0,
                first_visit_chance: 0.1,
            },
            acute: SegmentProfile {
                revenue_mean: 2500.0,
                revenue_sd: 500.0,
                revenue_min: 1500,
                revenue_max: 4000,
                age_mean: 38.0,
                age_sd: 15.0,
                first_visit_chance: 0.4,
            },
            checkup: SegmentProfile {
                revenue_mean: 15000.0,
                revenue_sd: 2000.0,
                revenue_min: 10000,
                revenue_max: 20000,
                age_mean: 45.0,
                age_sd: 8.0,
                // Checkups are always screenings; this is never drawn.
                first_visit_chance: 0.0,
            },
            age_min: 20,
            age_max: 85,
            opening_hours: vec![
                (9, 0.08),
                (10, 0.15),
                (11, 0.22),
                (12, 0.10),
                (14, 0.12),
                (15, 0.20),
                (16, 0.10),
                (17, 0.03),
            ],
            female_share: 0.52,
            wait: WaitModel {
                capacity: 60,
                scale: 30.0,
                min_minutes: 5,
                max_minutes: 120,
            },
        }
    }
}

impl GeneratorConfig {
    pub fn profile(&self, segment: Segment) -> &SegmentProfile {
        match segment {
            Segment::Lifestyle => &self.lifestyle,
            Segment::Acute => &self.acute,
            Segment::Checkup => &self.checkup,
        }
    }

    pub fn weekday_factor(&self, weekday: Weekday) -> f64 {
        self.weekday_factors
            .iter()
            .find(|(wd, _)| *wd == weekday)
            .map(|(_, f)| *f)
            .unwrap_or(1.0)
    }

    pub fn is_seasonal(&self, month: u32) -> bool {
        self.seasonal_months.contains(&month)
    }

    /// Opening hours in ascending order, for the hour-by-weekday grid domain.
    pub fn opening_hour_list(&self) -> Vec<u32> {
        let mut hours: Vec<u32> = self.opening_hours.iter().map(|(h, _)| *h).collect();
        hours.sort_unstable();
        hours.dedup();
        hours
    }

    /// Reject degenerate configurations before any sampling happens, so a
    /// bad capacity can never surface later as a division artifact in the
    /// wait-time derivation.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.months_back == 0 {
            return Err("invalid configuration: months_back must be at least 1".into());
        }
        if self.wait.capacity == 0 {
            return Err("invalid configuration: wait.capacity must be positive".into());
        }
        if self.wait.scale <= 0.0 {
            return Err("invalid configuration: wait.scale must be positive".into());
        }
        if self.wait.min_minutes > self.wait.max_minutes {
            return Err("invalid configuration: wait minute bounds are inverted".into());
        }
        if self.base_daily_mean <= 0.0 {
            return Err("invalid configuration: base_daily_mean must be positive".into());
        }
        if self.daily_min > self.daily_max {
            return Err("invalid configuration: daily count bounds are inverted".into());
        }
        if self.adverse_day_factor <= 0.0 || self.seasonal_factor <= 0.0 {
            return Err("invalid configuration: day-count factors must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.adverse_day_chance) {
            return Err("invalid configuration: adverse_day_chance must be a probability".into());
        }
        if !(0.0..=1.0).contains(&self.female_share) {
            return Err("invalid configuration: female_share must be a probability".into());
        }
        for (wd, f) in &self.weekday_factors {
            if *f <= 0.0 {
                return Err(
                    format!("invalid configuration: weekday factor for {} must be positive", wd)
                        .into(),
                );
            }
        }
        check_mix("segment_mix", &self.segment_mix)?;
        check_mix("seasonal_segment_mix", &self.seasonal_segment_mix)?;
        if self.opening_hours.is_empty() {
            return Err("invalid configuration: opening_hours must not be empty".into());
        }
        if self.opening_hours.iter().any(|(_, w)| *w <= 0.0) {
            return Err("invalid configuration: opening hour weights must be positive".into());
        }
        if self.age_min > self.age_max {
            return Err("invalid configuration: age bounds are inverted".into());
        }
        for (name, p) in [
            ("lifestyle", &self.lifestyle),
            ("acute", &self.acute),
            ("checkup", &self.checkup),
        ] {
            if p.revenue_sd <= 0.0 || p.age_sd <= 0.0 {
                return Err(format!(
                    "invalid configuration: {} profile spreads must be positive",
                    name
                )
                .into());
            }
            if p.revenue_min > p.revenue_max {
                return Err(format!(
                    "invalid configuration: {} revenue bounds are inverted",
                    name
                )
                .into());
            }
            if !(0.0..=1.0).contains(&p.first_visit_chance) {
                return Err(format!(
                    "invalid configuration: {} first_visit_chance must be a probability",
                    name
                )
                .into());
            }
        }
        Ok(())
    }
}

fn check_mix(name: &str, mix: &[(Segment, f64)]) -> Result<(), Box<dyn Error>> {
    if mix.is_empty() {
        return Err(format!("invalid configuration: {} must not be empty", name).into());
    }
    if mix.iter().any(|(_, w)| *w < 0.0) {
        return Err(format!("invalid configuration: {} weights must not be negative", name).into());
    }
    if mix.iter().map(|(_, w)| *w).sum::<f64>() <= 0.0 {
        return Err(format!("invalid configuration: {} weights must sum above zero", name).into());
    }
    Ok(())
}
