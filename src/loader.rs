use crate::config::GeneratorConfig;
use crate::generator::apply_wait_times;
use crate::types::{Gender, RawVisitRow, Segment, VisitRecord, VisitType};
use crate::util::{parse_date_safe, parse_i64_safe, parse_u32_safe};
use chrono::Datelike;
use csv::ReaderBuilder;
use std::error::Error;
use std::fs::File;
use std::io::Read;

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub parse_errors: usize,
    pub dropped_closed_day: usize,
    pub dropped_off_slot: usize,
}

pub fn load_and_clean(
    path: &str,
    config: &GeneratorConfig,
) -> Result<(Vec<VisitRecord>, LoadReport), Box<dyn Error>> {
    let file = File::open(path)?;
    from_reader(file, config)
}

/// Clean an external visits CSV into typed records.
///
/// Per-row failures are counted, never fatal. Rows that would violate the
/// table invariants are dropped: closed-day visits cannot exist, and
/// checkup visits exist only on the designated slot. Ages and revenues are
/// clamped into the configured bands, and wait times are rederived from
/// same-day counts once the whole table is known.
pub fn from_reader<R: Read>(
    reader: R,
    config: &GeneratorConfig,
) -> Result<(Vec<VisitRecord>, LoadReport), Box<dyn Error>> {
    config.validate()?;
    let opening_hours = config.opening_hour_list();
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut dropped_closed_day = 0usize;
    let mut dropped_off_slot = 0usize;
    let mut records: Vec<VisitRecord> = Vec::new();

    for result in rdr.deserialize::<RawVisitRow>() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                parse_errors += 1;
                continue;
            }
        };

        let date = match parse_date_safe(row.date.as_deref()) {
            Some(d) => d,
            None => {
                parse_errors += 1;
                continue;
            }
        };
        let segment = match row.segment.as_deref().and_then(Segment::from_code) {
            Some(s) => s,
            None => {
                parse_errors += 1;
                continue;
            }
        };
        let visit_type = match row.visit_type.as_deref().and_then(VisitType::from_code) {
            Some(v) => v,
            None => {
                parse_errors += 1;
                continue;
            }
        };
        let age = match parse_u32_safe(row.age.as_deref()) {
            Some(a) => a.clamp(config.age_min, config.age_max),
            None => {
                parse_errors += 1;
                continue;
            }
        };
        let revenue = match parse_i64_safe(row.revenue.as_deref()) {
            Some(v) => {
                let profile = config.profile(segment);
                v.clamp(profile.revenue_min, profile.revenue_max)
            }
            None => {
                parse_errors += 1;
                continue;
            }
        };
        let hour = match parse_u32_safe(row.hour.as_deref()) {
            Some(h) if opening_hours.contains(&h) => h,
            _ => {
                parse_errors += 1;
                continue;
            }
        };
        // Gender is optional; an unreadable value degrades to unknown.
        let gender = row.gender.as_deref().and_then(Gender::from_code);

        let weekday = date.weekday();
        if weekday == config.closed_weekday {
            dropped_closed_day += 1;
            continue;
        }
        if segment == Segment::Checkup && weekday != config.checkup_weekday {
            dropped_off_slot += 1;
            continue;
        }

        records.push(VisitRecord {
            date,
            segment,
            visit_type,
            age,
            gender,
            revenue,
            hour,
            weekday,
            wait_time: 0,
        });
    }

    // Wait time is derived, never trusted from the file.
    apply_wait_times(&mut records, &config.wait);

    let report = LoadReport {
        total_rows,
        kept_rows: records.len(),
        parse_errors,
        dropped_closed_day,
        dropped_off_slot,
    };
    Ok((records, report))
}
