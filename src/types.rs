use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Case-mix bucket assigned to a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Lifestyle,
    Acute,
    Checkup,
}

impl Segment {
    /// Stable wire code used in CSV files.
    pub fn code(&self) -> &'static str {
        match self {
            Segment::Lifestyle => "lifestyle",
            Segment::Acute => "acute",
            Segment::Checkup => "checkup",
        }
    }

    /// Display label used in the segment distribution report.
    pub fn label(&self) -> &'static str {
        match self {
            Segment::Lifestyle => "Chronic / lifestyle care",
            Segment::Acute => "Acute care",
            Segment::Checkup => "Health checkup",
        }
    }

    pub fn from_code(s: &str) -> Option<Segment> {
        match s.trim().to_lowercase().as_str() {
            "lifestyle" => Some(Segment::Lifestyle),
            "acute" => Some(Segment::Acute),
            "checkup" => Some(Segment::Checkup),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitType {
    FirstVisit,
    FollowUp,
    Screening,
}

impl VisitType {
    pub fn code(&self) -> &'static str {
        match self {
            VisitType::FirstVisit => "first-visit",
            VisitType::FollowUp => "follow-up",
            VisitType::Screening => "screening",
        }
    }

    pub fn from_code(s: &str) -> Option<VisitType> {
        match s.trim().to_lowercase().as_str() {
            "first-visit" => Some(VisitType::FirstVisit),
            "follow-up" => Some(VisitType::FollowUp),
            "screening" => Some(VisitType::Screening),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn from_code(s: &str) -> Option<Gender> {
        match s.trim().to_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// One clinic encounter, either synthesized or loaded from a CSV export.
///
/// `weekday` is always derived from `date`, and `wait_time` is derived
/// from the day's final record count. Neither is sampled independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    pub date: NaiveDate,
    pub segment: Segment,
    pub visit_type: VisitType,
    pub age: u32,
    pub gender: Option<Gender>,
    pub revenue: i64,
    pub hour: u32,
    pub weekday: Weekday,
    pub wait_time: u32,
}

/// Serialized form of a `VisitRecord` for the dataset export.
#[derive(Debug, Serialize)]
pub struct VisitCsvRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Segment")]
    pub segment: String,
    #[serde(rename = "VisitType")]
    pub visit_type: String,
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Gender")]
    pub gender: Option<String>,
    #[serde(rename = "Revenue")]
    pub revenue: i64,
    #[serde(rename = "Hour")]
    pub hour: u32,
    #[serde(rename = "Weekday")]
    pub weekday: String,
    #[serde(rename = "WaitTime")]
    pub wait_time: u32,
}

impl VisitCsvRow {
    pub fn from_record(r: &VisitRecord) -> Self {
        VisitCsvRow {
            date: r.date.format("%Y-%m-%d").to_string(),
            segment: r.segment.code().to_string(),
            visit_type: r.visit_type.code().to_string(),
            age: r.age,
            gender: r.gender.map(|g| g.code().to_string()),
            revenue: r.revenue,
            hour: r.hour,
            weekday: r.weekday.to_string(),
            wait_time: r.wait_time,
        }
    }
}

/// Raw shape of an external visits CSV before cleaning. Extra columns
/// (e.g. a stored wait time) are ignored; wait times are always rederived.
#[derive(Debug, Deserialize)]
pub struct RawVisitRow {
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Segment")]
    pub segment: Option<String>,
    #[serde(rename = "VisitType")]
    pub visit_type: Option<String>,
    #[serde(rename = "Age")]
    pub age: Option<String>,
    #[serde(rename = "Gender")]
    pub gender: Option<String>,
    #[serde(rename = "Revenue")]
    pub revenue: Option<String>,
    #[serde(rename = "Hour")]
    pub hour: Option<String>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DailyTrendRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Visits")]
    #[tabled(rename = "Visits")]
    pub visits: usize,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Revenue")]
    pub revenue: i64,
}

/// One opening hour's visit counts across the six-day clinic week.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct HourlyLoadRow {
    #[serde(rename = "Hour")]
    #[tabled(rename = "Hour")]
    pub hour: u32,
    #[serde(rename = "Mon")]
    #[tabled(rename = "Mon")]
    pub mon: usize,
    #[serde(rename = "Tue")]
    #[tabled(rename = "Tue")]
    pub tue: usize,
    #[serde(rename = "Wed")]
    #[tabled(rename = "Wed")]
    pub wed: usize,
    #[serde(rename = "Thu")]
    #[tabled(rename = "Thu")]
    pub thu: usize,
    #[serde(rename = "Fri")]
    #[tabled(rename = "Fri")]
    pub fri: usize,
    #[serde(rename = "Sat")]
    #[tabled(rename = "Sat")]
    pub sat: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SegmentShareRow {
    #[serde(rename = "Segment")]
    #[tabled(rename = "Segment")]
    pub segment: String,
    #[serde(rename = "Visits")]
    #[tabled(rename = "Visits")]
    pub visits: usize,
    #[serde(rename = "SharePct")]
    #[tabled(rename = "SharePct")]
    pub share_pct: String,
}

/// A KPI value paired with its percentage change versus the previous
/// period. `delta` is 0 whenever the previous period gives no denominator.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Kpi {
    pub value: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
    pub revenue: Kpi,
    pub visits: Kpi,
    pub wait_time: Kpi,
    pub first_visit_rate: Kpi,
}
