use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub pull: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub permissions: Permissions,
}

impl Repository {
    pub fn can_see_traffic(&self) -> bool {
        self.permissions.push || self.permissions.admin
    }
}

/// One day of traffic for a single metric. At most one sample per date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySample {
    pub date: NaiveDate,
    pub uniques: u64,
    pub count: u64,
}

impl DailySample {
    pub fn zero(date: NaiveDate) -> Self {
        Self { date, uniques: 0, count: 0 }
    }
}

/// Per-repository traffic for one metric: all-time totals plus a dense
/// per-day breakdown covering the report window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTraffic {
    pub breakdown: Vec<DailySample>,
    pub count: u64,
    pub name: String,
    pub uniques: u64,
}

impl RepoTraffic {
    pub fn zero(name: String, dates: &[NaiveDate]) -> Self {
        Self {
            breakdown: dates.iter().copied().map(DailySample::zero).collect(),
            count: 0,
            name,
            uniques: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferrerStat {
    pub count: u64,
    pub referrer: String,
    pub repo: String,
    pub uniques: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathStat {
    pub count: u64,
    pub path: String,
    pub repo: String,
    pub title: String,
    pub uniques: u64,
}

/// JSON document for the `summary` subcommand. A metric that was not
/// requested serializes as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub clones: Option<Vec<RepoTraffic>>,
    pub views: Option<Vec<RepoTraffic>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricCell {
    pub uniques: u64,
    pub count: u64,
}

/// Views and clones for one repository on one date (or all-time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayCell {
    pub views: MetricCell,
    pub clones: MetricCell,
}

impl DayCell {
    pub fn is_empty(&self) -> bool {
        self.views.count == 0 && self.clones.count == 0
    }
}

/// One aggregated summary row: leading all-time cell, then one cell per
/// date in the report window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub name: String,
    pub all_time: DayCell,
    pub days: Vec<DayCell>,
}
