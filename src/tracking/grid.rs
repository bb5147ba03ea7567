use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use super::aggregator::{ReportContext, summarize_month};
use super::calendar::ReportMonth;
use super::classifier::{DayStatus, Glyph};
use super::record::DayRecord;
use super::shift::describe_shift;
use crate::model::{attendance::AttendanceRecord, employee::Employee};

/// One employee's line of the monthly matrix.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    pub sr_no: usize,
    pub emp_id: String,
    pub emp_name: String,
    /// day of month -> glyph
    pub days: BTreeMap<u32, Glyph>,
    pub total_days: u32,
    pub present_days: f64,
    pub leave_days: f64,
}

/// One record of the chronological listing.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailRow {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub user_id: String,
    pub name: String,
    pub status: DayStatus,
    pub status_text: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub in_time: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub out_time: Option<DateTime<Utc>>,
    pub duration: String,
    /// Worked time against the required shift, e.g. "8h 40m (-0h 20m)"
    pub shift: Option<String>,
    /// Whether the worked time reached the required shift
    pub is_sufficient: Option<bool>,
}

/// Builds the employee x day matrix, one row per employee in input order.
///
/// Records whose user is not in `employees` are dropped.
pub fn build_grid(
    employees: &[Employee],
    records: &[AttendanceRecord],
    context: &ReportContext<'_>,
    month: ReportMonth,
) -> Vec<GridRow> {
    let mut by_user: HashMap<&str, Vec<&AttendanceRecord>> = HashMap::new();
    for record in records {
        by_user.entry(record.user_id.as_str()).or_default().push(record);
    }

    let rows: Vec<GridRow> = employees
        .iter()
        .enumerate()
        .map(|(index, employee)| {
            let own = by_user
                .get(employee.id.as_str())
                .into_iter()
                .flatten()
                .copied();
            let summary = summarize_month(&employee.id, own, context, month);

            GridRow {
                sr_no: index + 1,
                emp_id: employee.id.clone(),
                emp_name: employee.name.clone(),
                days: summary.days.iter().map(|d| (d.day, d.glyph)).collect(),
                total_days: summary.days_in_month,
                present_days: summary.present_days,
                leave_days: summary.leave_days,
            }
        })
        .collect();

    let orphaned = by_user
        .keys()
        .filter(|user_id| !employees.iter().any(|e| e.id == **user_id))
        .count();
    if orphaned > 0 {
        debug!(orphaned, "Ignoring attendance of unknown employees");
    }

    rows
}

/// Lists every record of the month, newest date first, then by employee name
/// (case-insensitive). Records of unknown employees are listed as "Unknown".
pub fn detailed_listing(
    employees: &[Employee],
    records: &[AttendanceRecord],
    context: &ReportContext<'_>,
    month: ReportMonth,
) -> Vec<DetailRow> {
    let names: HashMap<&str, &str> = employees
        .iter()
        .map(|e| (e.id.as_str(), e.name.as_str()))
        .collect();

    let mut rows: Vec<DetailRow> = records
        .iter()
        .filter_map(|record| match DayRecord::parse(record) {
            Ok(day) => Some((record, day)),
            Err(e) => {
                debug!(error = %e, user_id = %record.user_id, "Skipping attendance record");
                None
            }
        })
        .filter(|(_, day)| month.contains(day.date))
        .map(|(record, day)| {
            let classification = context.classify_day(&day.user_id, day.date, Some(&day));
            let required = context.policy.required_shift_minutes;
            let worked = if day.label.is_day_label() {
                None
            } else {
                day.worked_minutes().filter(|minutes| *minutes >= 0)
            };
            DetailRow {
                date: day.date,
                user_id: record.user_id.clone(),
                name: names
                    .get(record.user_id.as_str())
                    .copied()
                    .unwrap_or("Unknown")
                    .to_string(),
                status: classification.status,
                status_text: classification.display_text(),
                in_time: record.in_time,
                out_time: record.out_time,
                duration: if record.duration.trim().is_empty() {
                    "-".to_string()
                } else {
                    record.duration.clone()
                },
                shift: worked.map(|minutes| describe_shift(minutes, required)),
                is_sufficient: worked.map(|minutes| minutes >= required),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    rows
}
