//! Attendance status derivation and monthly reporting.
//!
//! Everything here is pure: callers hand in snapshots of records, leave requests
//! and holidays, and get plain values back.

pub mod aggregator;
pub mod calendar;
pub mod classifier;
pub mod duration;
pub mod error;
pub mod grid;
pub mod policy;
pub mod record;
pub mod shift;

pub use aggregator::{MonthlySummary, ReportContext, summarize_month};
pub use calendar::ReportMonth;
pub use classifier::{DayStatus, Glyph};
pub use duration::{Category, DurationLabel};
pub use grid::{DetailRow, GridRow, build_grid, detailed_listing};
pub use policy::AttendancePolicy;
pub use shift::{describe_shift, elapsed_minutes, format_elapsed};
