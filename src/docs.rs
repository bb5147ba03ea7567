use crate::api::attendance::{BulkAttendance, BulkKind, MarkDay, UpsertAttendance};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, UpdateEmployee};
use crate::api::holiday::CreateHoliday;
use crate::api::leave_request::{CreateLeave, LeaveListResponse};
use crate::api::report::GridResponse;
use crate::auth::handlers::LoginResponse;
use crate::model::{
    attendance::AttendanceRecord, employee::Employee, holiday::Holiday,
    leave_request::{LeaveRequest, LeaveStatus},
};
use crate::models::{LoginReqDto, RegisterReq};
use crate::tracking::{DayStatus, DetailRow, GridRow, Glyph, MonthlySummary, aggregator::DayEntry};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracker

Records daily clock-in/clock-out times and day labels for employees, and turns them
into monthly attendance reports.

### Key Features
- **Attendance**: clock in/out, mark leave or weekly offs, bulk entry by admins
- **Leave**: apply for leave, approve or reject requests
- **Holidays**: company-wide days off counted as present
- **Reports**: per-employee monthly summary, employee x day grid, detailed listing

### Day statuses
A day with at least 8.5 clocked hours is a full day, 4.5 to 8.5 hours a half day,
and anything shorter is counted as leave. Thresholds are configurable.

### Security
All `/api` endpoints require a **JWT Bearer** access token. Employees see their own
data; admins manage everyone.
"#,
    ),
    paths(
        crate::api::health::health,

        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::attendance::list_attendance,
        crate::api::attendance::user_attendance,
        crate::api::attendance::upsert_attendance,
        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::mark_day,
        crate::api::attendance::bulk_attendance,
        crate::api::attendance::delete_attendance,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::holiday::list_holidays,
        crate::api::holiday::create_holiday,
        crate::api::holiday::delete_holiday,

        crate::api::report::monthly_report,
        crate::api::report::grid_report,
        crate::api::report::detailed_report
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            Employee,
            CreateEmployee,
            UpdateEmployee,
            EmployeeListResponse,
            AttendanceRecord,
            UpsertAttendance,
            MarkDay,
            BulkKind,
            BulkAttendance,
            LeaveRequest,
            LeaveStatus,
            CreateLeave,
            LeaveListResponse,
            Holiday,
            CreateHoliday,
            DayStatus,
            Glyph,
            DayEntry,
            MonthlySummary,
            GridRow,
            GridResponse,
            DetailRow
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Registration and token APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Attendance", description = "Attendance recording APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Holiday", description = "Holiday calendar APIs"),
        (name = "Report", description = "Monthly attendance reports"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
