use crate::api::carry_forward::{
    CarryForwardFilter, CarryForwardListResponse, CreateCarryForward,
};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery, UpdateUserRole};
use crate::api::leave::{
    CreateLeave, CreatedLeaveResponse, ExportQuery, LeaveFilter, LeaveListResponse, RangeQuery,
};
use crate::api::summary::{NotifyResponse, SummaryListResponse};
use crate::engine::calendar::DateRange;
use crate::engine::summary::EmployeePtoSummary;
use crate::model::carry_forward::CarryForwardRequest;
use crate::model::employee::Employee;
use crate::model::leave_record::LeaveRecord;
use crate::model::status::ApprovalStatus;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Accounting API",
        version = "1.0.0",
        description = r#"
## Leave Accounting & Approval Service

This API powers the leave side of an HR dashboard: PTO submission,
manager approval, balance accounting, and carry-forward.

### 🔹 Key Features
- **Leave Requests**
  - Submit a date range; every day becomes an individually decided record
  - Automatic PTO / Non-PTO classification against the annual allowance
  - Conflict detection against already-requested dates
- **Carry-Forward**
  - Move unused allowance into the next year, subject to approval
- **Summaries**
  - Per-employee yearly balances, cached with a short TTL
  - Threshold alert emails when an allowance is nearly exhausted
- **Export**
  - CSV of a full year's records

### 🔐 Security
Endpoints are protected with **JWT Bearer authentication**.
Approvals, deletion, summaries and export require **Manager** or **Admin**.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave::leave_list,
        crate::api::leave::get_leave,
        crate::api::leave::create_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::delete_leave,
        crate::api::leave::leave_ranges,
        crate::api::leave::export_leave_csv,

        crate::api::carry_forward::create_carry_forward,
        crate::api::carry_forward::carry_forward_list,
        crate::api::carry_forward::approve_carry_forward,
        crate::api::carry_forward::reject_carry_forward,

        crate::api::summary::get_summaries,
        crate::api::summary::notify_thresholds,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_user_role
    ),
    components(
        schemas(
            ApprovalStatus,
            LeaveRecord,
            CreateLeave,
            CreatedLeaveResponse,
            LeaveFilter,
            LeaveListResponse,
            RangeQuery,
            ExportQuery,
            DateRange,
            CarryForwardRequest,
            CreateCarryForward,
            CarryForwardFilter,
            CarryForwardListResponse,
            EmployeePtoSummary,
            SummaryListResponse,
            NotifyResponse,
            Employee,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            UpdateUserRole
        )
    ),
    tags(
        (name = "Leave", description = "Leave request and approval APIs"),
        (name = "CarryForward", description = "Carry-forward request APIs"),
        (name = "Summary", description = "Balance summary and alerting APIs"),
        (name = "Employee", description = "Employee directory and role APIs"),
    )
)]
pub struct ApiDoc;
