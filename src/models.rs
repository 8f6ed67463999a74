//! Data models for the payroll engine.
//!
//! The `models` module defines the serialisable structs exchanged with
//! the external record source and sink, plus the internal value
//! objects the aggregator computes over.  Boundary types derive
//! `Serialize` and `Deserialize` so they can be transmitted over the
//! network or read from seed files; every numeric field on an inbound
//! record defaults to zero and every string to empty, because the
//! source is allowed to omit any of them.
//!
//! Amounts on the wire are `f64` and may carry fractions; internal raw
//! values are whole `i64` smallest-denomination units, produced by the
//! uniform flooring policy in [`crate::numeric::floor_monetary`].

use serde::{Deserialize, Serialize};

/// The calendar period one payroll covers.
///
/// Start and end dates are ISO 8601 strings (`YYYY-MM-DD`); the source
/// may omit them, in which case they stay empty and only month/year
/// identify the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Month number, 1 through 12.
    pub month: u32,
    /// Four-digit year.
    pub year: i32,
    /// Inclusive start date of the period.
    #[serde(default)]
    pub start: String,
    /// Inclusive end date of the period.
    #[serde(default)]
    pub end: String,
}

impl PayPeriod {
    /// Canonical `YYYY-MM` label for logs and lookups.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl std::fmt::Display for PayPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Who is operating on whose payroll.
///
/// Passed explicitly into the session at construction; nothing in the
/// engine reads ambient user state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// The company the payroll belongs to.
    pub company_id: String,
    /// The administrative user performing the edits.
    pub operator_id: String,
}

/// A previously created payroll record, as supplied by the store.
///
/// Every component amount is optional on the wire; absent fields load
/// as zero.  Monetary values may arrive fractional and are floored on
/// ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayrollDraft {
    #[serde(default)]
    pub payroll_id: String,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub employee_name: String,
    /// Period the draft covers.  A draft without one cannot be loaded.
    #[serde(default)]
    pub period: Option<PayPeriod>,

    // Addition components.
    #[serde(default)]
    pub base_salary: f64,
    #[serde(default)]
    pub transport_allowance: f64,
    #[serde(default)]
    pub reimbursement: f64,
    #[serde(default)]
    pub overtime_hours: f64,
    #[serde(default)]
    pub overtime_rate: f64,
    #[serde(default)]
    pub bonus_personal: f64,
    #[serde(default)]
    pub bonus_team: f64,
    #[serde(default)]
    pub bonus_jackpot: f64,
    #[serde(default)]
    pub full_attendance_days: f64,
    #[serde(default)]
    pub full_attendance_rate: f64,
    #[serde(default)]
    pub holiday_bonus_count: f64,
    #[serde(default)]
    pub holiday_bonus_rate: f64,
    #[serde(default)]
    pub health_insurance_allowance: f64,
    #[serde(default)]
    pub employment_insurance_allowance: f64,
    #[serde(default)]
    pub tax_allowance: f64,

    // Deduction components.
    #[serde(default)]
    pub absence_days: f64,
    #[serde(default)]
    pub absence_rate: f64,
    #[serde(default)]
    pub late_days: f64,
    #[serde(default)]
    pub late_rate: f64,
    #[serde(default)]
    pub unexcused_days: f64,
    #[serde(default)]
    pub unexcused_rate: f64,
    #[serde(default)]
    pub loan_repayment: f64,
    /// Total outstanding employee loan, shown read-only beside the
    /// repayment field.
    #[serde(default)]
    pub outstanding_loan: f64,
    #[serde(default)]
    pub health_insurance_deduction: f64,
    #[serde(default)]
    pub employment_insurance_deduction: f64,
    #[serde(default)]
    pub loss: f64,
}

/// A freshly computed attendance summary for an employee whose payroll
/// has not been created yet.
///
/// This is the second load shape: attendance counts and standing rates
/// are present, while discretionary amounts (bonuses, insurance
/// figures) are not part of the summary and start at zero on the
/// worksheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceSummary {
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub employee_name: String,
    #[serde(default)]
    pub period: Option<PayPeriod>,

    #[serde(default)]
    pub base_salary: f64,
    #[serde(default)]
    pub transport_allowance: f64,
    /// Approved reimbursement total for the period.
    #[serde(default)]
    pub reimbursement: f64,
    #[serde(default)]
    pub overtime_hours: f64,
    #[serde(default)]
    pub overtime_rate: f64,
    #[serde(default)]
    pub full_attendance_days: f64,
    #[serde(default)]
    pub full_attendance_rate: f64,
    #[serde(default)]
    pub absence_days: f64,
    #[serde(default)]
    pub absence_rate: f64,
    #[serde(default)]
    pub late_days: f64,
    #[serde(default)]
    pub late_rate: f64,
    #[serde(default)]
    pub unexcused_days: f64,
    #[serde(default)]
    pub unexcused_rate: f64,
    #[serde(default)]
    pub outstanding_loan: f64,
}

/// One record as served by a [`crate::record::RecordSource`].
///
/// The two shapes the loader accepts, tagged so seed files and API
/// payloads can declare which one they carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceRecord {
    /// An existing payroll draft being reopened for editing.
    PayrollDraft(PayrollDraft),
    /// An attendance summary backing a payroll that does not exist yet.
    AttendanceSummary(AttendanceSummary),
}

/// Submission status carried on the outbound payload.  Currently every
/// submission is final; any further lifecycle belongs to the sink.
pub const STATUS_FINAL: &str = "final";

/// The outbound payload built on save: every line-item raw value plus
/// the three derived totals and the status flag.  Field names mirror
/// the source shapes so the sink can persist it as a flat record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollSubmission {
    /// Empty when the session was opened from an attendance summary;
    /// the sink assigns an id in that case.
    pub payroll_id: String,
    pub employee_id: String,
    pub company_id: String,
    /// Operator who confirmed the submission.
    pub submitted_by: String,
    pub period: PayPeriod,
    pub status: String, // always "final"

    pub base_salary: i64,
    pub transport_allowance: i64,
    pub reimbursement: i64,
    pub overtime_hours: i64,
    pub overtime_rate: i64,
    pub bonus_personal: i64,
    pub bonus_team: i64,
    pub bonus_jackpot: i64,
    pub full_attendance_days: i64,
    pub full_attendance_rate: i64,
    pub holiday_bonus_count: i64,
    pub holiday_bonus_rate: i64,
    pub health_insurance_allowance: i64,
    pub employment_insurance_allowance: i64,
    pub tax_allowance: i64,
    pub absence_days: i64,
    pub absence_rate: i64,
    pub late_days: i64,
    pub late_rate: i64,
    pub unexcused_days: i64,
    pub unexcused_rate: i64,
    pub loan_repayment: i64,
    pub health_insurance_deduction: i64,
    pub employment_insurance_deduction: i64,
    pub loss: i64,

    pub total_additions: i64,
    pub total_deductions: i64,
    pub net_pay: i64,
}

/// Receipt returned by the sink for an accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// The id the record is stored under; assigned by the sink when
    /// the submission carried none.
    pub payroll_id: String,
}

/// The aggregator's input: every constituent figure as a raw value.
///
/// A plain value object so the total computation stays a pure
/// function, independent of any field or rendering state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollFigures {
    pub base_salary: i64,
    pub transport_allowance: i64,
    pub reimbursement: i64,
    pub overtime_hours: i64,
    pub overtime_rate: i64,
    pub bonus_personal: i64,
    pub bonus_team: i64,
    pub bonus_jackpot: i64,
    pub full_attendance_days: i64,
    pub full_attendance_rate: i64,
    pub holiday_bonus_count: i64,
    pub holiday_bonus_rate: i64,
    pub health_insurance_allowance: i64,
    pub employment_insurance_allowance: i64,
    pub tax_allowance: i64,
    pub absence_days: i64,
    pub absence_rate: i64,
    pub late_days: i64,
    pub late_rate: i64,
    pub unexcused_days: i64,
    pub unexcused_rate: i64,
    pub loan_repayment: i64,
    pub health_insurance_deduction: i64,
    pub employment_insurance_deduction: i64,
    pub loss: i64,
}

/// The three derived figures.  Recomputed in full on every constituent
/// change, never edited directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of every addition component.
    pub additions: i64,
    /// Sum of every deduction component.
    pub deductions: i64,
    /// Additions minus deductions.  May be negative; never clamped.
    pub net_pay: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pay_period_label() {
        let period = PayPeriod {
            month: 5,
            year: 2024,
            start: "2024-05-01".into(),
            end: "2024-05-31".into(),
        };
        assert_eq!(period.label(), "2024-05");
        assert_eq!(period.to_string(), "2024-05");
    }

    #[test]
    fn test_draft_tolerates_absent_fields() {
        let draft: PayrollDraft = serde_json::from_str(
            r#"{"employee_id": "EMP-1", "period": {"month": 3, "year": 2024}}"#,
        )
        .unwrap();
        assert_eq!(draft.employee_id, "EMP-1");
        assert_eq!(draft.base_salary, 0.0);
        assert_eq!(draft.loan_repayment, 0.0);
        assert_eq!(draft.employee_name, "");
        assert_eq!(draft.period.unwrap().start, "");
    }

    #[test]
    fn test_source_record_kind_tag() {
        let json = r#"{"kind": "attendance_summary", "employee_id": "EMP-2"}"#;
        let record: SourceRecord = serde_json::from_str(json).unwrap();
        match record {
            SourceRecord::AttendanceSummary(summary) => {
                assert_eq!(summary.employee_id, "EMP-2");
                assert!(summary.period.is_none());
            }
            SourceRecord::PayrollDraft(_) => panic!("wrong record kind"),
        }
    }

    #[test]
    fn test_totals_default_to_zero() {
        let totals = Totals::default();
        assert_eq!(totals.additions, 0);
        assert_eq!(totals.deductions, 0);
        assert_eq!(totals.net_pay, 0);
    }
}
