//! Record source and sink boundary.
//!
//! The `record` module defines the seams between the engine and its
//! external collaborators: a [`RecordSource`] supplying payroll drafts
//! and attendance summaries, a [`RecordSink`] accepting final
//! submissions, and a [`ConfirmationGate`] consulted before any
//! submission goes out.  Implementations must be thread-safe
//! (`Send + Sync`) because sessions may be served concurrently.
//!
//! It also houses the load mapping: external records carry optional
//! fractional `f64` amounts, internal figures are whole `i64` raw
//! values, and every monetary ingestion goes through the same flooring
//! policy.  Mapping fails fast when a record lacks the fields that
//! identify whose payroll it is.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use tracing::{info, warn};

use crate::error::{LoadError, SinkError, SourceError};
use crate::models::{
    AttendanceSummary, PayPeriod, PayrollDraft, PayrollFigures, PayrollSubmission, SessionContext,
    SourceRecord, SubmissionReceipt, Totals, STATUS_FINAL,
};
use crate::numeric::floor_monetary;

/// Supplies the records an edit session can be opened from.
pub trait RecordSource: Send + Sync {
    /// Fetches one record by its key.
    fn fetch(&self, key: &str) -> Result<SourceRecord, SourceError>;

    /// Lists every available record key.
    fn list_keys(&self) -> Result<Vec<String>, SourceError>;

    /// Returns the attendance summaries for one period, for batch
    /// draft preparation.
    fn summaries_for(&self, month: u32, year: i32) -> Result<Vec<AttendanceSummary>, SourceError>;
}

/// Accepts final payroll submissions.
pub trait RecordSink: Send + Sync {
    /// Persists a submission, returning the id it was stored under.
    fn submit(&self, submission: &PayrollSubmission) -> Result<SubmissionReceipt, SinkError>;
}

/// The yes/no prompt consulted before a submission is sent.  Declining
/// is a full no-op: nothing is submitted and nothing changes.
pub trait ConfirmationGate: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// A gate whose answer is fixed up front, for callers that collect the
/// confirmation before invoking the engine (HTTP handlers, tests).
pub struct Confirmed(pub bool);

impl ConfirmationGate for Confirmed {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// A record source backed by a directory of JSON files.
///
/// Every `.json` file in the directory is parsed as a [`SourceRecord`]
/// and keyed by its file stem.  Files that fail to parse are logged
/// and skipped so one bad record cannot block a whole period.
pub struct DirRecordStore {
    records: HashMap<String, SourceRecord>,
}

impl DirRecordStore {
    pub fn open(path: &Path) -> Result<Self> {
        let mut records = HashMap::new();
        if path.is_dir() {
            for entry in std::fs::read_dir(path)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    if let Some(ext) = entry.path().extension() {
                        if ext == "json" {
                            let data = std::fs::read_to_string(entry.path())?;
                            match serde_json::from_str::<SourceRecord>(&data) {
                                Ok(record) => {
                                    let key = entry
                                        .path()
                                        .file_stem()
                                        .map(|stem| stem.to_string_lossy().into_owned())
                                        .unwrap_or_default();
                                    records.insert(key, record);
                                }
                                Err(err) => {
                                    warn!(file = ?entry.path(), error = %err,
                                        "skipping unparseable record file");
                                }
                            }
                        }
                    }
                }
            }
        }
        info!(count = records.len(), dir = ?path, "loaded payroll records");
        Ok(DirRecordStore { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSource for DirRecordStore {
    fn fetch(&self, key: &str) -> Result<SourceRecord, SourceError> {
        self.records
            .get(key)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(key.to_string()))
    }

    fn list_keys(&self) -> Result<Vec<String>, SourceError> {
        let mut keys: Vec<String> = self.records.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn summaries_for(&self, month: u32, year: i32) -> Result<Vec<AttendanceSummary>, SourceError> {
        let mut summaries: Vec<AttendanceSummary> = self
            .records
            .values()
            .filter_map(|record| match record {
                SourceRecord::AttendanceSummary(summary) => summary
                    .period
                    .as_ref()
                    .filter(|period| period.month == month && period.year == year)
                    .map(|_| summary.clone()),
                SourceRecord::PayrollDraft(_) => None,
            })
            .collect();
        summaries.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));
        Ok(summaries)
    }
}

/// A sink that stores accepted submissions in memory.
///
/// Stands in for the persistence API during development and tests;
/// submissions arriving without a payroll id are assigned one.
#[derive(Default)]
pub struct MemorySink {
    accepted: Mutex<Vec<PayrollSubmission>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The submissions accepted so far.
    pub fn accepted(&self) -> Vec<PayrollSubmission> {
        match self.accepted.lock() {
            Ok(accepted) => accepted.clone(),
            Err(_) => Vec::new(),
        }
    }
}

impl RecordSink for MemorySink {
    fn submit(&self, submission: &PayrollSubmission) -> Result<SubmissionReceipt, SinkError> {
        let mut accepted = self
            .accepted
            .lock()
            .map_err(|_| SinkError::Unavailable("submission store is poisoned".to_string()))?;
        let payroll_id = if submission.payroll_id.is_empty() {
            format!("PAY-{:05}", accepted.len() + 1)
        } else {
            submission.payroll_id.clone()
        };
        let mut stored = submission.clone();
        stored.payroll_id = payroll_id.clone();
        accepted.push(stored);
        Ok(SubmissionReceipt { payroll_id })
    }
}

/// A source record mapped onto internal raw values, ready to seed a
/// worksheet.
#[derive(Debug, Clone)]
pub struct LoadedRecord {
    /// Empty when the record was an attendance summary and no payroll
    /// exists yet.
    pub payroll_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub period: PayPeriod,
    pub outstanding_loan: i64,
    pub figures: PayrollFigures,
}

/// Maps a source record onto internal raw values.
///
/// Missing numeric fields were already defaulted to zero during
/// deserialisation; missing identity fields are an error, because a
/// worksheet for an unidentifiable payroll could silently write over
/// someone else's record on save.
pub fn map_record(record: SourceRecord) -> Result<LoadedRecord, LoadError> {
    match record {
        SourceRecord::PayrollDraft(draft) => map_draft(draft),
        SourceRecord::AttendanceSummary(summary) => map_summary(summary),
    }
}

fn map_draft(draft: PayrollDraft) -> Result<LoadedRecord, LoadError> {
    if draft.employee_id.is_empty() {
        return Err(LoadError::MissingField("employee_id"));
    }
    let period = draft.period.clone().ok_or(LoadError::MissingField("period"))?;
    Ok(LoadedRecord {
        payroll_id: draft.payroll_id.clone(),
        employee_id: draft.employee_id.clone(),
        employee_name: draft.employee_name.clone(),
        period,
        outstanding_loan: floor_monetary(draft.outstanding_loan),
        figures: figures_from_draft(&draft),
    })
}

fn map_summary(summary: AttendanceSummary) -> Result<LoadedRecord, LoadError> {
    if summary.employee_id.is_empty() {
        return Err(LoadError::MissingField("employee_id"));
    }
    let period = summary
        .period
        .clone()
        .ok_or(LoadError::MissingField("period"))?;
    Ok(LoadedRecord {
        payroll_id: String::new(),
        employee_id: summary.employee_id.clone(),
        employee_name: summary.employee_name.clone(),
        period,
        outstanding_loan: floor_monetary(summary.outstanding_loan),
        figures: figures_from_summary(&summary),
    })
}

/// Maps a payroll draft's amounts onto raw figures, flooring every
/// value through the single ingestion policy.
pub fn figures_from_draft(draft: &PayrollDraft) -> PayrollFigures {
    PayrollFigures {
        base_salary: floor_monetary(draft.base_salary),
        transport_allowance: floor_monetary(draft.transport_allowance),
        reimbursement: floor_monetary(draft.reimbursement),
        overtime_hours: floor_monetary(draft.overtime_hours),
        overtime_rate: floor_monetary(draft.overtime_rate),
        bonus_personal: floor_monetary(draft.bonus_personal),
        bonus_team: floor_monetary(draft.bonus_team),
        bonus_jackpot: floor_monetary(draft.bonus_jackpot),
        full_attendance_days: floor_monetary(draft.full_attendance_days),
        full_attendance_rate: floor_monetary(draft.full_attendance_rate),
        holiday_bonus_count: floor_monetary(draft.holiday_bonus_count),
        holiday_bonus_rate: floor_monetary(draft.holiday_bonus_rate),
        health_insurance_allowance: floor_monetary(draft.health_insurance_allowance),
        employment_insurance_allowance: floor_monetary(draft.employment_insurance_allowance),
        tax_allowance: floor_monetary(draft.tax_allowance),
        absence_days: floor_monetary(draft.absence_days),
        absence_rate: floor_monetary(draft.absence_rate),
        late_days: floor_monetary(draft.late_days),
        late_rate: floor_monetary(draft.late_rate),
        unexcused_days: floor_monetary(draft.unexcused_days),
        unexcused_rate: floor_monetary(draft.unexcused_rate),
        loan_repayment: floor_monetary(draft.loan_repayment),
        health_insurance_deduction: floor_monetary(draft.health_insurance_deduction),
        employment_insurance_deduction: floor_monetary(draft.employment_insurance_deduction),
        loss: floor_monetary(draft.loss),
    }
}

/// Maps an attendance summary onto raw figures.  Fields the summary
/// does not carry (bonuses, insurance amounts, loan repayment) start
/// at zero for the operator to fill in.
pub fn figures_from_summary(summary: &AttendanceSummary) -> PayrollFigures {
    PayrollFigures {
        base_salary: floor_monetary(summary.base_salary),
        transport_allowance: floor_monetary(summary.transport_allowance),
        reimbursement: floor_monetary(summary.reimbursement),
        overtime_hours: floor_monetary(summary.overtime_hours),
        overtime_rate: floor_monetary(summary.overtime_rate),
        full_attendance_days: floor_monetary(summary.full_attendance_days),
        full_attendance_rate: floor_monetary(summary.full_attendance_rate),
        absence_days: floor_monetary(summary.absence_days),
        absence_rate: floor_monetary(summary.absence_rate),
        late_days: floor_monetary(summary.late_days),
        late_rate: floor_monetary(summary.late_rate),
        unexcused_days: floor_monetary(summary.unexcused_days),
        unexcused_rate: floor_monetary(summary.unexcused_rate),
        ..PayrollFigures::default()
    }
}

/// Builds the outbound payload from current raw values and freshly
/// computed totals.
pub fn build_submission(
    payroll_id: &str,
    employee_id: &str,
    period: &PayPeriod,
    context: &SessionContext,
    figures: &PayrollFigures,
    totals: &Totals,
) -> PayrollSubmission {
    PayrollSubmission {
        payroll_id: payroll_id.to_string(),
        employee_id: employee_id.to_string(),
        company_id: context.company_id.clone(),
        submitted_by: context.operator_id.clone(),
        period: period.clone(),
        status: STATUS_FINAL.to_string(),

        base_salary: figures.base_salary,
        transport_allowance: figures.transport_allowance,
        reimbursement: figures.reimbursement,
        overtime_hours: figures.overtime_hours,
        overtime_rate: figures.overtime_rate,
        bonus_personal: figures.bonus_personal,
        bonus_team: figures.bonus_team,
        bonus_jackpot: figures.bonus_jackpot,
        full_attendance_days: figures.full_attendance_days,
        full_attendance_rate: figures.full_attendance_rate,
        holiday_bonus_count: figures.holiday_bonus_count,
        holiday_bonus_rate: figures.holiday_bonus_rate,
        health_insurance_allowance: figures.health_insurance_allowance,
        employment_insurance_allowance: figures.employment_insurance_allowance,
        tax_allowance: figures.tax_allowance,
        absence_days: figures.absence_days,
        absence_rate: figures.absence_rate,
        late_days: figures.late_days,
        late_rate: figures.late_rate,
        unexcused_days: figures.unexcused_days,
        unexcused_rate: figures.unexcused_rate,
        loan_repayment: figures.loan_repayment,
        health_insurance_deduction: figures.health_insurance_deduction,
        employment_insurance_deduction: figures.employment_insurance_deduction,
        loss: figures.loss,

        total_additions: totals.additions,
        total_deductions: totals.deductions,
        net_pay: totals.net_pay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(employee_id: &str, period: Option<PayPeriod>) -> PayrollDraft {
        PayrollDraft {
            payroll_id: "PAY-00042".into(),
            employee_id: employee_id.into(),
            employee_name: "Citra".into(),
            period,
            base_salary: 4_000_000.75,
            late_days: 2.0,
            late_rate: 25_000.0,
            outstanding_loan: 1_500_000.9,
            ..PayrollDraft::default()
        }
    }

    fn april() -> PayPeriod {
        PayPeriod {
            month: 4,
            year: 2024,
            start: "2024-04-01".into(),
            end: "2024-04-30".into(),
        }
    }

    #[test]
    fn test_map_draft_floors_every_amount() {
        let loaded = map_record(SourceRecord::PayrollDraft(draft("EMP-3", Some(april()))))
            .expect("draft should load");
        assert_eq!(loaded.payroll_id, "PAY-00042");
        assert_eq!(loaded.figures.base_salary, 4_000_000);
        assert_eq!(loaded.figures.late_days, 2);
        assert_eq!(loaded.outstanding_loan, 1_500_000);
        assert_eq!(loaded.period.label(), "2024-04");
    }

    #[test]
    fn test_map_rejects_missing_employee_id() {
        let err = map_record(SourceRecord::PayrollDraft(draft("", Some(april()))))
            .expect_err("load should fail");
        assert!(matches!(err, LoadError::MissingField("employee_id")));
    }

    #[test]
    fn test_map_rejects_missing_period() {
        let err = map_record(SourceRecord::PayrollDraft(draft("EMP-3", None)))
            .expect_err("load should fail");
        assert!(matches!(err, LoadError::MissingField("period")));
    }

    #[test]
    fn test_summary_maps_with_empty_payroll_id() {
        let summary = AttendanceSummary {
            employee_id: "EMP-9".into(),
            employee_name: "Dewi".into(),
            period: Some(april()),
            base_salary: 3_200_000.0,
            unexcused_days: 1.0,
            unexcused_rate: 160_000.0,
            ..AttendanceSummary::default()
        };
        let loaded = map_record(SourceRecord::AttendanceSummary(summary)).expect("should load");
        assert_eq!(loaded.payroll_id, "");
        assert_eq!(loaded.figures.unexcused_days, 1);
        // Amounts the summary never carries default to zero.
        assert_eq!(loaded.figures.bonus_jackpot, 0);
        assert_eq!(loaded.figures.loan_repayment, 0);
    }

    #[test]
    fn test_dir_store_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("draft-1.json"),
            r#"{"kind": "payroll_draft", "payroll_id": "PAY-00001",
                "employee_id": "EMP-1", "base_salary": 5000000,
                "period": {"month": 4, "year": 2024}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = DirRecordStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.list_keys().unwrap(), vec!["draft-1".to_string()]);
        let record = store.fetch("draft-1").unwrap();
        assert!(matches!(record, SourceRecord::PayrollDraft(_)));
        assert!(matches!(
            store.fetch("missing"),
            Err(SourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_dir_store_filters_summaries_by_period() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("summary-apr.json"),
            r#"{"kind": "attendance_summary", "employee_id": "EMP-2",
                "period": {"month": 4, "year": 2024}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("summary-may.json"),
            r#"{"kind": "attendance_summary", "employee_id": "EMP-2",
                "period": {"month": 5, "year": 2024}}"#,
        )
        .unwrap();

        let store = DirRecordStore::open(dir.path()).unwrap();
        let summaries = store.summaries_for(4, 2024).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].period.as_ref().unwrap().month, 4);
    }

    #[test]
    fn test_memory_sink_assigns_id_when_absent() {
        let sink = MemorySink::new();
        let context = SessionContext {
            company_id: "CO-1".into(),
            operator_id: "ADM-1".into(),
        };
        let figures = PayrollFigures {
            base_salary: 1_000_000,
            ..PayrollFigures::default()
        };
        let totals = Totals {
            additions: 1_000_000,
            deductions: 0,
            net_pay: 1_000_000,
        };

        let fresh = build_submission("", "EMP-1", &april(), &context, &figures, &totals);
        let receipt = sink.submit(&fresh).unwrap();
        assert_eq!(receipt.payroll_id, "PAY-00001");

        let existing = build_submission("PAY-00777", "EMP-2", &april(), &context, &figures, &totals);
        let receipt = sink.submit(&existing).unwrap();
        assert_eq!(receipt.payroll_id, "PAY-00777");

        let accepted = sink.accepted();
        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[0].payroll_id, "PAY-00001");
        assert_eq!(accepted[0].status, "final");
        assert_eq!(accepted[0].submitted_by, "ADM-1");
    }

    #[test]
    fn test_submission_carries_every_figure_and_total() {
        let context = SessionContext {
            company_id: "CO-1".into(),
            operator_id: "ADM-2".into(),
        };
        let figures = PayrollFigures {
            base_salary: 5_000_000,
            transport_allowance: 500_000,
            overtime_hours: 3,
            overtime_rate: 50_000,
            late_days: 2,
            late_rate: 25_000,
            ..PayrollFigures::default()
        };
        let totals = crate::engine::compute_totals(&figures);
        let submission =
            build_submission("PAY-00005", "EMP-5", &april(), &context, &figures, &totals);

        assert_eq!(submission.base_salary, 5_000_000);
        assert_eq!(submission.overtime_hours, 3);
        assert_eq!(submission.late_rate, 25_000);
        assert_eq!(submission.total_additions, 5_650_000);
        assert_eq!(submission.total_deductions, 50_000);
        assert_eq!(submission.net_pay, 5_600_000);
        assert_eq!(submission.company_id, "CO-1");
        assert_eq!(submission.period, april());
    }
}
