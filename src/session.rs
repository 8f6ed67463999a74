//! Payroll edit sessions.
//!
//! An [`EditSession`] owns one worksheet from load to submission.  It
//! is constructed from a source record (failing fast if the record
//! cannot identify whose payroll it is), accepts field edits while in
//! the `Ready` phase, keeps the derived totals consistent with the
//! fields within the same call that changed them, and performs the
//! confirmed save that finalises the record.
//!
//! Phase transitions: `Ready -> Saving -> Saved` on success, with
//! `Saving -> Ready` on a failed submission so the operator can
//! correct and retry.  Re-entry into `Saving` is rejected while a
//! prior submission is unresolved, and a saved session accepts no
//! further edits.

use serde::Serialize;
use tracing::{info, warn};

use crate::engine::compute_totals;
use crate::error::{LoadError, SessionError};
use crate::fields::{FieldId, FieldView, GroupView, PayrollWorksheet};
use crate::models::{PayPeriod, SessionContext, SourceRecord, Totals};
use crate::numeric::{DotSeparated, NumericBinding};
use crate::record::{build_submission, map_record, ConfirmationGate, RecordSink};

/// The confirmation shown before a payroll is submitted.
pub const SAVE_PROMPT: &str = "Apakah Anda yakin ingin menyimpan payroll ini?";

/// Where one edit session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Accepting edits.
    Ready,
    /// A submission is in flight; edits and further saves are
    /// rejected until it resolves.
    Saving,
    /// Submitted and accepted.  The record is final.
    Saved,
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Ready => "ready",
            SessionPhase::Saving => "saving",
            SessionPhase::Saved => "saved",
        }
    }
}

/// Returned by a successful [`EditSession::save`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The sink accepted the submission under this id.
    Saved { payroll_id: String },
    /// The operator declined the confirmation; nothing was submitted
    /// and nothing changed.
    Declined,
}

/// The result of one field edit: the field's new state and the totals
/// recomputed from it.
#[derive(Debug, Clone, Serialize)]
pub struct EditOutcome {
    pub field: FieldView,
    pub totals: TotalsView,
}

/// The derived totals with their always-rendered display strings.
#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub additions: i64,
    pub additions_display: String,
    pub deductions: i64,
    pub deductions_display: String,
    pub net_pay: i64,
    pub net_pay_display: String,
}

/// Full session state for clients: identity, phase, every field, the
/// themed groups, and the current totals.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub payroll_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub period: PayPeriod,
    pub phase: &'static str,
    pub fields: Vec<FieldView>,
    pub groups: Vec<GroupView>,
    pub outstanding_loan: String,
    pub totals: TotalsView,
}

/// One payroll being edited, from load to submission.
#[derive(Debug)]
pub struct EditSession {
    context: SessionContext,
    payroll_id: String,
    employee_id: String,
    employee_name: String,
    period: PayPeriod,
    worksheet: PayrollWorksheet,
    totals: Totals,
    phase: SessionPhase,
}

impl EditSession {
    /// Opens a session from a source record.
    ///
    /// The record is mapped onto the worksheet with every amount
    /// floored to a raw value; a record that cannot identify its
    /// employee or period is rejected and no session exists.
    pub fn open(record: SourceRecord, context: SessionContext) -> Result<Self, LoadError> {
        let loaded = map_record(record)?;
        let mut worksheet = PayrollWorksheet::default();
        worksheet.apply_figures(&loaded.figures);
        worksheet.set_outstanding_loan(loaded.outstanding_loan);
        let totals = compute_totals(&loaded.figures);
        info!(
            employee = %loaded.employee_id,
            period = %loaded.period,
            net_pay = totals.net_pay,
            "opened payroll edit session"
        );
        Ok(EditSession {
            context,
            payroll_id: loaded.payroll_id,
            employee_id: loaded.employee_id,
            employee_name: loaded.employee_name,
            period: loaded.period,
            worksheet,
            totals,
            phase: SessionPhase::Ready,
        })
    }

    /// Applies one edit to the addressed field and recomputes the
    /// totals before returning, so callers always observe totals
    /// consistent with the fields.
    pub fn edit(&mut self, id: FieldId, text: &str) -> Result<EditOutcome, SessionError> {
        if self.phase != SessionPhase::Ready {
            return Err(SessionError::NotEditable {
                phase: self.phase.name(),
            });
        }
        self.worksheet.edit(id, text);
        self.totals = compute_totals(&self.worksheet.figures());
        Ok(EditOutcome {
            field: self.worksheet.field_view(id),
            totals: self.totals_view(),
        })
    }

    /// Submits the current figures through the sink, gated by the
    /// confirmation prompt.
    ///
    /// The payload totals are recomputed from the figures at the
    /// moment of submission rather than read from cached state.  On
    /// success the session becomes `Saved` and adopts the id the sink
    /// stored the record under.  On failure the session returns to
    /// `Ready` with every field value untouched so the operator can
    /// retry.
    pub fn save(
        &mut self,
        sink: &dyn RecordSink,
        gate: &dyn ConfirmationGate,
    ) -> Result<SaveOutcome, SessionError> {
        match self.phase {
            SessionPhase::Saving => return Err(SessionError::SaveInFlight),
            SessionPhase::Saved => return Err(SessionError::AlreadySaved),
            SessionPhase::Ready => {}
        }
        if !gate.confirm(SAVE_PROMPT) {
            info!(employee = %self.employee_id, "payroll submission declined by operator");
            return Ok(SaveOutcome::Declined);
        }

        self.phase = SessionPhase::Saving;
        let figures = self.worksheet.figures();
        let totals = compute_totals(&figures);
        self.totals = totals;
        let submission = build_submission(
            &self.payroll_id,
            &self.employee_id,
            &self.period,
            &self.context,
            &figures,
            &totals,
        );
        match sink.submit(&submission) {
            Ok(receipt) => {
                self.payroll_id = receipt.payroll_id.clone();
                self.phase = SessionPhase::Saved;
                info!(
                    payroll = %receipt.payroll_id,
                    employee = %self.employee_id,
                    net_pay = totals.net_pay,
                    "payroll submitted"
                );
                Ok(SaveOutcome::Saved {
                    payroll_id: receipt.payroll_id,
                })
            }
            Err(err) => {
                self.phase = SessionPhase::Ready;
                warn!(employee = %self.employee_id, error = %err, "payroll submission failed");
                Err(SessionError::Submission(err))
            }
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn payroll_id(&self) -> &str {
        &self.payroll_id
    }

    pub fn employee_id(&self) -> &str {
        &self.employee_id
    }

    pub fn period(&self) -> &PayPeriod {
        &self.period
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn worksheet(&self) -> &PayrollWorksheet {
        &self.worksheet
    }

    pub fn totals_view(&self) -> TotalsView {
        let binding = NumericBinding::always_shown(&DotSeparated);
        TotalsView {
            additions: self.totals.additions,
            additions_display: binding.format(self.totals.additions),
            deductions: self.totals.deductions,
            deductions_display: binding.format(self.totals.deductions),
            net_pay: self.totals.net_pay,
            net_pay_display: binding.format(self.totals.net_pay),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            payroll_id: self.payroll_id.clone(),
            employee_id: self.employee_id.clone(),
            employee_name: self.employee_name.clone(),
            period: self.period.clone(),
            phase: self.phase.name(),
            fields: self.worksheet.field_views(),
            groups: self.worksheet.group_views(),
            outstanding_loan: self.worksheet.outstanding_loan().display().to_string(),
            totals: self.totals_view(),
        }
    }
}
