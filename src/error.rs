//! Error types for the payroll engine.
//!
//! The engine computations themselves are pure and cannot fail; only
//! the load and save boundaries produce errors, and every one of them
//! is local to a single edit session and recoverable by retrying or
//! editing.  The variants below encode the taxonomy used throughout
//! the crate: load-mapping failures fail fast, submission failures
//! leave field state untouched, and invalid session phases are
//! rejected with the phase that caused the rejection.

use thiserror::Error;

/// Errors raised while mapping an external record onto the worksheet.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A required identifying field is absent from the source record.
    /// The session is not constructed; the caller may fetch a corrected
    /// record and retry.
    #[error("source record is missing required field `{0}`")]
    MissingField(&'static str),

    /// The record source could not supply the requested record.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Errors from the record source boundary.
#[derive(Error, Debug)]
pub enum SourceError {
    /// No record exists under the requested id.
    #[error("no payroll record found for `{0}`")]
    NotFound(String),

    /// The source itself failed (transport, storage).
    #[error("record source unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the record sink boundary.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The sink rejected the submitted payload.
    #[error("payroll sink rejected the submission: {0}")]
    Rejected(String),

    /// The sink could not be reached.
    #[error("payroll sink unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by edit-session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// An edit arrived while the session was not in the Ready phase.
    #[error("field edits are only accepted while the session is ready (currently {phase})")]
    NotEditable {
        /// The phase the session was in when the edit arrived.
        phase: &'static str,
    },

    /// A save was requested while a prior save had not yet resolved.
    #[error("a save is already in flight for this session")]
    SaveInFlight,

    /// The session already saved successfully; the record is final.
    #[error("session is already saved; the payroll record can no longer change")]
    AlreadySaved,

    /// The sink rejected or failed the submission.  The session returns
    /// to the Ready phase with all field values preserved for retry.
    #[error(transparent)]
    Submission(#[from] SinkError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_names_the_missing_field() {
        let err = LoadError::MissingField("employee_id");
        assert_eq!(
            err.to_string(),
            "source record is missing required field `employee_id`"
        );
    }

    #[test]
    fn test_source_error_passes_through_load_error() {
        let err = LoadError::from(SourceError::NotFound("draft-7".into()));
        assert_eq!(err.to_string(), "no payroll record found for `draft-7`");
    }

    #[test]
    fn test_session_error_reports_phase() {
        let err = SessionError::NotEditable { phase: "SAVING" };
        assert!(err.to_string().contains("SAVING"));
    }
}
