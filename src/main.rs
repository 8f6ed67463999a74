//! Entry point for the payroll engine binary.
//!
//! Running this binary starts an HTTP server exposing the payroll
//! edit-session API.  The directory containing seed record JSON files
//! may be specified via the `PAYROLL_RECORD_DIR` environment variable;
//! if unset the server looks for a `records` folder relative to the
//! current working directory.

use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use payroll_engine::models::SessionContext;

#[tokio::main]
async fn main() -> Result<()> {
    // Log to stdout, filtered by RUST_LOG when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Determine where seed records live and where to listen.
    let record_dir = std::env::var("PAYROLL_RECORD_DIR").unwrap_or_else(|_| "records".to_string());
    let addr = std::env::var("PAYROLL_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    // The company and operator every session runs under.
    let context = SessionContext {
        company_id: std::env::var("PAYROLL_COMPANY_ID").unwrap_or_else(|_| "CO-1".to_string()),
        operator_id: std::env::var("PAYROLL_OPERATOR_ID").unwrap_or_else(|_| "admin".to_string()),
    };

    payroll_engine::api::serve(&addr, PathBuf::from(record_dir), context).await
}
