//! Payroll aggregation engine.
//!
//! The `engine` module computes the three derived totals from a
//! [`PayrollFigures`] snapshot.  The computation is a pure function of
//! its input, cheap enough to re-run in full on every field change,
//! and the only place where count/rate pairs are multiplied.  It also
//! uses the [`rayon`] crate to prepare draft totals for a whole batch
//! of attendance summaries across multiple CPU cores, which backs the
//! period overview listing.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{AttendanceSummary, PayPeriod, PayrollFigures, Totals};
use crate::numeric::floor_monetary;
use crate::record::figures_from_summary;

/// Computes total additions, total deductions and net pay from the
/// current figures.
///
/// Arithmetic saturates instead of wrapping, so a pathological input
/// pins at the `i64` range ends rather than flipping sign.  Net pay is
/// additions minus deductions and is deliberately not clamped at zero;
/// a period where deductions exceed additions produces a negative
/// amount.
pub fn compute_totals(figures: &PayrollFigures) -> Totals {
    let additions = figures
        .base_salary
        .saturating_add(figures.transport_allowance)
        .saturating_add(figures.reimbursement)
        .saturating_add(figures.overtime_hours.saturating_mul(figures.overtime_rate))
        .saturating_add(figures.bonus_personal)
        .saturating_add(figures.bonus_team)
        .saturating_add(figures.bonus_jackpot)
        .saturating_add(
            figures
                .full_attendance_days
                .saturating_mul(figures.full_attendance_rate),
        )
        .saturating_add(figures.health_insurance_allowance)
        .saturating_add(figures.employment_insurance_allowance)
        .saturating_add(figures.tax_allowance)
        .saturating_add(
            figures
                .holiday_bonus_count
                .saturating_mul(figures.holiday_bonus_rate),
        );

    let deductions = figures
        .absence_days
        .saturating_mul(figures.absence_rate)
        .saturating_add(figures.late_days.saturating_mul(figures.late_rate))
        .saturating_add(
            figures
                .unexcused_days
                .saturating_mul(figures.unexcused_rate),
        )
        .saturating_add(figures.loan_repayment)
        .saturating_add(figures.health_insurance_deduction)
        .saturating_add(figures.employment_insurance_deduction)
        .saturating_add(figures.loss);

    Totals {
        additions,
        deductions,
        net_pay: additions.saturating_sub(deductions),
    }
}

/// A draft prepared from one attendance summary: the mapped figures
/// plus their computed totals, ready for the period overview listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedDraft {
    pub employee_id: String,
    pub employee_name: String,
    pub period: Option<PayPeriod>,
    pub outstanding_loan: i64,
    pub figures: PayrollFigures,
    pub totals: Totals,
}

/// Prepares draft figures and totals for a batch of attendance
/// summaries.
///
/// Each summary is mapped and aggregated independently, so the batch
/// is computed in parallel.  Output order matches input order.
pub fn prepare_drafts(summaries: Vec<AttendanceSummary>) -> Vec<PreparedDraft> {
    debug!(count = summaries.len(), "preparing payroll drafts");
    summaries
        .into_par_iter()
        .map(|summary| {
            let figures = figures_from_summary(&summary);
            let totals = compute_totals(&figures);
            PreparedDraft {
                employee_id: summary.employee_id,
                employee_name: summary.employee_name,
                period: summary.period,
                outstanding_loan: floor_monetary(summary.outstanding_loan),
                figures,
                totals,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario() {
        let figures = PayrollFigures {
            base_salary: 5_000_000,
            transport_allowance: 500_000,
            overtime_hours: 3,
            overtime_rate: 50_000,
            late_days: 2,
            late_rate: 25_000,
            ..PayrollFigures::default()
        };
        let totals = compute_totals(&figures);
        assert_eq!(totals.additions, 5_650_000);
        assert_eq!(totals.deductions, 50_000);
        assert_eq!(totals.net_pay, 5_600_000);
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let figures = PayrollFigures {
            base_salary: 4_200_000,
            transport_allowance: 350_000,
            reimbursement: 125_000,
            overtime_hours: 7,
            overtime_rate: 40_000,
            bonus_personal: 200_000,
            bonus_team: 100_000,
            bonus_jackpot: 1_000_000,
            full_attendance_days: 1,
            full_attendance_rate: 150_000,
            holiday_bonus_count: 1,
            holiday_bonus_rate: 4_200_000,
            health_insurance_allowance: 168_000,
            employment_insurance_allowance: 89_000,
            tax_allowance: 50_000,
            absence_days: 2,
            absence_rate: 190_000,
            late_days: 3,
            late_rate: 25_000,
            unexcused_days: 1,
            unexcused_rate: 380_000,
            loan_repayment: 500_000,
            health_insurance_deduction: 42_000,
            employment_insurance_deduction: 84_000,
            loss: 75_000,
        };
        let first = compute_totals(&figures);
        let second = compute_totals(&figures);
        assert_eq!(first, second);
        assert_eq!(first.additions, 10_912_000);
        assert_eq!(first.deductions, 1_536_000);
        assert_eq!(first.net_pay, 9_376_000);
    }

    #[test]
    fn test_zero_count_contributes_zero_not_rate() {
        let figures = PayrollFigures {
            overtime_hours: 0,
            overtime_rate: 50_000,
            absence_days: 4,
            absence_rate: 0,
            ..PayrollFigures::default()
        };
        let totals = compute_totals(&figures);
        assert_eq!(totals.additions, 0);
        assert_eq!(totals.deductions, 0);
    }

    #[test]
    fn test_pair_contribution_is_exactly_the_product() {
        let figures = PayrollFigures {
            holiday_bonus_count: 2,
            holiday_bonus_rate: 3_500_000,
            unexcused_days: 3,
            unexcused_rate: 120_000,
            ..PayrollFigures::default()
        };
        let totals = compute_totals(&figures);
        assert_eq!(totals.additions, 7_000_000);
        assert_eq!(totals.deductions, 360_000);
    }

    #[test]
    fn test_net_pay_may_be_negative() {
        let figures = PayrollFigures {
            base_salary: 100_000,
            loan_repayment: 150_000,
            ..PayrollFigures::default()
        };
        let totals = compute_totals(&figures);
        assert_eq!(totals.net_pay, -50_000);
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_wrapping() {
        let figures = PayrollFigures {
            base_salary: i64::MAX,
            transport_allowance: 1_000_000,
            overtime_hours: i64::MAX,
            overtime_rate: 2,
            ..PayrollFigures::default()
        };
        let totals = compute_totals(&figures);
        assert_eq!(totals.additions, i64::MAX);
        assert_eq!(totals.net_pay, i64::MAX);
    }

    #[test]
    fn test_prepare_drafts_keeps_order_and_computes_totals() {
        let period = PayPeriod {
            month: 4,
            year: 2024,
            start: String::new(),
            end: String::new(),
        };
        let summaries = vec![
            AttendanceSummary {
                employee_id: "EMP-1".into(),
                employee_name: "Andi".into(),
                period: Some(period.clone()),
                base_salary: 5_000_000.0,
                transport_allowance: 500_000.0,
                overtime_hours: 3.0,
                overtime_rate: 50_000.0,
                late_days: 2.0,
                late_rate: 25_000.0,
                ..AttendanceSummary::default()
            },
            AttendanceSummary {
                employee_id: "EMP-2".into(),
                employee_name: "Budi".into(),
                period: Some(period),
                base_salary: 3_750_000.5,
                outstanding_loan: 1_200_000.0,
                ..AttendanceSummary::default()
            },
        ];

        let drafts = prepare_drafts(summaries);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].employee_id, "EMP-1");
        assert_eq!(drafts[0].totals.net_pay, 5_600_000);
        assert_eq!(drafts[1].employee_id, "EMP-2");
        // Fractional source amounts are floored on ingestion.
        assert_eq!(drafts[1].figures.base_salary, 3_750_000);
        assert_eq!(drafts[1].outstanding_loan, 1_200_000);
        assert_eq!(drafts[1].totals.net_pay, 3_750_000);
    }
}
