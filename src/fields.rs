//! Editable worksheet fields.
//!
//! The `fields` module defines the building blocks of the payroll
//! worksheet: [`LineItem`] (one editable amount with its formatted
//! rendering), [`CountRatePair`] (an occurrences/rate pair whose
//! product the aggregator derives), [`FieldGroup`] (a fixed ordered
//! grouping of related fields), and [`PayrollWorksheet`] (the full set
//! of fields for one payroll, addressable by [`FieldId`]).
//!
//! Field titles and suffixes are the Indonesian labels the
//! administrative screens display.  The worksheet owns no business
//! logic: products and totals are computed from a figures snapshot by
//! [`crate::engine::compute_totals`].

use serde::{Deserialize, Serialize};

use crate::models::PayrollFigures;
use crate::numeric::{DotSeparated, LocaleNumeric, NumericBinding};

/// A single editable field holding a raw value and the display text
/// derived from it.
///
/// The display text is never stored independently of a parse: every
/// edit runs parse then format, so the field always shows the
/// canonical rendering of what was typed.
#[derive(Debug, Clone)]
pub struct LineItem {
    title: &'static str,
    suffix: Option<&'static str>,
    binding: NumericBinding,
    raw: i64,
    display: String,
    read_only: bool,
}

impl LineItem {
    /// An editable monetary amount with grouped-thousands rendering.
    pub fn monetary(title: &'static str, locale: &dyn LocaleNumeric) -> Self {
        Self::with_binding(title, None, NumericBinding::monetary(locale), false)
    }

    /// An editable occurrence count: plain digits, unit suffix.
    pub fn count(title: &'static str, suffix: &'static str) -> Self {
        Self::with_binding(title, Some(suffix), NumericBinding::count(), false)
    }

    /// A read-only reference amount computed elsewhere, rendered even
    /// when zero.
    pub fn reference(title: &'static str, locale: &dyn LocaleNumeric) -> Self {
        Self::with_binding(title, None, NumericBinding::always_shown(locale), true)
    }

    fn with_binding(
        title: &'static str,
        suffix: Option<&'static str>,
        binding: NumericBinding,
        read_only: bool,
    ) -> Self {
        LineItem {
            title,
            suffix,
            binding,
            raw: 0,
            display: binding.format(0),
            read_only,
        }
    }

    /// Applies one user edit: parses `text`, stores the raw value,
    /// reformats the display, and returns the parsed value.  Edits on
    /// a read-only field are ignored and return the current value.
    pub fn set_text(&mut self, text: &str) -> i64 {
        if self.read_only {
            return self.raw;
        }
        self.raw = self.binding.parse(text);
        self.display = self.binding.format(self.raw);
        self.raw
    }

    /// Replaces the raw value directly (the load path) and reformats.
    pub fn set_raw(&mut self, raw: i64) {
        self.raw = raw;
        self.display = self.binding.format(raw);
    }

    pub fn raw(&self) -> i64 {
        self.raw
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn title(&self) -> &'static str {
        self.title
    }

    pub fn suffix(&self) -> Option<&'static str> {
        self.suffix
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

/// An occurrences count paired with a per-occurrence rate.
///
/// Both halves are independently editable and neither suppresses the
/// other (a rate may be entered while the count is still zero).  The
/// pair deliberately does not compute its own product; multiplication
/// happens in the aggregator so the pair stays free of business logic.
#[derive(Debug, Clone)]
pub struct CountRatePair {
    count: LineItem,
    rate: LineItem,
}

impl CountRatePair {
    pub fn new(
        count_title: &'static str,
        suffix: &'static str,
        rate_title: &'static str,
        locale: &dyn LocaleNumeric,
    ) -> Self {
        CountRatePair {
            count: LineItem::count(count_title, suffix),
            rate: LineItem::monetary(rate_title, locale),
        }
    }

    pub fn count(&self) -> &LineItem {
        &self.count
    }

    pub fn count_mut(&mut self) -> &mut LineItem {
        &mut self.count
    }

    pub fn rate(&self) -> &LineItem {
        &self.rate
    }

    pub fn rate_mut(&mut self) -> &mut LineItem {
        &mut self.rate
    }
}

/// Identifies one editable field on the worksheet.
///
/// The read-only outstanding-loan reference is addressed separately
/// and deliberately has no id here, so no edit path can reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    BaseSalary,
    TransportAllowance,
    Reimbursement,
    OvertimeHours,
    OvertimeRate,
    BonusPersonal,
    BonusTeam,
    BonusJackpot,
    FullAttendanceDays,
    FullAttendanceRate,
    HolidayBonusCount,
    HolidayBonusRate,
    HealthInsuranceAllowance,
    EmploymentInsuranceAllowance,
    TaxAllowance,
    AbsenceDays,
    AbsenceRate,
    LateDays,
    LateRate,
    UnexcusedDays,
    UnexcusedRate,
    LoanRepayment,
    HealthInsuranceDeduction,
    EmploymentInsuranceDeduction,
    Loss,
}

impl FieldId {
    /// Every editable field, in worksheet display order.
    pub const ALL: [FieldId; 25] = [
        FieldId::BaseSalary,
        FieldId::TransportAllowance,
        FieldId::Reimbursement,
        FieldId::OvertimeHours,
        FieldId::OvertimeRate,
        FieldId::BonusPersonal,
        FieldId::BonusTeam,
        FieldId::BonusJackpot,
        FieldId::FullAttendanceDays,
        FieldId::FullAttendanceRate,
        FieldId::HolidayBonusCount,
        FieldId::HolidayBonusRate,
        FieldId::HealthInsuranceAllowance,
        FieldId::EmploymentInsuranceAllowance,
        FieldId::TaxAllowance,
        FieldId::AbsenceDays,
        FieldId::AbsenceRate,
        FieldId::LateDays,
        FieldId::LateRate,
        FieldId::UnexcusedDays,
        FieldId::UnexcusedRate,
        FieldId::LoanRepayment,
        FieldId::HealthInsuranceDeduction,
        FieldId::EmploymentInsuranceDeduction,
        FieldId::Loss,
    ];
}

/// A fixed ordered set of fields sharing one container and theme on
/// the worksheet.  Purely compositional; the members keep their own
/// state and edit paths.
#[derive(Debug, Clone, Copy)]
pub struct FieldGroup {
    pub label: &'static str,
    pub members: &'static [FieldId],
}

/// The themed groups the worksheet renders as shared containers.
pub const GROUPS: &[FieldGroup] = &[
    FieldGroup {
        label: "Bonus",
        members: &[
            FieldId::BonusPersonal,
            FieldId::BonusTeam,
            FieldId::BonusJackpot,
        ],
    },
    FieldGroup {
        label: "Tunjangan Asuransi & Pajak",
        members: &[
            FieldId::HealthInsuranceAllowance,
            FieldId::EmploymentInsuranceAllowance,
            FieldId::TaxAllowance,
        ],
    },
    FieldGroup {
        label: "Potongan Asuransi",
        members: &[
            FieldId::HealthInsuranceDeduction,
            FieldId::EmploymentInsuranceDeduction,
        ],
    },
];

/// Snapshot of one field for serialisation to clients.
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub id: FieldId,
    pub title: &'static str,
    pub suffix: Option<&'static str>,
    pub raw: i64,
    pub display: String,
}

/// One themed group with the current state of its member fields.
#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub label: &'static str,
    pub fields: Vec<FieldView>,
}

/// The full editable field set for one payroll.
///
/// Fields are addressed by [`FieldId`]; the outstanding-loan reference
/// sits outside that address space because it is never editable.
#[derive(Debug, Clone)]
pub struct PayrollWorksheet {
    base_salary: LineItem,
    transport_allowance: LineItem,
    reimbursement: LineItem,
    overtime: CountRatePair,
    bonus_personal: LineItem,
    bonus_team: LineItem,
    bonus_jackpot: LineItem,
    full_attendance: CountRatePair,
    holiday_bonus: CountRatePair,
    health_insurance_allowance: LineItem,
    employment_insurance_allowance: LineItem,
    tax_allowance: LineItem,
    absence: CountRatePair,
    late: CountRatePair,
    unexcused: CountRatePair,
    loan_repayment: LineItem,
    outstanding_loan: LineItem,
    health_insurance_deduction: LineItem,
    employment_insurance_deduction: LineItem,
    loss: LineItem,
}

impl PayrollWorksheet {
    /// Builds an all-zero worksheet using `locale` for monetary
    /// rendering.
    pub fn new(locale: &dyn LocaleNumeric) -> Self {
        PayrollWorksheet {
            base_salary: LineItem::monetary("Gaji Pokok", locale),
            transport_allowance: LineItem::monetary("Tunjangan Transport & Makan", locale),
            reimbursement: LineItem::monetary("Reimbursement", locale),
            overtime: CountRatePair::new("Lembur", "jam", "Tarif Lembur", locale),
            bonus_personal: LineItem::monetary("Bonus Pribadi", locale),
            bonus_team: LineItem::monetary("Bonus Tim", locale),
            bonus_jackpot: LineItem::monetary("Bonus Jackpot", locale),
            full_attendance: CountRatePair::new(
                "Absen Penuh",
                "hari",
                "Bonus Absen Penuh",
                locale,
            ),
            holiday_bonus: CountRatePair::new("THR", "bulan", "Tarif THR", locale),
            health_insurance_allowance: LineItem::monetary("Tunjangan BPJS Kesehatan", locale),
            employment_insurance_allowance: LineItem::monetary(
                "Tunjangan BPJS Ketenagakerjaan",
                locale,
            ),
            tax_allowance: LineItem::monetary("Tunjangan PPh 21", locale),
            absence: CountRatePair::new("Absen", "hari", "Potongan Absen", locale),
            late: CountRatePair::new("Terlambat", "hari", "Potongan Terlambat", locale),
            unexcused: CountRatePair::new("Mangkir", "hari", "Potongan Mangkir", locale),
            loan_repayment: LineItem::monetary("Pembayaran Kasbon", locale),
            outstanding_loan: LineItem::reference("Sisa Kasbon", locale),
            health_insurance_deduction: LineItem::monetary("Potongan BPJS Kesehatan", locale),
            employment_insurance_deduction: LineItem::monetary(
                "Potongan BPJS Ketenagakerjaan",
                locale,
            ),
            loss: LineItem::monetary("Kerugian Lain-lain", locale),
        }
    }

    pub fn field(&self, id: FieldId) -> &LineItem {
        match id {
            FieldId::BaseSalary => &self.base_salary,
            FieldId::TransportAllowance => &self.transport_allowance,
            FieldId::Reimbursement => &self.reimbursement,
            FieldId::OvertimeHours => self.overtime.count(),
            FieldId::OvertimeRate => self.overtime.rate(),
            FieldId::BonusPersonal => &self.bonus_personal,
            FieldId::BonusTeam => &self.bonus_team,
            FieldId::BonusJackpot => &self.bonus_jackpot,
            FieldId::FullAttendanceDays => self.full_attendance.count(),
            FieldId::FullAttendanceRate => self.full_attendance.rate(),
            FieldId::HolidayBonusCount => self.holiday_bonus.count(),
            FieldId::HolidayBonusRate => self.holiday_bonus.rate(),
            FieldId::HealthInsuranceAllowance => &self.health_insurance_allowance,
            FieldId::EmploymentInsuranceAllowance => &self.employment_insurance_allowance,
            FieldId::TaxAllowance => &self.tax_allowance,
            FieldId::AbsenceDays => self.absence.count(),
            FieldId::AbsenceRate => self.absence.rate(),
            FieldId::LateDays => self.late.count(),
            FieldId::LateRate => self.late.rate(),
            FieldId::UnexcusedDays => self.unexcused.count(),
            FieldId::UnexcusedRate => self.unexcused.rate(),
            FieldId::LoanRepayment => &self.loan_repayment,
            FieldId::HealthInsuranceDeduction => &self.health_insurance_deduction,
            FieldId::EmploymentInsuranceDeduction => &self.employment_insurance_deduction,
            FieldId::Loss => &self.loss,
        }
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut LineItem {
        match id {
            FieldId::BaseSalary => &mut self.base_salary,
            FieldId::TransportAllowance => &mut self.transport_allowance,
            FieldId::Reimbursement => &mut self.reimbursement,
            FieldId::OvertimeHours => self.overtime.count_mut(),
            FieldId::OvertimeRate => self.overtime.rate_mut(),
            FieldId::BonusPersonal => &mut self.bonus_personal,
            FieldId::BonusTeam => &mut self.bonus_team,
            FieldId::BonusJackpot => &mut self.bonus_jackpot,
            FieldId::FullAttendanceDays => self.full_attendance.count_mut(),
            FieldId::FullAttendanceRate => self.full_attendance.rate_mut(),
            FieldId::HolidayBonusCount => self.holiday_bonus.count_mut(),
            FieldId::HolidayBonusRate => self.holiday_bonus.rate_mut(),
            FieldId::HealthInsuranceAllowance => &mut self.health_insurance_allowance,
            FieldId::EmploymentInsuranceAllowance => &mut self.employment_insurance_allowance,
            FieldId::TaxAllowance => &mut self.tax_allowance,
            FieldId::AbsenceDays => self.absence.count_mut(),
            FieldId::AbsenceRate => self.absence.rate_mut(),
            FieldId::LateDays => self.late.count_mut(),
            FieldId::LateRate => self.late.rate_mut(),
            FieldId::UnexcusedDays => self.unexcused.count_mut(),
            FieldId::UnexcusedRate => self.unexcused.rate_mut(),
            FieldId::LoanRepayment => &mut self.loan_repayment,
            FieldId::HealthInsuranceDeduction => &mut self.health_insurance_deduction,
            FieldId::EmploymentInsuranceDeduction => &mut self.employment_insurance_deduction,
            FieldId::Loss => &mut self.loss,
        }
    }

    /// Applies one user edit to the addressed field and returns the
    /// parsed raw value.
    pub fn edit(&mut self, id: FieldId, text: &str) -> i64 {
        self.field_mut(id).set_text(text)
    }

    /// The read-only outstanding-loan reference shown beside the loan
    /// repayment field.
    pub fn outstanding_loan(&self) -> &LineItem {
        &self.outstanding_loan
    }

    pub fn set_outstanding_loan(&mut self, raw: i64) {
        self.outstanding_loan.set_raw(raw);
    }

    /// Snapshots every editable raw value for the aggregator.
    pub fn figures(&self) -> PayrollFigures {
        PayrollFigures {
            base_salary: self.base_salary.raw(),
            transport_allowance: self.transport_allowance.raw(),
            reimbursement: self.reimbursement.raw(),
            overtime_hours: self.overtime.count().raw(),
            overtime_rate: self.overtime.rate().raw(),
            bonus_personal: self.bonus_personal.raw(),
            bonus_team: self.bonus_team.raw(),
            bonus_jackpot: self.bonus_jackpot.raw(),
            full_attendance_days: self.full_attendance.count().raw(),
            full_attendance_rate: self.full_attendance.rate().raw(),
            holiday_bonus_count: self.holiday_bonus.count().raw(),
            holiday_bonus_rate: self.holiday_bonus.rate().raw(),
            health_insurance_allowance: self.health_insurance_allowance.raw(),
            employment_insurance_allowance: self.employment_insurance_allowance.raw(),
            tax_allowance: self.tax_allowance.raw(),
            absence_days: self.absence.count().raw(),
            absence_rate: self.absence.rate().raw(),
            late_days: self.late.count().raw(),
            late_rate: self.late.rate().raw(),
            unexcused_days: self.unexcused.count().raw(),
            unexcused_rate: self.unexcused.rate().raw(),
            loan_repayment: self.loan_repayment.raw(),
            health_insurance_deduction: self.health_insurance_deduction.raw(),
            employment_insurance_deduction: self.employment_insurance_deduction.raw(),
            loss: self.loss.raw(),
        }
    }

    /// Initialises every editable field from a figures snapshot (the
    /// load path; the outstanding-loan reference is set separately).
    pub fn apply_figures(&mut self, figures: &PayrollFigures) {
        self.base_salary.set_raw(figures.base_salary);
        self.transport_allowance.set_raw(figures.transport_allowance);
        self.reimbursement.set_raw(figures.reimbursement);
        self.overtime.count_mut().set_raw(figures.overtime_hours);
        self.overtime.rate_mut().set_raw(figures.overtime_rate);
        self.bonus_personal.set_raw(figures.bonus_personal);
        self.bonus_team.set_raw(figures.bonus_team);
        self.bonus_jackpot.set_raw(figures.bonus_jackpot);
        self.full_attendance
            .count_mut()
            .set_raw(figures.full_attendance_days);
        self.full_attendance
            .rate_mut()
            .set_raw(figures.full_attendance_rate);
        self.holiday_bonus
            .count_mut()
            .set_raw(figures.holiday_bonus_count);
        self.holiday_bonus
            .rate_mut()
            .set_raw(figures.holiday_bonus_rate);
        self.health_insurance_allowance
            .set_raw(figures.health_insurance_allowance);
        self.employment_insurance_allowance
            .set_raw(figures.employment_insurance_allowance);
        self.tax_allowance.set_raw(figures.tax_allowance);
        self.absence.count_mut().set_raw(figures.absence_days);
        self.absence.rate_mut().set_raw(figures.absence_rate);
        self.late.count_mut().set_raw(figures.late_days);
        self.late.rate_mut().set_raw(figures.late_rate);
        self.unexcused.count_mut().set_raw(figures.unexcused_days);
        self.unexcused.rate_mut().set_raw(figures.unexcused_rate);
        self.loan_repayment.set_raw(figures.loan_repayment);
        self.health_insurance_deduction
            .set_raw(figures.health_insurance_deduction);
        self.employment_insurance_deduction
            .set_raw(figures.employment_insurance_deduction);
        self.loss.set_raw(figures.loss);
    }

    pub fn field_view(&self, id: FieldId) -> FieldView {
        let item = self.field(id);
        FieldView {
            id,
            title: item.title(),
            suffix: item.suffix(),
            raw: item.raw(),
            display: item.display().to_string(),
        }
    }

    /// Every editable field in display order.
    pub fn field_views(&self) -> Vec<FieldView> {
        FieldId::ALL.iter().map(|id| self.field_view(*id)).collect()
    }

    /// The themed groups with their members' current state.
    pub fn group_views(&self) -> Vec<GroupView> {
        GROUPS
            .iter()
            .map(|group| GroupView {
                label: group.label,
                fields: group
                    .members
                    .iter()
                    .map(|id| self.field_view(*id))
                    .collect(),
            })
            .collect()
    }
}

impl Default for PayrollWorksheet {
    fn default() -> Self {
        Self::new(&DotSeparated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monetary_edit_reformats_display() {
        let mut sheet = PayrollWorksheet::default();
        let raw = sheet.edit(FieldId::BaseSalary, "1500000");
        assert_eq!(raw, 1_500_000);
        assert_eq!(sheet.field(FieldId::BaseSalary).display(), "1.500.000");
    }

    #[test]
    fn test_edit_strips_non_digits() {
        let mut sheet = PayrollWorksheet::default();
        let raw = sheet.edit(FieldId::Reimbursement, "Rp 1.234.abc");
        assert_eq!(raw, 1234);
        assert_eq!(sheet.field(FieldId::Reimbursement).display(), "1.234");
    }

    #[test]
    fn test_zero_renders_empty_on_editable_fields() {
        let sheet = PayrollWorksheet::default();
        assert_eq!(sheet.field(FieldId::BonusTeam).display(), "");
        assert_eq!(sheet.field(FieldId::LateDays).display(), "");
    }

    #[test]
    fn test_count_field_has_suffix_and_no_grouping() {
        let mut sheet = PayrollWorksheet::default();
        sheet.edit(FieldId::OvertimeHours, "1250");
        let item = sheet.field(FieldId::OvertimeHours);
        assert_eq!(item.display(), "1250");
        assert_eq!(item.suffix(), Some("jam"));
    }

    #[test]
    fn test_outstanding_loan_is_read_only_and_always_rendered() {
        let mut sheet = PayrollWorksheet::default();
        assert_eq!(sheet.outstanding_loan().display(), "0");
        sheet.set_outstanding_loan(2_000_000);
        assert_eq!(sheet.outstanding_loan().display(), "2.000.000");
        assert!(sheet.outstanding_loan().is_read_only());

        // A direct edit attempt leaves the value untouched.
        let mut reference = sheet.outstanding_loan().clone();
        assert_eq!(reference.set_text("999"), 2_000_000);
        assert_eq!(reference.raw(), 2_000_000);
    }

    #[test]
    fn test_every_field_is_editable_by_id() {
        let mut sheet = PayrollWorksheet::default();
        for id in FieldId::ALL {
            assert_eq!(sheet.edit(id, "7"), 7);
            assert_eq!(sheet.field(id).raw(), 7);
        }
    }

    #[test]
    fn test_figures_round_trip() {
        let mut sheet = PayrollWorksheet::default();
        sheet.edit(FieldId::BaseSalary, "5000000");
        sheet.edit(FieldId::OvertimeHours, "3");
        sheet.edit(FieldId::OvertimeRate, "50000");
        sheet.edit(FieldId::Loss, "120");

        let figures = sheet.figures();
        assert_eq!(figures.base_salary, 5_000_000);
        assert_eq!(figures.overtime_hours, 3);
        assert_eq!(figures.overtime_rate, 50_000);
        assert_eq!(figures.loss, 120);

        let mut other = PayrollWorksheet::default();
        other.apply_figures(&figures);
        assert_eq!(other.figures(), figures);
        assert_eq!(other.field(FieldId::BaseSalary).display(), "5.000.000");
    }

    #[test]
    fn test_rate_editable_while_count_is_zero() {
        let mut sheet = PayrollWorksheet::default();
        sheet.edit(FieldId::AbsenceRate, "100000");
        assert_eq!(sheet.field(FieldId::AbsenceRate).raw(), 100_000);
        assert_eq!(sheet.field(FieldId::AbsenceDays).raw(), 0);
    }

    #[test]
    fn test_group_membership() {
        let sheet = PayrollWorksheet::default();
        let groups = sheet.group_views();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].label, "Bonus");
        assert_eq!(groups[0].fields.len(), 3);
        assert_eq!(groups[2].label, "Potongan Asuransi");
        assert_eq!(groups[2].fields[0].title, "Potongan BPJS Kesehatan");
    }

    #[test]
    fn test_field_id_serialises_snake_case() {
        let json = serde_json::to_string(&FieldId::HolidayBonusRate).unwrap();
        assert_eq!(json, r#""holiday_bonus_rate""#);
        let id: FieldId = serde_json::from_str(r#""late_days""#).unwrap();
        assert_eq!(id, FieldId::LateDays);
    }
}
