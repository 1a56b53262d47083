//! Derived-amount calculations for the three payment structures, plus tax and
//! financing breakdowns.
//!
//! Every monetary result is rounded to two decimal places, half away from
//! zero. Intermediate values are kept at full precision.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::{Milestone, PaymentPlan, TaxHandling};

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount with exactly two fractional digits.
pub fn format_money(amount: Decimal) -> String {
    format!("{:.2}", round_money(amount))
}

/// Milestones and months picked for invoicing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    milestones: BTreeSet<String>,
    months: BTreeSet<u32>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of a milestone. Returns whether it is now selected.
    pub fn toggle_milestone(&mut self, name: &str) -> bool {
        if self.milestones.remove(name) {
            false
        } else {
            self.milestones.insert(name.to_string());
            true
        }
    }

    pub fn toggle_month(&mut self, month: u32) -> bool {
        if self.months.remove(&month) {
            false
        } else {
            self.months.insert(month);
            true
        }
    }

    pub fn milestone_names(&self) -> impl Iterator<Item = &str> {
        self.milestones.iter().map(String::as_str)
    }

    pub fn months(&self) -> impl Iterator<Item = u32> + '_ {
        self.months.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty() && self.months.is_empty()
    }

    pub fn clear(&mut self) {
        self.milestones.clear();
        self.months.clear();
    }
}

/// Payable amount for the selected part of a plan.
///
/// Single plans always pay the whole amount. Milestone names that are not in
/// the plan and months outside the contract contribute nothing.
pub fn compute_amount(plan: &PaymentPlan, project_amount: Decimal, selection: &Selection) -> Decimal {
    match plan {
        PaymentPlan::Single => project_amount,
        PaymentPlan::Milestones(milestones) => {
            let total: Decimal = selection
                .milestone_names()
                .filter_map(|name| find_milestone(milestones, name))
                .map(|m| project_amount * m.percent / Decimal::ONE_HUNDRED)
                .sum();
            round_money(total)
        }
        PaymentPlan::Recurring(schedule) => {
            let duration = schedule.contract_duration.unwrap_or(0).max(1);
            let monthly = project_amount / Decimal::from(duration);
            let months = selection
                .months()
                .filter(|month| (1..=duration).contains(month))
                .count();
            round_money(monthly * Decimal::from(months))
        }
    }
}

fn find_milestone<'a>(milestones: &'a [Milestone], name: &str) -> Option<&'a Milestone> {
    milestones.iter().find(|m| m.name == name)
}

/// Amount of one installment of a recurring plan.
pub fn installment_amount(project_amount: Decimal, contract_duration: Option<u32>) -> Decimal {
    let duration = contract_duration.unwrap_or(0).max(1);
    round_money(project_amount / Decimal::from(duration))
}

/// Share of the project amount owed for one milestone.
pub fn milestone_amount(project_amount: Decimal, milestone: &Milestone) -> Decimal {
    round_money(project_amount * milestone.percent / Decimal::ONE_HUNDRED)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecurringOption {
    pub name: String,
    pub value: u32,
}

/// One option per contract month, 1-based.
pub fn recurring_options(contract_duration: Option<u32>) -> Vec<RecurringOption> {
    (1..=contract_duration.unwrap_or(0))
        .map(|i| RecurringOption {
            name: format!("Month {i}"),
            value: i,
        })
        .collect()
}

/// A tax rate expressed as a fraction (0.18 for 18%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(pub Decimal);

impl TaxRate {
    /// GST applied in the project wizard preview.
    pub fn project_gst() -> Self {
        TaxRate(Decimal::new(18, 2))
    }

    /// Rate applied by the invoice generator.
    pub fn invoice() -> Self {
        TaxRate(Decimal::new(15, 2))
    }

    pub fn percent(&self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).normalize()
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxBreakdown {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl TaxBreakdown {
    pub fn compute(amount: Decimal, handling: TaxHandling, rate: TaxRate) -> Self {
        let (subtotal, tax, total) = match handling {
            TaxHandling::Inclusive => {
                let subtotal = amount / (Decimal::ONE + rate.0);
                (subtotal, amount - subtotal, amount)
            }
            TaxHandling::Exclusive => {
                let tax = amount * rate.0;
                (amount, tax, amount + tax)
            }
        };

        Self {
            subtotal: round_money(subtotal),
            tax: round_money(tax),
            total: round_money(total),
        }
    }
}

/// What the creator receives upfront when the project is financed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FinancingBreakdown {
    pub total: Decimal,
    pub service_fee: Decimal,
    pub receive: Decimal,
}

impl FinancingBreakdown {
    pub fn compute(project_amount: Decimal, fee_percent: Decimal) -> Self {
        let service_fee = project_amount * fee_percent / Decimal::ONE_HUNDRED;
        Self {
            total: round_money(project_amount),
            service_fee: round_money(service_fee),
            receive: round_money(project_amount - service_fee),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecurringSchedule;

    fn milestone_plan() -> PaymentPlan {
        PaymentPlan::Milestones(vec![
            Milestone::new("A", Decimal::from(40), "Concepts"),
            Milestone::new("B", Decimal::from(60), "Final cut"),
        ])
    }

    fn recurring_plan(duration: Option<u32>) -> PaymentPlan {
        PaymentPlan::Recurring(RecurringSchedule {
            contract_duration: duration,
            ..Default::default()
        })
    }

    #[test]
    fn test_single_pays_full_amount() {
        let amount = Decimal::new(123456, 2);
        assert_eq!(
            compute_amount(&PaymentPlan::Single, amount, &Selection::new()),
            amount
        );
    }

    #[test]
    fn test_milestone_proration() {
        let plan = milestone_plan();
        let mut selection = Selection::new();

        selection.toggle_milestone("A");
        assert_eq!(
            compute_amount(&plan, Decimal::from(1000), &selection),
            Decimal::new(40000, 2)
        );

        selection.toggle_milestone("B");
        assert_eq!(
            compute_amount(&plan, Decimal::from(1000), &selection),
            Decimal::new(100000, 2)
        );

        assert!(!selection.toggle_milestone("A"));
        assert_eq!(
            compute_amount(&plan, Decimal::from(1000), &selection),
            Decimal::from(600)
        );
    }

    #[test]
    fn test_unknown_milestone_contributes_nothing() {
        let mut selection = Selection::new();
        selection.toggle_milestone("Ghost");
        assert_eq!(
            compute_amount(&milestone_plan(), Decimal::from(1000), &selection),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_recurring_proration() {
        let mut selection = Selection::new();
        for month in [1, 2, 3] {
            selection.toggle_month(month);
        }
        assert_eq!(
            compute_amount(&recurring_plan(Some(12)), Decimal::from(1200), &selection),
            Decimal::from(300)
        );
    }

    #[test]
    fn test_recurring_without_duration_divides_by_one() {
        let mut selection = Selection::new();
        selection.toggle_month(1);
        assert_eq!(
            compute_amount(&recurring_plan(None), Decimal::from(500), &selection),
            Decimal::from(500)
        );
        assert_eq!(
            compute_amount(&recurring_plan(Some(0)), Decimal::from(500), &selection),
            Decimal::from(500)
        );
    }

    #[test]
    fn test_recurring_rounds_to_cents() {
        let mut selection = Selection::new();
        selection.toggle_month(1);
        assert_eq!(
            compute_amount(&recurring_plan(Some(3)), Decimal::from(100), &selection),
            Decimal::new(3333, 2)
        );
        assert_eq!(format_money(Decimal::new(3333, 2)), "33.33");
        assert_eq!(format_money(Decimal::from(5)), "5.00");
    }

    #[test]
    fn test_months_outside_contract_contribute_nothing() {
        let mut selection = Selection::new();
        for month in [0, 2, 5, 99] {
            selection.toggle_month(month);
        }
        assert_eq!(
            compute_amount(&recurring_plan(Some(4)), Decimal::from(1000), &selection),
            Decimal::from(250)
        );
    }

    #[test]
    fn test_recurring_options_are_one_based() {
        let options = recurring_options(Some(3));
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].name, "Month 1");
        assert_eq!(options[2].value, 3);
        assert!(recurring_options(None).is_empty());
    }

    #[test]
    fn test_tax_inclusive() {
        let breakdown = TaxBreakdown::compute(
            Decimal::from(118),
            TaxHandling::Inclusive,
            TaxRate::project_gst(),
        );
        assert_eq!(breakdown.subtotal, Decimal::from(100));
        assert_eq!(breakdown.tax, Decimal::from(18));
        assert_eq!(breakdown.total, Decimal::from(118));
    }

    #[test]
    fn test_tax_exclusive() {
        let breakdown = TaxBreakdown::compute(
            Decimal::from(100),
            TaxHandling::Exclusive,
            TaxRate::project_gst(),
        );
        assert_eq!(breakdown.subtotal, Decimal::from(100));
        assert_eq!(breakdown.tax, Decimal::from(18));
        assert_eq!(breakdown.total, Decimal::from(118));
    }

    #[test]
    fn test_invoice_rate_is_separate_from_project_rate() {
        let breakdown = TaxBreakdown::compute(
            Decimal::from(100),
            TaxHandling::Exclusive,
            TaxRate::invoice(),
        );
        assert_eq!(breakdown.total, Decimal::from(115));
        assert_eq!(TaxRate::invoice().to_string(), "15%");
    }

    #[test]
    fn test_financing_breakdown() {
        let breakdown = FinancingBreakdown::compute(Decimal::from(5000), Decimal::from(20));
        assert_eq!(breakdown.service_fee, Decimal::from(1000));
        assert_eq!(breakdown.receive, Decimal::from(4000));
    }

    #[test]
    fn test_installment_amount() {
        assert_eq!(
            installment_amount(Decimal::from(1200), Some(12)),
            Decimal::from(100)
        );
        assert_eq!(installment_amount(Decimal::from(1200), None), Decimal::from(1200));
    }
}
