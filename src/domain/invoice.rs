use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{
    compute_amount, recurring_options, Currency, DomainError, DomainResult, PaymentPlan,
    PaymentStructure, ProjectId, ProjectRecord, Selection, TaxBreakdown, TaxHandling, TaxRate,
};

/// Days between issue and due date on a fresh invoice.
pub const DEFAULT_PAYMENT_TERMS_DAYS: i64 = 30;

labeled_enum! {
    pub enum InvoiceStatus("status") {
        Draft => "Draft",
        Pending => "Pending",
        Paid => "Paid",
        Cancelled => "Cancelled",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvoiceSource {
    Standalone,
    Project {
        project_id: ProjectId,
        project_name: String,
        plan: Option<PaymentPlan>,
        project_amount: Decimal,
        selection: Selection,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub source: InvoiceSource,
    pub client_name: String,
    pub client_email: String,
    pub company: String,
    pub phone: String,
    pub address: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub notes: String,
    pub tax_handling: TaxHandling,
}

impl InvoiceDraft {
    pub fn standalone(today: NaiveDate) -> Self {
        Self {
            source: InvoiceSource::Standalone,
            client_name: String::new(),
            client_email: String::new(),
            company: String::new(),
            phone: String::new(),
            address: String::new(),
            amount: Decimal::ZERO,
            currency: Currency::Pkr,
            status: InvoiceStatus::Draft,
            issue_date: today,
            due_date: today + Duration::days(DEFAULT_PAYMENT_TERMS_DAYS),
            notes: String::new(),
            tax_handling: TaxHandling::Inclusive,
        }
    }

    /// Invoice prefilled from a project: full project amount, the project's
    /// currency and its point of contact as the billed client.
    pub fn for_project(record: &ProjectRecord, today: NaiveDate) -> Self {
        let draft = &record.draft;
        let project_amount = draft.project_amount.unwrap_or_default();

        Self {
            source: InvoiceSource::Project {
                project_id: record.id.clone(),
                project_name: draft.project_name.clone(),
                plan: draft.plan.clone(),
                project_amount,
                selection: Selection::new(),
            },
            client_name: draft.contact_name.clone(),
            client_email: draft.contact_email.clone(),
            company: draft.contact_brand.clone(),
            phone: draft.contact_number.clone(),
            amount: project_amount,
            currency: draft.currency.unwrap_or(Currency::Pkr),
            tax_handling: draft.tax_handling.unwrap_or(TaxHandling::Inclusive),
            ..Self::standalone(today)
        }
    }

    pub fn payment_structure(&self) -> Option<PaymentStructure> {
        match &self.source {
            InvoiceSource::Project { plan, .. } => plan.as_ref().map(PaymentPlan::structure),
            InvoiceSource::Standalone => None,
        }
    }

    /// Toggles a milestone and recomputes the amount.
    pub fn toggle_milestone(&mut self, name: &str) -> DomainResult<Decimal> {
        self.update_selection(PaymentStructure::Multiple, |s| {
            s.toggle_milestone(name);
        })
    }

    /// Toggles a contract month (1-based) and recomputes the amount. Only
    /// months offered by the contract can be billed.
    pub fn toggle_month(&mut self, month: u32) -> DomainResult<Decimal> {
        if let InvoiceSource::Project {
            plan: Some(PaymentPlan::Recurring(schedule)),
            ..
        } = &self.source
        {
            let offered = recurring_options(schedule.contract_duration);
            if !offered.iter().any(|option| option.value == month) {
                return Err(DomainError::MonthOutOfRange {
                    month,
                    duration: schedule.contract_duration.unwrap_or(0),
                });
            }
        }
        self.update_selection(PaymentStructure::Recurring, |s| {
            s.toggle_month(month);
        })
    }

    fn update_selection(
        &mut self,
        expected: PaymentStructure,
        change: impl FnOnce(&mut Selection),
    ) -> DomainResult<Decimal> {
        let InvoiceSource::Project {
            plan: Some(plan),
            project_amount,
            selection,
            ..
        } = &mut self.source
        else {
            return Err(DomainError::PlanMismatch { expected });
        };
        if plan.structure() != expected {
            return Err(DomainError::PlanMismatch { expected });
        }

        change(selection);
        self.amount = compute_amount(plan, *project_amount, selection);
        Ok(self.amount)
    }

    pub fn totals(&self, rate: TaxRate) -> TaxBreakdown {
        TaxBreakdown::compute(self.amount, self.tax_handling, rate)
    }

    pub fn summary(&self, rate: TaxRate) -> InvoiceSummary {
        let (project, invoice_type) = match &self.source {
            InvoiceSource::Standalone => (None, "Standalone".to_string()),
            InvoiceSource::Project {
                project_name, plan, ..
            } => (
                Some(project_name.clone()),
                plan.as_ref()
                    .map(|p| p.structure().to_string())
                    .unwrap_or_else(|| "Project".to_string()),
            ),
        };

        InvoiceSummary {
            invoice_type,
            project,
            client_name: self.client_name.clone(),
            currency: self.currency,
            status: self.status,
            issue_date: self.issue_date,
            due_date: self.due_date,
            tax_handling: self.tax_handling,
            tax_rate: rate,
            totals: self.totals(rate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub invoice_type: String,
    pub project: Option<String>,
    pub client_name: String,
    pub currency: Currency,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub tax_handling: TaxHandling,
    pub tax_rate: TaxRate,
    pub totals: TaxBreakdown,
}
