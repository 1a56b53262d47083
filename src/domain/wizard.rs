//! Five-step project wizard.
//!
//! The wizard only moves one step at a time. Moving forward requires the
//! current step to validate; moving back never validates. The last step does
//! not advance, it reports that the draft is ready to be finalized.

use super::{
    recurring_options, review_warnings, validate, PaymentStructure, ProjectDraft,
    RecurringOption, ReviewWarning, ValidationErrors,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Details,
    PaymentStructure,
    PaymentDetails,
    Financing,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Details,
        WizardStep::PaymentStructure,
        WizardStep::PaymentDetails,
        WizardStep::Financing,
        WizardStep::Review,
    ];

    pub fn index(&self) -> usize {
        match self {
            WizardStep::Details => 0,
            WizardStep::PaymentStructure => 1,
            WizardStep::PaymentDetails => 2,
            WizardStep::Financing => 3,
            WizardStep::Review => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Details => "Project Details",
            WizardStep::PaymentStructure => "Payment Structure",
            WizardStep::PaymentDetails => "Payment Details",
            WizardStep::Financing => "Financing Details",
            WizardStep::Review => "Review",
        }
    }

    pub fn following(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn preceding(&self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_last(&self) -> bool {
        self.following().is_none()
    }
}

/// Result of asking the wizard to move forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced(WizardStep),
    Rejected(ValidationErrors),
    ReadyToFinalize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wizard {
    step: WizardStep,
    draft: ProjectDraft,
    errors: ValidationErrors,
    recurring_options: Vec<RecurringOption>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self::from_draft(ProjectDraft::default())
    }

    /// Starts on the first step with an existing draft, e.g. one fetched from
    /// the drafts endpoint.
    pub fn from_draft(draft: ProjectDraft) -> Self {
        Self {
            step: WizardStep::Details,
            draft,
            errors: ValidationErrors::new(),
            recurring_options: Vec::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &ProjectDraft {
        &self.draft
    }

    pub fn into_draft(self) -> ProjectDraft {
        self.draft
    }

    /// Errors from the last rejected `next`.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn recurring_options(&self) -> &[RecurringOption] {
        &self.recurring_options
    }

    pub fn review_warnings(&self) -> Vec<ReviewWarning> {
        review_warnings(&self.draft)
    }

    /// Applies a field change. Recurring options follow the contract duration.
    pub fn edit<R>(&mut self, change: impl FnOnce(&mut ProjectDraft) -> R) -> R {
        let duration_before = self.contract_duration();
        let result = change(&mut self.draft);
        if self.contract_duration() != duration_before && self.step >= WizardStep::PaymentDetails {
            self.refresh_recurring_options();
        }
        result
    }

    pub fn next(&mut self) -> StepOutcome {
        let errors = validate(self.step, &self.draft);
        if !errors.is_empty() {
            tracing::debug!(
                step = self.step.title(),
                missing = errors.len(),
                "wizard step rejected"
            );
            self.errors = errors.clone();
            return StepOutcome::Rejected(errors);
        }

        self.errors = ValidationErrors::new();
        match self.step.following() {
            Some(following) => {
                self.step = following;
                if following == WizardStep::PaymentDetails {
                    self.refresh_recurring_options();
                }
                StepOutcome::Advanced(following)
            }
            None => StepOutcome::ReadyToFinalize,
        }
    }

    pub fn back(&mut self) -> WizardStep {
        if let Some(preceding) = self.step.preceding() {
            self.step = preceding;
        }
        self.errors = ValidationErrors::new();
        self.step
    }

    fn contract_duration(&self) -> Option<u32> {
        self.draft.recurring().and_then(|s| s.contract_duration)
    }

    fn refresh_recurring_options(&mut self) {
        self.recurring_options = match self.draft.payment_structure() {
            Some(PaymentStructure::Recurring) => recurring_options(self.contract_duration()),
            _ => Vec::new(),
        };
    }
}
