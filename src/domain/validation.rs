use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use super::{ClientDraft, Financing, PaymentStructure, ProjectDraft, SignUp, WizardStep};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid"));
static STRICT_PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10,15}$").expect("strict phone pattern is valid"));
static LENIENT_PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+]?[\d\s\-()]{7,15}$").expect("lenient phone pattern is valid")
});

/// Form fields that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    ProjectName,
    ProjectType,
    Client,
    ProjectStatus,
    StartDate,
    EndDate,
    PaymentStructure,
    ProjectAmount,
    Currency,
    Milestones,
    ContractDuration,
    Agree,
    FullName,
    ClientType,
    Email,
    Phone,
    Password,
}

impl Field {
    /// Key used by the backend payloads.
    pub fn key(&self) -> &'static str {
        match self {
            Field::ProjectName => "projectName",
            Field::ProjectType => "projectType",
            Field::Client => "client",
            Field::ProjectStatus => "projectStatus",
            Field::StartDate => "startDate",
            Field::EndDate => "endDate",
            Field::PaymentStructure => "paymentStructure",
            Field::ProjectAmount => "projectAmount",
            Field::Currency => "currency",
            Field::Milestones => "milestones",
            Field::ContractDuration => "contractDuration",
            Field::Agree => "agree",
            Field::FullName => "fullName",
            Field::ClientType => "clientType",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Password => "password",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Field-keyed messages. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Required-field checks for one wizard step.
pub fn validate(step: WizardStep, draft: &ProjectDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    match step {
        WizardStep::Details => {
            if draft.project_name.trim().is_empty() {
                errors.insert(Field::ProjectName, "Project Name is required");
            }
            if draft.project_type.is_none() {
                errors.insert(Field::ProjectType, "Project Type is required");
            }
            if draft.client.is_none() {
                errors.insert(Field::Client, "Client is required");
            }
            if draft.project_status.is_none() {
                errors.insert(Field::ProjectStatus, "Project Status is required");
            }
            if draft.start_date.is_none() {
                errors.insert(Field::StartDate, "Start Date is required");
            }
            if draft.end_date.is_none() {
                errors.insert(Field::EndDate, "End Date is required");
            }
        }
        WizardStep::PaymentStructure => {
            if draft.plan.is_none() {
                errors.insert(Field::PaymentStructure, "Payment Type is required");
            }
        }
        WizardStep::PaymentDetails => {
            match draft.project_amount {
                None => errors.insert(Field::ProjectAmount, "Project Amount is required"),
                Some(amount) if amount <= Decimal::ZERO => errors.insert(
                    Field::ProjectAmount,
                    "Project Amount must be greater than zero",
                ),
                Some(_) => {}
            }
            if draft.currency.is_none() {
                errors.insert(Field::Currency, "Currency is required");
            }
            match draft.payment_structure() {
                Some(PaymentStructure::Multiple) => {
                    if draft.milestones().is_empty() {
                        errors.insert(Field::Milestones, "At least one milestone is required");
                    } else if draft.milestone_allocation() > Decimal::ONE_HUNDRED {
                        errors.insert(
                            Field::Milestones,
                            "Milestone allocation cannot exceed 100%",
                        );
                    }
                }
                Some(PaymentStructure::Recurring) => {
                    let duration = draft.recurring().and_then(|s| s.contract_duration);
                    if duration.unwrap_or(0) == 0 {
                        errors.insert(Field::ContractDuration, "Contract Duration is required");
                    }
                }
                Some(PaymentStructure::Single) | None => {}
            }
        }
        WizardStep::Financing => {
            if draft.financing == Some(Financing::Yes) && !draft.agree {
                errors.insert(Field::Agree, "You must agree to financing terms");
            }
        }
        WizardStep::Review => {}
    }

    errors
}

/// Issues shown on the review step that do not block submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewWarning {
    MilestoneAllocation { allocated: Decimal },
    EndBeforeStart,
}

impl fmt::Display for ReviewWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewWarning::MilestoneAllocation { allocated } => {
                write!(f, "Milestones allocate {allocated}% of the project amount, not 100%")
            }
            ReviewWarning::EndBeforeStart => f.write_str("End date is before start date"),
        }
    }
}

pub fn review_warnings(draft: &ProjectDraft) -> Vec<ReviewWarning> {
    let mut warnings = Vec::new();

    if draft.payment_structure() == Some(PaymentStructure::Multiple) {
        let allocated = draft.milestone_allocation();
        if allocated != Decimal::ONE_HUNDRED {
            warnings.push(ReviewWarning::MilestoneAllocation { allocated });
        }
    }

    if let (Some(start), Some(end)) = (draft.start_date, draft.end_date) {
        if end < start {
            warnings.push(ReviewWarning::EndBeforeStart);
        }
    }

    warnings
}

/// Which phone format the client form accepts. Both variants exist in the
/// product and are kept apart on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhonePolicy {
    /// 10 to 15 digits, nothing else.
    Strict,
    /// 7 to 15 digits, spaces, dashes or parentheses with an optional `+`.
    #[default]
    Lenient,
}

impl PhonePolicy {
    pub fn accepts(&self, phone: &str) -> bool {
        match self {
            PhonePolicy::Strict => STRICT_PHONE_PATTERN.is_match(phone),
            PhonePolicy::Lenient => LENIENT_PHONE_PATTERN.is_match(phone),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Checks for the sign-up form.
pub fn validate_sign_up(request: &SignUp) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if request.full_name.trim().is_empty() {
        errors.insert(Field::FullName, "Full name is required");
    }
    if request.email.trim().is_empty() {
        errors.insert(Field::Email, "Email is required");
    } else if !is_valid_email(&request.email) {
        errors.insert(Field::Email, "Invalid email format");
    }
    if request.password.is_empty() {
        errors.insert(Field::Password, "Password is required");
    }

    errors
}

pub fn validate_client(client: &ClientDraft, phone_policy: PhonePolicy) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if client.full_name.trim().is_empty() {
        errors.insert(Field::FullName, "Full name is required");
    }

    if client.email.trim().is_empty() {
        errors.insert(Field::Email, "Email is required");
    } else if !is_valid_email(&client.email) {
        errors.insert(Field::Email, "Invalid email format");
    }

    if client.phone.trim().is_empty() {
        errors.insert(Field::Phone, "Phone number is required");
    } else if !phone_policy.accepts(&client.phone) {
        errors.insert(Field::Phone, "Invalid phone number");
    }

    if client.client_type.is_none() {
        errors.insert(Field::ClientType, "Client type is required");
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::*;
    use chrono::NaiveDate;

    fn complete_details() -> ProjectDraft {
        ProjectDraft {
            project_name: "Spring campaign".to_string(),
            project_type: Some(ProjectType::SocialMediaContent),
            client: Some(ClientKind::Brand),
            project_status: Some(ProjectStatus::InProcess),
            start_date: NaiveDate::from_ymd_opt(2025, 4, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_details_report_every_required_field() {
        let errors = validate(WizardStep::Details, &ProjectDraft::default());
        let fields: Vec<Field> = errors.fields().collect();
        assert_eq!(
            fields,
            vec![
                Field::ProjectName,
                Field::ProjectType,
                Field::Client,
                Field::ProjectStatus,
                Field::StartDate,
                Field::EndDate,
            ]
        );
        assert_eq!(errors.get(Field::ProjectName), Some("Project Name is required"));
    }

    #[test]
    fn test_whitespace_name_is_missing() {
        let draft = ProjectDraft {
            project_name: "   ".to_string(),
            ..complete_details()
        };
        let errors = validate(WizardStep::Details, &draft);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec![Field::ProjectName]);
    }

    #[test]
    fn test_complete_details_are_valid() {
        assert!(validate(WizardStep::Details, &complete_details()).is_empty());
    }

    #[test]
    fn test_payment_structure_required() {
        let mut draft = complete_details();
        assert!(validate(WizardStep::PaymentStructure, &draft).contains(Field::PaymentStructure));
        draft.select_structure(PaymentStructure::Single);
        assert!(validate(WizardStep::PaymentStructure, &draft).is_empty());
    }

    #[test]
    fn test_payment_details_rules_follow_structure() {
        let mut draft = complete_details();
        draft.select_structure(PaymentStructure::Multiple);
        draft.project_amount = Some(Decimal::ZERO);

        let errors = validate(WizardStep::PaymentDetails, &draft);
        assert!(errors.contains(Field::ProjectAmount));
        assert!(errors.contains(Field::Currency));
        assert!(errors.contains(Field::Milestones));
        assert!(!errors.contains(Field::ContractDuration));

        draft.select_structure(PaymentStructure::Recurring);
        draft.project_amount = Some(Decimal::from(1200));
        draft.currency = Some(Currency::Usd);
        let errors = validate(WizardStep::PaymentDetails, &draft);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec![Field::ContractDuration]);

        draft.recurring_mut().unwrap().contract_duration = Some(12);
        assert!(validate(WizardStep::PaymentDetails, &draft).is_empty());
    }

    #[test]
    fn test_financing_requires_agreement() {
        let mut draft = complete_details();
        draft.financing = Some(Financing::Yes);
        let errors = validate(WizardStep::Financing, &draft);
        assert_eq!(errors.get(Field::Agree), Some("You must agree to financing terms"));

        draft.agree = true;
        assert!(validate(WizardStep::Financing, &draft).is_empty());

        draft.agree = false;
        draft.financing = Some(Financing::No);
        assert!(validate(WizardStep::Financing, &draft).is_empty());
    }

    #[test]
    fn test_review_warnings_are_soft() {
        let mut draft = complete_details();
        draft.end_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        draft.select_structure(PaymentStructure::Multiple);
        draft
            .add_milestone(Milestone::new("Deposit", Decimal::from(50), ""))
            .unwrap();

        assert!(validate(WizardStep::Review, &draft).is_empty());
        assert_eq!(
            review_warnings(&draft),
            vec![
                ReviewWarning::MilestoneAllocation {
                    allocated: Decimal::from(50)
                },
                ReviewWarning::EndBeforeStart,
            ]
        );
    }

    #[test]
    fn test_phone_policies_differ() {
        assert!(PhonePolicy::Strict.accepts("03001234567"));
        assert!(!PhonePolicy::Strict.accepts("+92 300 1234567"));
        assert!(PhonePolicy::Lenient.accepts("+92 300 1234567"));
        assert!(PhonePolicy::Lenient.accepts("(042) 3576"));
        assert!(!PhonePolicy::Lenient.accepts("12345"));
        assert!(!PhonePolicy::Strict.accepts("123456789"));
    }

    #[test]
    fn test_client_validation() {
        let client = ClientDraft {
            full_name: "Ayesha Khan".to_string(),
            client_type: Some(ClientKind::Individual),
            email: "ayesha@example".to_string(),
            phone: "0300-1234567".to_string(),
            ..Default::default()
        };

        let errors = validate_client(&client, PhonePolicy::Lenient);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec![Field::Email]);
        assert_eq!(errors.get(Field::Email), Some("Invalid email format"));

        let errors = validate_client(&client, PhonePolicy::Strict);
        assert!(errors.contains(Field::Phone));

        let errors = validate_client(&ClientDraft::default(), PhonePolicy::Lenient);
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get(Field::Phone), Some("Phone number is required"));
    }
}
