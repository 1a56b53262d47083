use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use super::widgets::TextInput;
use crate::domain::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    ProjectName,
    ProjectType,
    Client,
    ProjectStatus,
    StartDate,
    EndDate,
    Description,
    Tags,
    Media,
    ContactName,
    ContactRole,
    ContactBrand,
    ContactEmail,
    ContactNumber,
    PaymentStructure,
    ProjectAmount,
    Currency,
    TaxHandling,
    Milestones,
    ContractDuration,
    PaymentFrequency,
    PaymentStartDate,
    Financing,
    Agree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text written straight into the draft.
    Text,
    /// One of a fixed set of labels, cycled with the arrow keys.
    Choice,
    Toggle,
    /// Text that is appended to a list on Enter.
    Entry,
}

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::ProjectName => "Project Name",
            FormField::ProjectType => "Project Type",
            FormField::Client => "Client",
            FormField::ProjectStatus => "Project Status",
            FormField::StartDate => "Start Date",
            FormField::EndDate => "End Date",
            FormField::Description => "Description",
            FormField::Tags => "Tags",
            FormField::Media => "Media",
            FormField::ContactName => "Contact Name",
            FormField::ContactRole => "Contact Role",
            FormField::ContactBrand => "Contact Brand",
            FormField::ContactEmail => "Contact Email",
            FormField::ContactNumber => "Contact Number",
            FormField::PaymentStructure => "Payment Type",
            FormField::ProjectAmount => "Project Amount",
            FormField::Currency => "Currency",
            FormField::TaxHandling => "Tax Handling",
            FormField::Milestones => "Milestones",
            FormField::ContractDuration => "Contract (months)",
            FormField::PaymentFrequency => "Frequency",
            FormField::PaymentStartDate => "Payment Start",
            FormField::Financing => "Financing",
            FormField::Agree => "Agree to terms",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FormField::ProjectType
            | FormField::Client
            | FormField::ProjectStatus
            | FormField::PaymentStructure
            | FormField::Currency
            | FormField::TaxHandling
            | FormField::PaymentFrequency
            | FormField::Financing => FieldKind::Choice,
            FormField::Agree => FieldKind::Toggle,
            FormField::Tags | FormField::Media | FormField::Milestones => FieldKind::Entry,
            _ => FieldKind::Text,
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            FormField::StartDate | FormField::EndDate | FormField::PaymentStartDate => "YYYY-MM-DD",
            FormField::ProjectAmount => "0.00",
            FormField::ContractDuration => "number of months",
            FormField::Tags => "type a tag, Enter to add",
            FormField::Media => "file path or URL, Enter to add",
            FormField::Milestones => "name, percent, deliverable",
            _ => "",
        }
    }

    /// The validation key whose message belongs under this field.
    pub fn validation_field(&self) -> Option<Field> {
        Some(match self {
            FormField::ProjectName => Field::ProjectName,
            FormField::ProjectType => Field::ProjectType,
            FormField::Client => Field::Client,
            FormField::ProjectStatus => Field::ProjectStatus,
            FormField::StartDate => Field::StartDate,
            FormField::EndDate => Field::EndDate,
            FormField::PaymentStructure => Field::PaymentStructure,
            FormField::ProjectAmount => Field::ProjectAmount,
            FormField::Currency => Field::Currency,
            FormField::Milestones => Field::Milestones,
            FormField::ContractDuration => Field::ContractDuration,
            FormField::Agree => Field::Agree,
            _ => return None,
        })
    }
}

/// Fields shown on a step. Payment details depend on the chosen structure.
pub fn fields_for(step: WizardStep, draft: &ProjectDraft) -> Vec<FormField> {
    match step {
        WizardStep::Details => vec![
            FormField::ProjectName,
            FormField::ProjectType,
            FormField::Client,
            FormField::ProjectStatus,
            FormField::StartDate,
            FormField::EndDate,
            FormField::Description,
            FormField::Tags,
            FormField::Media,
            FormField::ContactName,
            FormField::ContactRole,
            FormField::ContactBrand,
            FormField::ContactEmail,
            FormField::ContactNumber,
        ],
        WizardStep::PaymentStructure => vec![FormField::PaymentStructure],
        WizardStep::PaymentDetails => {
            let mut fields = vec![
                FormField::ProjectAmount,
                FormField::Currency,
                FormField::TaxHandling,
            ];
            match draft.payment_structure() {
                Some(PaymentStructure::Multiple) => fields.push(FormField::Milestones),
                Some(PaymentStructure::Recurring) => fields.extend([
                    FormField::ContractDuration,
                    FormField::PaymentFrequency,
                    FormField::PaymentStartDate,
                ]),
                Some(PaymentStructure::Single) | None => {}
            }
            fields
        }
        WizardStep::Financing => vec![FormField::Financing, FormField::Agree],
        WizardStep::Review => Vec::new(),
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: Option<T>, forward: bool) -> Option<T> {
    if all.is_empty() {
        return None;
    }
    let position = current.and_then(|c| all.iter().position(|v| *v == c));
    let index = match (position, forward) {
        (None, true) => 0,
        (None, false) => all.len() - 1,
        (Some(i), true) => (i + 1) % all.len(),
        (Some(i), false) => (i + all.len() - 1) % all.len(),
    };
    Some(all[index])
}

fn date_text(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn optional_date(text: &str) -> Result<Option<chrono::NaiveDate>, String> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    parse_date(text)
        .map(Some)
        .map_err(|_| "Use YYYY-MM-DD".to_string())
}

/// Text buffers for the wizard fields plus input errors that validation
/// cannot see (an unparsable date leaves the draft field empty).
#[derive(Debug, Default)]
pub struct WizardForm {
    inputs: HashMap<FormField, TextInput>,
    input_errors: HashMap<FormField, String>,
    /// Plans of the payment types cycled past, restored when cycled back to.
    parked_plans: HashMap<PaymentStructure, PaymentPlan>,
}

impl WizardForm {
    pub fn from_draft(draft: &ProjectDraft) -> Self {
        let schedule = draft.recurring();
        let values = [
            (FormField::ProjectName, draft.project_name.clone()),
            (FormField::StartDate, date_text(draft.start_date)),
            (FormField::EndDate, date_text(draft.end_date)),
            (FormField::Description, draft.description.clone()),
            (FormField::ContactName, draft.contact_name.clone()),
            (FormField::ContactRole, draft.contact_role.clone()),
            (FormField::ContactBrand, draft.contact_brand.clone()),
            (FormField::ContactEmail, draft.contact_email.clone()),
            (FormField::ContactNumber, draft.contact_number.clone()),
            (
                FormField::ProjectAmount,
                draft.project_amount.map(|a| a.to_string()).unwrap_or_default(),
            ),
            (
                FormField::ContractDuration,
                schedule
                    .and_then(|s| s.contract_duration)
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            ),
            (
                FormField::PaymentStartDate,
                date_text(schedule.and_then(|s| s.start_date)),
            ),
        ];

        Self {
            inputs: values
                .into_iter()
                .map(|(field, value)| (field, TextInput::with_value(value)))
                .collect(),
            input_errors: HashMap::new(),
            parked_plans: HashMap::new(),
        }
    }

    pub fn input(&self, field: FormField) -> Option<&TextInput> {
        self.inputs.get(&field)
    }

    pub fn input_mut(&mut self, field: FormField) -> &mut TextInput {
        self.inputs.entry(field).or_default()
    }

    pub fn input_error(&self, field: FormField) -> Option<&str> {
        self.input_errors.get(&field).map(String::as_str)
    }

    fn record(&mut self, field: FormField, result: Result<(), String>) -> Result<(), String> {
        match &result {
            Ok(()) => {
                self.input_errors.remove(&field);
            }
            Err(message) => {
                self.input_errors.insert(field, message.clone());
            }
        }
        result
    }

    /// Writes the buffer of a text field into the draft.
    pub fn apply_text(&mut self, field: FormField, wizard: &mut Wizard) -> Result<(), String> {
        let text = self
            .input(field)
            .map(|i| i.value().to_string())
            .unwrap_or_default();

        match field {
            FormField::ProjectName => wizard.edit(|d| d.project_name = text),
            FormField::Description => wizard.edit(|d| d.description = text),
            FormField::ContactName => wizard.edit(|d| d.contact_name = text),
            FormField::ContactRole => wizard.edit(|d| d.contact_role = text),
            FormField::ContactBrand => wizard.edit(|d| d.contact_brand = text),
            FormField::ContactEmail => wizard.edit(|d| d.contact_email = text),
            FormField::ContactNumber => wizard.edit(|d| d.contact_number = text),
            FormField::StartDate => {
                let parsed = optional_date(&text);
                wizard.edit(|d| d.start_date = parsed.clone().unwrap_or(None));
                return self.record(field, parsed.map(|_| ()));
            }
            FormField::EndDate => {
                let parsed = optional_date(&text);
                wizard.edit(|d| d.end_date = parsed.clone().unwrap_or(None));
                return self.record(field, parsed.map(|_| ()));
            }
            FormField::PaymentStartDate => {
                let parsed = optional_date(&text);
                let value = parsed.clone().unwrap_or(None);
                wizard.edit(|d| d.recurring_mut().map(|s| s.start_date = value)).ok();
                return self.record(field, parsed.map(|_| ()));
            }
            FormField::ProjectAmount => {
                let parsed = if text.trim().is_empty() {
                    Ok(None)
                } else {
                    parse_amount(&text)
                        .map(Some)
                        .map_err(|_| "Enter a positive number".to_string())
                };
                wizard.edit(|d| d.project_amount = parsed.clone().unwrap_or(None));
                return self.record(field, parsed.map(|_| ()));
            }
            FormField::ContractDuration => {
                let parsed = if text.trim().is_empty() {
                    Ok(None)
                } else {
                    text.trim()
                        .parse::<u32>()
                        .map(Some)
                        .map_err(|_| "Enter a whole number of months".to_string())
                };
                let value = parsed.clone().unwrap_or(None);
                wizard
                    .edit(|d| d.recurring_mut().map(|s| s.contract_duration = value))
                    .ok();
                return self.record(field, parsed.map(|_| ()));
            }
            _ => {}
        }

        self.record(field, Ok(()))
    }

    pub fn cycle_choice(&mut self, field: FormField, forward: bool, wizard: &mut Wizard) {
        if field == FormField::PaymentStructure {
            self.cycle_structure(forward, wizard);
            return;
        }
        wizard.edit(|d| match field {
            FormField::ProjectType => d.project_type = cycle(ProjectType::ALL, d.project_type, forward),
            FormField::Client => d.client = cycle(ClientKind::ALL, d.client, forward),
            FormField::ProjectStatus => {
                d.project_status = cycle(ProjectStatus::ALL, d.project_status, forward)
            }
            FormField::Currency => d.currency = cycle(Currency::ALL, d.currency, forward),
            FormField::TaxHandling => {
                d.tax_handling = cycle(TaxHandling::ALL, d.tax_handling, forward)
            }
            FormField::PaymentFrequency => {
                if let Ok(schedule) = d.recurring_mut() {
                    schedule.frequency = cycle(PaymentFrequency::ALL, schedule.frequency, forward);
                }
            }
            FormField::Financing => d.financing = cycle(Financing::ALL, d.financing, forward),
            _ => {}
        });
    }

    /// Switches the payment type, parking the current plan and restoring the
    /// one left under the new type, if any.
    fn cycle_structure(&mut self, forward: bool, wizard: &mut Wizard) {
        let current = wizard.draft().payment_structure();
        let Some(next) = cycle(PaymentStructure::ALL, current, forward) else {
            return;
        };
        if current == Some(next) {
            return;
        }

        let parked = &mut self.parked_plans;
        wizard.edit(|d| {
            if let Some(plan) = d.plan.take() {
                parked.insert(plan.structure(), plan);
            }
            match parked.remove(&next) {
                Some(plan) => d.plan = Some(plan),
                None => d.select_structure(next),
            }
        });
        self.sync_schedule_inputs(wizard.draft());
    }

    /// Rewrites the recurring schedule buffers from the draft so they never
    /// show text from a plan that is no longer active.
    fn sync_schedule_inputs(&mut self, draft: &ProjectDraft) {
        let schedule = draft.recurring();
        let duration = schedule
            .and_then(|s| s.contract_duration)
            .map(|d| d.to_string())
            .unwrap_or_default();
        let start = date_text(schedule.and_then(|s| s.start_date));
        for (field, value) in [
            (FormField::ContractDuration, duration),
            (FormField::PaymentStartDate, start),
        ] {
            self.inputs.insert(field, TextInput::with_value(value));
            self.input_errors.remove(&field);
        }
    }

    pub fn toggle(&self, field: FormField, wizard: &mut Wizard) {
        if field == FormField::Agree {
            wizard.edit(|d| d.agree = !d.agree);
        }
    }

    /// Adds the buffer of an entry field to its list. Returns a confirmation.
    pub fn submit_entry(&mut self, field: FormField, wizard: &mut Wizard) -> Result<String, String> {
        let text = self.input_mut(field).value().trim().to_string();
        if text.is_empty() {
            return Err(format!("{} entry is empty", field.label()));
        }

        let result = match field {
            FormField::Tags => {
                if wizard.edit(|d| d.add_tag(&text)) {
                    Ok(format!("Added tag {text}"))
                } else {
                    Err(format!("Tag {text} is already added"))
                }
            }
            FormField::Media => parse_media(&text).map(|item| {
                let label = item.label();
                wizard.edit(|d| d.media.push(item));
                format!("Added {label}")
            }),
            FormField::Milestones => parse_milestone(&text).and_then(|milestone| {
                let name = milestone.name.clone();
                wizard
                    .edit(|d| d.add_milestone(milestone))
                    .map(|()| format!("Added milestone {name}"))
                    .map_err(|e| e.to_string())
            }),
            _ => Err(format!("{} does not take entries", field.label())),
        };

        let recorded = self.record(field, result.as_ref().map(|_| ()).map_err(Clone::clone));
        if recorded.is_ok() {
            self.input_mut(field).clear();
        }
        result
    }

    /// Drops the last item of an entry field's list.
    pub fn remove_last(&self, field: FormField, wizard: &mut Wizard) -> Option<String> {
        wizard.edit(|d| match field {
            FormField::Tags => d.tags.pop(),
            FormField::Media => d.media.pop().map(|m| m.label()),
            FormField::Milestones => {
                let last = d.milestones().len().checked_sub(1)?;
                d.remove_milestone(last).ok().map(|m| m.name)
            }
            _ => None,
        })
    }
}

fn parse_media(text: &str) -> Result<MediaItem, String> {
    if text.starts_with("http://") || text.starts_with("https://") {
        return Ok(MediaItem::Remote(text.to_string()));
    }
    let path = PathBuf::from(text);
    if path.is_file() {
        Ok(MediaItem::Local(path))
    } else {
        Err(format!("File not found: {text}"))
    }
}

/// `name, percent[, deliverable]`
fn parse_milestone(text: &str) -> Result<Milestone, String> {
    let mut parts = text.splitn(3, ',').map(str::trim);
    let name = parts.next().unwrap_or_default();
    if name.is_empty() {
        return Err("Milestone name is required".to_string());
    }
    let percent = parts
        .next()
        .map(|p| p.trim_end_matches('%').trim())
        .and_then(|p| Decimal::from_str(p).ok())
        .ok_or_else(|| "Use: name, percent, deliverable".to_string())?;
    let deliverable = parts.next().unwrap_or_default();
    Ok(Milestone::new(name, percent, deliverable))
}

/// Read-only rendering of a non-text field.
pub fn display_value(field: FormField, draft: &ProjectDraft) -> String {
    fn label<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_else(|| "<select>".to_string())
    }

    match field {
        FormField::ProjectType => label(draft.project_type),
        FormField::Client => label(draft.client),
        FormField::ProjectStatus => label(draft.project_status),
        FormField::PaymentStructure => label(draft.payment_structure().map(|s| s.title())),
        FormField::Currency => label(draft.currency),
        FormField::TaxHandling => label(draft.tax_handling),
        FormField::PaymentFrequency => label(draft.recurring().and_then(|s| s.frequency)),
        FormField::Financing => label(draft.financing),
        FormField::Agree => (if draft.agree { "[x]" } else { "[ ]" }).to_string(),
        FormField::Tags => draft.tags.join(", "),
        FormField::Media => draft
            .media
            .iter()
            .map(MediaItem::label)
            .collect::<Vec<_>>()
            .join(", "),
        FormField::Milestones => draft
            .milestones()
            .iter()
            .map(|m| format!("{} {}%", m.name, m.percent.normalize()))
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}
