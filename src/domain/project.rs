use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        ProjectId(s)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        ProjectId(s.to_string())
    }
}

labeled_enum! {
    pub enum ProjectType("projectType") {
        ProductPhotography => "Product Photography",
        EventPhotography => "Event Photography",
        PortraitPhotography => "Portrait Photography",
        WeddingPhotography => "Wedding Photography",
        CommercialPhotography => "Commercial Photography",
        SocialMediaContent => "Social Media Content",
        VideoProduction => "Video Production",
        GraphicDesign => "Graphic Design",
        WebDevelopment => "Web Development",
        ContentCreation => "Content Creation",
    }
}

labeled_enum! {
    pub enum ClientKind("client") {
        Individual => "individual",
        Brand => "brand",
    }
}

labeled_enum! {
    pub enum ProjectStatus("projectStatus") {
        InProcess => "In Process",
        ContractSigned => "Contract Signed & Uploaded",
        Started => "Project Started",
        Completed => "Project Completed",
        Delayed => "Project Delayed",
    }
}

labeled_enum! {
    pub enum PaymentStructure("paymentStructure") {
        Single => "single",
        Multiple => "multiple",
        Recurring => "recurring",
    }
}

labeled_enum! {
    pub enum Currency("currency") {
        Pkr => "PKR",
        Usd => "USD",
        Eur => "EUR",
    }
}

labeled_enum! {
    pub enum TaxHandling("taxHandling") {
        Inclusive => "inclusive",
        Exclusive => "exclusive",
    }
}

labeled_enum! {
    pub enum PaymentFrequency("paymentFrequency") {
        Weekly => "weekly",
        Monthly => "monthly",
        Quarterly => "quarterly",
    }
}

labeled_enum! {
    pub enum Financing("financing") {
        Yes => "yes",
        No => "no",
    }
}

impl PaymentStructure {
    pub fn title(&self) -> &'static str {
        match self {
            PaymentStructure::Single => "Single Payment",
            PaymentStructure::Multiple => "Multiple Payments",
            PaymentStructure::Recurring => "Recurring Payment",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PaymentStructure::Single => {
                "Get paid in one transaction, either before or after delivery"
            }
            PaymentStructure::Multiple => "Split payment into milestones tied to project phases",
            PaymentStructure::Recurring => "Regular fixed payments on scheduled basis",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    pub percent: Decimal,
    pub deliverable: String,
}

impl Milestone {
    pub fn new(name: impl Into<String>, percent: Decimal, deliverable: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            percent,
            deliverable: deliverable.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecurringSchedule {
    pub contract_duration: Option<u32>,
    pub frequency: Option<PaymentFrequency>,
    pub start_date: Option<NaiveDate>,
}

/// The active payment arrangement. Only the data of the selected variant
/// exists, so the calculator can match on it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentPlan {
    Single,
    Milestones(Vec<Milestone>),
    Recurring(RecurringSchedule),
}

impl PaymentPlan {
    pub fn empty(structure: PaymentStructure) -> Self {
        match structure {
            PaymentStructure::Single => PaymentPlan::Single,
            PaymentStructure::Multiple => PaymentPlan::Milestones(Vec::new()),
            PaymentStructure::Recurring => PaymentPlan::Recurring(RecurringSchedule::default()),
        }
    }

    pub fn structure(&self) -> PaymentStructure {
        match self {
            PaymentPlan::Single => PaymentStructure::Single,
            PaymentPlan::Milestones(_) => PaymentStructure::Multiple,
            PaymentPlan::Recurring(_) => PaymentStructure::Recurring,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaItem {
    /// A file picked locally that has not been uploaded yet.
    Local(PathBuf),
    Remote(String),
}

impl MediaItem {
    pub fn is_pending(&self) -> bool {
        matches!(self, MediaItem::Local(_))
    }

    pub fn remote_url(&self) -> Option<&str> {
        match self {
            MediaItem::Remote(url) => Some(url),
            MediaItem::Local(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            MediaItem::Local(path) => format!("{} (pending upload)", path.display()),
            MediaItem::Remote(url) => url.clone(),
        }
    }
}

/// The project being edited by the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectDraft {
    /// Server-side id handed back by a media upload, sent along on submit.
    pub project_id: Option<ProjectId>,
    /// Id of the stored draft this was loaded from. Re-saving updates that
    /// draft instead of creating another one.
    pub draft_id: Option<ProjectId>,

    pub project_name: String,
    pub project_type: Option<ProjectType>,
    pub client: Option<ClientKind>,
    pub project_status: Option<ProjectStatus>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    pub description: String,
    pub tags: Vec<String>,
    pub media: Vec<MediaItem>,

    pub contact_name: String,
    pub contact_role: String,
    pub contact_brand: String,
    pub contact_email: String,
    pub contact_number: String,

    pub plan: Option<PaymentPlan>,
    pub project_amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub tax_handling: Option<TaxHandling>,

    pub financing: Option<Financing>,
    pub agree: bool,
}

impl ProjectDraft {
    pub fn payment_structure(&self) -> Option<PaymentStructure> {
        self.plan.as_ref().map(PaymentPlan::structure)
    }

    /// Switches the payment structure. Re-selecting the current structure keeps
    /// its milestones or schedule; picking another one starts it empty.
    pub fn select_structure(&mut self, structure: PaymentStructure) {
        if self.payment_structure() != Some(structure) {
            self.plan = Some(PaymentPlan::empty(structure));
        }
    }

    pub fn milestones(&self) -> &[Milestone] {
        match &self.plan {
            Some(PaymentPlan::Milestones(milestones)) => milestones,
            _ => &[],
        }
    }

    pub fn recurring(&self) -> Option<&RecurringSchedule> {
        match &self.plan {
            Some(PaymentPlan::Recurring(schedule)) => Some(schedule),
            _ => None,
        }
    }

    pub fn recurring_mut(&mut self) -> DomainResult<&mut RecurringSchedule> {
        match &mut self.plan {
            Some(PaymentPlan::Recurring(schedule)) => Ok(schedule),
            _ => Err(DomainError::PlanMismatch {
                expected: PaymentStructure::Recurring,
            }),
        }
    }

    fn milestones_mut(&mut self) -> DomainResult<&mut Vec<Milestone>> {
        match &mut self.plan {
            Some(PaymentPlan::Milestones(milestones)) => Ok(milestones),
            _ => Err(DomainError::PlanMismatch {
                expected: PaymentStructure::Multiple,
            }),
        }
    }

    pub fn milestone_allocation(&self) -> Decimal {
        self.milestones().iter().map(|m| m.percent).sum()
    }

    /// Appends a milestone. Refused once the allocation would pass 100%.
    pub fn add_milestone(&mut self, milestone: Milestone) -> DomainResult<()> {
        check_percent(milestone.percent)?;
        let attempted = self.milestone_allocation() + milestone.percent;
        let milestones = self.milestones_mut()?;
        if attempted > Decimal::ONE_HUNDRED {
            return Err(DomainError::AllocationExceeded { attempted });
        }
        milestones.push(milestone);
        Ok(())
    }

    /// Replaces the milestone at `index`. The other milestones plus the new
    /// percentage must stay within 100%.
    pub fn update_milestone(&mut self, index: usize, milestone: Milestone) -> DomainResult<()> {
        check_percent(milestone.percent)?;
        let milestones = self.milestones_mut()?;
        if index >= milestones.len() {
            return Err(DomainError::MilestoneOutOfRange(index));
        }
        let others: Decimal = milestones
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, m)| m.percent)
            .sum();
        let attempted = others + milestone.percent;
        if attempted > Decimal::ONE_HUNDRED {
            return Err(DomainError::AllocationExceeded { attempted });
        }
        milestones[index] = milestone;
        Ok(())
    }

    pub fn remove_milestone(&mut self, index: usize) -> DomainResult<Milestone> {
        let milestones = self.milestones_mut()?;
        if index >= milestones.len() {
            return Err(DomainError::MilestoneOutOfRange(index));
        }
        Ok(milestones.remove(index))
    }

    /// Adds a trimmed tag unless it is blank or already present.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag.trim());
        self.tags.len() != before
    }

    pub fn pending_media(&self) -> Vec<&Path> {
        self.media
            .iter()
            .filter_map(|item| match item {
                MediaItem::Local(path) => Some(path.as_path()),
                MediaItem::Remote(_) => None,
            })
            .collect()
    }

    /// Replaces the media list with uploaded URLs, the way an upload response
    /// supersedes the locally picked files.
    pub fn apply_upload(&mut self, urls: Vec<String>, project_id: Option<ProjectId>) {
        self.media = urls.into_iter().map(MediaItem::Remote).collect();
        if project_id.is_some() {
            self.project_id = project_id;
        }
    }
}

fn check_percent(percent: Decimal) -> DomainResult<()> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(DomainError::InvalidPercent(percent));
    }
    Ok(())
}

/// A project (or draft) as stored by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub draft: ProjectDraft,
    pub is_draft: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Flattened row shown in project and draft listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    pub project_type: Option<ProjectType>,
    pub due_date: Option<NaiveDate>,
    pub currency: Option<Currency>,
    pub amount: Option<Decimal>,
    pub status: String,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&ProjectRecord> for ProjectSummary {
    fn from(record: &ProjectRecord) -> Self {
        let status = if record.is_draft {
            "Draft".to_string()
        } else {
            record
                .draft
                .project_status
                .map(|s| s.to_string())
                .unwrap_or_default()
        };

        Self {
            id: record.id.clone(),
            name: record.draft.project_name.clone(),
            project_type: record.draft.project_type,
            due_date: record.draft.end_date,
            currency: record.draft.currency,
            amount: record.draft.project_amount,
            status,
            tags: record.draft.tags.clone(),
            created_at: record.created_at.or(record.updated_at),
        }
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and `DD/MM/YYYY`.
pub fn parse_date(input: &str) -> DomainResult<NaiveDate> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.with_timezone(&Utc).date_naive());
    }
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y")
        .map_err(|_| DomainError::InvalidDate(input.to_string()))
}

/// Parses a non-negative money amount.
pub fn parse_amount(input: &str) -> DomainResult<Decimal> {
    let amount = Decimal::from_str(input.trim())
        .map_err(|_| DomainError::InvalidAmount(input.to_string()))?;
    if amount.is_sign_negative() {
        return Err(DomainError::InvalidAmount(input.to_string()));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milestone_draft() -> ProjectDraft {
        let mut draft = ProjectDraft::default();
        draft.select_structure(PaymentStructure::Multiple);
        draft
    }

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for status in ProjectStatus::ALL {
            assert_eq!(status.as_str().parse::<ProjectStatus>().unwrap(), *status);
        }
        assert_eq!("  BRAND ".parse::<ClientKind>().unwrap(), ClientKind::Brand);
        assert!(matches!(
            "crypto".parse::<Currency>(),
            Err(DomainError::InvalidValue { field: "currency", .. })
        ));
    }

    #[test]
    fn test_reselecting_structure_keeps_milestones() {
        let mut draft = milestone_draft();
        draft
            .add_milestone(Milestone::new("Kickoff", Decimal::from(40), "Brief"))
            .unwrap();

        draft.select_structure(PaymentStructure::Multiple);
        assert_eq!(draft.milestones().len(), 1);

        draft.select_structure(PaymentStructure::Recurring);
        assert!(draft.milestones().is_empty());
        assert_eq!(draft.recurring(), Some(&RecurringSchedule::default()));
    }

    #[test]
    fn test_add_milestone_refuses_over_allocation() {
        let mut draft = milestone_draft();
        draft
            .add_milestone(Milestone::new("A", Decimal::from(70), ""))
            .unwrap();

        let err = draft
            .add_milestone(Milestone::new("B", Decimal::from(40), ""))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::AllocationExceeded {
                attempted: Decimal::from(110)
            }
        );

        draft
            .add_milestone(Milestone::new("B", Decimal::from(30), ""))
            .unwrap();
        assert_eq!(draft.milestone_allocation(), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_update_milestone_keeps_allocation_within_hundred() {
        let mut draft = milestone_draft();
        draft
            .add_milestone(Milestone::new("Shoot", Decimal::from(60), ""))
            .unwrap();
        draft
            .add_milestone(Milestone::new("Edit", Decimal::from(30), ""))
            .unwrap();

        let err = draft
            .update_milestone(1, Milestone::new("Edit", Decimal::from(50), ""))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::AllocationExceeded {
                attempted: Decimal::from(110)
            }
        );
        assert_eq!(draft.milestones()[1].percent, Decimal::from(30));

        // The edited milestone's old share does not count against it
        draft
            .update_milestone(0, Milestone::new("Shoot", Decimal::from(70), ""))
            .unwrap();
        assert_eq!(draft.milestone_allocation(), Decimal::ONE_HUNDRED);

        assert_eq!(
            draft.update_milestone(5, Milestone::new("Extra", Decimal::ONE, "")),
            Err(DomainError::MilestoneOutOfRange(5))
        );
    }

    #[test]
    fn test_milestone_ops_require_milestone_plan() {
        let mut draft = ProjectDraft::default();
        draft.select_structure(PaymentStructure::Single);
        assert!(matches!(
            draft.add_milestone(Milestone::default()),
            Err(DomainError::PlanMismatch { .. })
        ));
        assert!(draft.recurring_mut().is_err());
    }

    #[test]
    fn test_tags_behave_as_a_set() {
        let mut draft = ProjectDraft::default();
        assert!(draft.add_tag(" wedding "));
        assert!(!draft.add_tag("wedding"));
        assert!(!draft.add_tag("   "));
        assert_eq!(draft.tags, vec!["wedding".to_string()]);
        assert!(draft.remove_tag("wedding"));
        assert!(!draft.remove_tag("wedding"));
    }

    #[test]
    fn test_apply_upload_replaces_pending_media() {
        let mut draft = ProjectDraft {
            media: vec![MediaItem::Local(PathBuf::from("/tmp/a.jpg"))],
            ..Default::default()
        };
        assert_eq!(draft.pending_media().len(), 1);

        draft.apply_upload(
            vec!["https://cdn.example/a.jpg".to_string()],
            Some(ProjectId::from("p-1")),
        );
        assert!(draft.pending_media().is_empty());
        assert_eq!(draft.project_id, Some(ProjectId::from("p-1")));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(parse_date("2025-03-09").unwrap(), expected);
        assert_eq!(parse_date("2025-03-09T10:00:00.000Z").unwrap(), expected);
        assert_eq!(parse_date("09/03/2025").unwrap(), expected);
        assert!(parse_date("next week").is_err());
    }

    #[test]
    fn test_parse_amount_rejects_negative() {
        assert_eq!(parse_amount("1500.50").unwrap(), Decimal::new(150050, 2));
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_summary_marks_drafts() {
        let record = ProjectRecord {
            id: ProjectId::from("d-1"),
            draft: ProjectDraft {
                project_name: "Lookbook".to_string(),
                project_status: Some(ProjectStatus::Started),
                ..Default::default()
            },
            is_draft: true,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(ProjectSummary::from(&record).status, "Draft");

        let record = ProjectRecord {
            is_draft: false,
            ..record
        };
        assert_eq!(ProjectSummary::from(&record).status, "Project Started");
    }
}
