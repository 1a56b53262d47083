use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::domain::*;
use crate::ports::{MediaUpload, RepositoryError, RepositoryResult};

// Response wrappers
#[derive(Debug, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectResponse {
    pub project: Option<ProjectRecordDto>,
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn into_result(self, fallback: &str) -> RepositoryResult<()> {
        match self.success {
            Some(false) => Err(RepositoryError::Api {
                status: 200,
                message: self.message.unwrap_or_else(|| fallback.to_string()),
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: Option<bool>,
    pub project: Option<UploadedProjectDto>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadedProjectDto {
    #[serde(default, deserialize_with = "lenient_media")]
    pub media: Vec<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub pid: Option<String>,
}

impl TryFrom<UploadResponse> for MediaUpload {
    type Error = RepositoryError;

    fn try_from(response: UploadResponse) -> RepositoryResult<Self> {
        if response.success == Some(false) {
            return Err(RepositoryError::Api {
                status: 200,
                message: response
                    .message
                    .unwrap_or_else(|| "Failed to upload media".to_string()),
            });
        }
        let project = response.project.ok_or_else(|| {
            RepositoryError::Serialization("Upload response carried no project".to_string())
        })?;
        Ok(MediaUpload {
            urls: project.media,
            project_id: project.pid.map(ProjectId),
        })
    }
}

// Auth DTOs
#[derive(Debug, Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SignInResponse {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Deserialize)]
pub struct UserDto {
    #[serde(deserialize_with = "lenient_string")]
    pub uid: String,
    #[serde(rename = "fullName", default, deserialize_with = "lenient_string")]
    pub full_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

impl From<SignInResponse> for Session {
    fn from(response: SignInResponse) -> Self {
        Self {
            token: response.token,
            user: User {
                id: UserId(response.user.uid),
                full_name: response.user.full_name,
                email: response.user.email,
            },
        }
    }
}

// Project DTOs

/// Outgoing project body. Every field is always present, unset values are
/// sent as empty strings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpid: Option<String>,
    pub project_name: String,
    pub project_type: String,
    pub client: String,
    pub project_status: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub tags: Vec<String>,
    pub media: Vec<String>,
    pub contact_name: String,
    pub contact_role: String,
    pub contact_brand: String,
    pub contact_email: String,
    pub contact_number: String,
    pub payment_structure: String,
    pub project_amount: String,
    pub currency: String,
    pub tax_handling: String,
    pub milestones: Vec<MilestoneDto>,
    pub contract_duration: String,
    pub payment_frequency: String,
    pub payment_start_date: String,
    pub financing: String,
    pub agree: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneDto {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub percent: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub deliverable: String,
}

fn label<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn date_label(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

impl ProjectPayload {
    pub fn new(draft: &ProjectDraft, user_id: Option<&UserId>) -> Self {
        let schedule = draft.recurring();

        Self {
            pid: draft.project_id.as_ref().map(|id| id.0.clone()),
            dpid: draft.draft_id.as_ref().map(|id| id.0.clone()),
            project_name: draft.project_name.clone(),
            project_type: label(draft.project_type),
            client: label(draft.client),
            project_status: label(draft.project_status),
            start_date: date_label(draft.start_date),
            end_date: date_label(draft.end_date),
            description: draft.description.clone(),
            tags: draft.tags.clone(),
            media: draft
                .media
                .iter()
                .filter_map(|m| m.remote_url().map(str::to_string))
                .collect(),
            contact_name: draft.contact_name.clone(),
            contact_role: draft.contact_role.clone(),
            contact_brand: draft.contact_brand.clone(),
            contact_email: draft.contact_email.clone(),
            contact_number: draft.contact_number.clone(),
            payment_structure: label(draft.payment_structure()),
            project_amount: label(draft.project_amount),
            currency: label(draft.currency),
            tax_handling: label(draft.tax_handling),
            milestones: draft
                .milestones()
                .iter()
                .map(|m| MilestoneDto {
                    name: m.name.clone(),
                    percent: m.percent.normalize().to_string(),
                    deliverable: m.deliverable.clone(),
                })
                .collect(),
            contract_duration: label(schedule.and_then(|s| s.contract_duration)),
            payment_frequency: label(schedule.and_then(|s| s.frequency)),
            payment_start_date: date_label(schedule.and_then(|s| s.start_date)),
            financing: label(draft.financing),
            agree: draft.agree,
            user_id: user_id.map(|id| id.0.clone()),
        }
    }

    pub fn for_record(record: &ProjectRecord) -> Self {
        let mut payload = Self::new(&record.draft, None);
        if record.is_draft {
            payload.dpid = Some(record.id.0.clone());
        } else {
            payload.pid = Some(record.id.0.clone());
        }
        payload
    }
}

/// Incoming project or draft. Reads are lenient: numbers may arrive as
/// strings, dates in several formats and media in several shapes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectRecordDto {
    #[serde(deserialize_with = "lenient_opt_string")]
    pub pid: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub dpid: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub project_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub project_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub client: String,
    #[serde(deserialize_with = "lenient_string")]
    pub project_status: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "lenient_media")]
    pub media: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_role: String,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_brand: String,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_number: String,
    #[serde(deserialize_with = "lenient_string")]
    pub payment_structure: String,
    #[serde(deserialize_with = "lenient_string")]
    pub project_amount: String,
    #[serde(deserialize_with = "lenient_string")]
    pub currency: String,
    #[serde(deserialize_with = "lenient_string")]
    pub tax_handling: String,
    #[serde(deserialize_with = "lenient_milestones")]
    pub milestones: Vec<MilestoneDto>,
    #[serde(deserialize_with = "lenient_string")]
    pub contract_duration: String,
    #[serde(deserialize_with = "lenient_string")]
    pub payment_frequency: String,
    #[serde(deserialize_with = "lenient_string")]
    pub payment_start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub financing: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub agree: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(deserialize_with = "lenient_string")]
    pub updated_at: String,
}

fn parse_label<T: FromStr>(raw: &str) -> Option<T> {
    if raw.trim().is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::debug!(value = raw, "ignoring unknown label");
            None
        }
    }
}

fn parse_optional_date(raw: &str) -> Option<NaiveDate> {
    if raw.trim().is_empty() {
        return None;
    }
    parse_date(raw).ok()
}

fn parse_optional_amount(raw: &str) -> Option<Decimal> {
    if raw.trim().is_empty() {
        return None;
    }
    parse_amount(raw).ok()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            parse_date(trimmed)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

impl ProjectRecordDto {
    fn plan(&self) -> Option<PaymentPlan> {
        let structure: PaymentStructure = parse_label(&self.payment_structure)?;
        Some(match structure {
            PaymentStructure::Single => PaymentPlan::Single,
            PaymentStructure::Multiple => PaymentPlan::Milestones(
                self.milestones
                    .iter()
                    .map(|m| Milestone {
                        name: m.name.clone(),
                        percent: parse_optional_amount(&m.percent).unwrap_or_default(),
                        deliverable: m.deliverable.clone(),
                    })
                    .collect(),
            ),
            PaymentStructure::Recurring => PaymentPlan::Recurring(RecurringSchedule {
                contract_duration: self.contract_duration.trim().parse().ok(),
                frequency: parse_label(&self.payment_frequency),
                start_date: parse_optional_date(&self.payment_start_date),
            }),
        })
    }

    pub fn into_record(self, is_draft: bool) -> RepositoryResult<ProjectRecord> {
        let plan = self.plan();
        let id = self
            .pid
            .clone()
            .or_else(|| self.dpid.clone())
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                RepositoryError::Serialization("Project record has no pid or dpid".to_string())
            })?;

        let draft = ProjectDraft {
            project_id: self.pid.map(ProjectId),
            draft_id: self.dpid.map(ProjectId),
            project_name: self.project_name,
            project_type: parse_label(&self.project_type),
            client: parse_label(&self.client),
            project_status: parse_label(&self.project_status),
            start_date: parse_optional_date(&self.start_date),
            end_date: parse_optional_date(&self.end_date),
            description: self.description,
            tags: self.tags,
            media: self.media.into_iter().map(MediaItem::Remote).collect(),
            contact_name: self.contact_name,
            contact_role: self.contact_role,
            contact_brand: self.contact_brand,
            contact_email: self.contact_email,
            contact_number: self.contact_number,
            plan,
            project_amount: parse_optional_amount(&self.project_amount),
            currency: parse_label(&self.currency),
            tax_handling: parse_label(&self.tax_handling),
            financing: parse_label(&self.financing),
            agree: self.agree,
        };

        Ok(ProjectRecord {
            id: ProjectId(id),
            draft,
            is_draft,
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
        })
    }
}

// Client DTOs
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientDto {
    #[serde(deserialize_with = "lenient_opt_string")]
    pub cid: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub id: Option<String>,
    #[serde(rename = "_id", deserialize_with = "lenient_opt_string")]
    pub object_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub full_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub client_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_person_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_person_role: String,
}

/// Client endpoints answer either `{client: {...}}` or the bare record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ClientResponse {
    Wrapped { client: ClientDto },
    Bare(ClientDto),
}

impl ClientResponse {
    pub fn into_dto(self) -> ClientDto {
        match self {
            ClientResponse::Wrapped { client } | ClientResponse::Bare(client) => client,
        }
    }
}

impl TryFrom<ClientDto> for Client {
    type Error = RepositoryError;

    fn try_from(dto: ClientDto) -> RepositoryResult<Self> {
        let id = dto
            .cid
            .or(dto.id)
            .or(dto.object_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| RepositoryError::Serialization("Client record has no id".to_string()))?;

        Ok(Client {
            id: ClientId(id),
            details: ClientDraft {
                full_name: dto.full_name,
                client_type: parse_label(&dto.client_type),
                company: dto.company,
                email: dto.email,
                phone: dto.phone,
                address: dto.address,
                contact_person_name: dto.contact_person_name,
                contact_person_role: dto.contact_person_role,
            },
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    pub full_name: String,
    pub client_type: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub contact_person_name: String,
    pub contact_person_role: String,
}

impl From<&ClientDraft> for ClientPayload {
    fn from(draft: &ClientDraft) -> Self {
        Self {
            full_name: draft.full_name.trim().to_string(),
            client_type: label(draft.client_type),
            company: draft.company.trim().to_string(),
            email: draft.email.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            address: draft.address.trim().to_string(),
            contact_person_name: draft.contact_person_name.trim().to_string(),
            contact_person_role: draft.contact_person_role.trim().to_string(),
        }
    }
}

// Lenient field readers

fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(value_to_string)
        .unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(value_to_string)
        .filter(|s| !s.is_empty()))
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    })
}

fn lenient_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let tags = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items.into_iter().map(value_to_string).collect(),
        Some(Value::String(joined)) => joined.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(tags
        .into_iter()
        .map(|t: String| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

fn media_urls(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(url) => Some(url),
                Value::Object(mut fields) => fields
                    .remove("url")
                    .or_else(|| fields.remove("secure_url"))
                    .and_then(|v| v.as_str().map(str::to_string)),
                _ => None,
            })
            .filter(|url| !url.trim().is_empty())
            .collect(),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.starts_with('[') {
                serde_json::from_str(trimmed).map(media_urls).unwrap_or_default()
            } else if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
        _ => Vec::new(),
    }
}

fn lenient_media<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(media_urls)
        .unwrap_or_default())
}

fn lenient_milestones<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<MilestoneDto>, D::Error> {
    let value = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(raw)) => serde_json::from_str(&raw).unwrap_or(Value::Null),
        Some(value) => value,
        None => Value::Null,
    };
    match value {
        Value::Array(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(Vec::new()),
    }
}
