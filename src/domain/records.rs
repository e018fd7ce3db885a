// Backend records as delivered by the REST API
//
// Every field has an explicit default so a sparse or slightly off-schema
// payload still deserializes; ids accept strings or numbers and dates accept
// either a plain date or a full ISO timestamp.
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<Value>")]
pub enum Role {
    Admin,
    Sales,
    Engineer,
    #[default]
    Unknown,
}

impl From<Option<Value>> for Role {
    fn from(value: Option<Value>) -> Self {
        match normalize(value).as_str() {
            "admin" => Role::Admin,
            "sales" => Role::Sales,
            "engineer" => Role::Engineer,
            _ => Role::Unknown,
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Sales => "sales",
            Role::Engineer => "engineer",
            Role::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<Value>")]
pub enum ClientStatus {
    Active,
    Inactive,
    #[default]
    Unknown,
}

impl From<Option<Value>> for ClientStatus {
    fn from(value: Option<Value>) -> Self {
        match normalize(value).as_str() {
            "active" => ClientStatus::Active,
            "inactive" => ClientStatus::Inactive,
            _ => ClientStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "Option<Value>")]
pub enum ProjectStatus {
    Active,
    Completed,
    OnHold,
    Cancelled,
    #[default]
    Unknown,
}

impl From<Option<Value>> for ProjectStatus {
    fn from(value: Option<Value>) -> Self {
        match normalize(value).as_str() {
            "active" => ProjectStatus::Active,
            "completed" => ProjectStatus::Completed,
            "on_hold" => ProjectStatus::OnHold,
            "cancelled" | "canceled" => ProjectStatus::Cancelled,
            _ => ProjectStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<Value>")]
pub enum AssignmentStatus {
    Active,
    Completed,
    #[default]
    Unknown,
}

impl From<Option<Value>> for AssignmentStatus {
    fn from(value: Option<Value>) -> Self {
        match normalize(value).as_str() {
            "active" => AssignmentStatus::Active,
            "completed" | "ended" => AssignmentStatus::Completed,
            _ => AssignmentStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<Value>")]
pub enum ReportStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
    #[default]
    Unknown,
}

impl From<Option<Value>> for ReportStatus {
    fn from(value: Option<Value>) -> Self {
        match normalize(value).as_str() {
            "draft" => ReportStatus::Draft,
            "submitted" => ReportStatus::Submitted,
            "approved" => ReportStatus::Approved,
            "rejected" => ReportStatus::Rejected,
            _ => ReportStatus::Unknown,
        }
    }
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Draft => "draft",
            ReportStatus::Submitted => "submitted",
            ReportStatus::Approved => "approved",
            ReportStatus::Rejected => "rejected",
            ReportStatus::Unknown => "unknown",
        }
    }
}

/// Non-string values normalize to "" and so map to `Unknown`.
fn normalize(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_ascii_lowercase().replace(['-', ' '], "_"),
        _ => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: ClientStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub client_id: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub engineer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: AssignmentStatus,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub engineer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub year: i32,
    #[serde(default, deserialize_with = "lenient_number")]
    pub month: u32,
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttendanceStats {
    #[serde(deserialize_with = "lenient_number")]
    pub working_days: u32,
    #[serde(deserialize_with = "lenient_number")]
    pub present_days: u32,
    #[serde(deserialize_with = "lenient_number")]
    pub absent_days: u32,
    #[serde(deserialize_with = "lenient_number")]
    pub leave_days: u32,
    #[serde(deserialize_with = "lenient_number")]
    pub total_hours: f64,
}

fn default_true() -> bool {
    true
}

fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

fn lenient_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(id_from_value))
}

/// Numbers or numeric strings; anything else is the type's default.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.to_string().parse().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => T::default(),
    })
}

/// Accepts "2025-03-31" or "2025-03-31T00:00:00.000Z"; anything else is None.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()),
        _ => None,
    })
}
