//! Patient root record and its child documents.
//!
//! # Responsibility
//! - Define the patient record plus activity and progress-session documents.
//! - Define derived read models (`PatientSummary`, `PatientExport`).
//!
//! # Invariants
//! - Patient records leave the active set through `PatientStatus::Archived`.
//! - Unmodelled document fields survive a read/write cycle via `extra`.

use super::board::{AacBoard, VisualSchedule};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Default UI/speech locale for new patients.
pub const DEFAULT_LANGUAGE: &str = "en-IN";
/// Category bucket used for activities without one.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Lifecycle state of a patient record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    #[default]
    Active,
    Inactive,
    Archived,
}

/// Personal details collected by the signup form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientProfile {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    pub date_of_birth: String,
    pub gender: String,
    pub diagnosis: String,
    pub therapist_email: String,
    pub language: Option<String>,
}

impl PatientProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Root patient document (`patients/{uid}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub therapist_email: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub status: PatientStatus,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<i64>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_theme() -> String {
    "light".to_string()
}

impl PatientRecord {
    /// Builds the record written at signup.
    pub fn from_signup(uid: &str, email: &str, profile: &PatientProfile, now_ms: i64) -> Self {
        Self {
            uid: uid.to_string(),
            email: email.to_string(),
            first_name: profile.first_name.trim().to_string(),
            last_name: profile.last_name.trim().to_string(),
            age: profile.age,
            date_of_birth: profile.date_of_birth.clone(),
            gender: profile.gender.clone(),
            diagnosis: profile.diagnosis.clone(),
            therapist_email: profile.therapist_email.clone(),
            language: profile
                .language
                .clone()
                .filter(|language| !language.trim().is_empty())
                .unwrap_or_else(default_language),
            theme: default_theme(),
            status: PatientStatus::Active,
            created_at: now_ms,
            updated_at: now_ms,
            last_login_at: Some(now_ms),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PatientStatus::Active
    }
}

/// Therapy activity (`patients/{id}/activities/{activityId}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Document id; filled in on reads, never stored in the body.
    #[serde(default, skip_serializing)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `speech|learning|motor|social|behavior` in practice; not enforced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Activity mechanic, e.g. `matching`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// Items, feedback media and other activity-specific content.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn category_or_default(&self) -> &str {
        self.category
            .as_deref()
            .filter(|category| !category.trim().is_empty())
            .unwrap_or(UNCATEGORIZED)
    }
}

/// Progress/session log (`patients/{id}/progress/{sessionId}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSession {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    /// Percentage in `0..=100` when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<u32>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub therapist_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caregiver_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Derived per-patient statistics. Recomputed on every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub total_sessions: usize,
    /// Distinct activity ids seen across sessions.
    pub total_activities_completed: usize,
    /// Mean over sessions that report accuracy, rounded to 2 decimals.
    pub average_accuracy: f64,
    pub category_stats: BTreeMap<String, usize>,
    pub generated_at: i64,
}

/// A stored document together with its id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identified<T> {
    pub id: String,
    #[serde(flatten)]
    pub data: T,
}

/// Full per-patient data dump.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientExport {
    pub patient: Option<PatientRecord>,
    pub aac_boards: Vec<Identified<AacBoard>>,
    pub visual_schedules: Vec<Identified<VisualSchedule>>,
    pub activities: Vec<Activity>,
    pub progress: Vec<ProgressSession>,
    pub exported_at: i64,
}

#[cfg(test)]
mod tests {
    use super::{Activity, PatientProfile, PatientRecord, PatientStatus, DEFAULT_LANGUAGE};

    #[test]
    fn signup_record_defaults_language_and_status() {
        let profile = PatientProfile {
            first_name: " Asha ".to_string(),
            last_name: "Rao".to_string(),
            ..PatientProfile::default()
        };
        let record = PatientRecord::from_signup("uid-1", "a@example.com", &profile, 5);
        assert_eq!(record.language, DEFAULT_LANGUAGE);
        assert_eq!(record.status, PatientStatus::Active);
        assert_eq!(record.first_name, "Asha");
        assert_eq!(record.last_login_at, Some(5));
        assert_eq!(profile.display_name(), "Asha Rao");
    }

    #[test]
    fn activity_keeps_unmodelled_fields() {
        let raw = r#"{"title":"Colors","type":"matching","items":[{"id":"item_1"}],"timeLimit":60}"#;
        let activity: Activity = serde_json::from_str(raw).unwrap();
        assert_eq!(activity.kind.as_deref(), Some("matching"));
        assert!(activity.extra.contains_key("items"));
        let back = serde_json::to_value(&activity).unwrap();
        assert_eq!(back["timeLimit"], 60);
        assert!(back.get("id").is_none());
    }

    #[test]
    fn blank_category_counts_as_uncategorized() {
        let mut activity = Activity::new("Sorting");
        activity.category = Some("  ".to_string());
        assert_eq!(activity.category_or_default(), "uncategorized");
    }
}
