//! Patient data gateway.
//!
//! # Responsibility
//! - CRUD over the patient record and its sub-collections.
//! - Derived read models: full export and summary statistics.
//!
//! # Invariants
//! - Writes stamp `patientId` and `updatedAt` (progress: `createdAt`).
//! - Reads decode into typed documents; undecodable documents are reported
//!   as `ErrorKind::Unknown`, never passed through.
//! - Patients are archived via `status`, never deleted.
//!
//! Collection layout: `patients/{patientId}/{aacBoards|visualSchedules|activities|progress}/{docId}`.

use super::gateway::{ErrorKind, GatewayError, GatewayResult, RetryPolicy};
use crate::config::CoreConfig;
use crate::logging::sanitize_for_log;
use crate::model::board::{AacBoard, VisualSchedule};
use crate::model::now_epoch_ms;
use crate::model::patient::{
    Activity, Identified, PatientExport, PatientRecord, PatientStatus, PatientSummary,
    ProgressSession,
};
use crate::store::{
    CollectionPath, DocPath, DocQuery, DocumentStore, SortDirection, StoredDocument,
    Subcollection, WriteMode,
};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Board/schedule id used when the caller does not name one.
pub const DEFAULT_DOC_ID: &str = "default";

/// Gateway over a [`DocumentStore`] for patient-owned documents.
pub struct PatientDataService<S: DocumentStore> {
    store: S,
    retry: RetryPolicy,
    progress_limit: u32,
}

impl<S: DocumentStore> PatientDataService<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, &CoreConfig::default())
    }

    pub fn with_config(store: S, config: &CoreConfig) -> Self {
        Self {
            store,
            retry: RetryPolicy::from_config(&config.retry),
            progress_limit: config.progress_list_limit,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // ---- patient record ----

    /// Writes the full patient record, replacing any existing one.
    pub fn put_patient(&self, record: &PatientRecord) -> GatewayResult<()> {
        let path = DocPath::patient(&record.uid);
        let body = to_body(record)?;
        self.write(&path, &body, WriteMode::Replace, "put_patient")
    }

    pub fn get_patient(&self, patient_id: &str) -> GatewayResult<PatientRecord> {
        let path = DocPath::patient(patient_id);
        match self.read(&path, "get_patient")? {
            Some(body) => decode(&path, body),
            None => Err(GatewayError::not_found(format_args!("patient `{patient_id}`"))),
        }
    }

    /// Merges `updates` into an existing patient record and bumps `updatedAt`.
    ///
    /// `null` values delete keys. The merged record must still decode as a
    /// [`PatientRecord`]; otherwise nothing is written.
    pub fn update_patient(&self, patient_id: &str, updates: Map<String, Value>) -> GatewayResult<()> {
        let path = DocPath::patient(patient_id);
        let Some(mut body) = self.read(&path, "update_patient")? else {
            return Err(GatewayError::not_found(format_args!("patient `{patient_id}`")));
        };
        merge_patch(&mut body, &Value::Object(updates));
        stamp(&mut body, None, &[("updatedAt", now_epoch_ms())]);
        if let Err(err) = decode::<PatientRecord>(&path, body.clone()) {
            return Err(log_failure("update_patient", err));
        }
        self.write(&path, &body, WriteMode::Replace, "update_patient")
    }

    /// Archives a patient. The record and its children stay readable.
    pub fn archive_patient(&self, patient_id: &str) -> GatewayResult<()> {
        let mut updates = Map::new();
        updates.insert("status".to_string(), serde_json::to_value(PatientStatus::Archived).map_err(json_error)?);
        self.update_patient(patient_id, updates)
    }

    pub(crate) fn touch_last_login(&self, patient_id: &str, now_ms: i64) -> GatewayResult<()> {
        let mut updates = Map::new();
        updates.insert("lastLoginAt".to_string(), Value::from(now_ms));
        self.update_patient(patient_id, updates)
    }

    // ---- AAC boards ----

    pub fn save_aac_board(
        &self,
        patient_id: &str,
        board: &AacBoard,
        board_id: Option<&str>,
    ) -> GatewayResult<String> {
        let id = board_id.unwrap_or(DEFAULT_DOC_ID);
        self.save_child(patient_id, Subcollection::AacBoards, id, board, "save_aac_board")?;
        Ok(id.to_string())
    }

    pub fn get_aac_board(&self, patient_id: &str, board_id: Option<&str>) -> GatewayResult<AacBoard> {
        self.get_child(
            patient_id,
            Subcollection::AacBoards,
            board_id.unwrap_or(DEFAULT_DOC_ID),
            "get_aac_board",
        )
    }

    pub fn list_aac_boards(&self, patient_id: &str) -> GatewayResult<Vec<Identified<AacBoard>>> {
        self.list_identified(patient_id, Subcollection::AacBoards, "list_aac_boards")
    }

    // ---- visual schedules ----

    pub fn save_visual_schedule(
        &self,
        patient_id: &str,
        schedule: &VisualSchedule,
        schedule_id: Option<&str>,
    ) -> GatewayResult<String> {
        let id = schedule_id.unwrap_or(DEFAULT_DOC_ID);
        self.save_child(
            patient_id,
            Subcollection::VisualSchedules,
            id,
            schedule,
            "save_visual_schedule",
        )?;
        Ok(id.to_string())
    }

    pub fn get_visual_schedule(
        &self,
        patient_id: &str,
        schedule_id: Option<&str>,
    ) -> GatewayResult<VisualSchedule> {
        self.get_child(
            patient_id,
            Subcollection::VisualSchedules,
            schedule_id.unwrap_or(DEFAULT_DOC_ID),
            "get_visual_schedule",
        )
    }

    pub fn list_visual_schedules(
        &self,
        patient_id: &str,
    ) -> GatewayResult<Vec<Identified<VisualSchedule>>> {
        self.list_identified(patient_id, Subcollection::VisualSchedules, "list_visual_schedules")
    }

    // ---- activities ----

    /// Saves an activity; a fresh `activity_*` id is generated when none is given.
    pub fn save_activity(
        &self,
        patient_id: &str,
        activity: &Activity,
        activity_id: Option<&str>,
    ) -> GatewayResult<String> {
        let id = activity_id
            .map(str::to_string)
            .unwrap_or_else(|| generated_id("activity"));
        self.save_child(patient_id, Subcollection::Activities, &id, activity, "save_activity")?;
        Ok(id)
    }

    pub fn get_activity(&self, patient_id: &str, activity_id: &str) -> GatewayResult<Activity> {
        let mut activity: Activity =
            self.get_child(patient_id, Subcollection::Activities, activity_id, "get_activity")?;
        activity.id = activity_id.to_string();
        Ok(activity)
    }

    /// Lists activities, optionally only those in `category`.
    pub fn list_activities(&self, patient_id: &str, category: Option<&str>) -> GatewayResult<Vec<Activity>> {
        let mut query = DocQuery::new();
        if let Some(category) = category {
            query = query.where_eq("category", category);
        }
        let documents = self.query_child(patient_id, Subcollection::Activities, &query, "list_activities")?;
        decode_all(patient_id, Subcollection::Activities, documents, |activity: &mut Activity, id| {
            activity.id = id;
        })
    }

    pub fn delete_activity(&self, patient_id: &str, activity_id: &str) -> GatewayResult<()> {
        let path = CollectionPath::patient_child(patient_id, Subcollection::Activities).doc(activity_id);
        self.retry
            .run("delete_activity", || self.store.delete(&path))
            .map_err(|err| log_failure("delete_activity", err.into()))?;
        info!("event=delete_activity module=gateway status=ok");
        Ok(())
    }

    // ---- progress sessions ----

    /// Saves a session; `createdAt` defaults to now when the session has none.
    pub fn save_progress(
        &self,
        patient_id: &str,
        session: &ProgressSession,
        session_id: Option<&str>,
    ) -> GatewayResult<String> {
        let id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| generated_id("session"));
        let path = CollectionPath::patient_child(patient_id, Subcollection::Progress).doc(&id);
        let mut body = to_body(session)?;
        let created_at = session.created_at.unwrap_or_else(now_epoch_ms);
        stamp(&mut body, Some(patient_id), &[("createdAt", created_at)]);
        self.write(&path, &body, WriteMode::Merge, "save_progress")?;
        Ok(id)
    }

    pub fn get_progress(&self, patient_id: &str, session_id: &str) -> GatewayResult<ProgressSession> {
        let mut session: ProgressSession =
            self.get_child(patient_id, Subcollection::Progress, session_id, "get_progress")?;
        session.id = session_id.to_string();
        Ok(session)
    }

    /// Newest-first sessions, optionally for one activity.
    ///
    /// `limit` defaults to the configured progress page size.
    pub fn list_progress(
        &self,
        patient_id: &str,
        activity_id: Option<&str>,
        limit: Option<u32>,
    ) -> GatewayResult<Vec<ProgressSession>> {
        let query = progress_query(activity_id).limit(limit.unwrap_or(self.progress_limit));
        self.query_progress(patient_id, &query)
    }

    // ---- aggregates ----

    /// Collects every document owned by a patient.
    ///
    /// A missing patient record exports as `patient: None`.
    pub fn export_all(&self, patient_id: &str) -> GatewayResult<PatientExport> {
        let patient = match self.get_patient(patient_id) {
            Ok(record) => Some(record),
            Err(err) if err.kind == ErrorKind::NotFound => None,
            Err(err) => return Err(err),
        };

        Ok(PatientExport {
            patient,
            aac_boards: self.list_aac_boards(patient_id)?,
            visual_schedules: self.list_visual_schedules(patient_id)?,
            activities: self.list_activities(patient_id, None)?,
            progress: self.query_progress(patient_id, &progress_query(None))?,
            exported_at: now_epoch_ms(),
        })
    }

    /// Recomputes summary statistics over all sessions and activities.
    pub fn summarize(&self, patient_id: &str) -> GatewayResult<PatientSummary> {
        let activities = self.list_activities(patient_id, None)?;
        let sessions = self.query_progress(patient_id, &progress_query(None))?;
        Ok(summarize_documents(&activities, &sessions, now_epoch_ms()))
    }

    // ---- internals ----

    fn save_child<T: Serialize>(
        &self,
        patient_id: &str,
        child: Subcollection,
        id: &str,
        document: &T,
        operation: &'static str,
    ) -> GatewayResult<()> {
        let path = CollectionPath::patient_child(patient_id, child).doc(id);
        let mut body = to_body(document)?;
        stamp(&mut body, Some(patient_id), &[("updatedAt", now_epoch_ms())]);
        self.write(&path, &body, WriteMode::Merge, operation)
    }

    fn get_child<T: DeserializeOwned>(
        &self,
        patient_id: &str,
        child: Subcollection,
        id: &str,
        operation: &'static str,
    ) -> GatewayResult<T> {
        let path = CollectionPath::patient_child(patient_id, child).doc(id);
        match self.read(&path, operation)? {
            Some(body) => decode(&path, body),
            None => Err(GatewayError::not_found(format_args!("document `{path}`"))),
        }
    }

    fn list_identified<T: DeserializeOwned>(
        &self,
        patient_id: &str,
        child: Subcollection,
        operation: &'static str,
    ) -> GatewayResult<Vec<Identified<T>>> {
        let collection = CollectionPath::patient_child(patient_id, child);
        self.query_child(patient_id, child, &DocQuery::new(), operation)?
            .into_iter()
            .map(|document| -> GatewayResult<Identified<T>> {
                let path = collection.doc(&document.id);
                Ok(Identified {
                    id: document.id,
                    data: decode(&path, document.body)?,
                })
            })
            .collect()
    }

    fn query_progress(&self, patient_id: &str, query: &DocQuery) -> GatewayResult<Vec<ProgressSession>> {
        let documents = self.query_child(patient_id, Subcollection::Progress, query, "list_progress")?;
        decode_all(patient_id, Subcollection::Progress, documents, |session: &mut ProgressSession, id| {
            session.id = id;
        })
    }

    fn query_child(
        &self,
        patient_id: &str,
        child: Subcollection,
        query: &DocQuery,
        operation: &'static str,
    ) -> GatewayResult<Vec<StoredDocument>> {
        let collection = CollectionPath::patient_child(patient_id, child);
        self.retry
            .run(operation, || self.store.query(&collection, query))
            .map_err(|err| log_failure(operation, err.into()))
    }

    fn read(&self, path: &DocPath, operation: &'static str) -> GatewayResult<Option<Value>> {
        self.retry
            .run(operation, || self.store.get(path))
            .map_err(|err| log_failure(operation, err.into()))
    }

    fn write(&self, path: &DocPath, body: &Value, mode: WriteMode, operation: &'static str) -> GatewayResult<()> {
        self.retry
            .run(operation, || self.store.set(path, body, mode))
            .map_err(|err| log_failure(operation, err.into()))?;
        info!("event={operation} module=gateway status=ok");
        Ok(())
    }
}

/// Pure summary computation shared by `summarize` and tests.
pub fn summarize_documents(
    activities: &[Activity],
    sessions: &[ProgressSession],
    generated_at: i64,
) -> PatientSummary {
    let accuracies = sessions
        .iter()
        .filter_map(|session| session.accuracy)
        .collect::<Vec<_>>();
    let average_accuracy = if accuracies.is_empty() {
        0.0
    } else {
        let mean = accuracies.iter().sum::<f64>() / accuracies.len() as f64;
        (mean * 100.0).round() / 100.0
    };

    // Sessions without an activity id count together as one activity.
    let total_activities_completed = sessions
        .iter()
        .map(|session| session.activity_id.as_deref())
        .collect::<BTreeSet<_>>()
        .len();

    let mut category_stats = BTreeMap::new();
    for activity in activities {
        *category_stats
            .entry(activity.category_or_default().to_string())
            .or_insert(0) += 1;
    }

    PatientSummary {
        total_sessions: sessions.len(),
        total_activities_completed,
        average_accuracy,
        category_stats,
        generated_at,
    }
}

/// Applies a JSON merge patch in place: objects merge recursively, `null`
/// removes a key, anything else replaces the target.
fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_fields) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(fields) = target {
        for (key, value) in patch_fields {
            if value.is_null() {
                fields.remove(key);
            } else {
                merge_patch(fields.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

fn progress_query(activity_id: Option<&str>) -> DocQuery {
    let query = DocQuery::new().order_by("createdAt", SortDirection::Descending);
    match activity_id {
        Some(activity_id) => query.where_eq("activityId", activity_id),
        None => query,
    }
}

fn generated_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

fn to_body<T: Serialize>(document: &T) -> GatewayResult<Value> {
    match serde_json::to_value(document).map_err(json_error)? {
        body @ Value::Object(_) => Ok(body),
        _ => Err(GatewayError::unknown("document must serialize to a JSON object")),
    }
}

fn stamp(body: &mut Value, patient_id: Option<&str>, timestamps: &[(&str, i64)]) {
    if let Value::Object(fields) = body {
        if let Some(patient_id) = patient_id {
            fields.insert("patientId".to_string(), Value::from(patient_id));
        }
        for (field, value) in timestamps {
            fields.insert((*field).to_string(), Value::from(*value));
        }
    }
}

fn decode<T: DeserializeOwned>(path: &DocPath, body: Value) -> GatewayResult<T> {
    serde_json::from_value(body).map_err(|err| {
        GatewayError::unknown(format!("stored document `{path}` failed validation: {err}"))
    })
}

fn decode_all<T, F>(
    patient_id: &str,
    child: Subcollection,
    documents: Vec<StoredDocument>,
    mut set_id: F,
) -> GatewayResult<Vec<T>>
where
    T: DeserializeOwned,
    F: FnMut(&mut T, String),
{
    let collection = CollectionPath::patient_child(patient_id, child);
    documents
        .into_iter()
        .map(|document| -> GatewayResult<T> {
            let mut decoded: T = decode(&collection.doc(&document.id), document.body)?;
            set_id(&mut decoded, document.id);
            Ok(decoded)
        })
        .collect()
}

fn json_error(err: serde_json::Error) -> GatewayError {
    GatewayError::unknown(format!("failed to encode document: {err}"))
}

fn log_failure(operation: &str, err: GatewayError) -> GatewayError {
    warn!(
        "event={} module=gateway status=error error_kind={} error={}",
        operation,
        err.kind.as_str(),
        sanitize_for_log(&err.message)
    );
    err
}

#[cfg(test)]
mod tests {
    use super::{merge_patch, summarize_documents};
    use crate::model::patient::{Activity, ProgressSession};
    use serde_json::json;

    fn session(activity_id: Option<&str>, accuracy: Option<f64>) -> ProgressSession {
        ProgressSession {
            activity_id: activity_id.map(str::to_string),
            accuracy,
            ..ProgressSession::default()
        }
    }

    #[test]
    fn summary_of_nothing_is_zeroed() {
        let summary = summarize_documents(&[], &[], 1);
        assert_eq!(summary.total_sessions, 0);
        assert_eq!(summary.average_accuracy, 0.0);
        assert!(summary.category_stats.is_empty());
    }

    #[test]
    fn summary_rounds_mean_and_counts_distinct_activities() {
        let sessions = vec![
            session(Some("a1"), Some(90.0)),
            session(Some("a1"), Some(85.0)),
            session(Some("a2"), Some(70.333)),
            session(None, None),
        ];
        let mut speech = Activity::new("Colors");
        speech.category = Some("speech".to_string());
        let activities = vec![speech.clone(), speech, Activity::new("Free play")];

        let summary = summarize_documents(&activities, &sessions, 1);
        assert_eq!(summary.total_sessions, 4);
        assert_eq!(summary.total_activities_completed, 3);
        assert_eq!(summary.average_accuracy, 81.78);
        assert_eq!(summary.category_stats["speech"], 2);
        assert_eq!(summary.category_stats["uncategorized"], 1);
    }

    #[test]
    fn sessions_without_activity_id_count_once() {
        let sessions = vec![session(None, None), session(None, Some(50.0))];
        let summary = summarize_documents(&[], &sessions, 1);
        assert_eq!(summary.total_activities_completed, 1);
    }

    #[test]
    fn merge_patch_merges_nested_objects_and_deletes_nulls() {
        let mut target = json!({"name": "Asha", "email": "a@x.in", "prefs": {"voice": "f", "speed": 1}});
        merge_patch(
            &mut target,
            &json!({"email": null, "prefs": {"speed": 2, "theme": "dark"}, "tags": ["x"]}),
        );
        assert_eq!(
            target,
            json!({"name": "Asha", "prefs": {"voice": "f", "speed": 2, "theme": "dark"}, "tags": ["x"]})
        );
    }
}
