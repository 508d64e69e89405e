//! AAC board and visual schedule documents.
//!
//! # Responsibility
//! - Define board tiles and schedule steps edited by drag/drop and label edits.
//! - Provide default documents created at signup.
//!
//! # Invariants
//! - Every tile/step has a `label` (placeholder text when not provided).
//! - `icon` and `audio_data` are independently optional.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Label given to tiles and steps that were created without one.
pub const DEFAULT_TILE_LABEL: &str = "New Tile";
/// Page id of the board every AAC board starts from.
pub const ROOT_PAGE_ID: &str = "root";

fn default_tile_label() -> String {
    DEFAULT_TILE_LABEL.to_string()
}

/// Audio attachment dropped onto a tile or step.
///
/// Stored as-is from the drag envelope, so playback can pick a locale later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioPayload {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_text: Option<String>,
    /// Locale tag to phrase text, e.g. `hi` / `ta`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub audio_locale_variants: BTreeMap<String, String>,
}

impl AudioPayload {
    /// Text handed to speech synthesis: the primary phrase, else the label.
    ///
    /// Returns `None` when both are blank.
    pub fn spoken_text(&self) -> Option<&str> {
        self.audio_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .or_else(|| Some(self.label.as_str()).filter(|label| !label.trim().is_empty()))
    }

    /// Phrase text for `locale`, falling back to [`Self::spoken_text`].
    pub fn text_for_locale(&self, locale: &str) -> Option<&str> {
        self.audio_locale_variants
            .get(locale)
            .map(String::as_str)
            .filter(|text| !text.trim().is_empty())
            .or_else(|| self.spoken_text())
    }
}

/// One cell on an AAC board page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardTile {
    pub id: String,
    #[serde(default = "default_tile_label")]
    pub label: String,
    /// Media reference (public URL or bucket handle).
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<AudioPayload>,
    #[serde(default)]
    pub position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Page opened when the tile is activated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_board: Option<String>,
}

impl BoardTile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: default_tile_label(),
            icon: None,
            audio_data: None,
            position: 0,
            category_id: None,
            item_id: None,
            next_board: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// A page of tiles inside an AAC board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPage {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub items: Vec<BoardTile>,
}

/// AAC board document (`patients/{id}/aacBoards/{boardId}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AacBoard {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub boards: BTreeMap<String, BoardPage>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl AacBoard {
    /// Empty board with a single `root` page, as created at signup.
    pub fn default_for(patient_id: &str, now_ms: i64) -> Self {
        let root = BoardPage {
            id: ROOT_PAGE_ID.to_string(),
            title: "Main Board".to_string(),
            items: Vec::new(),
        };
        Self {
            title: "My Communication Board".to_string(),
            description: None,
            boards: BTreeMap::from([(ROOT_PAGE_ID.to_string(), root)]),
            is_published: false,
            patient_id: Some(patient_id.to_string()),
            created_at: Some(now_ms),
            updated_at: Some(now_ms),
        }
    }

    /// Appends a tile to `page_id`, assigning the next position.
    ///
    /// Returns `false` when the page does not exist.
    pub fn push_tile(&mut self, page_id: &str, mut tile: BoardTile) -> bool {
        let Some(page) = self.boards.get_mut(page_id) else {
            return false;
        };
        tile.position = u32::try_from(page.items.len()).unwrap_or(u32::MAX);
        page.items.push(tile);
        true
    }

    pub fn tile_mut(&mut self, page_id: &str, tile_id: &str) -> Option<&mut BoardTile> {
        self.boards
            .get_mut(page_id)?
            .items
            .iter_mut()
            .find(|tile| tile.id == tile_id)
    }

    /// Every media reference used by tile icons, deduplicated.
    ///
    /// Feeds resolver preloading when a board is opened.
    pub fn icon_refs(&self) -> Vec<String> {
        self.boards
            .values()
            .flat_map(|page| page.items.iter())
            .filter_map(|tile| tile.icon.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// One step in a visual schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStep {
    pub id: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default = "default_tile_label", alias = "title")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<AudioPayload>,
    /// Minutes.
    #[serde(default, rename = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl ScheduleStep {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            order: 0,
            label: default_tile_label(),
            description: None,
            icon: None,
            audio_data: None,
            duration_minutes: None,
            completed: false,
            completed_at: None,
        }
    }
}

/// Visual schedule document (`patients/{id}/visualSchedules/{scheduleId}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualSchedule {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<ScheduleStep>,
    #[serde(default)]
    pub repeat_daily: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl VisualSchedule {
    /// Empty "Daily Schedule", as created at signup.
    pub fn default_for(patient_id: &str, now_ms: i64) -> Self {
        Self {
            title: "Daily Schedule".to_string(),
            description: None,
            steps: Vec::new(),
            repeat_daily: false,
            is_published: false,
            patient_id: Some(patient_id.to_string()),
            created_at: Some(now_ms),
            updated_at: Some(now_ms),
        }
    }

    /// Appends a step; orders are 1-based and follow insertion.
    pub fn push_step(&mut self, mut step: ScheduleStep) {
        step.order = u32::try_from(self.steps.len() + 1).unwrap_or(u32::MAX);
        self.steps.push(step);
    }

    pub fn step_mut(&mut self, step_id: &str) -> Option<&mut ScheduleStep> {
        self.steps.iter_mut().find(|step| step.id == step_id)
    }

    /// Marks a step complete. Returns `false` for unknown ids.
    pub fn complete_step(&mut self, step_id: &str, now_ms: i64) -> bool {
        match self.step_mut(step_id) {
            Some(step) => {
                step.completed = true;
                step.completed_at = Some(now_ms);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AacBoard, AudioPayload, BoardTile, ScheduleStep, VisualSchedule, DEFAULT_TILE_LABEL,
        ROOT_PAGE_ID,
    };
    use std::collections::BTreeMap;

    #[test]
    fn tile_without_label_gets_placeholder() {
        let tile: BoardTile = serde_json::from_str(r#"{"id":"t1"}"#).unwrap();
        assert_eq!(tile.label, DEFAULT_TILE_LABEL);
        assert!(tile.icon.is_none());
        assert!(tile.audio_data.is_none());
    }

    #[test]
    fn schedule_step_accepts_title_alias() {
        let step: ScheduleStep =
            serde_json::from_str(r#"{"id":"s1","order":2,"title":"Wake Up","duration":5}"#).unwrap();
        assert_eq!(step.label, "Wake Up");
        assert_eq!(step.duration_minutes, Some(5));
    }

    #[test]
    fn push_tile_assigns_positions() {
        let mut board = AacBoard::default_for("p1", 10);
        assert!(board.push_tile(ROOT_PAGE_ID, BoardTile::new("a")));
        assert!(board.push_tile(ROOT_PAGE_ID, BoardTile::new("b")));
        assert!(!board.push_tile("missing", BoardTile::new("c")));
        let positions: Vec<u32> = board.boards[ROOT_PAGE_ID]
            .items
            .iter()
            .map(|tile| tile.position)
            .collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn icon_refs_are_deduplicated() {
        let mut board = AacBoard::default_for("p1", 10);
        let mut first = BoardTile::new("a");
        first.icon = Some("gs://bucket/mom.jpg".to_string());
        let mut second = BoardTile::new("b");
        second.icon = Some("gs://bucket/mom.jpg".to_string());
        board.push_tile(ROOT_PAGE_ID, first);
        board.push_tile(ROOT_PAGE_ID, second);
        board.push_tile(ROOT_PAGE_ID, BoardTile::new("c"));
        assert_eq!(board.icon_refs(), vec!["gs://bucket/mom.jpg".to_string()]);
    }

    #[test]
    fn schedule_steps_are_one_based_and_completable() {
        let mut schedule = VisualSchedule::default_for("p1", 10);
        schedule.push_step(ScheduleStep::new("wake"));
        schedule.push_step(ScheduleStep::new("eat"));
        assert_eq!(schedule.steps[1].order, 2);
        assert!(schedule.complete_step("eat", 99));
        assert_eq!(schedule.steps[1].completed_at, Some(99));
        assert!(!schedule.complete_step("missing", 99));
    }

    #[test]
    fn spoken_text_prefers_phrase_then_label() {
        let mut payload = AudioPayload {
            id: "hello".to_string(),
            label: "Hello".to_string(),
            audio_text: None,
            audio_locale_variants: BTreeMap::from([("hi".to_string(), "नमस्ते".to_string())]),
        };
        assert_eq!(payload.spoken_text(), Some("Hello"));
        payload.audio_text = Some("Hello there".to_string());
        assert_eq!(payload.spoken_text(), Some("Hello there"));
        assert_eq!(payload.text_for_locale("hi"), Some("नमस्ते"));
        assert_eq!(payload.text_for_locale("ta"), Some("Hello there"));
    }
}
