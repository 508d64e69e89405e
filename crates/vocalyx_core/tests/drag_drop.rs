use std::collections::BTreeMap;
use vocalyx_core::catalog::audio::AudioCatalog;
use vocalyx_core::catalog::fixture::{parse_legacy_catalog, CategorizedCatalog};
use vocalyx_core::drag::envelope::{ImageToken, AAC_TOKEN_SLOT};
use vocalyx_core::drag::transfer::DropEffect;
use vocalyx_core::model::board::{AacBoard, AudioPayload, BoardTile, ScheduleStep, ROOT_PAGE_ID};
use vocalyx_core::{
    begin_drag, handle_drop, DataTransfer, DragEnvelope, DragError, DropOutcome, MediaType,
    ResourceCatalog,
};

fn mom_catalog() -> ResourceCatalog {
    let categorized = CategorizedCatalog::from_json_str(
        r#"{"categories": [{"id": "family", "names": {"en-IN": "Family"}, "items": [
            {"id": "mom", "names": {"en-IN": "Mom"}, "imageRef": "gs://bucket/mom.jpg"}
        ]}]}"#,
    )
    .unwrap();
    ResourceCatalog::with_default_locale(categorized, Vec::new())
}

fn blank_tile() -> BoardTile {
    BoardTile::new("t1").with_label("")
}

#[test]
fn searched_resource_dropped_on_tile_sets_icon_only() {
    let catalog = mom_catalog();
    let mom = catalog.search("mom")[0];
    let envelope = DragEnvelope::from_resource(mom).unwrap();

    let mut transfer = DataTransfer::new();
    begin_drag(&mut transfer, &envelope).unwrap();
    assert_eq!(transfer.effect_allowed, DropEffect::Copy);

    let mut tile = blank_tile();
    let outcome = handle_drop(&transfer, &mut tile);

    assert!(matches!(outcome, DropOutcome::Applied(MediaType::Image)));
    assert_eq!(tile.id, "t1");
    assert_eq!(tile.label, "");
    assert_eq!(tile.icon.as_deref(), Some("gs://bucket/mom.jpg"));
    assert!(tile.audio_data.is_none());
}

#[test]
fn drop_without_payload_leaves_target_untouched() {
    let mut tile = blank_tile();
    let before = tile.clone();

    let mut transfer = DataTransfer::new();
    transfer.set_data("text/plain", "https://elsewhere.example.com/cat.png");
    assert!(matches!(handle_drop(&transfer, &mut tile), DropOutcome::Ignored));
    assert!(matches!(handle_drop(&DataTransfer::new(), &mut tile), DropOutcome::Ignored));
    assert_eq!(tile, before);
}

#[test]
fn empty_payload_slot_counts_as_absent() {
    let mut step = ScheduleStep::new("s1");
    let before = step.clone();
    let mut transfer = DataTransfer::new();
    transfer.set_data(AAC_TOKEN_SLOT, "");
    assert!(matches!(handle_drop(&transfer, &mut step), DropOutcome::Ignored));
    assert_eq!(step, before);
}

fn rejection(raw: &str, tile: &mut BoardTile) -> DragError {
    let mut transfer = DataTransfer::new();
    transfer.set_data(AAC_TOKEN_SLOT, raw);
    match handle_drop(&transfer, tile) {
        DropOutcome::Rejected(err) => err,
        other => panic!("expected rejection for {raw}, got {other:?}"),
    }
}

#[test]
fn malformed_or_unknown_payloads_are_rejected_without_mutation() {
    let mut tile = blank_tile();
    let before = tile.clone();

    assert!(matches!(rejection("{not json", &mut tile), DragError::Malformed(_)));
    assert!(matches!(
        rejection(
            r#"{"id": "v1", "label": "Clip", "type": "video", "url": "https://x/v.mp4"}"#,
            &mut tile
        ),
        DragError::UnknownType(kind) if kind == "video"
    ));
    assert!(matches!(
        rejection(r#"{"id": "i1", "label": "Nothing", "type": "image"}"#, &mut tile),
        DragError::MissingMediaRef { id } if id == "i1"
    ));
    assert_eq!(tile, before);
}

#[test]
fn audio_envelope_replaces_audio_data_with_full_payload() {
    let payload = AudioPayload {
        id: "hello".to_string(),
        label: "Hello".to_string(),
        audio_text: Some("Hello".to_string()),
        audio_locale_variants: BTreeMap::from([
            ("hi".to_string(), "नमस्ते".to_string()),
            ("ta".to_string(), "வணக்கம்".to_string()),
        ]),
    };
    let mut transfer = DataTransfer::new();
    begin_drag(&mut transfer, &DragEnvelope::Audio(payload.clone())).unwrap();

    let mut tile = blank_tile();
    tile.icon = Some("gs://bucket/old.png".to_string());
    let outcome = handle_drop(&transfer, &mut tile);

    assert!(matches!(outcome, DropOutcome::Applied(MediaType::Audio)));
    assert_eq!(tile.audio_data, Some(payload));
    assert_eq!(tile.icon.as_deref(), Some("gs://bucket/old.png"));
}

#[test]
fn legacy_locale_fields_fold_into_variants() {
    let mut transfer = DataTransfer::new();
    transfer.set_data(
        AAC_TOKEN_SLOT,
        r#"{"id": "water", "label": "Water", "type": "audio", "audioText": "Water", "audioHi": "पानी"}"#,
    );
    let mut step = ScheduleStep::new("s1");
    assert!(handle_drop(&transfer, &mut step).is_applied());

    let audio = step.audio_data.unwrap();
    assert_eq!(audio.text_for_locale("hi"), Some("पानी"));
    assert_eq!(audio.text_for_locale("ta"), Some("Water"));
}

#[test]
fn image_envelope_accepts_either_reference_field() {
    for raw in [
        r#"{"id": "a", "label": "A", "type": "image", "url": "https://cdn/a.png"}"#,
        r#"{"id": "a", "label": "A", "type": "image", "imageRef": "https://cdn/a.png"}"#,
    ] {
        let envelope = DragEnvelope::decode(raw).unwrap();
        assert_eq!(
            envelope,
            DragEnvelope::Image(ImageToken {
                id: "a".to_string(),
                label: "A".to_string(),
                media_ref: "https://cdn/a.png".to_string(),
            })
        );
    }
}

#[test]
fn audio_catalog_phrase_drops_onto_board_tile() {
    let audio = AudioCatalog::from_json_str(
        r#"{"categories": [{"id": "greetings", "items": [
            {"id": "hello", "en": "Hello", "hi": "नमस्ते"}
        ]}]}"#,
    )
    .unwrap();
    let phrase = audio.find("hello").unwrap();

    let mut board = AacBoard::default_for("p1", 1);
    assert!(board.push_tile(ROOT_PAGE_ID, BoardTile::new("t1")));

    let mut transfer = DataTransfer::new();
    begin_drag(&mut transfer, &DragEnvelope::Audio(phrase.to_payload())).unwrap();
    let tile = board.tile_mut(ROOT_PAGE_ID, "t1").unwrap();
    assert!(handle_drop(&transfer, &mut *tile).is_applied());

    let spoken = tile.audio_data.as_ref().unwrap();
    assert_eq!(spoken.spoken_text(), Some("Hello"));
    assert_eq!(spoken.text_for_locale("hi"), Some("नमस्ते"));
}

#[test]
fn legacy_audio_resource_builds_audio_envelope() {
    let catalog = ResourceCatalog::with_default_locale(
        CategorizedCatalog::default(),
        parse_legacy_catalog(r#"[{"id": "r2", "label": "Hello", "type": "audio", "tags": []}]"#)
            .unwrap(),
    );
    let envelope = DragEnvelope::from_resource(catalog.find("r2").unwrap()).unwrap();
    assert_eq!(envelope.media_type(), MediaType::Audio);
    assert_eq!(envelope.id(), "r2");
}
