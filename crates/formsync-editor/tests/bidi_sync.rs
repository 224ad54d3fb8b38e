//! Integration tests: sync engine round trips (formsync-editor ↔ formsync-core).
//!
//! Text changes flow out as per-form change logs; designer requests flow
//! back as text edits that, once applied, show up in the next change log.

use formsync_core::id::{dotted, parse_dotted};
use formsync_core::{Name, build_source};
use formsync_editor::{ChangeKind, ChangeState, SyncConfig, SyncEngine, diff_models};
use pretty_assertions::assert_eq;

fn engine() -> SyncEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let input = include_str!("fixtures/settings_form.js");
    let (engine, update) =
        SyncEngine::from_text("settings_form.js", input, SyncConfig::default()).unwrap();
    assert!(update.diagnostics.is_empty(), "{:?}", update.diagnostics);
    engine
}

// ─── Text → Designer ────────────────────────────────────────────────────

#[test]
fn caption_edit_yields_single_modified_value() {
    let first = build_source(r#"let f = NewForm(); f.Caption = "a";"#, "s.js")
        .unwrap()
        .model;
    let same = diff_models(Some(&first), &first);
    assert!(same.forms.form_update("f").is_empty());

    let second = build_source(r#"let f = NewForm(); f.Caption = "b";"#, "s.js")
        .unwrap()
        .model;
    let diff = diff_models(Some(&first), &second);
    let view = diff.forms.form_update("f");

    assert_eq!(view.changes.len(), 1);
    let change = &view.changes[0];
    assert_eq!(change.kind, ChangeKind::Value);
    assert_eq!(change.name, Name::intern("Caption"));
    assert_eq!(change.state, ChangeState::Modified);
    assert_eq!(change.value.as_deref(), Some("b"));
    assert_eq!(change.owner, parse_dotted("f"));
}

#[test]
fn open_form_sends_every_member() {
    let mut engine = engine();
    assert_eq!(engine.form_names(), vec!["Settings".to_string()]);

    let view = engine.open_form("Settings").unwrap();
    let names: Vec<_> = view.changes.iter().map(|c| dotted(&c.full_name)).collect();
    assert_eq!(
        names,
        vec![
            "Settings",
            "Settings.Caption",
            "Settings.Position",
            "Units",
            "Units.SetLayout",
            "Panel",
            "Panel.SetLayout",
            "Panel.Color",
            "Panel.Inner",
            "Panel.Inner.Scale",
            "Zoom",
            "Zoom.SetLayout",
            "Settings.Show",
        ]
    );
    assert!(view.changes.iter().all(|c| c.state == ChangeState::Created));
}

#[test]
fn text_edit_reaches_designer_as_update() {
    let mut engine = engine();
    engine.open_form("Settings").unwrap();

    let text = engine.text().replace("Units.SetLayout(8, 8,", "Units.SetLayout(8, 12,");
    let update = engine.set_text(&text).unwrap();
    let json = engine
        .outbound_update(&update.forms)
        .unwrap()
        .expect("update message");
    let message: serde_json::Value = serde_json::from_str(&json).unwrap();

    let changes = message["info"]["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0]["fullName"], serde_json::json!(["Units", "SetLayout"]));
    assert_eq!(changes[0]["args"][1]["state"], "modified");
    assert_eq!(changes[0]["args"][1]["value"], "12");
}

// ─── Designer → Text ────────────────────────────────────────────────────

#[test]
fn property_change_round_trip() {
    let mut engine = engine();
    let edits = engine
        .handle_message(
            r#"{"type":"componentschanges","filename":"settings_form.js",
                "message":[{"component":"Units","property":"Top","value":30},
                           {"component":"Units","property":"Caption","value":"\"Unit\""}]}"#,
        )
        .unwrap();
    assert_eq!(edits.len(), 2);

    engine.apply_edits(&edits).unwrap();
    assert!(engine.text().contains("let Units = Settings.NewCombo(\"Unit\");"));
    assert!(engine.text().contains("Units.SetLayout(8, 30, 120, 22);"));
}

#[test]
fn new_component_lands_before_form_calls() {
    let mut engine = engine();
    engine.open_form("Settings").unwrap();
    let edits = engine
        .handle_message(
            r#"{"type":"newcomponent","filename":"settings_form.js","message":{
                "name":"Button","type":"NewButton","owner":"Panel","args":["\"Reset\""],
                "layout":{"left":8,"top":48,"width":80,"height":24}}}"#,
        )
        .unwrap();

    let update = engine.apply_edits(&edits).unwrap();
    let text = engine.text();
    let inserted = text.find("let Button1 = Panel.NewButton(\"Reset\");").unwrap();
    assert!(inserted < text.find("Settings.Show();").unwrap());
    assert!(text.contains("Button1.SetLayout(8, 48, 80, 24);"));

    let view = update.forms.form_update("Settings");
    let created: Vec<_> = view
        .changes
        .iter()
        .map(|c| (dotted(&c.full_name), c.state))
        .collect();
    assert_eq!(
        created,
        vec![
            ("Button1".to_string(), ChangeState::Created),
            ("Button1.SetLayout".to_string(), ChangeState::Created),
        ]
    );
    assert_eq!(view.changes[0].component_owner, Some(parse_dotted("Panel")));
}

#[test]
fn delete_group_removes_nested_members() {
    let mut engine = engine();
    engine.open_form("Settings").unwrap();
    let edits = engine
        .handle_message(
            r#"{"type":"deletecomponent","filename":"settings_form.js",
                "message":[{"fullname":"Panel"}]}"#,
        )
        .unwrap();
    let update = engine.apply_edits(&edits).unwrap();

    let text = engine.text();
    assert!(!text.contains("Panel"));
    assert!(!text.contains("Zoom"));
    assert!(text.contains("Units.SetLayout(8, 8, 120, 22);"));
    assert!(text.contains("Settings.Show();"));

    let view = update.forms.form_update("Settings");
    assert!(view.changes.iter().all(|c| c.state == ChangeState::Deleted));
    let deleted: Vec<_> = view.changes.iter().map(|c| dotted(&c.full_name)).collect();
    assert!(deleted.contains(&"Zoom".to_string()));
    assert!(deleted.contains(&"Panel.Inner.Scale".to_string()));
}
