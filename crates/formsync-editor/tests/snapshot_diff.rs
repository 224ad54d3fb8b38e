//! Integration tests: snapshot differ over whole scripts.

use formsync_core::id::dotted;
use formsync_core::{SourceModel, build_source};
use formsync_editor::{ChangeKind, ChangeState, diff_models};
use pretty_assertions::assert_eq;

fn model(src: &str) -> SourceModel {
    build_source(src, "form.js").expect("parse failed").model
}

#[test]
fn identical_models_produce_no_changes() {
    let m = model(include_str!("fixtures/settings_form.js"));
    let diff = diff_models(Some(&m), &m.clone());
    assert!(diff.forms.is_unchanged());
    assert_eq!(diff.forms.changes.len(), m.variables().len());
}

#[test]
fn created_then_deleted() {
    let x = model("let f = NewForm();\nf.Caption = 'x';");
    let empty = model("");

    let created = diff_models(None, &x);
    let states: Vec<_> = created
        .forms
        .changes
        .iter()
        .map(|c| (dotted(&c.full_name), c.state))
        .collect();
    assert_eq!(
        states,
        vec![
            ("f".to_string(), ChangeState::Created),
            ("f.Caption".to_string(), ChangeState::Created)
        ]
    );

    let deleted = diff_models(Some(&x), &empty);
    let states: Vec<_> = deleted
        .forms
        .changes
        .iter()
        .map(|c| (dotted(&c.full_name), c.state))
        .collect();
    assert_eq!(
        states,
        vec![
            ("f".to_string(), ChangeState::Deleted),
            ("f.Caption".to_string(), ChangeState::Deleted)
        ]
    );
    // Deleted records still route to their form.
    assert_eq!(deleted.forms.form_update("f").changes.len(), 2);
}

#[test]
fn reference_modified_only_when_target_changes() {
    let old = model("let f = NewForm();\nlet g = NewForm();\nlet h = NewForm();\nf.Next = g;");
    let same = model("let f = NewForm();\nlet g = NewForm();\nlet h = NewForm();\n\n\nf.Next = g;");
    let moved = model("let f = NewForm();\nlet g = NewForm();\nlet h = NewForm();\nf.Next = h;");

    assert!(diff_models(Some(&old), &same).forms.is_unchanged());

    let diff = diff_models(Some(&old), &moved);
    let next = diff
        .forms
        .changes
        .iter()
        .find(|c| dotted(&c.full_name) == "f.Next")
        .unwrap();
    assert_eq!(next.kind, ChangeKind::Reference);
    assert_eq!(next.state, ChangeState::Modified);
}

#[test]
fn forward_reference_resolves_to_later_declaration() {
    let m = model("let f = NewForm();\nf.Default = ok;\nlet ok = f.NewButton('OK');");
    let diff = diff_models(None, &m);
    let default = diff
        .forms
        .changes
        .iter()
        .find(|c| dotted(&c.full_name) == "f.Default")
        .unwrap();
    assert_eq!(default.kind, ChangeKind::Reference);
    assert_eq!(default.reference.as_deref().map(dotted), Some("ok".to_string()));
    // The placeholder for `ok` does not show up as its own record.
    let oks = diff
        .forms
        .changes
        .iter()
        .filter(|c| dotted(&c.full_name) == "ok")
        .count();
    assert_eq!(oks, 1);
}

#[test]
fn changed_constructor_modifies_component() {
    let old = model("let f = NewForm();\nlet c = f.NewButton('x');");
    let new = model("let f = NewForm();\nlet c = f.NewLabel('x');");
    let diff = diff_models(Some(&old), &new);
    let c = diff
        .forms
        .changes
        .iter()
        .find(|c| dotted(&c.full_name) == "c")
        .unwrap();
    assert_eq!(c.kind, ChangeKind::Component);
    assert_eq!(c.state, ChangeState::Modified);
}

#[test]
fn diff_leaves_input_models_untouched() {
    let old = model("let a = later;\nlet later = 1;");
    let new = model("let a = later;\nlet later = 2;");
    let (old_copy, new_copy) = (old.clone(), new.clone());
    let _ = diff_models(Some(&old), &new);
    assert_eq!(old, old_copy);
    assert_eq!(new, new_copy);
}
