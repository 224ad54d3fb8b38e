//! Snapshot differ: compares two builds of the same script and classifies
//! every name-addressable entity as unchanged, created, modified or deleted.
//!
//! Entities are matched by full dotted name. The new model's entities form
//! a pool; each old entity takes the first pool entry with the same name
//! (or is reported deleted), and whatever is left in the pool was created.
//! Call arguments are matched with the same rule, which pairs them up
//! position by position since arguments are anonymous.
//!
//! Both models are snapshotted first, so the caller's models are never
//! touched.

use formsync_core::consts::{is_component_constructor, is_form_constructor};
use formsync_core::diagnostic::Diagnostic;
use formsync_core::id::{FullName, Name, dotted, is_within, parse_dotted};
use formsync_core::model::{EntityId, EntityKind, SourceModel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ─── Change records ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeState {
    Unchanged,
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Value,
    Reference,
    Function,
    Object,
    Component,
    Form,
}

/// One diffed entity, carrying the attributes of its newest version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub kind: ChangeKind,
    pub state: ChangeState,
    pub name: Name,
    pub full_name: FullName,
    /// Dotted name of the declaring owner; empty at top level.
    #[serde(default, skip_serializing_if = "is_root")]
    pub owner: FullName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Dereferenced target of a Reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<FullName>,
    /// Constructor of a component or form (`NewButton`, `NewForm`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor: Option<Name>,
    /// The form or container the constructor was called on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_owner: Option<FullName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Change>,
}

fn is_root(name: &FullName) -> bool {
    name.is_empty()
}

impl Change {
    /// The name a per-form view routes this record by.
    pub fn group_owner(&self) -> &FullName {
        match (&self.kind, &self.component_owner) {
            (ChangeKind::Component, Some(owner)) => owner,
            _ => &self.owner,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.state == ChangeState::Unchanged
    }
}

/// The full change log of one diff, in discovery order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Forms {
    pub changes: Vec<Change>,
}

/// The part of a change log that concerns one form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormChange {
    pub name: String,
    pub changes: Vec<Change>,
}

impl FormChange {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl Forms {
    /// Full names of the forms still present, in discovery order.
    pub fn form_names(&self) -> Vec<String> {
        self.changes
            .iter()
            .filter(|c| c.kind == ChangeKind::Form && c.state != ChangeState::Deleted)
            .map(|c| dotted(&c.full_name))
            .collect()
    }

    /// Records belonging to `form`: the form itself, everything whose owner
    /// path lies within the form, and everything owned by a record already
    /// kept. Unchanged records are dropped.
    pub fn form_update(&self, form: &str) -> FormChange {
        let form_name = parse_dotted(form);
        let mut kept: Vec<&Change> = Vec::new();
        let mut kept_names: HashSet<&FullName> = HashSet::new();

        for change in &self.changes {
            let is_form = change.kind == ChangeKind::Form && change.full_name == form_name;
            let group = change.group_owner();
            let owned = !group.is_empty()
                && (is_within(group, &form_name) || kept_names.contains(group));
            if is_form || owned {
                kept.push(change);
                kept_names.insert(&change.full_name);
            }
        }

        FormChange {
            name: form.to_string(),
            changes: kept
                .into_iter()
                .filter(|c| !c.is_unchanged())
                .cloned()
                .collect(),
        }
    }

    /// True when nothing was created, modified or deleted.
    pub fn is_unchanged(&self) -> bool {
        self.changes.iter().all(Change::is_unchanged)
    }
}

/// Change log plus the diagnostics raised while computing it.
#[derive(Debug, Clone, Default)]
pub struct Diff {
    pub forms: Forms,
    pub diagnostics: Vec<Diagnostic>,
}

// ─── Diff ────────────────────────────────────────────────────────────────

/// Diff `new` against `old`, or against nothing when `old` is `None`.
#[must_use]
pub fn diff_models(old: Option<&SourceModel>, new: &SourceModel) -> Diff {
    let old = old.map(SourceModel::snapshot);
    let new = new.snapshot();
    let mut diagnostics = duplicate_warnings(&new);

    let mut pool: Vec<EntityId> = new.variables().to_vec();
    let mut changes = Vec::new();

    if let Some(old) = &old {
        for &old_id in old.variables() {
            let name = old.full_name(old_id, false);
            match pool
                .iter()
                .position(|&id| new.full_name(id, false) == name)
            {
                Some(i) => {
                    let new_id = pool.remove(i);
                    changes.push(diff_pair(old, old_id, &new, new_id));
                }
                None => changes.push(record(old, old_id, ChangeState::Deleted)),
            }
        }
    }
    changes.extend(pool.into_iter().map(|id| record(&new, id, ChangeState::Created)));

    let forms = Forms { changes };
    let changed = forms.changes.iter().filter(|c| !c.is_unchanged()).count();
    log::debug!(
        "{}: diff {} records, {changed} changed",
        new.file_name,
        forms.changes.len()
    );
    if old.is_none() && forms.changes.is_empty() {
        diagnostics.push(Diagnostic::warning(
            new.range,
            "empty-model",
            "script declares nothing the designer can show",
        ));
    }

    Diff { forms, diagnostics }
}

/// Object classes the designer distinguishes.
pub(crate) fn classify(model: &SourceModel, id: EntityId) -> ChangeKind {
    let entity = model.entity(id);
    match entity.kind() {
        EntityKind::Value => ChangeKind::Value,
        EntityKind::Reference => ChangeKind::Reference,
        EntityKind::Function => ChangeKind::Function,
        EntityKind::Object => {
            let Some(init) = entity.initializer() else {
                return ChangeKind::Object;
            };
            let name = model.full_name(init, false);
            match name.as_slice() {
                [only] if is_form_constructor(only.as_str()) => ChangeKind::Form,
                [.., last] if is_component_constructor(last.as_str()) => ChangeKind::Component,
                _ => ChangeKind::Object,
            }
        }
    }
}

/// The call whose arguments describe the entity: its own for a Function,
/// its constructor's for a component or form.
fn argument_source(model: &SourceModel, id: EntityId, kind: ChangeKind) -> Option<EntityId> {
    match kind {
        ChangeKind::Function => Some(id),
        ChangeKind::Component | ChangeKind::Form => model.entity(id).initializer(),
        _ => None,
    }
}

/// Record of a single entity in the given state, with its arguments
/// recorded in the same state.
fn record(model: &SourceModel, id: EntityId, state: ChangeState) -> Change {
    let kind = classify(model, id);
    let entity = model.entity(id);

    let mut change = Change {
        kind,
        state,
        name: entity.name,
        full_name: model.full_name(id, false),
        owner: entity
            .owner
            .map(|owner| model.full_name(owner, false))
            .unwrap_or_default(),
        value: entity.value().map(|literal| literal.text.clone()),
        reference: entity.reference().map(|_| model.full_name(id, true)),
        constructor: None,
        component_owner: None,
        args: Vec::new(),
    };

    if matches!(kind, ChangeKind::Component | ChangeKind::Form) {
        if let Some(init) = entity.initializer() {
            let ctor = model.entity(init);
            change.constructor = Some(ctor.name);
            change.component_owner = ctor.owner.map(|owner| model.full_name(owner, true));
        }
    }
    if let Some(call) = argument_source(model, id, kind) {
        change.args = model
            .entity(call)
            .args()
            .iter()
            .map(|&arg| record(model, arg, state))
            .collect();
    }
    change
}

fn diff_pair(old: &SourceModel, old_id: EntityId, new: &SourceModel, new_id: EntityId) -> Change {
    let mut change = record(new, new_id, ChangeState::Unchanged);
    let old_kind = classify(old, old_id);

    if let (Some(old_call), Some(new_call)) = (
        argument_source(old, old_id, old_kind),
        argument_source(new, new_id, change.kind),
    ) {
        change.args = diff_args(old, old.entity(old_call).args(), new, new.entity(new_call).args());
    }

    let modified = if old_kind != change.kind {
        true
    } else {
        match change.kind {
            ChangeKind::Value => {
                old.entity(old_id).value().map(|l| l.text.as_str()) != change.value.as_deref()
            }
            ChangeKind::Reference => Some(old.full_name(old_id, true)) != change.reference,
            ChangeKind::Function => args_changed(&change.args),
            ChangeKind::Component | ChangeKind::Form => {
                let old_ctor = old.entity(old_id).initializer().map(|init| old.entity(init));
                old_ctor.map(|c| c.name) != change.constructor
                    || old_ctor
                        .and_then(|c| c.owner)
                        .map(|owner| old.full_name(owner, true))
                        != change.component_owner
                    || args_changed(&change.args)
            }
            ChangeKind::Object => false,
        }
    };
    if modified {
        change.state = ChangeState::Modified;
    }
    change
}

/// Arguments pair up by name with the same pool rule as entities. Unchanged
/// arguments stay in the list so positions remain complete.
fn diff_args(
    old: &SourceModel,
    old_args: &[EntityId],
    new: &SourceModel,
    new_args: &[EntityId],
) -> Vec<Change> {
    let mut pool: Vec<EntityId> = new_args.to_vec();
    let mut changes = Vec::new();
    for &old_arg in old_args {
        let name = old.full_name(old_arg, false);
        match pool.iter().position(|&id| new.full_name(id, false) == name) {
            Some(i) => {
                let new_arg = pool.remove(i);
                changes.push(diff_pair(old, old_arg, new, new_arg));
            }
            None => changes.push(record(old, old_arg, ChangeState::Deleted)),
        }
    }
    changes.extend(pool.into_iter().map(|id| record(new, id, ChangeState::Created)));
    changes
}

fn args_changed(args: &[Change]) -> bool {
    args.iter().any(|arg| !arg.is_unchanged())
}

/// Only the first of several same-named entities is compared by name.
fn duplicate_warnings(model: &SourceModel) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    let mut warnings = Vec::new();
    for &id in model.variables() {
        let entity = model.entity(id);
        if entity.is_function() {
            continue;
        }
        let name = model.full_name(id, false);
        if !seen.insert(name.clone()) {
            warnings.push(Diagnostic::warning(
                entity.range,
                "duplicate-name",
                format!("`{}` is declared more than once", dotted(&name)),
            ));
        }
    }
    warnings
}
