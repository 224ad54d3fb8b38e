//! Patch generator: turns designer edit requests into text edits against
//! the current model.
//!
//! Nothing here mutates the caller's model. Resolving an owner that does
//! not exist yet creates placeholders on a private copy.

use crate::diff::{ChangeKind, classify};
use formsync_core::consts::{
    LAYOUT_SETTER, is_component_constructor, layout_arg_index, primary_arg_index,
};
use formsync_core::emitter::{
    emit_assignment, emit_call, emit_component, emit_form, format_number,
};
use formsync_core::id::{FullName, Name, dotted, parse_dotted};
use formsync_core::model::{EntityId, Range, SourceModel};
use formsync_core::{LayoutRect, ModelError};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// Replace `[pos, end)` with `new_text`. Offsets are bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub pos: usize,
    pub end: usize,
    pub new_text: String,
}

impl TextEdit {
    pub fn insert(pos: usize, text: impl Into<String>) -> Self {
        Self {
            pos,
            end: pos,
            new_text: text.into(),
        }
    }

    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            pos: range.pos,
            end: range.end,
            new_text: text.into(),
        }
    }

    pub fn delete(range: Range) -> Self {
        Self::replace(range, "")
    }

    pub fn range(&self) -> Range {
        Range::new(self.pos, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error(transparent)]
    NotFound(#[from] ModelError),
    #[error("`{0}` is not a component constructor")]
    UnknownConstructor(String),
    #[error("`{0}` is not a valid form name")]
    InvalidFormName(String),
    #[error("the request produced no edits")]
    EmptyRequest,
}

/// A component the designer wants added.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComponent {
    /// Form or container the component is created on.
    pub owner: String,
    /// Base name; a numeric suffix is appended.
    pub name: String,
    pub constructor: String,
    pub args: Vec<String>,
    pub layout: LayoutRect,
}

// ─── Insert ──────────────────────────────────────────────────────────────

/// A new form declaration at the top of the script.
pub fn insert_form(name: &str) -> Result<Vec<TextEdit>, PatchError> {
    if name.is_empty() || name.contains(['.', ',', ' ']) {
        return Err(PatchError::InvalidFormName(name.to_string()));
    }
    Ok(vec![TextEdit::insert(0, emit_form(name))])
}

pub fn insert_component(
    model: &SourceModel,
    request: &NewComponent,
) -> Result<Vec<TextEdit>, PatchError> {
    if !is_component_constructor(&request.constructor) {
        return Err(PatchError::UnknownConstructor(request.constructor.clone()));
    }

    let owner_name = parse_dotted(&request.owner);
    let mut scratch = Cow::Borrowed(model);
    let owner = match model.find(&owner_name) {
        Ok(id) => id,
        Err(_) => scratch.to_mut().find_or_create(&owner_name),
    };
    let model = scratch.as_ref();

    let name = unique_name(model, &request.name);
    let pos = insertion_point(model, owner);
    log::debug!(
        "insert `{name}` ({}) on `{}` at {pos}",
        request.constructor,
        request.owner
    );

    Ok(vec![TextEdit::insert(
        pos,
        emit_component(
            &name,
            &request.owner,
            &request.constructor,
            &request.args,
            &request.layout,
        ),
    )])
}

/// Smallest `base<n>`, `n >= 1`, that names nothing yet.
fn unique_name(model: &SourceModel, base: &str) -> String {
    let mut n = 1usize;
    loop {
        let candidate = format!("{base}{n}");
        if !model.exists(&[Name::intern(&candidate)]) {
            return candidate;
        }
        n += 1;
    }
}

/// Where new statements for children of `owner` go: before the first call
/// on the enclosing form, so declarations precede behavior, or otherwise
/// right after the last statement belonging to `owner`.
fn insertion_point(model: &SourceModel, owner: EntityId) -> usize {
    let form = if is_form(model, owner) {
        Some(owner)
    } else {
        group_owner(model, owner).filter(|&o| is_form(model, o))
    };

    if let Some(form) = form {
        let first_call = model.variables().iter().copied().find(|&id| {
            let entity = model.entity(id);
            entity.is_function() && entity.owner == Some(form)
        });
        if let Some(call) = first_call {
            return model.entity(call).init_range.pos;
        }
    }

    let owner_end = model.entity(owner).init_range.end;
    subtree(model, owner)
        .into_iter()
        .map(|id| model.entity(id).init_range)
        .filter(|range| !range.is_empty())
        .map(|range| range.end)
        .max()
        .unwrap_or(owner_end)
        .max(owner_end)
}

fn is_form(model: &SourceModel, id: EntityId) -> bool {
    classify(model, id) == ChangeKind::Form
}

fn is_component(model: &SourceModel, id: EntityId) -> bool {
    classify(model, id) == ChangeKind::Component
}

/// The entity a component was created on, or the declaring owner.
fn group_owner(model: &SourceModel, id: EntityId) -> Option<EntityId> {
    let entity = model.entity(id);
    let ctor_owner = entity
        .initializer()
        .and_then(|init| model.entity(init).owner)
        .map(|owner| model.entity(owner).reference().unwrap_or(owner));
    ctor_owner.or(entity.owner)
}

/// Addressable entities belonging to `root`, directly or transitively.
fn subtree(model: &SourceModel, root: EntityId) -> Vec<EntityId> {
    let mut members: HashSet<EntityId> = HashSet::from([root]);
    let mut found = Vec::new();
    for &id in model.variables() {
        if id == root {
            continue;
        }
        let entity = model.entity(id);
        let belongs = [entity.owner, group_owner(model, id)]
            .into_iter()
            .flatten()
            .any(|owner| members.contains(&owner));
        if belongs {
            members.insert(id);
            found.push(id);
        }
    }
    found
}

// ─── Change property ─────────────────────────────────────────────────────

pub fn change_property(
    model: &SourceModel,
    component: &str,
    property: &str,
    value: &str,
) -> Result<Vec<TextEdit>, PatchError> {
    let comp_name = parse_dotted(component);
    let comp = model.find(&comp_name)?;

    // Layout slots and constructor arguments only exist on components.
    if is_component(model, comp) {
        if let Some(slot) = layout_arg_index(property) {
            if let Some(edit) = layout_edit(model, &comp_name, slot, value) {
                return Ok(vec![edit]);
            }
        } else if let Some(index) = primary_arg_index(property) {
            if let Some(ctor) = model.entity(comp).initializer() {
                return Ok(vec![constructor_arg_edit(model, ctor, index, value)]);
            }
        }
    }

    Ok(vec![free_form_edit(model, comp, &comp_name, property, value)])
}

/// Replace one argument of `<component>.SetLayout(...)`. Only the top and
/// width slots carry a leading space.
fn layout_edit(
    model: &SourceModel,
    comp_name: &FullName,
    slot: usize,
    value: &str,
) -> Option<TextEdit> {
    let mut setter = comp_name.clone();
    setter.push(Name::intern(LAYOUT_SETTER));
    let call = model.find_function(&setter)?;
    let arg = *model.entity(call).args().get(slot)?;

    let number = value
        .trim()
        .parse::<f64>()
        .map(format_number)
        .unwrap_or_else(|_| value.to_string());
    let text = if matches!(slot, 1 | 2) {
        format!(" {number}")
    } else {
        number
    };
    Some(TextEdit::replace(model.entity(arg).range, text))
}

/// Set constructor argument `index`. Missing earlier arguments are filled
/// with `''` and everything is inserted before the closing parenthesis.
pub(crate) fn constructor_arg_edit(
    model: &SourceModel,
    ctor: EntityId,
    index: usize,
    value: &str,
) -> TextEdit {
    let call = model.entity(ctor);
    let args = call.args();
    if let Some(&arg) = args.get(index) {
        return TextEdit::replace(model.entity(arg).range, value);
    }

    let mut items = vec!["''".to_string(); index - args.len()];
    items.push(value.to_string());
    let mut text = items.join(", ");
    if !args.is_empty() {
        text = format!(", {text}");
    }
    TextEdit::insert(call.range.end.saturating_sub(1), text)
}

fn free_form_edit(
    model: &SourceModel,
    comp: EntityId,
    comp_name: &FullName,
    property: &str,
    value: &str,
) -> TextEdit {
    let mut prop_name = comp_name.clone();
    prop_name.push(Name::intern(property));
    let target = dotted(&prop_name);

    let Ok(prop) = model.find(&prop_name) else {
        let pos = if is_component(model, comp) {
            insertion_point(model, comp)
        } else {
            model.entity(comp).init_range.end
        };
        return TextEdit::insert(pos, emit_assignment(&target, value));
    };

    let entity = model.entity(prop);
    if let (Some(literal), false) = (entity.value(), entity.is_function()) {
        return TextEdit::replace(literal.range, format!(" {value}"));
    }

    let text = if entity.is_function() {
        emit_call(&target, value)
    } else {
        emit_assignment(&target, value)
    };
    let range = if !entity.init_range.is_empty() {
        entity.init_range
    } else if !entity.range.is_empty() {
        entity.range
    } else {
        let end = model.entity(comp).init_range.end;
        Range::new(end, end)
    };
    TextEdit::replace(range, text)
}

// ─── Delete ──────────────────────────────────────────────────────────────

/// Delete the component and, transitively, everything related to it.
pub fn delete_component(
    model: &SourceModel,
    component: &str,
) -> Result<Vec<TextEdit>, PatchError> {
    let root = parse_dotted(component);
    model.find(&root)?;

    let mut queue: VecDeque<FullName> = VecDeque::from([root.clone()]);
    let mut queued: HashSet<FullName> = HashSet::from([root]);
    let mut collected: Vec<EntityId> = Vec::new();
    let mut seen: HashSet<EntityId> = HashSet::new();

    while let Some(query) = queue.pop_front() {
        for &id in model.variables() {
            if seen.contains(&id) || !model.related_to(id, &query) {
                continue;
            }
            seen.insert(id);
            collected.push(id);
            if !model.entity(id).is_function() {
                let name = model.full_name(id, true);
                if queued.insert(name.clone()) {
                    queue.push_back(name);
                }
            }
        }
    }

    let mut ranges: HashSet<Range> = HashSet::new();
    let edits: Vec<TextEdit> = collected
        .into_iter()
        .map(|id| model.entity(id).init_range)
        .filter(|range| !range.is_empty() && ranges.insert(*range))
        .map(TextEdit::delete)
        .collect();
    log::debug!("delete `{component}`: {} edits", edits.len());
    Ok(edits)
}

/// Apply edits to `text`, last position first so earlier offsets stay
/// valid. Edits at the same position land in list order.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut ordered: Vec<&TextEdit> = edits.iter().rev().collect();
    ordered.sort_by(|a, b| b.pos.cmp(&a.pos));

    let mut out = text.to_string();
    for edit in ordered {
        let end = edit.end.min(out.len());
        let pos = edit.pos.min(end);
        out.replace_range(pos..end, &edit.new_text);
    }
    out
}
