//! Semantic object model for one source unit.
//!
//! Entities live in an arena (`Vec<Entity>`) addressed by [`EntityId`].
//! Ownership is an explicit `owner` handle rather than tree containment, so
//! the dotted full name of an entity is rebuilt by walking its owner chain.
//! The model also keeps a flat, ordered list of the name-addressable
//! entities (`variables`): declarations, assigned properties, statement-level
//! calls, and the placeholders that forward references create.

use crate::error::ModelError;
use crate::id::{FullName, Name, dotted, is_within};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Half-open `[pos, end)` byte span over the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub pos: usize,
    pub end: usize,
}

impl Range {
    pub const fn new(pos: usize, end: usize) -> Self {
        Self { pos, end }
    }

    /// The unset span `0..0`. A span that merely has `pos == end` elsewhere
    /// in the file is an insertion point, not empty.
    pub fn is_empty(&self) -> bool {
        self.pos == 0 && self.end == 0
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.pos)
    }

    /// The covered text, or `""` if the span falls outside `text`.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.pos..self.end).unwrap_or("")
    }
}

/// Stable handle into a [`SourceModel`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A literal's text plus the span of its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub text: String,
    pub range: Range,
}

/// What an entity was bound to when it was declared or assigned.
/// Decided once, from the parse context, and never re-tagged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Binding {
    #[default]
    Unset,
    /// A literal or a resolved symbolic constant.
    Value(Literal),
    /// An alias for another name-addressable entity.
    Reference(EntityId),
    /// The call (or object) that produced this entity.
    Initializer(EntityId),
}

/// Positional arguments of one call site.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Call {
    pub args: Vec<EntityId>,
}

/// Derived classification of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Object,
    Value,
    Reference,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub name: Name,
    pub owner: Option<EntityId>,
    /// Span of the node that declared or assigned the entity.
    pub range: Range,
    /// Span of the whole declaring statement, trailing terminator included.
    pub init_range: Range,
    pub binding: Binding,
    /// Present on call sites only.
    pub call: Option<Call>,
}

impl Entity {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            owner: None,
            range: Range::default(),
            init_range: Range::default(),
            binding: Binding::Unset,
            call: None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        if self.call.is_some() {
            return EntityKind::Function;
        }
        match self.binding {
            Binding::Value(_) => EntityKind::Value,
            Binding::Reference(_) => EntityKind::Reference,
            Binding::Unset | Binding::Initializer(_) => EntityKind::Object,
        }
    }

    pub fn is_function(&self) -> bool {
        self.call.is_some()
    }

    pub fn value(&self) -> Option<&Literal> {
        match &self.binding {
            Binding::Value(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn reference(&self) -> Option<EntityId> {
        match self.binding {
            Binding::Reference(target) => Some(target),
            _ => None,
        }
    }

    pub fn initializer(&self) -> Option<EntityId> {
        match self.binding {
            Binding::Initializer(init) => Some(init),
            _ => None,
        }
    }

    pub fn args(&self) -> &[EntityId] {
        self.call.as_ref().map_or(&[], |call| call.args.as_slice())
    }
}

/// All entities found in one source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceModel {
    pub file_name: String,
    /// Span of the whole file.
    pub range: Range,
    entities: Vec<Entity>,
    variables: Vec<EntityId>,
}

impl SourceModel {
    pub fn new(file_name: impl Into<String>, range: Range) -> Self {
        Self {
            file_name: file_name.into(),
            range,
            entities: Vec::new(),
            variables: Vec::new(),
        }
    }

    // ─── Arena ───────────────────────────────────────────────────────────

    /// Add an entity to the arena. It is not name-addressable until it is
    /// pushed with [`SourceModel::push_variable`].
    pub fn alloc(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(entity);
        id
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.index()]
    }

    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.index()]
    }

    pub fn push_variable(&mut self, id: EntityId) {
        self.variables.push(id);
    }

    /// Name-addressable entities, in discovery order.
    pub fn variables(&self) -> &[EntityId] {
        &self.variables
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // ─── Names ───────────────────────────────────────────────────────────

    /// Dotted name from the root down to `id`. With `deref`, a Reference
    /// entity answers with its target's name instead.
    pub fn full_name(&self, id: EntityId, deref: bool) -> FullName {
        let mut id = id;
        if deref {
            if let Some(target) = self.entity(id).reference() {
                id = target;
            }
        }

        let mut segments = FullName::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            // Owner links never form cycles in a built model; stop anyway
            // once every entity has been visited.
            if segments.len() > self.entities.len() {
                break;
            }
            let entity = self.entity(current);
            segments.push(entity.name);
            cursor = entity.owner;
        }
        segments.reverse();
        segments
    }

    pub fn dotted_name(&self, id: EntityId, deref: bool) -> String {
        dotted(&self.full_name(id, deref))
    }

    /// Strict lookup: the first name-addressable entity whose full name is
    /// exactly `name`.
    pub fn find(&self, name: &[Name]) -> Result<EntityId, ModelError> {
        self.variables
            .iter()
            .copied()
            .find(|&id| self.full_name(id, false).as_slice() == name)
            .ok_or_else(|| ModelError::NotFound(dotted(name)))
    }

    pub fn exists(&self, name: &[Name]) -> bool {
        self.find(name).is_ok()
    }

    /// Lookup that synthesizes a placeholder for every missing prefix of
    /// `name`. A placeholder inherits its owner's spans (the file span at
    /// top level) until a declaration or assignment overwrites them.
    pub fn find_or_create(&mut self, name: &[Name]) -> EntityId {
        let mut owner: Option<EntityId> = None;
        for depth in 1..=name.len() {
            let prefix = &name[..depth];
            let id = match self.find(prefix) {
                Ok(id) => id,
                Err(_) => {
                    let (range, init_range) = match owner {
                        Some(owner) => {
                            let owner = self.entity(owner);
                            (owner.range, owner.init_range)
                        }
                        None => (self.range, self.range),
                    };
                    let id = self.alloc(Entity {
                        owner,
                        range,
                        init_range,
                        ..Entity::new(name[depth - 1])
                    });
                    self.push_variable(id);
                    log::trace!("placeholder `{}`", dotted(prefix));
                    id
                }
            };
            owner = Some(id);
        }
        // An empty name resolves to a fresh anonymous entity.
        match owner {
            Some(id) => id,
            None => self.alloc(Entity::new(Name::anonymous())),
        }
    }

    /// First statement-level call with this full name.
    pub fn find_function(&self, name: &[Name]) -> Option<EntityId> {
        self.variables.iter().copied().find(|&id| {
            self.entity(id).is_function() && self.full_name(id, false).as_slice() == name
        })
    }

    /// True iff the entity's dereferenced name is `query` or lies below it,
    /// or the same holds for the owner of its initializer.
    pub fn related_to(&self, id: EntityId, query: &[Name]) -> bool {
        if is_within(&self.full_name(id, true), query) {
            return true;
        }
        self.entity(id)
            .initializer()
            .and_then(|init| self.entity(init).owner)
            .is_some_and(|owner| is_within(&self.full_name(owner, true), query))
    }

    /// Drop placeholders that were never declared or assigned.
    pub fn prune(&mut self) {
        let file_range = self.range;
        let entities = &self.entities;
        self.variables.retain(|id| {
            let range = entities[id.index()].range;
            !range.is_empty() && range != file_range
        });
    }

    /// Deep copy whose owner and reference links are re-resolved by full
    /// name against the copy. A link whose target is no longer
    /// name-addressable keeps pointing at its detached arena copy.
    pub fn snapshot(&self) -> SourceModel {
        let mut by_name: HashMap<FullName, EntityId> = HashMap::new();
        for &id in &self.variables {
            by_name.entry(self.full_name(id, false)).or_insert(id);
        }
        let addressable: HashSet<EntityId> =
            self.variables.iter().copied().collect();

        let resolve = |target: EntityId| -> EntityId {
            if addressable.contains(&target) {
                return target;
            }
            by_name
                .get(&self.full_name(target, false))
                .copied()
                .unwrap_or(target)
        };

        let mut copy = self.clone();
        for entity in &mut copy.entities {
            if let Some(owner) = entity.owner {
                entity.owner = Some(resolve(owner));
            }
            if let Binding::Reference(target) = entity.binding {
                entity.binding = Binding::Reference(resolve(target));
            }
        }
        copy
    }
}
