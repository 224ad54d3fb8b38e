//! Static symbol tables: widget constructors, argument slots, and the
//! symbolic enumerations a script may reference.

/// The call that creates a form.
pub const FORM_CONSTRUCTOR: &str = "NewForm";

/// Statement-level call that places a component: `b.SetLayout(l, t, w, h)`.
pub const LAYOUT_SETTER: &str = "SetLayout";

/// Widget factories, called on a form or container: `f.NewButton(...)`.
pub const COMPONENT_CONSTRUCTORS: &[&str] = &[
    "NewButton",
    "NewNumber",
    "NewBool",
    "NewString",
    "NewCombo",
    "NewGroup",
    "NewImage",
    "NewSelector",
    "NewMaterial",
    "NewButt",
    "NewFurniture",
    "NewLabel",
    "NewColor",
    "NewSeparator",
];

/// Argument slots of the layout setter.
const LAYOUT_SLOTS: &[&str] = &["Left", "Top", "Width", "Height"];

/// Properties passed positionally to a component constructor.
const PRIMARY_ARGS: &[(&str, usize)] = &[("Caption", 0)];

/// Closed enumerations; a member resolves to its zero-based ordinal.
const ENUMS: &[(&str, &[&str])] = &[
    ("AlignmentType", &["Left", "Right", "Center"]),
    ("AlignType", &["None", "Top", "Bottom", "Left", "Right", "Client"]),
    ("WindowPosition", &["Default", "Left", "Right"]),
];

pub fn is_component_constructor(name: &str) -> bool {
    COMPONENT_CONSTRUCTORS.contains(&name)
}

pub fn is_form_constructor(name: &str) -> bool {
    name == FORM_CONSTRUCTOR
}

/// Argument index of a layout property inside the `SetLayout` call.
pub fn layout_arg_index(property: &str) -> Option<usize> {
    LAYOUT_SLOTS.iter().position(|slot| *slot == property)
}

/// Constructor argument index a property is passed at, if any.
pub fn primary_arg_index(property: &str) -> Option<usize> {
    PRIMARY_ARGS
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, index)| *index)
}

/// Resolve `Enum.Member` to its ordinal, as decimal text.
pub fn resolve_constant(dotted: &str) -> Option<String> {
    let (enum_name, member) = dotted.split_once('.')?;
    let (_, members) = ENUMS.iter().find(|(name, _)| *name == enum_name)?;
    members
        .iter()
        .position(|m| *m == member)
        .map(|ordinal| ordinal.to_string())
}
