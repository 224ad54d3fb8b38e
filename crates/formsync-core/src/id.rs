use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for identifier segments; keeps comparisons cheap.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A single interned identifier segment (`Button1`, `Caption`, `SetLayout`).
/// Internally a `Spur` index, so it is `Copy` and hashes in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name(Spur);

impl Name {
    /// Intern a segment, or return the existing handle if already interned.
    pub fn intern(s: &str) -> Self {
        Name(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// The empty name carried by anonymous entities (literals, call arguments).
    pub fn anonymous() -> Self {
        Self::intern("")
    }

    pub fn is_anonymous(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Name::intern(&s))
    }
}

/// Ordered identifier segments from the model root down to an entity.
pub type FullName = SmallVec<[Name; 4]>;

/// Split a dotted path (`Form1.Button1.Caption`) into interned segments.
pub fn parse_dotted(path: &str) -> FullName {
    path.split('.').map(Name::intern).collect()
}

/// Join segments back into a dotted path.
pub fn dotted(name: &[Name]) -> String {
    let mut out = String::new();
    for (i, segment) in name.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(segment.as_str());
    }
    out
}

/// Segments as owned strings, the shape the designer protocol expects.
pub fn to_strings(name: &[Name]) -> Vec<String> {
    name.iter().map(|s| s.as_str().to_string()).collect()
}

/// True iff `ancestor` is a strict, contiguous prefix of `name`.
pub fn is_ancestor_name(ancestor: &[Name], name: &[Name]) -> bool {
    name.len() > ancestor.len() && name.starts_with(ancestor)
}

/// True iff `name` equals `scope` or lies underneath it.
pub fn is_within(name: &[Name], scope: &[Name]) -> bool {
    name == scope || is_ancestor_name(scope, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = Name::intern("Button1");
        let b = Name::intern("Button1");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "Button1");
    }

    #[test]
    fn dotted_roundtrip() {
        let name = parse_dotted("Form1.Button1.Caption");
        assert_eq!(name.len(), 3);
        assert_eq!(dotted(&name), "Form1.Button1.Caption");
    }

    #[test]
    fn ancestor_is_strict_prefix() {
        let form = parse_dotted("Form1");
        let caption = parse_dotted("Form1.Caption");
        let other = parse_dotted("Form2.Caption");

        assert!(is_ancestor_name(&form, &caption));
        assert!(!is_ancestor_name(&caption, &form));
        assert!(!is_ancestor_name(&form, &form));
        assert!(!is_ancestor_name(&form, &other));
        assert!(is_within(&form, &form));
        assert!(is_within(&caption, &form));
    }

    #[test]
    fn equality_is_order_and_length_sensitive() {
        assert_ne!(parse_dotted("a.b"), parse_dotted("b.a"));
        assert_ne!(parse_dotted("a.b"), parse_dotted("a.b.c"));
    }
}
