//! Structured values produced by resolution.

use super::{NativeValue, Scalar};

/// A resolved value: plain data with no native indirection left in it.
///
/// `Unresolved` carries a native value the resolver could not interpret
/// (a union without a known discriminant). It passes through unchanged and
/// is accepted back as-is by the record marshaler.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    /// Null pointer.
    Absent,
    Scalar(Scalar),
    /// Contents of a scalar array.
    Bytes(Vec<u8>),
    Sequence(Vec<ResolvedValue>),
    Mapping(Mapping),
    Unresolved(NativeValue),
}

impl ResolvedValue {
    /// Whether this is [`ResolvedValue::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Whether resolution stopped at an untagged union.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved(_))
    }

    /// The scalar, if this is one.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    /// The bytes, if this is a copied scalar array.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The elements, if this is a sequence.
    pub fn as_sequence(&self) -> Option<&[ResolvedValue]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// The mapping, if this is one.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Look up `key` when this is a mapping.
    pub fn get(&self, key: &str) -> Option<&ResolvedValue> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Short kind name used in error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Self::Absent => "absent".to_string(),
            Self::Scalar(s) => s.kind().name().to_string(),
            Self::Bytes(b) => format!("bytes[{}]", b.len()),
            Self::Sequence(items) => format!("sequence[{}]", items.len()),
            Self::Mapping(_) => "mapping".to_string(),
            Self::Unresolved(v) => format!("unresolved {}", v.kind_name()),
        }
    }
}

impl From<Scalar> for ResolvedValue {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<Mapping> for ResolvedValue {
    fn from(m: Mapping) -> Self {
        Self::Mapping(m)
    }
}

impl From<Vec<u8>> for ResolvedValue {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<ResolvedValue>> for ResolvedValue {
    fn from(items: Vec<ResolvedValue>) -> Self {
        Self::Sequence(items)
    }
}

/// An ordered name-to-value mapping.
///
/// Keys keep insertion order, which for resolved records is the field
/// declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mapping {
    entries: Vec<(String, ResolvedValue)>,
}

impl Mapping {
    /// An empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ResolvedValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace `key`; a replaced entry keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ResolvedValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&ResolvedValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<ResolvedValue>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

impl IntoIterator for Mapping {
    type Item = (String, ResolvedValue);
    type IntoIter = std::vec::IntoIter<(String, ResolvedValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut m = Mapping::new().with("a", 1u32).with("b", 2u32);
        m.insert("a", 3u32);
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(m.get("a"), Some(&ResolvedValue::from(3u32)));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_nested_get() {
        let inner = Mapping::new().with("field", 42u32);
        let outer = ResolvedValue::from(Mapping::new().with("field", inner));
        let got = outer.get("field").and_then(|v| v.get("field"));
        assert_eq!(got, Some(&ResolvedValue::from(42u32)));
        assert!(outer.get("missing").is_none());
    }
}
