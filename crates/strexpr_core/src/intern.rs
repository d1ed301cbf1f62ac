//! Interned type and member names.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// Handle of a name in a [`StringInterner`]. Equal names get equal handles.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct InternedString(Spur);

impl fmt::Debug for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:?}", self.0)
    }
}

/// The name table of a type registry.
///
/// Names are added with [`intern`](Self::intern) while the registry is being
/// built. Lookups while parsing go through [`get`](Self::get), which never
/// adds a key, so probing for an unknown member leaves the table unchanged.
#[derive(Clone, Default)]
pub struct StringInterner {
    names: Arc<ThreadedRodeo>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, name: &str) -> InternedString {
        InternedString(self.names.get_or_intern(name))
    }

    pub fn get(&self, name: &str) -> Option<InternedString> {
        self.names.get(name).map(InternedString)
    }

    pub fn resolve(&self, key: InternedString) -> &str {
        self.names.resolve(&key.0)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

impl fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StringInterner({} names)", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_same_handle() {
        let names = StringInterner::new();
        let math = names.intern("System.Math");
        assert_eq!(names.intern("System.Math"), math);
        assert_ne!(names.intern("Pow"), math);
        assert_eq!(names.resolve(math), "System.Math");
    }

    #[test]
    fn test_lookup_never_adds() {
        let names = StringInterner::new();
        assert_eq!(names.get("Count"), None);
        assert_eq!(names.len(), 0);
        let count = names.intern("Count");
        assert_eq!(names.get("Count"), Some(count));
        assert_eq!(names.len(), 1);
    }
}
