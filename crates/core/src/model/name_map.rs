use std::{collections::BTreeMap, fmt};

/// Case-insensitive map over named schema objects.
///
/// Keys are the upper-cased object names; the original spelling lives in the
/// stored value. Iteration order is the lexicographic order of the upper-cased
/// names, which makes every traversal of the metadata deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct NameMap<T> {
    entries: BTreeMap<String, T>,
}

impl<T> Default for NameMap<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> NameMap<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts under the case-folded name. A second entry whose name differs
    /// only in case is rejected.
    pub fn insert(&mut self, name: &str, value: T) -> Result<(), DuplicateName> {
        let key = name.to_uppercase();
        if self.entries.contains_key(&key) {
            return Err(DuplicateName(name.to_string()));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(&name.to_uppercase())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries.get_mut(&name.to_uppercase())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_uppercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by case-folded name.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &T)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.values_mut()
    }

    /// Case-folded names, in iteration order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateName(pub String);

impl fmt::Display for DuplicateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duplicate object name `{}` (case-insensitive)", self.0)
    }
}

impl std::error::Error for DuplicateName {}
