use indexmap::IndexMap;

use crate::errors::{ReferenceKind, SeedError, SeedResult};
use crate::store::DocumentId;

/// Name to backend id map built by one phase and read by the next. Keeps
/// dataset order so reports list records the way they were created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameIndex {
    ids: IndexMap<String, DocumentId>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, id: DocumentId) {
        self.ids.insert(name.into(), id);
    }

    pub fn get(&self, name: &str) -> Option<&DocumentId> {
        self.ids.get(name)
    }

    /// Look up `name` for menu item `item`, failing instead of yielding a
    /// dangling reference.
    pub fn resolve(&self, kind: ReferenceKind, name: &str, item: &str) -> SeedResult<&DocumentId> {
        self.get(name).ok_or_else(|| SeedError::UnknownReference {
            kind,
            name: name.to_string(),
            item: item.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocumentId)> {
        self.ids.iter().map(|(name, id)| (name.as_str(), id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_and_unknown_names() {
        let mut index = NameIndex::new();
        index.insert("Pizza", DocumentId("cat-1".to_string()));

        assert_eq!(
            index
                .resolve(ReferenceKind::Category, "Pizza", "Margherita")
                .expect("resolves"),
            &DocumentId("cat-1".to_string())
        );

        let err = index
            .resolve(ReferenceKind::Category, "Pasta", "Carbonara")
            .unwrap_err();
        assert!(matches!(
            err,
            SeedError::UnknownReference { kind: ReferenceKind::Category, .. }
        ));
    }

    #[test]
    fn iteration_keeps_insertion_order() {
        let mut index = NameIndex::new();
        index.insert("Drinks", DocumentId("b".to_string()));
        index.insert("Burgers", DocumentId("a".to_string()));

        let names: Vec<_> = index.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Drinks", "Burgers"]);
        assert_eq!(index.len(), 2);
    }
}
