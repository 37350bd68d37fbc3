//! Qualified-name index with ambiguity folding.
//!
//! Registering a second element under a name that is already bound does not
//! replace the first: both fold into one [`AmbiguousBinding`] that keeps the
//! candidates in arrival order. Lookups report such a name as
//! [`LookupResult::Ambiguous`] and never pick one arbitrarily.

use std::borrow::Cow;
use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::model::{ContainerId, EdmModel, OperationId, TermId, TypeId};
use crate::types::{split_qualified_name, Capability};

/// Several same-named elements of one capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousBinding<T> {
    pub name: String,
    pub candidates: Vec<T>,
}

/// What a name is bound to in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementBinding<T> {
    Single(T),
    Ambiguous(AmbiguousBinding<T>),
}

impl<T: Copy> ElementBinding<T> {
    /// Fold a new arrival into this binding.
    ///
    /// A single binding becomes ambiguous with both candidates; an ambiguous
    /// binding grows by one. Nothing nests.
    pub fn fold(&mut self, name: &str, item: T) {
        match self {
            ElementBinding::Single(existing) => {
                *self = ElementBinding::Ambiguous(AmbiguousBinding {
                    name: name.to_string(),
                    candidates: vec![*existing, item],
                });
            }
            ElementBinding::Ambiguous(ambiguous) => ambiguous.candidates.push(item),
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ElementBinding::Ambiguous(_))
    }

    pub fn to_lookup(&self) -> LookupResult<T> {
        match self {
            ElementBinding::Single(item) => LookupResult::Found(*item),
            ElementBinding::Ambiguous(ambiguous) => {
                LookupResult::Ambiguous(ambiguous.candidates.clone())
            }
        }
    }
}

/// Insert `item` under `name`, folding into ambiguity on collision.
pub(crate) fn register<T: Copy>(
    map: &mut IndexMap<String, ElementBinding<T>>,
    name: &str,
    item: T,
) {
    match map.get_mut(name) {
        Some(binding) => binding.fold(name, item),
        None => {
            map.insert(name.to_string(), ElementBinding::Single(item));
        }
    }
}

/// Outcome of a name lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LookupResult<T> {
    Found(T),
    /// Every candidate registered under the name, in registration order.
    Ambiguous(Vec<T>),
    /// The name that was looked up.
    NotFound(String),
}

impl<T> LookupResult<T> {
    pub fn found(self) -> Option<T> {
        match self {
            LookupResult::Found(item) => Some(item),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, LookupResult::Found(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, LookupResult::Ambiguous(_))
    }

    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> LookupResult<U> {
        match self {
            LookupResult::Found(item) => LookupResult::Found(f(item)),
            LookupResult::Ambiguous(items) => LookupResult::Ambiguous(items.into_iter().map(f).collect()),
            LookupResult::NotFound(name) => LookupResult::NotFound(name),
        }
    }
}

/// A schema element returned from a capability-scoped lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SchemaElementRef {
    Type(TypeId),
    Term(TermId),
    EntityContainer(ContainerId),
    /// An operation name binds to its whole overload group.
    Operations(Vec<OperationId>),
}

/// Per-model name tables, built once on first lookup.
#[derive(Debug, Default)]
pub struct NameIndex {
    types: IndexMap<String, ElementBinding<TypeId>>,
    terms: IndexMap<String, ElementBinding<TermId>>,
    containers: IndexMap<String, ElementBinding<ContainerId>>,
    operations: IndexMap<String, Vec<OperationId>>,
    aliases: HashMap<String, String>,
}

impl NameIndex {
    pub(crate) fn build(model: &EdmModel) -> Self {
        let mut index = NameIndex::default();

        for schema in model.schemas() {
            if let Some(alias) = &schema.alias {
                index
                    .aliases
                    .insert(alias.clone(), schema.namespace.clone());
            }
        }

        for id in model.type_ids() {
            register(&mut index.types, &model.schema_type(id).full_name(), id);
        }
        for id in model.term_ids() {
            register(&mut index.terms, &model.term(id).full_name(), id);
        }
        for id in model.container_ids() {
            let container = model.container(id);
            register(&mut index.containers, &container.full_name(), id);
            if !container.namespace.is_empty() {
                register(&mut index.containers, &container.name, id);
            }
        }
        for id in model.operation_ids() {
            index
                .operations
                .entry(model.operation(id).full_name())
                .or_default()
                .push(id);
        }

        debug!(
            types = index.types.len(),
            terms = index.terms.len(),
            containers = index.containers.len(),
            operation_groups = index.operations.len(),
            "built name index"
        );
        index
    }

    /// Rewrite `Alias.Name` to `Namespace.Name`; other names pass through.
    pub fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        let (namespace, simple) = split_qualified_name(name);
        match self.aliases.get(namespace) {
            Some(full) => Cow::Owned(format!("{}.{}", full, simple)),
            None => Cow::Borrowed(name),
        }
    }

    fn lookup<T: Copy>(
        &self,
        map: &IndexMap<String, ElementBinding<T>>,
        name: &str,
    ) -> LookupResult<T> {
        let normalized = self.normalize(name);
        match map.get(normalized.as_ref()) {
            Some(binding) => binding.to_lookup(),
            None => LookupResult::NotFound(name.to_string()),
        }
    }
}

impl EdmModel {
    pub(crate) fn name_index(&self) -> &NameIndex {
        self.index.get_or_init(|| NameIndex::build(self))
    }

    /// Rewrite a schema alias prefix to its namespace.
    pub fn normalize_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        self.name_index().normalize(name)
    }

    pub fn find_type(&self, name: &str) -> LookupResult<TypeId> {
        let index = self.name_index();
        index.lookup(&index.types, name)
    }

    pub fn find_term(&self, name: &str) -> LookupResult<TermId> {
        let index = self.name_index();
        index.lookup(&index.terms, name)
    }

    /// Containers are found by qualified or by bare name.
    pub fn find_entity_container(&self, name: &str) -> LookupResult<ContainerId> {
        let index = self.name_index();
        index.lookup(&index.containers, name)
    }

    /// Overload group for a qualified operation name, in declaration order.
    pub fn find_operations(&self, name: &str) -> &[OperationId] {
        let index = self.name_index();
        let normalized = index.normalize(name);
        index
            .operations
            .get(normalized.as_ref())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn resolve_qualified_name(
        &self,
        name: &str,
        capability: Capability,
    ) -> LookupResult<SchemaElementRef> {
        match capability {
            Capability::Type => self.find_type(name).map(SchemaElementRef::Type),
            Capability::Term => self.find_term(name).map(SchemaElementRef::Term),
            Capability::EntityContainer => self
                .find_entity_container(name)
                .map(SchemaElementRef::EntityContainer),
            Capability::Operation => match self.find_operations(name) {
                [] => LookupResult::NotFound(name.to_string()),
                group => LookupResult::Found(SchemaElementRef::Operations(group.to_vec())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_registration_folds_into_ambiguity() {
        let mut map = IndexMap::new();
        register(&mut map, "NS.T", 1u32);
        assert_eq!(map["NS.T"].to_lookup(), LookupResult::Found(1));

        register(&mut map, "NS.T", 2);
        assert_eq!(map["NS.T"].to_lookup(), LookupResult::Ambiguous(vec![1, 2]));
    }

    #[test]
    fn later_arrivals_extend_without_nesting() {
        let mut map = IndexMap::new();
        for i in 0..3u32 {
            register(&mut map, "NS.T", i);
        }
        match &map["NS.T"] {
            ElementBinding::Ambiguous(a) => assert_eq!(a.candidates, vec![0, 1, 2]),
            other => panic!("expected ambiguous binding, got {:?}", other),
        }

        register(&mut map, "NS.T", 3);
        match &map["NS.T"] {
            ElementBinding::Ambiguous(a) => {
                assert_eq!(a.name, "NS.T");
                assert_eq!(a.candidates, vec![0, 1, 2, 3]);
            }
            other => panic!("expected ambiguous binding, got {:?}", other),
        }
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn distinct_names_stay_single() {
        let mut map = IndexMap::new();
        register(&mut map, "NS.A", 'a');
        register(&mut map, "NS.B", 'b');
        assert!(!map["NS.A"].is_ambiguous());
        assert!(!map["NS.B"].is_ambiguous());
    }

    #[test]
    fn lookup_result_map_preserves_shape() {
        let r: LookupResult<u32> = LookupResult::Ambiguous(vec![1, 2]);
        assert_eq!(r.map(|x| x * 10), LookupResult::Ambiguous(vec![10, 20]));
        let r: LookupResult<u32> = LookupResult::NotFound("X".into());
        assert_eq!(r.map(|x| x + 1), LookupResult::NotFound("X".into()));
    }
}
