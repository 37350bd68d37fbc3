//! The schema element graph.
//!
//! Every element is owned by one [`EdmModel`] arena and referred to
//! elsewhere by a copyable id. Cross references that come from the CSDL
//! text (base types, property types, binding paths) are kept as written and
//! resolved on first use; see [`crate::resolver`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::Value;

use crate::cache::LazyCache;
use crate::diagnostic::Location;
use crate::error::RuleSetError;
use crate::index::{ElementBinding, NameIndex};
use crate::resolver::{Ancestry, NamedTypeRef, NavigationBindingResolution};
use crate::typeref::{OperationReturn, TypeReference};
use crate::types::{EdmVersion, Facets, OperationKind, TypeKind};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Entity, complex, enum or type-definition type.
    TypeId
);
arena_id!(PropertyId);
arena_id!(NavigationPropertyId);
arena_id!(OperationId);
arena_id!(TermId);
arena_id!(ContainerId);
arena_id!(EntitySetId);
arena_id!(SingletonId);
arena_id!(OperationImportId);
arena_id!(BindingId);
arena_id!(AnnotationId);

/// A property slot on a structured type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MemberId {
    Structural(PropertyId),
    Navigation(NavigationPropertyId),
}

/// An entity set or singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NavigationSource {
    EntitySet(EntitySetId),
    Singleton(SingletonId),
}

/// A named member of an entity container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContainerMember {
    EntitySet(EntitySetId),
    Singleton(SingletonId),
    OperationImport(OperationImportId),
}

impl ContainerMember {
    pub fn as_navigation_source(&self) -> Option<NavigationSource> {
        match *self {
            ContainerMember::EntitySet(id) => Some(NavigationSource::EntitySet(id)),
            ContainerMember::Singleton(id) => Some(NavigationSource::Singleton(id)),
            ContainerMember::OperationImport(_) => None,
        }
    }
}

/// A type as written in CSDL, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    pub name: String,
    pub nullable: bool,
    pub facets: Facets,
}

impl DeclaredType {
    pub fn new(name: impl Into<String>, nullable: bool, facets: Facets) -> Self {
        Self {
            name: name.into(),
            nullable,
            facets,
        }
    }
}

/// A declared type plus its resolution, filled on first access.
#[derive(Debug)]
pub struct LazyTypeRef {
    pub declared: DeclaredType,
    pub(crate) resolved: OnceCell<TypeReference>,
}

impl LazyTypeRef {
    pub fn new(declared: DeclaredType) -> Self {
        Self {
            declared,
            resolved: OnceCell::new(),
        }
    }

    /// Resolve against `model`, caching the result.
    pub fn get(&self, model: &EdmModel) -> &TypeReference {
        self.resolved.get_or_init(|| {
            model.resolve_type_name(
                &self.declared.name,
                self.declared.nullable,
                self.declared.facets,
            )
        })
    }
}

/// One namespace contributed by a CSDL document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaInfo {
    pub namespace: String,
    pub alias: Option<String>,
}

#[derive(Debug)]
pub struct SchemaType {
    pub name: String,
    pub namespace: String,
    pub location: Location,
    pub def: SchemaTypeDef,
}

#[derive(Debug)]
pub enum SchemaTypeDef {
    Entity(EntityType),
    Complex(StructuredType),
    Enum(EnumType),
    TypeDefinition(TypeDefinitionType),
}

impl SchemaType {
    pub fn full_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }

    pub fn type_kind(&self) -> TypeKind {
        match self.def {
            SchemaTypeDef::Entity(_) => TypeKind::Entity,
            SchemaTypeDef::Complex(_) => TypeKind::Complex,
            SchemaTypeDef::Enum(_) => TypeKind::Enum,
            SchemaTypeDef::TypeDefinition(_) => TypeKind::TypeDefinition,
        }
    }

    pub fn as_structured(&self) -> Option<&StructuredType> {
        match &self.def {
            SchemaTypeDef::Entity(e) => Some(&e.structure),
            SchemaTypeDef::Complex(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityType> {
        match &self.def {
            SchemaTypeDef::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match &self.def {
            SchemaTypeDef::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_type_definition(&self) -> Option<&TypeDefinitionType> {
        match &self.def {
            SchemaTypeDef::TypeDefinition(t) => Some(t),
            _ => None,
        }
    }
}

/// Shape shared by entity and complex types.
#[derive(Debug)]
pub struct StructuredType {
    /// Base type name as written; resolved through [`EdmModel::base_type`].
    pub base_type: Option<String>,
    pub is_abstract: bool,
    pub is_open: bool,
    pub properties: Vec<PropertyId>,
    pub navigation_properties: Vec<NavigationPropertyId>,
    pub(crate) members: IndexMap<String, ElementBinding<MemberId>>,
    pub(crate) resolved_base: OnceCell<Option<NamedTypeRef>>,
}

impl StructuredType {
    /// Declared members in declaration order, structural first.
    pub fn declared_members(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.properties
            .iter()
            .map(|id| MemberId::Structural(*id))
            .chain(
                self.navigation_properties
                    .iter()
                    .map(|id| MemberId::Navigation(*id)),
            )
    }

    pub fn has_declared_members(&self) -> bool {
        !self.properties.is_empty() || !self.navigation_properties.is_empty()
    }
}

#[derive(Debug)]
pub struct EntityType {
    pub structure: StructuredType,
    /// Key property names declared on this type; `None` when inherited or missing.
    pub key: Option<Vec<String>>,
    pub has_stream: bool,
}

#[derive(Debug)]
pub struct EnumType {
    pub underlying: LazyTypeRef,
    pub is_flags: bool,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
    /// False when the value was assigned implicitly.
    pub explicit: bool,
}

#[derive(Debug)]
pub struct TypeDefinitionType {
    pub underlying: LazyTypeRef,
}

#[derive(Debug)]
pub struct StructuralProperty {
    pub name: String,
    pub declaring_type: TypeId,
    pub type_ref: LazyTypeRef,
    pub default_value: Option<String>,
    pub location: Location,
}

#[derive(Debug)]
pub struct NavigationProperty {
    pub name: String,
    pub declaring_type: TypeId,
    pub type_ref: LazyTypeRef,
    pub partner: Option<String>,
    pub contains_target: bool,
    pub referential_constraints: Vec<ReferentialConstraint>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferentialConstraint {
    pub dependent_property: String,
    pub principal_property: String,
}

#[derive(Debug)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: String,
    pub namespace: String,
    pub is_bound: bool,
    pub is_composable: bool,
    pub entity_set_path: Option<String>,
    pub parameters: Vec<OperationParameter>,
    pub return_type: Option<DeclaredType>,
    pub location: Location,
    pub(crate) resolved_return: OnceCell<Option<OperationReturn>>,
}

impl Operation {
    pub fn full_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }

    pub fn is_function(&self) -> bool {
        self.kind == OperationKind::Function
    }
}

#[derive(Debug)]
pub struct OperationParameter {
    pub name: String,
    pub type_ref: LazyTypeRef,
}

#[derive(Debug)]
pub struct Term {
    pub name: String,
    pub namespace: String,
    pub type_ref: LazyTypeRef,
    pub base_term: Option<String>,
    pub applies_to: Vec<String>,
    pub default_value: Option<String>,
    pub location: Location,
}

impl Term {
    pub fn full_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }
}

#[derive(Debug)]
pub struct EntityContainer {
    pub name: String,
    pub namespace: String,
    pub extends: Option<String>,
    pub entity_sets: Vec<EntitySetId>,
    pub singletons: Vec<SingletonId>,
    pub operation_imports: Vec<OperationImportId>,
    pub location: Location,
    pub(crate) members: IndexMap<String, ElementBinding<ContainerMember>>,
}

impl EntityContainer {
    pub fn full_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }
}

#[derive(Debug)]
pub struct EntitySet {
    pub name: String,
    pub container: ContainerId,
    pub entity_type: LazyTypeRef,
    pub include_in_service_document: bool,
    pub bindings: Vec<BindingId>,
    pub location: Location,
}

#[derive(Debug)]
pub struct Singleton {
    pub name: String,
    pub container: ContainerId,
    pub entity_type: LazyTypeRef,
    pub bindings: Vec<BindingId>,
    pub location: Location,
}

/// A `(path, target)` pair declared on an entity set or singleton.
#[derive(Debug)]
pub struct NavigationPropertyBinding {
    pub path: String,
    pub target: String,
    pub source: NavigationSource,
    pub location: Location,
}

#[derive(Debug)]
pub struct OperationImport {
    pub kind: OperationKind,
    pub name: String,
    pub container: ContainerId,
    /// Qualified name of the imported operation.
    pub operation: String,
    pub entity_set: Option<String>,
    pub location: Location,
}

#[derive(Debug)]
pub struct VocabularyAnnotation {
    pub target: String,
    pub term: String,
    pub qualifier: Option<String>,
    pub value: Value,
    /// Namespace of the schema that declared the annotation.
    pub namespace: String,
    pub location: Location,
}

/// A resolved, queryable EDM model.
///
/// Built once by [`crate::ModelBuilder`]; afterwards only the lazy caches
/// change, and they converge on the same values regardless of access order,
/// so a model can be shared across threads.
#[derive(Debug, Default)]
pub struct EdmModel {
    pub(crate) declared_version: Option<String>,
    pub(crate) schemas: Vec<SchemaInfo>,
    pub(crate) types: Vec<SchemaType>,
    pub(crate) properties: Vec<StructuralProperty>,
    pub(crate) navigation_properties: Vec<NavigationProperty>,
    pub(crate) operations: Vec<Operation>,
    pub(crate) terms: Vec<Term>,
    pub(crate) containers: Vec<EntityContainer>,
    pub(crate) entity_sets: Vec<EntitySet>,
    pub(crate) singletons: Vec<Singleton>,
    pub(crate) operation_imports: Vec<OperationImport>,
    pub(crate) bindings: Vec<NavigationPropertyBinding>,
    pub(crate) annotations: Vec<VocabularyAnnotation>,
    pub(crate) index: OnceCell<NameIndex>,
    pub(crate) ancestry: LazyCache<TypeId, Arc<Ancestry>>,
    pub(crate) resolved_bindings: LazyCache<BindingId, Arc<NavigationBindingResolution>>,
}

impl EdmModel {
    /// Version string declared by the first document that carried one.
    pub fn declared_version(&self) -> Option<&str> {
        self.declared_version.as_deref()
    }

    /// Declared version parsed into an [`EdmVersion`].
    ///
    /// `Ok(None)` when no document declares one; a declared version this
    /// crate has no rule set for is an error.
    pub fn version(&self) -> Result<Option<EdmVersion>, RuleSetError> {
        self.declared_version
            .as_deref()
            .map(str::parse)
            .transpose()
    }

    pub fn schemas(&self) -> &[SchemaInfo] {
        &self.schemas
    }

    pub fn schema_type(&self, id: TypeId) -> &SchemaType {
        &self.types[id.index()]
    }

    pub fn property(&self, id: PropertyId) -> &StructuralProperty {
        &self.properties[id.index()]
    }

    pub fn navigation_property(&self, id: NavigationPropertyId) -> &NavigationProperty {
        &self.navigation_properties[id.index()]
    }

    pub fn operation(&self, id: OperationId) -> &Operation {
        &self.operations[id.index()]
    }

    pub fn term(&self, id: TermId) -> &Term {
        &self.terms[id.index()]
    }

    pub fn container(&self, id: ContainerId) -> &EntityContainer {
        &self.containers[id.index()]
    }

    pub fn entity_set(&self, id: EntitySetId) -> &EntitySet {
        &self.entity_sets[id.index()]
    }

    pub fn singleton(&self, id: SingletonId) -> &Singleton {
        &self.singletons[id.index()]
    }

    pub fn operation_import(&self, id: OperationImportId) -> &OperationImport {
        &self.operation_imports[id.index()]
    }

    pub fn binding(&self, id: BindingId) -> &NavigationPropertyBinding {
        &self.bindings[id.index()]
    }

    pub fn annotation(&self, id: AnnotationId) -> &VocabularyAnnotation {
        &self.annotations[id.index()]
    }

    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> {
        (0..self.types.len()).map(TypeId::from_index)
    }

    pub fn operation_ids(&self) -> impl Iterator<Item = OperationId> {
        (0..self.operations.len()).map(OperationId::from_index)
    }

    pub fn term_ids(&self) -> impl Iterator<Item = TermId> {
        (0..self.terms.len()).map(TermId::from_index)
    }

    pub fn container_ids(&self) -> impl Iterator<Item = ContainerId> {
        (0..self.containers.len()).map(ContainerId::from_index)
    }

    pub fn annotation_ids(&self) -> impl Iterator<Item = AnnotationId> {
        (0..self.annotations.len()).map(AnnotationId::from_index)
    }

    pub fn binding_ids(&self) -> impl Iterator<Item = BindingId> {
        (0..self.bindings.len()).map(BindingId::from_index)
    }

    /// Structured-type view of `id`, if it is an entity or complex type.
    pub fn structured(&self, id: TypeId) -> Option<&StructuredType> {
        self.schema_type(id).as_structured()
    }

    pub fn member_name(&self, member: MemberId) -> &str {
        match member {
            MemberId::Structural(id) => &self.property(id).name,
            MemberId::Navigation(id) => &self.navigation_property(id).name,
        }
    }

    pub fn member_location(&self, member: MemberId) -> &Location {
        match member {
            MemberId::Structural(id) => &self.property(id).location,
            MemberId::Navigation(id) => &self.navigation_property(id).location,
        }
    }

    /// Resolved type of a structural or navigation property.
    pub fn member_type(&self, member: MemberId) -> &TypeReference {
        match member {
            MemberId::Structural(id) => self.property(id).type_ref.get(self),
            MemberId::Navigation(id) => self.navigation_property(id).type_ref.get(self),
        }
    }

    pub fn navigation_source_name(&self, source: NavigationSource) -> &str {
        match source {
            NavigationSource::EntitySet(id) => &self.entity_set(id).name,
            NavigationSource::Singleton(id) => &self.singleton(id).name,
        }
    }

    pub fn navigation_source_container(&self, source: NavigationSource) -> ContainerId {
        match source {
            NavigationSource::EntitySet(id) => self.entity_set(id).container,
            NavigationSource::Singleton(id) => self.singleton(id).container,
        }
    }

    pub fn navigation_source_location(&self, source: NavigationSource) -> &Location {
        match source {
            NavigationSource::EntitySet(id) => &self.entity_set(id).location,
            NavigationSource::Singleton(id) => &self.singleton(id).location,
        }
    }

    pub fn navigation_source_bindings(&self, source: NavigationSource) -> &[BindingId] {
        match source {
            NavigationSource::EntitySet(id) => &self.entity_set(id).bindings,
            NavigationSource::Singleton(id) => &self.singleton(id).bindings,
        }
    }

    /// Resolved element type of an entity set or singleton.
    pub fn navigation_source_type(&self, source: NavigationSource) -> &TypeReference {
        match source {
            NavigationSource::EntitySet(id) => self.entity_set(id).entity_type.get(self),
            NavigationSource::Singleton(id) => self.singleton(id).entity_type.get(self),
        }
    }

    /// Entity type of an entity set or singleton, when it resolves to one.
    pub fn navigation_source_entity_type(&self, source: NavigationSource) -> Option<TypeId> {
        match self.navigation_source_type(source).definition {
            crate::typeref::TypeDefinition::Entity(id) => Some(id),
            _ => None,
        }
    }
}

/// Join a namespace and a simple name.
pub(crate) fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberId::Structural(id) => write!(f, "property#{}", id.index()),
            MemberId::Navigation(id) => write!(f, "navigation#{}", id.index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_joins_with_dot() {
        assert_eq!(qualify("FQ.NS", "Customer"), "FQ.NS.Customer");
        assert_eq!(qualify("", "Container"), "Container");
    }

    #[test]
    fn container_member_navigation_source() {
        let set = ContainerMember::EntitySet(EntitySetId::from_index(0));
        assert_eq!(
            set.as_navigation_source(),
            Some(NavigationSource::EntitySet(EntitySetId::from_index(0)))
        );
        let import = ContainerMember::OperationImport(OperationImportId::from_index(0));
        assert_eq!(import.as_navigation_source(), None);
    }

    #[test]
    fn ids_expose_their_index() {
        assert_eq!(TypeId::from_index(7).index(), 7);
        assert_ne!(TypeId::from_index(1), TypeId::from_index(2));
    }
}
