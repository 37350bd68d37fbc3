//! Type references: a type definition plus nullability and facets.
//!
//! Named schema types are referenced by arena id, so two references to the
//! same entity type compare equal by identity. A name that does not bind
//! becomes [`TypeDefinition::Unresolved`] instead of an error.

use serde::Serialize;

use crate::model::{OperationId, TypeId};
use crate::types::{Facets, PathKind, PrimitiveKind, TypeKind};

/// What a type reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeDefinition {
    Primitive(PrimitiveKind),
    Entity(TypeId),
    Complex(TypeId),
    Enum(TypeId),
    TypeDefinition(TypeId),
    Collection(Box<TypeReference>),
    EntityReference(TypeId),
    Path(PathKind),
    Untyped,
    Unresolved(UnresolvedType),
}

impl TypeDefinition {
    pub fn type_kind(&self) -> TypeKind {
        match self {
            TypeDefinition::Primitive(_) => TypeKind::Primitive,
            TypeDefinition::Entity(_) => TypeKind::Entity,
            TypeDefinition::Complex(_) => TypeKind::Complex,
            TypeDefinition::Enum(_) => TypeKind::Enum,
            TypeDefinition::TypeDefinition(_) => TypeKind::TypeDefinition,
            TypeDefinition::Collection(_) => TypeKind::Collection,
            TypeDefinition::EntityReference(_) => TypeKind::EntityReference,
            TypeDefinition::Path(_) => TypeKind::Path,
            TypeDefinition::Untyped => TypeKind::Untyped,
            TypeDefinition::Unresolved(_) => TypeKind::Unresolved,
        }
    }

    /// Arena id of the named schema type, if this definition is one.
    pub fn schema_type_id(&self) -> Option<TypeId> {
        match self {
            TypeDefinition::Entity(id)
            | TypeDefinition::Complex(id)
            | TypeDefinition::Enum(id)
            | TypeDefinition::TypeDefinition(id) => Some(*id),
            _ => None,
        }
    }
}

/// Why a type name failed to bind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum UnresolvedReason {
    NotFound,
    /// Several same-named types; candidates in registration order.
    Ambiguous(Vec<TypeId>),
    /// The text is not a well-formed type name, e.g. `Collection(`.
    Malformed,
    /// The name binds, but to a type of the wrong kind for this slot.
    WrongKind(TypeKind),
}

/// Sentinel for a type name that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UnresolvedType {
    /// The name as written.
    pub name: String,
    pub reason: UnresolvedReason,
}

impl UnresolvedType {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: UnresolvedReason::NotFound,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self.reason, UnresolvedReason::Ambiguous(_))
    }
}

/// A resolved type slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeReference {
    pub definition: TypeDefinition,
    pub nullable: bool,
    pub facets: Facets,
}

impl TypeReference {
    pub fn new(definition: TypeDefinition, nullable: bool) -> Self {
        Self {
            definition,
            nullable,
            facets: Facets::default(),
        }
    }

    pub fn primitive(kind: PrimitiveKind, nullable: bool) -> Self {
        Self::new(TypeDefinition::Primitive(kind), nullable)
    }

    pub fn with_facets(mut self, facets: Facets) -> Self {
        self.facets = facets;
        self
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.definition, TypeDefinition::Collection(_))
    }

    /// Element type of a collection reference.
    pub fn element_type(&self) -> Option<&TypeReference> {
        match &self.definition {
            TypeDefinition::Collection(inner) => Some(inner),
            _ => None,
        }
    }

    /// Entity type targeted by an entity or collection-of-entity reference.
    pub fn entity_type(&self) -> Option<TypeId> {
        match &self.definition {
            TypeDefinition::Entity(id) => Some(*id),
            TypeDefinition::Collection(inner) => match inner.definition {
                TypeDefinition::Entity(id) => Some(id),
                _ => None,
            },
            _ => None,
        }
    }

    /// The first unresolved sentinel inside this reference, looking through collections.
    pub fn unresolved(&self) -> Option<&UnresolvedType> {
        match &self.definition {
            TypeDefinition::Unresolved(u) => Some(u),
            TypeDefinition::Collection(inner) => inner.unresolved(),
            _ => None,
        }
    }
}

/// Read access shared by every kind of type reference.
pub trait EdmTypeReference {
    fn definition(&self) -> &TypeDefinition;

    fn is_nullable(&self) -> bool;

    fn facets(&self) -> &Facets;

    fn type_kind(&self) -> TypeKind {
        self.definition().type_kind()
    }

    /// True when the reference, or a collection's element, is unresolved.
    fn is_bad(&self) -> bool {
        match self.definition() {
            TypeDefinition::Unresolved(_) => true,
            TypeDefinition::Collection(inner) => inner.is_bad(),
            _ => false,
        }
    }
}

impl EdmTypeReference for TypeReference {
    fn definition(&self) -> &TypeDefinition {
        &self.definition
    }

    fn is_nullable(&self) -> bool {
        self.nullable
    }

    fn facets(&self) -> &Facets {
        &self.facets
    }
}

impl<T: EdmTypeReference + ?Sized> EdmTypeReference for &T {
    fn definition(&self) -> &TypeDefinition {
        (**self).definition()
    }

    fn is_nullable(&self) -> bool {
        (**self).is_nullable()
    }

    fn facets(&self) -> &Facets {
        (**self).facets()
    }
}

/// Return type of an operation: a type reference that also knows which
/// operation declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReturn<T: EdmTypeReference = TypeReference> {
    inner: T,
    declaring_operation: OperationId,
}

impl<T: EdmTypeReference> OperationReturn<T> {
    pub fn new(inner: T, declaring_operation: OperationId) -> Self {
        Self {
            inner,
            declaring_operation,
        }
    }

    pub fn declaring_operation(&self) -> OperationId {
        self.declaring_operation
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: EdmTypeReference> EdmTypeReference for OperationReturn<T> {
    fn definition(&self) -> &TypeDefinition {
        self.inner.definition()
    }

    fn is_nullable(&self) -> bool {
        self.inner.is_nullable()
    }

    fn facets(&self) -> &Facets {
        self.inner.facets()
    }

    fn type_kind(&self) -> TypeKind {
        self.inner.type_kind()
    }

    fn is_bad(&self) -> bool {
        self.inner.is_bad()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_of_entity_reports_entity_type() {
        let entity = TypeId::from_index(3);
        let reference = TypeReference::new(
            TypeDefinition::Collection(Box::new(TypeReference::new(
                TypeDefinition::Entity(entity),
                false,
            ))),
            true,
        );
        assert_eq!(reference.type_kind(), TypeKind::Collection);
        assert_eq!(reference.entity_type(), Some(entity));
        assert!(!reference.is_bad());
    }

    #[test]
    fn unresolved_is_bad_through_collections() {
        let reference = TypeReference::new(
            TypeDefinition::Collection(Box::new(TypeReference::new(
                TypeDefinition::Unresolved(UnresolvedType::not_found("NS.Missing")),
                true,
            ))),
            true,
        );
        assert!(reference.is_bad());
        assert_eq!(reference.unresolved().map(|u| u.name.as_str()), Some("NS.Missing"));
    }

    #[test]
    fn return_wrapper_forwards_to_inner() {
        let op = OperationId::from_index(0);
        let inner = TypeReference::primitive(PrimitiveKind::String, false);
        let ret = OperationReturn::new(inner.clone(), op);
        assert_eq!(ret.declaring_operation(), op);
        assert_eq!(ret.type_kind(), TypeKind::Primitive);
        assert!(!ret.is_nullable());
        assert_eq!(ret.definition(), &inner.definition);

        let borrowed = OperationReturn::new(&inner, op);
        assert_eq!(borrowed.type_kind(), TypeKind::Primitive);
    }
}
