//! Structural equivalence and human-readable renderings of type references.

use crate::model::EdmModel;
use crate::typeref::{EdmTypeReference, TypeDefinition, TypeReference};

impl TypeReference {
    /// Same definition, nullability and facets.
    pub fn is_equivalent(&self, other: &TypeReference) -> bool {
        self.nullable == other.nullable
            && self.facets == other.facets
            && definition_equivalent(&self.definition, &other.definition)
    }
}

/// Compare definitions: schema types by identity, primitives by kind,
/// collections element-wise. Unresolved types match on the attempted name.
pub fn definition_equivalent(a: &TypeDefinition, b: &TypeDefinition) -> bool {
    match (a, b) {
        (TypeDefinition::Collection(x), TypeDefinition::Collection(y)) => x.is_equivalent(y),
        (TypeDefinition::Unresolved(x), TypeDefinition::Unresolved(y)) => x.name == y.name,
        _ => a == b,
    }
}

impl EdmModel {
    /// Qualified name of a type reference, e.g. `Collection(NS.Order)`.
    pub fn type_name(&self, reference: &impl EdmTypeReference) -> String {
        self.definition_name(reference.definition())
    }

    fn definition_name(&self, definition: &TypeDefinition) -> String {
        match definition {
            TypeDefinition::Primitive(kind) => kind.to_string(),
            TypeDefinition::Entity(id)
            | TypeDefinition::Complex(id)
            | TypeDefinition::Enum(id)
            | TypeDefinition::TypeDefinition(id) => self.schema_type(*id).full_name(),
            TypeDefinition::Collection(element) => {
                format!("Collection({})", self.definition_name(&element.definition))
            }
            TypeDefinition::EntityReference(id) => {
                format!("Ref({})", self.schema_type(*id).full_name())
            }
            TypeDefinition::Path(kind) => kind.name().to_string(),
            TypeDefinition::Untyped => crate::types::UNTYPED_NAME.to_string(),
            TypeDefinition::Unresolved(u) => u.name.clone(),
        }
    }

    /// Diagnostic rendering: `[NS.T Nullable=false MaxLength=10]`.
    pub fn trace_string(&self, reference: &impl EdmTypeReference) -> String {
        let mut out = format!(
            "[{} Nullable={}",
            self.type_name(reference),
            reference.is_nullable()
        );
        let facets = reference.facets();
        if let Some(v) = facets.max_length {
            out.push_str(&format!(" MaxLength={}", v));
        }
        if let Some(v) = facets.unicode {
            out.push_str(&format!(" Unicode={}", v));
        }
        if let Some(v) = facets.precision {
            out.push_str(&format!(" Precision={}", v));
        }
        if let Some(v) = facets.scale {
            out.push_str(&format!(" Scale={}", v));
        }
        if let Some(v) = facets.srid {
            out.push_str(&format!(" SRID={}", v));
        }
        out.push(']');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeId;
    use crate::typeref::UnresolvedType;
    use crate::types::{Facets, PrimitiveKind};

    fn string(max_length: Option<u32>) -> TypeReference {
        TypeReference::primitive(PrimitiveKind::String, true).with_facets(Facets {
            max_length,
            ..Facets::default()
        })
    }

    #[test]
    fn facets_and_nullability_matter() {
        assert!(string(Some(10)).is_equivalent(&string(Some(10))));
        assert!(!string(Some(10)).is_equivalent(&string(Some(20))));
        assert!(!TypeReference::primitive(PrimitiveKind::Int32, true)
            .is_equivalent(&TypeReference::primitive(PrimitiveKind::Int32, false)));
    }

    #[test]
    fn schema_types_compare_by_identity() {
        let a = TypeReference::new(TypeDefinition::Entity(TypeId::from_index(0)), true);
        let b = TypeReference::new(TypeDefinition::Entity(TypeId::from_index(1)), true);
        assert!(a.is_equivalent(&a.clone()));
        assert!(!a.is_equivalent(&b));
    }

    #[test]
    fn collections_compare_element_wise() {
        let a = TypeReference::new(TypeDefinition::Collection(Box::new(string(None))), true);
        let b = TypeReference::new(TypeDefinition::Collection(Box::new(string(Some(5)))), true);
        assert!(a.is_equivalent(&a.clone()));
        assert!(!a.is_equivalent(&b));
    }

    #[test]
    fn unresolved_render_their_name() {
        let model = EdmModel::default();
        let r = TypeReference::new(
            TypeDefinition::Unresolved(UnresolvedType::not_found("NS.Missing")),
            false,
        );
        assert_eq!(model.type_name(&r), "NS.Missing");
        assert_eq!(model.trace_string(&r), "[NS.Missing Nullable=false]");
    }

    #[test]
    fn trace_string_lists_facets() {
        let model = EdmModel::default();
        let r = TypeReference::new(TypeDefinition::Collection(Box::new(string(Some(10)))), true)
            .with_facets(Facets {
                max_length: Some(10),
                ..Facets::default()
            });
        assert_eq!(
            model.trace_string(&r),
            "[Collection(Edm.String) Nullable=true MaxLength=10]"
        );
    }
}
