//! Built-in validation rules.
//!
//! Each rule is a `static` [`ValidationRule`] bound to one [`NodeKind`].
//! Rules only read the model and report; they never stop the walk. Version
//! specific rules are listed in [`crate::ruleset`]; everything in
//! [`VERSION_INDEPENDENT`] applies to every version.

use std::collections::HashSet;

use crate::diagnostic::{ErrorCode, Location};
use crate::index::{ElementBinding, LookupResult};
use crate::model::{ContainerMember, EdmModel, MemberId, NavigationSource, TypeId};
use crate::resolver::NamedTypeRef;
use crate::ruleset::ValidationRule;
use crate::typeref::{EdmTypeReference, OperationReturn, TypeDefinition, UnresolvedReason, UnresolvedType};
use crate::types::{is_simple_identifier, TypeKind};
use crate::validator::{Node, NodeKind, ValidationContext};

fn report_unresolved(
    cx: &mut ValidationContext<'_>,
    location: Location,
    what: &str,
    unresolved: &UnresolvedType,
) {
    let name = &unresolved.name;
    let (code, message) = match &unresolved.reason {
        UnresolvedReason::NotFound => (
            ErrorCode::BadUnresolvedType,
            format!("{} '{}' not found", what, name),
        ),
        UnresolvedReason::Ambiguous(candidates) => (
            ErrorCode::BadAmbiguousElementBinding,
            format!(
                "{} '{}' is ambiguous between {} definitions",
                what,
                name,
                candidates.len()
            ),
        ),
        UnresolvedReason::Malformed => (
            ErrorCode::BadUnresolvedType,
            format!("{} '{}' is not a valid type name", what, name),
        ),
        UnresolvedReason::WrongKind(kind) => (
            ErrorCode::BadUnresolvedType,
            format!("{} '{}' names a {} type", what, name, kind),
        ),
    };
    cx.error(location, code, message);
}

fn container_member_location(model: &EdmModel, member: ContainerMember) -> &Location {
    match member {
        ContainerMember::EntitySet(id) => &model.entity_set(id).location,
        ContainerMember::Singleton(id) => &model.singleton(id).location,
        ContainerMember::OperationImport(id) => &model.operation_import(id).location,
    }
}

fn full_name(model: &EdmModel, node: Node) -> String {
    match (node.namespace(model), node.name(model)) {
        (Some(ns), Some(name)) if !ns.is_empty() => format!("{}.{}", ns, name),
        (_, name) => name.unwrap_or_default().to_string(),
    }
}

// Element

pub static ELEMENT_NAME_MUST_NOT_BE_EMPTY: ValidationRule = ValidationRule::new(
    "ElementNameMustNotBeEmpty",
    NodeKind::Element,
    element_name_must_not_be_empty,
);

fn element_name_must_not_be_empty(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    if node.name(model) == Some("") {
        cx.error(node.location(model), ErrorCode::InvalidName, "name cannot be empty");
    }
}

pub static ELEMENT_NAME_MUST_BE_SIMPLE_IDENTIFIER: ValidationRule = ValidationRule::new(
    "ElementNameMustBeSimpleIdentifier",
    NodeKind::Element,
    element_name_must_be_simple_identifier,
);

fn element_name_must_be_simple_identifier(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    if let Some(name) = node.name(model) {
        if !name.is_empty() && !is_simple_identifier(name) {
            cx.error(
                node.location(model),
                ErrorCode::InvalidName,
                format!("'{}' is not a valid simple identifier", name),
            );
        }
    }
}

// Schema element

pub static NAMESPACE_MUST_BE_VALID: ValidationRule = ValidationRule::new(
    "NamespaceMustBeValid",
    NodeKind::SchemaElement,
    namespace_must_be_valid,
);

fn namespace_must_be_valid(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Some(namespace) = node.namespace(model) else {
        return;
    };
    if namespace.is_empty() {
        cx.error(
            node.location(model),
            ErrorCode::InvalidNamespaceName,
            "namespace cannot be empty",
        );
    } else if !namespace.split('.').all(is_simple_identifier) {
        cx.error(
            node.location(model),
            ErrorCode::InvalidNamespaceName,
            format!("'{}' is not a valid namespace name", namespace),
        );
    }
}

pub static QUALIFIED_NAME_MUST_BE_UNIQUE: ValidationRule = ValidationRule::new(
    "QualifiedNameMustBeUnique",
    NodeKind::SchemaElement,
    qualified_name_must_be_unique,
);

fn qualified_name_must_be_unique(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let name = full_name(model, node);
    let type_hit = model.find_type(&name);
    let term_hit = model.find_term(&name);
    let container_hit = model.find_entity_container(&name);

    let duplicated = match node {
        Node::Type(_) => {
            type_hit.is_ambiguous() || term_hit.is_found() || container_hit.is_found()
        }
        Node::Term(_) => {
            term_hit.is_ambiguous() || type_hit.is_found() || container_hit.is_found()
        }
        Node::Container(_) => {
            container_hit.is_ambiguous() || type_hit.is_found() || term_hit.is_found()
        }
        _ => false,
    };
    if duplicated {
        cx.error(
            node.location(model),
            ErrorCode::AlreadyDefined,
            format!("'{}' is defined more than once", name),
        );
    }
}

// Structured types

pub static BASE_TYPE_MUST_RESOLVE: ValidationRule = ValidationRule::new(
    "BaseTypeMustResolve",
    NodeKind::StructuredType,
    base_type_must_resolve,
);

fn base_type_must_resolve(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    let Some(NamedTypeRef::Unresolved(unresolved)) = model.base_type(id) else {
        return;
    };
    if let UnresolvedReason::WrongKind(kind) = unresolved.reason {
        cx.error(
            node.location(model),
            ErrorCode::InvalidBaseType,
            format!("base type '{}' is a {} type", unresolved.name, kind),
        );
    } else {
        report_unresolved(cx, node.location(model), "base type", unresolved);
    }
}

pub static BASE_TYPE_MUST_BE_SAME_KIND: ValidationRule = ValidationRule::new(
    "BaseTypeMustBeSameKind",
    NodeKind::StructuredType,
    base_type_must_be_same_kind,
);

fn base_type_must_be_same_kind(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    let Some(NamedTypeRef::Resolved(base)) = model.base_type(id) else {
        return;
    };
    let own = model.schema_type(id).type_kind();
    let inherited = model.schema_type(*base).type_kind();
    if own != inherited {
        cx.error(
            node.location(model),
            ErrorCode::InvalidBaseType,
            format!(
                "{} type '{}' cannot derive from {} type '{}'",
                own,
                model.schema_type(id).full_name(),
                inherited,
                model.schema_type(*base).full_name()
            ),
        );
    }
}

pub static INHERITANCE_MUST_NOT_BE_CYCLIC: ValidationRule = ValidationRule::new(
    "InheritanceMustNotBeCyclic",
    NodeKind::StructuredType,
    inheritance_must_not_be_cyclic,
);

fn inheritance_must_not_be_cyclic(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    if !model.ancestry(id).in_cycle {
        return;
    }
    let ty = model.schema_type(id);
    let code = if ty.type_kind() == TypeKind::Entity {
        ErrorCode::BadCyclicEntity
    } else {
        ErrorCode::BadCyclicComplex
    };
    cx.error(
        node.location(model),
        code,
        format!("type '{}' is its own ancestor", ty.full_name()),
    );
}

pub static PROPERTY_NAMES_MUST_BE_UNIQUE: ValidationRule = ValidationRule::new(
    "PropertyNamesMustBeUnique",
    NodeKind::StructuredType,
    property_names_must_be_unique,
);

fn property_names_must_be_unique(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    let Some(structure) = model.structured(id) else {
        return;
    };
    let ancestry = model.ancestry(id);

    for (name, binding) in &structure.members {
        match binding {
            ElementBinding::Ambiguous(ambiguous) => {
                for member in ambiguous.candidates.iter().skip(1) {
                    cx.error(
                        model.member_location(*member).clone(),
                        ErrorCode::AlreadyDefined,
                        format!("property '{}' is defined more than once", name),
                    );
                }
            }
            ElementBinding::Single(member) => {
                let hidden = ancestry.chain.iter().find(|ancestor| {
                    model
                        .structured(**ancestor)
                        .map_or(false, |s| s.members.contains_key(name))
                });
                if let Some(ancestor) = hidden {
                    cx.error(
                        model.member_location(*member).clone(),
                        ErrorCode::AlreadyDefined,
                        format!(
                            "property '{}' is already defined on base type '{}'",
                            name,
                            model.schema_type(*ancestor).full_name()
                        ),
                    );
                }
            }
        }
    }
}

pub static MEMBER_NAME_MUST_NOT_MATCH_TYPE_NAME: ValidationRule = ValidationRule::new(
    "MemberNameMustNotMatchTypeName",
    NodeKind::StructuredType,
    member_name_must_not_match_type_name,
);

fn member_name_must_not_match_type_name(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    let ty = model.schema_type(id);
    let Some(structure) = ty.as_structured() else {
        return;
    };
    for member in structure.declared_members() {
        // Legal CSDL, so only a warning.
        if model.member_name(member) == ty.name {
            cx.warning(
                model.member_location(member).clone(),
                ErrorCode::InvalidMemberNameMatchesTypeName,
                format!("property '{}' has the same name as its declaring type", ty.name),
            );
        }
    }
}

pub static OPEN_TYPES_NOT_SUPPORTED: ValidationRule = ValidationRule::new(
    "OpenTypesNotSupported",
    NodeKind::StructuredType,
    open_types_not_supported,
);

fn open_types_not_supported(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    if model.structured(id).map_or(false, |s| s.is_open) {
        cx.error(
            node.location(model),
            ErrorCode::OpenTypeNotSupported,
            "open types are not supported before version 1.2",
        );
    }
}

// Entity types

pub static ENTITY_KEY_MUST_BE_DECLARED: ValidationRule = ValidationRule::new(
    "EntityKeyMustBeDeclared",
    NodeKind::EntityType,
    entity_key_must_be_declared,
);

fn entity_key_must_be_declared(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    let Some(entity) = model.schema_type(id).as_entity() else {
        return;
    };
    if entity.structure.is_abstract {
        return;
    }
    // A broken base chain is reported on its own; its key is unknown.
    let ancestry = model.ancestry(id);
    if ancestry.broken.is_some() || ancestry.cyclic {
        return;
    }
    if model.declared_key(id).is_none() {
        cx.error(
            node.location(model),
            ErrorCode::KeyMissingOnEntityType,
            format!("entity type '{}' has no key", model.schema_type(id).full_name()),
        );
    }
}

pub static KEY_MUST_NOT_BE_REDEFINED: ValidationRule = ValidationRule::new(
    "KeyMustNotBeRedefined",
    NodeKind::EntityType,
    key_must_not_be_redefined,
);

fn key_must_not_be_redefined(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    let has_own_key = model
        .schema_type(id)
        .as_entity()
        .map_or(false, |e| e.key.is_some());
    let Some(NamedTypeRef::Resolved(base)) = model.base_type(id) else {
        return;
    };
    if has_own_key && !model.ancestry(id).cyclic {
        if let Some((owner, _)) = model.declared_key(*base) {
            cx.error(
                node.location(model),
                ErrorCode::InvalidKey,
                format!(
                    "key cannot be redefined; it is inherited from '{}'",
                    model.schema_type(owner).full_name()
                ),
            );
        }
    }
}

fn key_names(model: &EdmModel, id: TypeId) -> &[String] {
    model
        .schema_type(id)
        .as_entity()
        .and_then(|e| e.key.as_deref())
        .unwrap_or(&[])
}

pub static KEY_PROPERTIES_MUST_EXIST: ValidationRule = ValidationRule::new(
    "KeyPropertiesMustExist",
    NodeKind::EntityType,
    key_properties_must_exist,
);

fn key_properties_must_exist(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    for name in key_names(model, id) {
        if !matches!(model.find_property(id, name), LookupResult::Found(MemberId::Structural(_))) {
            cx.error(
                node.location(model),
                ErrorCode::BadUnresolvedProperty,
                format!("key property '{}' is not a structural property of the type", name),
            );
        }
    }
}

pub static KEY_PROPERTY_NAMES_MUST_BE_UNIQUE: ValidationRule = ValidationRule::new(
    "KeyPropertyNamesMustBeUnique",
    NodeKind::EntityType,
    key_property_names_must_be_unique,
);

fn key_property_names_must_be_unique(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    let mut seen = HashSet::new();
    for name in key_names(model, id) {
        if !seen.insert(name.as_str()) {
            cx.error(
                node.location(model),
                ErrorCode::DuplicatePropertyNameSpecifiedInEntityKey,
                format!("key property '{}' is listed more than once", name),
            );
        }
    }
}

pub static KEY_PROPERTIES_MUST_BE_NON_NULLABLE_SCALARS: ValidationRule = ValidationRule::new(
    "KeyPropertiesMustBeNonNullableScalars",
    NodeKind::EntityType,
    key_properties_must_be_non_nullable_scalars,
);

fn key_properties_must_be_non_nullable_scalars(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    for name in key_names(model, id) {
        let LookupResult::Found(MemberId::Structural(prop)) = model.find_property(id, name) else {
            continue;
        };
        let type_ref = model.property(prop).type_ref.get(model);
        let scalar = match &type_ref.definition {
            TypeDefinition::Primitive(_) | TypeDefinition::Enum(_) => true,
            TypeDefinition::TypeDefinition(def) => model
                .schema_type(*def)
                .as_type_definition()
                .map_or(false, |t| {
                    matches!(t.underlying.get(model).definition, TypeDefinition::Primitive(_))
                }),
            TypeDefinition::Unresolved(_) => continue,
            _ => false,
        };
        let location = model.property(prop).location.clone();
        if !scalar {
            cx.error(
                location,
                ErrorCode::EntityKeyMustBeScalar,
                format!("key property '{}' must be a primitive or enum type", name),
            );
        } else if type_ref.nullable {
            cx.error(
                location,
                ErrorCode::InvalidKey,
                format!("key property '{}' must not be nullable", name),
            );
        }
    }
}

// Complex types

pub static COMPLEX_TYPE_MUST_NOT_BE_ABSTRACT: ValidationRule = ValidationRule::new(
    "ComplexTypeMustNotBeAbstract",
    NodeKind::ComplexType,
    complex_type_must_not_be_abstract,
);

fn complex_type_must_not_be_abstract(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    if model.structured(id).map_or(false, |s| s.is_abstract) {
        cx.error(
            node.location(model),
            ErrorCode::InvalidAbstractComplexType,
            "complex types cannot be abstract before version 1.1",
        );
    }
}

pub static COMPLEX_TYPE_MUST_NOT_HAVE_BASE_TYPE: ValidationRule = ValidationRule::new(
    "ComplexTypeMustNotHaveBaseType",
    NodeKind::ComplexType,
    complex_type_must_not_have_base_type,
);

fn complex_type_must_not_have_base_type(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    if model.structured(id).map_or(false, |s| s.base_type.is_some()) {
        cx.error(
            node.location(model),
            ErrorCode::InvalidPolymorphicComplexType,
            "complex types cannot have a base type before version 1.1",
        );
    }
}

pub static COMPLEX_TYPE_MUST_CONTAIN_PROPERTIES: ValidationRule = ValidationRule::new(
    "ComplexTypeMustContainProperties",
    NodeKind::ComplexType,
    complex_type_must_contain_properties,
);

fn complex_type_must_contain_properties(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    let ancestry = model.ancestry(id);
    let has_members = std::iter::once(id)
        .chain(ancestry.chain.iter().copied())
        .any(|t| model.structured(t).map_or(false, |s| s.has_declared_members()));
    if !has_members {
        cx.error(
            node.location(model),
            ErrorCode::ComplexTypeMustHaveProperties,
            format!(
                "complex type '{}' must declare at least one property",
                model.schema_type(id).full_name()
            ),
        );
    }
}

// Enum types

pub static ENUM_UNDERLYING_TYPE_MUST_BE_INTEGRAL: ValidationRule = ValidationRule::new(
    "EnumUnderlyingTypeMustBeIntegral",
    NodeKind::EnumType,
    enum_underlying_type_must_be_integral,
);

fn enum_underlying_type_must_be_integral(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    let Some(enum_type) = model.schema_type(id).as_enum() else {
        return;
    };
    let underlying = enum_type.underlying.get(model);
    let integral = matches!(underlying.definition, TypeDefinition::Primitive(k) if k.is_integral());
    if !integral {
        cx.error(
            node.location(model),
            ErrorCode::EnumMustHaveIntegerUnderlyingType,
            format!(
                "underlying type '{}' is not an integer type",
                enum_type.underlying.declared.name
            ),
        );
    }
}

pub static ENUM_MEMBER_NAMES_MUST_BE_UNIQUE: ValidationRule = ValidationRule::new(
    "EnumMemberNamesMustBeUnique",
    NodeKind::EnumType,
    enum_member_names_must_be_unique,
);

fn enum_member_names_must_be_unique(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    let Some(enum_type) = model.schema_type(id).as_enum() else {
        return;
    };
    let mut seen = HashSet::new();
    for member in &enum_type.members {
        if !seen.insert(member.name.as_str()) {
            cx.error(
                node.location(model),
                ErrorCode::AlreadyDefined,
                format!("enum member '{}' is defined more than once", member.name),
            );
        }
    }
}

pub static ENUM_MEMBER_VALUES_MUST_FIT_UNDERLYING_TYPE: ValidationRule = ValidationRule::new(
    "EnumMemberValuesMustFitUnderlyingType",
    NodeKind::EnumType,
    enum_member_values_must_fit_underlying_type,
);

fn enum_member_values_must_fit_underlying_type(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    let Some(enum_type) = model.schema_type(id).as_enum() else {
        return;
    };
    let TypeDefinition::Primitive(kind) = enum_type.underlying.get(model).definition else {
        return;
    };
    let Some((min, max)) = kind.integral_range() else {
        return;
    };
    for member in &enum_type.members {
        if member.value < min || member.value > max {
            cx.error(
                node.location(model),
                ErrorCode::EnumMemberValueOutOfRange,
                format!(
                    "value {} of member '{}' does not fit in {}",
                    member.value, member.name, kind
                ),
            );
        }
    }
}

// Type definitions

pub static TYPE_DEFINITION_UNDERLYING_TYPE_MUST_BE_PRIMITIVE: ValidationRule = ValidationRule::new(
    "TypeDefinitionUnderlyingTypeMustBePrimitive",
    NodeKind::TypeDefinition,
    type_definition_underlying_type_must_be_primitive,
);

fn type_definition_underlying_type_must_be_primitive(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Type(id) = node else { return };
    let Some(def) = model.schema_type(id).as_type_definition() else {
        return;
    };
    match &def.underlying.get(model).definition {
        TypeDefinition::Primitive(_) => {}
        TypeDefinition::Unresolved(u) => {
            report_unresolved(cx, node.location(model), "underlying type", u)
        }
        _ => cx.error(
            node.location(model),
            ErrorCode::InvalidTypeDefinitionUnderlyingType,
            format!(
                "underlying type '{}' is not a primitive type",
                def.underlying.declared.name
            ),
        ),
    }
}

// Structural properties

pub static PROPERTY_TYPE_MUST_RESOLVE: ValidationRule = ValidationRule::new(
    "PropertyTypeMustResolve",
    NodeKind::StructuralProperty,
    property_type_must_resolve,
);

fn property_type_must_resolve(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Property(id) = node else { return };
    if let Some(unresolved) = model.property(id).type_ref.get(model).unresolved() {
        report_unresolved(cx, node.location(model), "type", unresolved);
    }
}

pub static COMPLEX_PROPERTY_MUST_NOT_BE_NULLABLE: ValidationRule = ValidationRule::new(
    "ComplexPropertyMustNotBeNullable",
    NodeKind::StructuralProperty,
    complex_property_must_not_be_nullable,
);

fn complex_property_must_not_be_nullable(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Property(id) = node else { return };
    let type_ref = model.property(id).type_ref.get(model);
    if matches!(type_ref.definition, TypeDefinition::Complex(_)) && type_ref.nullable {
        cx.error(
            node.location(model),
            ErrorCode::NullableComplexTypeProperty,
            "complex-typed properties must not be nullable before version 3.0",
        );
    }
}

pub static SCALE_MUST_NOT_EXCEED_PRECISION: ValidationRule = ValidationRule::new(
    "ScaleMustNotExceedPrecision",
    NodeKind::StructuralProperty,
    scale_must_not_exceed_precision,
);

fn scale_must_not_exceed_precision(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Property(id) = node else { return };
    let facets = model.property(id).type_ref.get(model).facets;
    if let (Some(precision), Some(scale)) = (facets.precision, facets.scale) {
        if scale > precision {
            cx.error(
                node.location(model),
                ErrorCode::ScaleOutOfRange,
                format!("scale {} exceeds precision {}", scale, precision),
            );
        }
    }
}

// Navigation properties

pub static NAVIGATION_TYPE_MUST_BE_ENTITY: ValidationRule = ValidationRule::new(
    "NavigationTypeMustBeEntity",
    NodeKind::NavigationProperty,
    navigation_type_must_be_entity,
);

fn navigation_type_must_be_entity(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::NavigationProperty(id) = node else { return };
    let type_ref = model.navigation_property(id).type_ref.get(model);
    if let Some(unresolved) = type_ref.unresolved() {
        report_unresolved(cx, node.location(model), "navigation target", unresolved);
    } else if type_ref.entity_type().is_none() {
        cx.error(
            node.location(model),
            ErrorCode::InvalidNavigationPropertyType,
            format!(
                "navigation property type '{}' is not an entity type",
                model.type_name(type_ref)
            ),
        );
    }
}

pub static REFERENTIAL_CONSTRAINTS_MUST_MATCH: ValidationRule = ValidationRule::new(
    "ReferentialConstraintsMustMatch",
    NodeKind::NavigationProperty,
    referential_constraints_must_match,
);

fn referential_constraints_must_match(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::NavigationProperty(id) = node else { return };
    let nav = model.navigation_property(id);
    let Some(principal_type) = nav.type_ref.get(model).entity_type() else {
        return;
    };

    for constraint in &nav.referential_constraints {
        let dependent = model.find_property(nav.declaring_type, &constraint.dependent_property);
        let principal = model.find_property(principal_type, &constraint.principal_property);
        let (dependent, principal) = match (dependent, principal) {
            (LookupResult::Found(MemberId::Structural(d)), LookupResult::Found(MemberId::Structural(p))) => (d, p),
            (LookupResult::Found(MemberId::Structural(_)), _) => {
                cx.error(
                    node.location(model),
                    ErrorCode::BadUnresolvedProperty,
                    format!(
                        "principal property '{}' not found on '{}'",
                        constraint.principal_property,
                        model.schema_type(principal_type).full_name()
                    ),
                );
                continue;
            }
            _ => {
                cx.error(
                    node.location(model),
                    ErrorCode::BadUnresolvedProperty,
                    format!(
                        "dependent property '{}' not found on '{}'",
                        constraint.dependent_property,
                        model.schema_type(nav.declaring_type).full_name()
                    ),
                );
                continue;
            }
        };

        let dependent_type = model.property(dependent).type_ref.get(model);
        let principal_type_ref = model.property(principal).type_ref.get(model);
        if !crate::equivalence::definition_equivalent(
            &dependent_type.definition,
            &principal_type_ref.definition,
        ) {
            cx.error(
                node.location(model),
                ErrorCode::TypeMismatchRelationshipConstraint,
                format!(
                    "'{}' is {} but '{}' is {}",
                    constraint.dependent_property,
                    model.type_name(dependent_type),
                    constraint.principal_property,
                    model.type_name(principal_type_ref)
                ),
            );
        }
    }
}

pub static NAVIGATION_PARTNER_MUST_EXIST: ValidationRule = ValidationRule::new(
    "NavigationPartnerMustExist",
    NodeKind::NavigationProperty,
    navigation_partner_must_exist,
);

fn navigation_partner_must_exist(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::NavigationProperty(id) = node else { return };
    let nav = model.navigation_property(id);
    let (Some(partner), Some(target)) = (&nav.partner, nav.type_ref.get(model).entity_type()) else {
        return;
    };
    if model.find_navigation_property(target, partner).is_none() {
        cx.error(
            node.location(model),
            ErrorCode::BadUnresolvedNavigationPropertyPartner,
            format!(
                "partner '{}' is not a navigation property of '{}'",
                partner,
                model.schema_type(target).full_name()
            ),
        );
    }
}

pub static NAVIGATION_PARTNER_MUST_POINT_BACK: ValidationRule = ValidationRule::new(
    "NavigationPartnerMustPointBack",
    NodeKind::NavigationProperty,
    navigation_partner_must_point_back,
);

fn navigation_partner_must_point_back(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::NavigationProperty(id) = node else { return };
    let nav = model.navigation_property(id);
    let (Some(partner_name), Some(target)) = (&nav.partner, nav.type_ref.get(model).entity_type())
    else {
        return;
    };
    let Some(partner_id) = model.find_navigation_property(target, partner_name) else {
        return;
    };
    let partner = model.navigation_property(partner_id);

    let names_back = partner.partner.as_deref().map_or(true, |back| back == nav.name);
    let types_back = partner.type_ref.get(model).entity_type().map_or(true, |back| {
        model.is_self_or_derived_from(nav.declaring_type, back)
            || model.is_self_or_derived_from(back, nav.declaring_type)
    });
    if !names_back || !types_back {
        cx.error(
            node.location(model),
            ErrorCode::InvalidNavigationPropertyPartner,
            format!(
                "partner '{}' does not point back to '{}'",
                partner_name, nav.name
            ),
        );
    }
}

// Operations

pub static OPERATIONS_NOT_SUPPORTED_BEFORE_V2: ValidationRule = ValidationRule::new(
    "OperationsNotSupportedBeforeV2",
    NodeKind::Operation,
    operations_not_supported_before_v2,
);

fn operations_not_supported_before_v2(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    cx.error(
        node.location(model),
        ErrorCode::FunctionsNotSupportedBeforeV2,
        "operations are not supported before version 2.0",
    );
}

pub static PARAMETER_NAMES_MUST_BE_UNIQUE: ValidationRule = ValidationRule::new(
    "ParameterNamesMustBeUnique",
    NodeKind::Operation,
    parameter_names_must_be_unique,
);

fn parameter_names_must_be_unique(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Operation(id) = node else { return };
    let mut seen = HashSet::new();
    for param in &model.operation(id).parameters {
        if !seen.insert(param.name.as_str()) {
            cx.error(
                node.location(model),
                ErrorCode::AlreadyDefined,
                format!("parameter '{}' is defined more than once", param.name),
            );
        }
    }
}

pub static PARAMETER_TYPES_MUST_RESOLVE: ValidationRule = ValidationRule::new(
    "ParameterTypesMustResolve",
    NodeKind::Operation,
    parameter_types_must_resolve,
);

fn parameter_types_must_resolve(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Operation(id) = node else { return };
    for param in &model.operation(id).parameters {
        if let Some(unresolved) = param.type_ref.get(model).unresolved() {
            let what = format!("type of parameter '{}'", param.name);
            report_unresolved(cx, node.location(model), &what, unresolved);
        }
    }
}

pub static RETURN_TYPE_MUST_RESOLVE: ValidationRule = ValidationRule::new(
    "ReturnTypeMustResolve",
    NodeKind::Operation,
    return_type_must_resolve,
);

fn return_type_must_resolve(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Operation(id) = node else { return };
    let Some(ret) = model.return_type(id) else {
        return;
    };
    if ret.is_bad() {
        if let Some(unresolved) = ret.inner().unresolved() {
            report_unresolved(cx, node.location(model), "return type", unresolved);
        }
    }
}

pub static BOUND_OPERATION_MUST_HAVE_PARAMETERS: ValidationRule = ValidationRule::new(
    "BoundOperationMustHaveParameters",
    NodeKind::Operation,
    bound_operation_must_have_parameters,
);

fn bound_operation_must_have_parameters(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Operation(id) = node else { return };
    let op = model.operation(id);
    if op.is_bound && op.parameters.is_empty() {
        cx.error(
            node.location(model),
            ErrorCode::BoundOperationMustHaveParameters,
            format!("bound operation '{}' has no binding parameter", op.full_name()),
        );
    }
}

pub static FUNCTION_MUST_HAVE_RETURN_TYPE: ValidationRule = ValidationRule::new(
    "FunctionMustHaveReturnType",
    NodeKind::Operation,
    function_must_have_return_type,
);

fn function_must_have_return_type(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Operation(id) = node else { return };
    let op = model.operation(id);
    if op.is_function() && op.return_type.is_none() {
        cx.error(
            node.location(model),
            ErrorCode::FunctionMustHaveReturnType,
            format!("function '{}' has no return type", op.full_name()),
        );
    }
}

fn same_return(a: Option<&OperationReturn>, b: Option<&OperationReturn>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => x.inner().is_equivalent(y.inner()),
        _ => false,
    }
}

pub static UNBOUND_FUNCTION_OVERLOADS_MUST_AGREE: ValidationRule = ValidationRule::new(
    "UnboundFunctionOverloadsMustAgree",
    NodeKind::Operation,
    unbound_function_overloads_must_agree,
);

fn unbound_function_overloads_must_agree(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Operation(id) = node else { return };
    let op = model.operation(id);
    if !op.is_function() || op.is_bound {
        return;
    }
    let first = model
        .find_operations(&op.full_name())
        .iter()
        .copied()
        .find(|other| {
            let other = model.operation(*other);
            other.is_function() && !other.is_bound
        });
    if let Some(first) = first {
        if first != id && !same_return(model.return_type(first), model.return_type(id)) {
            cx.error(
                node.location(model),
                ErrorCode::UnboundFunctionOverloadHasIncorrectReturnType,
                format!(
                    "overloads of unbound function '{}' must share one return type",
                    op.full_name()
                ),
            );
        }
    }
}

// Operation imports

pub static OPERATION_IMPORT_MUST_RESOLVE: ValidationRule = ValidationRule::new(
    "OperationImportMustResolve",
    NodeKind::OperationImport,
    operation_import_must_resolve,
);

fn operation_import_must_resolve(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::OperationImport(id) = node else { return };
    let import = model.operation_import(id);
    if model.find_operations(&import.operation).is_empty() {
        cx.error(
            node.location(model),
            ErrorCode::BadUnresolvedOperation,
            format!("operation '{}' not found", import.operation),
        );
    }
}

pub static OPERATION_IMPORT_MUST_NOT_IMPORT_BOUND: ValidationRule = ValidationRule::new(
    "OperationImportMustNotImportBound",
    NodeKind::OperationImport,
    operation_import_must_not_import_bound,
);

fn operation_import_must_not_import_bound(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::OperationImport(id) = node else { return };
    let import = model.operation_import(id);
    let group = model.find_operations(&import.operation);
    if !group.is_empty() && group.iter().all(|op| model.operation(*op).is_bound) {
        cx.error(
            node.location(model),
            ErrorCode::OperationImportCannotImportBoundOperation,
            format!("'{}' is bound and cannot be imported", import.operation),
        );
    }
}

pub static OPERATION_IMPORT_ENTITY_SET_MUST_EXIST: ValidationRule = ValidationRule::new(
    "OperationImportEntitySetMustExist",
    NodeKind::OperationImport,
    operation_import_entity_set_must_exist,
);

fn operation_import_entity_set_must_exist(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::OperationImport(id) = node else { return };
    let import = model.operation_import(id);
    let Some(set) = &import.entity_set else {
        return;
    };
    let found = model
        .find_container_member(import.container, set)
        .found()
        .and_then(|m| m.as_navigation_source());
    if found.is_none() {
        cx.error(
            node.location(model),
            ErrorCode::BadUnresolvedEntitySet,
            format!("entity set '{}' not found", set),
        );
    }
}

// Entity containers

pub static CONTAINER_MEMBER_NAMES_MUST_BE_UNIQUE: ValidationRule = ValidationRule::new(
    "ContainerMemberNamesMustBeUnique",
    NodeKind::EntityContainer,
    container_member_names_must_be_unique,
);

fn container_member_names_must_be_unique(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Container(id) = node else { return };
    for (name, binding) in &model.container(id).members {
        if let ElementBinding::Ambiguous(ambiguous) = binding {
            for member in ambiguous.candidates.iter().skip(1) {
                cx.error(
                    container_member_location(model, *member).clone(),
                    ErrorCode::DuplicateEntityContainerMemberName,
                    format!("container member '{}' is defined more than once", name),
                );
            }
        }
    }
}

pub static CONTAINER_EXTENDS_MUST_RESOLVE: ValidationRule = ValidationRule::new(
    "ContainerExtendsMustResolve",
    NodeKind::EntityContainer,
    container_extends_must_resolve,
);

fn container_extends_must_resolve(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Container(id) = node else { return };
    let mut seen = HashSet::from([id]);
    let mut current = id;
    while let Some(lookup) = model.extended_container(current) {
        match lookup {
            LookupResult::Found(next) if next == id => {
                cx.error(
                    node.location(model),
                    ErrorCode::BadCyclicEntityContainer,
                    format!("container '{}' extends itself", model.container(id).full_name()),
                );
                return;
            }
            LookupResult::Found(next) => {
                if !seen.insert(next) {
                    return;
                }
                current = next;
            }
            // Only the declaring container reports its own bad reference.
            _ if current != id => return,
            LookupResult::Ambiguous(_) | LookupResult::NotFound(_) => {
                let extends = model.container(id).extends.clone().unwrap_or_default();
                cx.error(
                    node.location(model),
                    ErrorCode::BadUnresolvedEntityContainer,
                    format!("extended container '{}' not found", extends),
                );
                return;
            }
        }
    }
}

// Navigation sources

pub static NAVIGATION_SOURCE_TYPE_MUST_BE_ENTITY: ValidationRule = ValidationRule::new(
    "NavigationSourceTypeMustBeEntity",
    NodeKind::NavigationSource,
    navigation_source_type_must_be_entity,
);

fn navigation_source_type_must_be_entity(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let source = match node {
        Node::EntitySet(id) => NavigationSource::EntitySet(id),
        Node::Singleton(id) => NavigationSource::Singleton(id),
        _ => return,
    };
    let type_ref = model.navigation_source_type(source);
    match &type_ref.definition {
        TypeDefinition::Entity(_) => {}
        TypeDefinition::Unresolved(u) => {
            report_unresolved(cx, node.location(model), "entity type", u)
        }
        _ => cx.error(
            node.location(model),
            ErrorCode::NavigationSourceTypeMustBeEntityType,
            format!("'{}' is not an entity type", model.type_name(type_ref)),
        ),
    }
}

pub static ENTITY_SET_TYPE_MUST_HAVE_KEY: ValidationRule = ValidationRule::new(
    "EntitySetTypeMustHaveKey",
    NodeKind::EntitySet,
    entity_set_type_must_have_key,
);

fn entity_set_type_must_have_key(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::EntitySet(id) = node else { return };
    let Some(ty) = model.navigation_source_entity_type(NavigationSource::EntitySet(id))
    else {
        return;
    };
    let ancestry = model.ancestry(ty);
    if ancestry.broken.is_none() && !ancestry.cyclic && model.declared_key(ty).is_none() {
        cx.error(
            node.location(model),
            ErrorCode::EntitySetTypeHasNoKeys,
            format!(
                "entity set type '{}' has no key",
                model.schema_type(ty).full_name()
            ),
        );
    }
}

pub static SINGLETONS_NOT_SUPPORTED_BEFORE_V4: ValidationRule = ValidationRule::new(
    "SingletonsNotSupportedBeforeV4",
    NodeKind::Singleton,
    singletons_not_supported_before_v4,
);

fn singletons_not_supported_before_v4(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    cx.error(
        node.location(model),
        ErrorCode::SingletonsNotSupportedBeforeV4,
        "singletons are not supported before version 4.0",
    );
}

// Navigation property bindings

pub static NAVIGATION_BINDING_MUST_RESOLVE: ValidationRule = ValidationRule::new(
    "NavigationBindingMustResolve",
    NodeKind::NavigationPropertyBinding,
    navigation_binding_must_resolve,
);

fn navigation_binding_must_resolve(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Binding(id) = node else { return };
    let resolution = model.navigation_binding(id);
    for diagnostic in resolution.diagnostics() {
        cx.report(diagnostic.clone());
    }
}

pub static NAVIGATION_BINDING_TARGET_TYPE_MUST_MATCH: ValidationRule = ValidationRule::new(
    "NavigationBindingTargetTypeMustMatch",
    NodeKind::NavigationPropertyBinding,
    navigation_binding_target_type_must_match,
);

fn navigation_binding_target_type_must_match(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Binding(id) = node else { return };
    let resolution = model.navigation_binding(id);
    let (Some(nav), Some(target)) = (resolution.navigation_property_id(), resolution.target_source())
    else {
        return;
    };
    let expected = model.navigation_property(nav).type_ref.get(model).entity_type();
    let actual = model.navigation_source_entity_type(target);
    if let (Some(expected), Some(actual)) = (expected, actual) {
        if !model.is_self_or_derived_from(actual, expected) {
            cx.error(
                node.location(model),
                ErrorCode::BindingTargetTypeMismatch,
                format!(
                    "target '{}' holds '{}', not '{}'",
                    model.navigation_source_name(target),
                    model.schema_type(actual).full_name(),
                    model.schema_type(expected).full_name()
                ),
            );
        }
    }
}

// Terms

pub static TERM_TYPE_MUST_RESOLVE: ValidationRule =
    ValidationRule::new("TermTypeMustResolve", NodeKind::Term, term_type_must_resolve);

fn term_type_must_resolve(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Term(id) = node else { return };
    if let Some(unresolved) = model.term(id).type_ref.get(model).unresolved() {
        report_unresolved(cx, node.location(model), "term type", unresolved);
    }
}

// Vocabulary annotations

pub static ANNOTATIONS_NOT_SUPPORTED_BEFORE_V3: ValidationRule = ValidationRule::new(
    "AnnotationsNotSupportedBeforeV3",
    NodeKind::VocabularyAnnotation,
    annotations_not_supported_before_v3,
);

fn annotations_not_supported_before_v3(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    cx.error(
        node.location(model),
        ErrorCode::VocabularyAnnotationsNotSupportedBeforeV3,
        "vocabulary annotations are not supported before version 3.0",
    );
}

pub static ANNOTATION_TERM_MUST_RESOLVE: ValidationRule = ValidationRule::new(
    "AnnotationTermMustResolve",
    NodeKind::VocabularyAnnotation,
    annotation_term_must_resolve,
);

fn annotation_term_must_resolve(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Annotation(id) = node else { return };
    let annotation = model.annotation(id);
    if !model.find_term(&annotation.term).is_found() {
        cx.error(
            node.location(model),
            ErrorCode::BadUnresolvedTerm,
            format!("term '{}' not found", annotation.term),
        );
    }
}

pub static ANNOTATION_TARGET_MUST_RESOLVE: ValidationRule = ValidationRule::new(
    "AnnotationTargetMustResolve",
    NodeKind::VocabularyAnnotation,
    annotation_target_must_resolve,
);

fn annotation_target_must_resolve(cx: &mut ValidationContext<'_>, node: Node) {
    let model = cx.model();
    let Node::Annotation(id) = node else { return };
    let annotation = model.annotation(id);
    if model.resolve_annotation_target(&annotation.target).is_none() {
        cx.error(
            node.location(model),
            ErrorCode::BadUnresolvedTarget,
            format!("annotation target '{}' not found", annotation.target),
        );
    }
}

pub static ANNOTATIONS_MUST_BE_UNIQUE: ValidationRule = ValidationRule::new(
    "AnnotationsMustBeUnique",
    NodeKind::Model,
    annotations_must_be_unique,
);

fn annotations_must_be_unique(cx: &mut ValidationContext<'_>, _node: Node) {
    let model = cx.model();
    let mut seen = HashSet::new();
    for id in model.annotation_ids() {
        let annotation = model.annotation(id);
        let key = (
            model.normalize_name(&annotation.target).into_owned(),
            model.normalize_name(&annotation.term).into_owned(),
            annotation.qualifier.clone(),
        );
        if !seen.insert(key) {
            cx.error(
                annotation.location.clone(),
                ErrorCode::DuplicateAnnotation,
                format!(
                    "term '{}' is applied to '{}' more than once",
                    annotation.term, annotation.target
                ),
            );
        }
    }
}

/// Rules shared by every version, in registration order.
pub static VERSION_INDEPENDENT: &[&ValidationRule] = &[
    &ELEMENT_NAME_MUST_NOT_BE_EMPTY,
    &ELEMENT_NAME_MUST_BE_SIMPLE_IDENTIFIER,
    &NAMESPACE_MUST_BE_VALID,
    &QUALIFIED_NAME_MUST_BE_UNIQUE,
    &BASE_TYPE_MUST_RESOLVE,
    &BASE_TYPE_MUST_BE_SAME_KIND,
    &INHERITANCE_MUST_NOT_BE_CYCLIC,
    &PROPERTY_NAMES_MUST_BE_UNIQUE,
    &MEMBER_NAME_MUST_NOT_MATCH_TYPE_NAME,
    &ENTITY_KEY_MUST_BE_DECLARED,
    &KEY_MUST_NOT_BE_REDEFINED,
    &KEY_PROPERTIES_MUST_EXIST,
    &KEY_PROPERTY_NAMES_MUST_BE_UNIQUE,
    &KEY_PROPERTIES_MUST_BE_NON_NULLABLE_SCALARS,
    &ENUM_UNDERLYING_TYPE_MUST_BE_INTEGRAL,
    &ENUM_MEMBER_NAMES_MUST_BE_UNIQUE,
    &ENUM_MEMBER_VALUES_MUST_FIT_UNDERLYING_TYPE,
    &TYPE_DEFINITION_UNDERLYING_TYPE_MUST_BE_PRIMITIVE,
    &PROPERTY_TYPE_MUST_RESOLVE,
    &SCALE_MUST_NOT_EXCEED_PRECISION,
    &NAVIGATION_TYPE_MUST_BE_ENTITY,
    &REFERENTIAL_CONSTRAINTS_MUST_MATCH,
    &PARAMETER_NAMES_MUST_BE_UNIQUE,
    &PARAMETER_TYPES_MUST_RESOLVE,
    &RETURN_TYPE_MUST_RESOLVE,
    &UNBOUND_FUNCTION_OVERLOADS_MUST_AGREE,
    &OPERATION_IMPORT_MUST_RESOLVE,
    &OPERATION_IMPORT_MUST_NOT_IMPORT_BOUND,
    &OPERATION_IMPORT_ENTITY_SET_MUST_EXIST,
    &CONTAINER_MEMBER_NAMES_MUST_BE_UNIQUE,
    &CONTAINER_EXTENDS_MUST_RESOLVE,
    &NAVIGATION_SOURCE_TYPE_MUST_BE_ENTITY,
    &ENTITY_SET_TYPE_MUST_HAVE_KEY,
    &NAVIGATION_BINDING_MUST_RESOLVE,
    &NAVIGATION_BINDING_TARGET_TYPE_MUST_MATCH,
    &TERM_TYPE_MUST_RESOLVE,
    &ANNOTATION_TERM_MUST_RESOLVE,
    &ANNOTATION_TARGET_MUST_RESOLVE,
    &ANNOTATIONS_MUST_BE_UNIQUE,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csdl::CsdlDocument;
    use crate::ruleset::RuleSet;
    use crate::validator::validate;
    use serde_json::json;

    fn codes(rule: &'static ValidationRule, schema: serde_json::Value) -> Vec<ErrorCode> {
        let doc: CsdlDocument = serde_json::from_value(json!({ "Schemas": [schema] })).unwrap();
        let model = EdmModel::from_documents([&doc]);
        let rules = RuleSet::new([rule], []).unwrap();
        validate(&model, &rules).into_iter().map(|d| d.code).collect()
    }

    #[test]
    fn names_must_be_identifiers() {
        let found = codes(
            &ELEMENT_NAME_MUST_BE_SIMPLE_IDENTIFIER,
            json!({ "Namespace": "NS", "ComplexTypes": [
                { "Name": "Fine", "Properties": [{ "Name": "not ok", "Type": "Edm.String" }] }
            ]}),
        );
        assert_eq!(found, vec![ErrorCode::InvalidName]);
    }

    #[test]
    fn key_is_required_unless_abstract() {
        let found = codes(
            &ENTITY_KEY_MUST_BE_DECLARED,
            json!({ "Namespace": "NS", "EntityTypes": [
                { "Name": "Keyless" },
                { "Name": "Base", "Abstract": true },
                { "Name": "Derived", "BaseType": "NS.Base", "Key": ["Id"],
                  "Properties": [{ "Name": "Id", "Type": "Edm.Int32", "Nullable": false }] }
            ]}),
        );
        assert_eq!(found, vec![ErrorCode::KeyMissingOnEntityType]);
    }

    #[test]
    fn empty_key_list_is_no_key() {
        let schema = json!({ "Namespace": "NS",
            "EntityTypes": [{ "Name": "E", "Key": [],
                "Properties": [{ "Name": "Id", "Type": "Edm.Int32", "Nullable": false }] }],
            "EntityContainers": [{ "Name": "C", "EntitySets": [{ "Name": "Es", "EntityType": "NS.E" }] }]
        });
        assert_eq!(
            codes(&ENTITY_KEY_MUST_BE_DECLARED, schema.clone()),
            vec![ErrorCode::KeyMissingOnEntityType]
        );
        assert_eq!(
            codes(&ENTITY_SET_TYPE_MUST_HAVE_KEY, schema),
            vec![ErrorCode::EntitySetTypeHasNoKeys]
        );
    }

    #[test]
    fn member_named_like_its_type_is_a_warning() {
        let doc: CsdlDocument = serde_json::from_value(json!({ "Schemas": [{
            "Namespace": "NS",
            "ComplexTypes": [{ "Name": "Point", "Properties": [{ "Name": "Point", "Type": "Edm.Int32" }] }]
        }]}))
        .unwrap();
        let model = EdmModel::from_documents([&doc]);
        let rules = RuleSet::new([&MEMBER_NAME_MUST_NOT_MATCH_TYPE_NAME], []).unwrap();

        let diagnostics = validate(&model, &rules);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, ErrorCode::InvalidMemberNameMatchesTypeName);
        assert!(!diagnostics[0].is_error());
    }

    #[test]
    fn key_properties_must_be_non_nullable_scalars() {
        let found = codes(
            &KEY_PROPERTIES_MUST_BE_NON_NULLABLE_SCALARS,
            json!({ "Namespace": "NS",
                "ComplexTypes": [{ "Name": "Address", "Properties": [{ "Name": "Street", "Type": "Edm.String" }] }],
                "EntityTypes": [{ "Name": "E", "Key": ["Loose", "Home"], "Properties": [
                    { "Name": "Loose", "Type": "Edm.Int32" },
                    { "Name": "Home", "Type": "NS.Address", "Nullable": false }
                ]}]
            }),
        );
        assert_eq!(found, vec![ErrorCode::InvalidKey, ErrorCode::EntityKeyMustBeScalar]);
    }

    #[test]
    fn inherited_property_cannot_be_redeclared() {
        let found = codes(
            &PROPERTY_NAMES_MUST_BE_UNIQUE,
            json!({ "Namespace": "NS", "ComplexTypes": [
                { "Name": "Base", "Properties": [{ "Name": "Id", "Type": "Edm.Int32" }] },
                { "Name": "Derived", "BaseType": "NS.Base", "Properties": [
                    { "Name": "Id", "Type": "Edm.Int64" },
                    { "Name": "Own", "Type": "Edm.Int64" },
                    { "Name": "Own", "Type": "Edm.Int64" }
                ]}
            ]}),
        );
        assert_eq!(found, vec![ErrorCode::AlreadyDefined, ErrorCode::AlreadyDefined]);
    }

    #[test]
    fn every_type_in_an_inheritance_cycle_is_reported() {
        let found = codes(
            &INHERITANCE_MUST_NOT_BE_CYCLIC,
            json!({ "Namespace": "NS", "EntityTypes": [
                { "Name": "A", "BaseType": "NS.B" },
                { "Name": "B", "BaseType": "NS.A" },
                { "Name": "C", "BaseType": "NS.A" }
            ]}),
        );
        assert_eq!(found, vec![ErrorCode::BadCyclicEntity, ErrorCode::BadCyclicEntity]);
    }

    #[test]
    fn enum_values_must_fit_underlying_type() {
        let found = codes(
            &ENUM_MEMBER_VALUES_MUST_FIT_UNDERLYING_TYPE,
            json!({ "Namespace": "NS", "EnumTypes": [
                { "Name": "Small", "UnderlyingType": "Edm.Byte", "Members": [
                    { "Name": "Low", "Value": 0 },
                    { "Name": "High", "Value": 300 }
                ]}
            ]}),
        );
        assert_eq!(found, vec![ErrorCode::EnumMemberValueOutOfRange]);

        let found = codes(
            &ENUM_UNDERLYING_TYPE_MUST_BE_INTEGRAL,
            json!({ "Namespace": "NS", "EnumTypes": [
                { "Name": "Text", "UnderlyingType": "Edm.String", "Members": [{ "Name": "A" }] }
            ]}),
        );
        assert_eq!(found, vec![ErrorCode::EnumMustHaveIntegerUnderlyingType]);
    }

    #[test]
    fn partner_must_point_back() {
        let found = codes(
            &NAVIGATION_PARTNER_MUST_POINT_BACK,
            json!({ "Namespace": "NS", "EntityTypes": [
                { "Name": "Customer", "NavigationProperties": [
                    { "Name": "Orders", "Type": "Collection(NS.Order)", "Partner": "Buyer" }
                ]},
                { "Name": "Order", "NavigationProperties": [
                    { "Name": "Buyer", "Type": "NS.Customer", "Partner": "Invoices" }
                ]}
            ]}),
        );
        assert_eq!(found, vec![ErrorCode::InvalidNavigationPropertyPartner]);
    }

    #[test]
    fn unbound_overloads_share_return_type() {
        let found = codes(
            &UNBOUND_FUNCTION_OVERLOADS_MUST_AGREE,
            json!({ "Namespace": "NS", "Operations": [
                { "Kind": "Function", "Name": "Count", "ReturnType": { "Type": "Edm.Int32" } },
                { "Kind": "Function", "Name": "Count",
                  "Parameters": [{ "Name": "Filter", "Type": "Edm.String" }],
                  "ReturnType": { "Type": "Edm.String" } }
            ]}),
        );
        assert_eq!(found, vec![ErrorCode::UnboundFunctionOverloadHasIncorrectReturnType]);
    }

    #[test]
    fn container_extension_cycles_and_dangling_names() {
        let found = codes(
            &CONTAINER_EXTENDS_MUST_RESOLVE,
            json!({ "Namespace": "NS", "EntityContainers": [
                { "Name": "A", "Extends": "NS.B" },
                { "Name": "B", "Extends": "NS.A" },
                { "Name": "C", "Extends": "NS.Missing" }
            ]}),
        );
        assert_eq!(
            found,
            vec![
                ErrorCode::BadCyclicEntityContainer,
                ErrorCode::BadCyclicEntityContainer,
                ErrorCode::BadUnresolvedEntityContainer
            ]
        );
    }

    #[test]
    fn binding_target_must_exist() {
        let found = codes(
            &NAVIGATION_BINDING_MUST_RESOLVE,
            json!({ "Namespace": "NS",
                "EntityTypes": [
                    { "Name": "Person", "Key": ["Id"],
                      "Properties": [{ "Name": "Id", "Type": "Edm.Int32", "Nullable": false }],
                      "NavigationProperties": [{ "Name": "Friends", "Type": "Collection(NS.Person)" }] }
                ],
                "EntityContainers": [{ "Name": "C", "EntitySets": [
                    { "Name": "People", "EntityType": "NS.Person", "NavigationPropertyBindings": [
                        { "Path": "Friends", "Target": "People" },
                        { "Path": "Friends", "Target": "Strangers" }
                    ]}
                ]}]
            }),
        );
        assert_eq!(found, vec![ErrorCode::BadUnresolvedEntitySet]);
    }

    #[test]
    fn duplicate_annotations_match_through_alias() {
        let found = codes(
            &ANNOTATIONS_MUST_BE_UNIQUE,
            json!({ "Namespace": "NS", "Alias": "Self",
                "Terms": [{ "Name": "Label", "Type": "Edm.String" }],
                "EntityTypes": [{ "Name": "E" }],
                "Annotations": [{ "Target": "NS.E", "Annotations": [
                    { "Term": "NS.Label", "Value": "a" },
                    { "Term": "Self.Label", "Value": "b" },
                    { "Term": "NS.Label", "Qualifier": "Short", "Value": "c" }
                ]}]
            }),
        );
        assert_eq!(found, vec![ErrorCode::DuplicateAnnotation]);
    }

    #[test]
    fn versioned_rules_are_not_in_the_shared_list() {
        for rule in [
            &OPEN_TYPES_NOT_SUPPORTED,
            &SINGLETONS_NOT_SUPPORTED_BEFORE_V4,
            &NAVIGATION_PARTNER_MUST_EXIST,
        ] {
            assert!(!VERSION_INDEPENDENT.iter().any(|r| *r == rule));
        }
    }
}
