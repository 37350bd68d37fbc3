//! EDM Schema
//!
//! Semantic resolution and versioned validation of Entity Data Model schemas.
//!
//! CSDL documents are loaded into an [`EdmModel`]: an arena of types,
//! properties, operations, terms and containers whose cross references are
//! resolved lazily. Names that do not bind become explicit sentinels
//! ([`TypeDefinition::Unresolved`], [`LookupResult::Ambiguous`]) instead of
//! failing construction, and [`validate`] reports them as [`Diagnostic`]s
//! together with every rule violation for the chosen [`EdmVersion`].
//!
//! # Example
//!
//! ```
//! use edm_schema::{get_ruleset, load_document_str, validate, EdmModel, EdmVersion, ErrorCode};
//!
//! let doc = load_document_str(r#"{
//!     "Schemas": [{
//!         "Namespace": "Sales",
//!         "EntityTypes": [{ "Name": "Customer" }]
//!     }]
//! }"#).unwrap();
//!
//! let model = EdmModel::from_documents([&doc]);
//! assert!(model.find_type("Sales.Customer").is_found());
//!
//! // Customer declares no key
//! let diagnostics = validate(&model, get_ruleset(EdmVersion::V4));
//! assert!(diagnostics.iter().any(|d| d.code == ErrorCode::KeyMissingOnEntityType));
//! ```
//!
//! # Versions
//!
//! | Version | Adds over the previous version |
//! |---------|--------------------------------|
//! | 1.0 | entity and complex types, containers |
//! | 1.1 | abstract and derived complex types |
//! | 1.2 | open types |
//! | 2.0 | operations |
//! | 3.0 | vocabulary annotations, nullable complex properties |
//! | 4.0 | singletons, empty complex types; partner and operation checks |

mod builder;
mod cache;
pub mod csdl;
mod diagnostic;
mod equivalence;
mod error;
mod index;
mod loader;
mod model;
mod resolver;
pub mod rules;
mod ruleset;
mod typeref;
mod types;
mod validator;

pub use builder::ModelBuilder;
pub use cache::LazyCache;
pub use diagnostic::{Diagnostic, ErrorCode, Location, Severity};
pub use equivalence::definition_equivalent;
pub use error::{LoadError, RuleSetError};
pub use index::{AmbiguousBinding, ElementBinding, LookupResult, NameIndex, SchemaElementRef};
pub use loader::{load_document, load_document_str, load_model};
pub use model::{
    AnnotationId, BindingId, ContainerId, ContainerMember, DeclaredType, EdmModel,
    EntityContainer, EntitySet, EntitySetId, EntityType, EnumMember, EnumType, LazyTypeRef,
    MemberId, NavigationProperty, NavigationPropertyBinding, NavigationPropertyId,
    NavigationSource, Operation, OperationId, OperationImport, OperationImportId,
    OperationParameter, PropertyId, ReferentialConstraint, SchemaInfo, SchemaType,
    SchemaTypeDef, Singleton, SingletonId, StructuralProperty, StructuredType, Term, TermId,
    TypeDefinitionType, TypeId, VocabularyAnnotation,
};
pub use resolver::{
    parse_type_name, Ancestry, AnnotationTarget, BindingPathResolution, BindingTargetResolution,
    NamedTypeRef, NavigationBindingResolution, TypeNameSyntax, UnresolvedEntitySet,
    UnresolvedPath,
};
pub use ruleset::{base_ruleset, get_ruleset, RuleCheck, RuleSet, ValidationRule};
pub use typeref::{
    EdmTypeReference, OperationReturn, TypeDefinition, TypeReference, UnresolvedReason,
    UnresolvedType,
};
pub use types::{
    is_simple_identifier, split_qualified_name, Capability, EdmVersion, Facets, OperationKind,
    PathKind, PrimitiveKind, TypeKind, EDM_NAMESPACE, PATH_SEPARATOR, UNTYPED_NAME,
};
pub use validator::{validate, validate_version, Edge, Node, NodeKind, ValidationContext};
