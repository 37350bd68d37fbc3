//! Allocation of parsed CSDL documents into a model arena.
//!
//! The builder copies every element into [`EdmModel`] and records
//! cross references exactly as written. No name is looked up here; lookups
//! happen lazily once the model is finished.

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::csdl::{
    CsdlComplexType, CsdlDocument, CsdlEntityContainer, CsdlEntityType, CsdlEnumType,
    CsdlNavigationProperty, CsdlNavigationPropertyBinding, CsdlOperation, CsdlProperty,
    CsdlSchema, CsdlTerm, CsdlTypeDefinition, CsdlTypeRef, SourcePosition,
};
use crate::diagnostic::Location;
use crate::index::register;
use crate::model::{
    qualify, BindingId, ContainerId, ContainerMember, DeclaredType, EdmModel, EntityContainer,
    EntitySet, EntitySetId, EntityType, EnumMember, EnumType, LazyTypeRef, MemberId,
    NavigationProperty, NavigationPropertyBinding, NavigationPropertyId, NavigationSource,
    Operation, OperationImport, OperationImportId, OperationParameter, PropertyId,
    ReferentialConstraint, SchemaInfo, SchemaType, SchemaTypeDef, Singleton, SingletonId,
    StructuralProperty, StructuredType, Term, TypeDefinitionType, TypeId, VocabularyAnnotation,
};
use crate::types::{Facets, PrimitiveKind};

/// Incrementally assembles an [`EdmModel`] from CSDL documents.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    model: EdmModel,
}

/// Where a document's elements are reported.
struct DocContext<'a> {
    source: Option<&'a str>,
}

impl DocContext<'_> {
    fn locate(&self, position: Option<SourcePosition>, path: impl FnOnce() -> String) -> Location {
        match position {
            Some(pos) => Location::Source {
                document: self.source.map(str::to_string),
                line: pos.line,
                column: pos.column,
            },
            None => Location::element(path()),
        }
    }
}

fn declared(type_ref: &CsdlTypeRef) -> DeclaredType {
    DeclaredType::new(
        type_ref.r#type.clone(),
        type_ref.nullable,
        Facets::from(type_ref.facets),
    )
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every schema of `doc`. Documents may reference each other in any order.
    pub fn add_document(&mut self, doc: &CsdlDocument) -> &mut Self {
        if self.model.declared_version.is_none() {
            self.model.declared_version = doc.version.clone();
        }
        let cx = DocContext {
            source: doc.source.as_deref(),
        };
        for schema in &doc.schemas {
            self.add_schema(&cx, schema);
        }
        self
    }

    pub fn finish(self) -> EdmModel {
        let model = self.model;
        info!(
            schemas = model.schemas.len(),
            types = model.types.len(),
            operations = model.operations.len(),
            containers = model.containers.len(),
            annotations = model.annotations.len(),
            "built EDM model"
        );
        model
    }

    fn add_schema(&mut self, cx: &DocContext<'_>, schema: &CsdlSchema) {
        let ns = schema.namespace.as_str();
        debug!(namespace = ns, "adding schema");
        self.model.schemas.push(SchemaInfo {
            namespace: schema.namespace.clone(),
            alias: schema.alias.clone(),
        });

        for ty in &schema.entity_types {
            self.add_entity_type(cx, ns, ty);
        }
        for ty in &schema.complex_types {
            self.add_complex_type(cx, ns, ty);
        }
        for ty in &schema.enum_types {
            self.add_enum_type(cx, ns, ty);
        }
        for ty in &schema.type_definitions {
            self.add_type_definition(cx, ns, ty);
        }
        for op in &schema.operations {
            self.add_operation(cx, ns, op);
        }
        for term in &schema.terms {
            self.add_term(cx, ns, term);
        }
        for container in &schema.entity_containers {
            self.add_container(cx, ns, container);
        }
        for group in &schema.annotations {
            for annotation in &group.annotations {
                let path = || {
                    let mut path = format!("{}@{}", group.target, annotation.term);
                    if let Some(q) = &annotation.qualifier {
                        path.push('#');
                        path.push_str(q);
                    }
                    path
                };
                let location = cx.locate(annotation.location, path);
                self.model.annotations.push(VocabularyAnnotation {
                    target: group.target.clone(),
                    term: annotation.term.clone(),
                    qualifier: annotation.qualifier.clone(),
                    value: annotation.value.clone(),
                    namespace: schema.namespace.clone(),
                    location,
                });
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn add_structure(
        &mut self,
        cx: &DocContext<'_>,
        type_id: TypeId,
        full_name: &str,
        base_type: Option<&String>,
        is_abstract: bool,
        is_open: bool,
        properties: &[CsdlProperty],
        navigation_properties: &[CsdlNavigationProperty],
    ) -> StructuredType {
        let mut members = IndexMap::new();
        let mut property_ids = Vec::with_capacity(properties.len());
        let mut navigation_ids = Vec::with_capacity(navigation_properties.len());

        for prop in properties {
            let id = PropertyId::from_index(self.model.properties.len());
            let location = cx.locate(prop.location, || format!("{}/{}", full_name, prop.name));
            self.model.properties.push(StructuralProperty {
                name: prop.name.clone(),
                declaring_type: type_id,
                type_ref: LazyTypeRef::new(declared(&prop.type_ref)),
                default_value: prop.default_value.clone(),
                location,
            });
            register(&mut members, &prop.name, MemberId::Structural(id));
            property_ids.push(id);
        }

        for nav in navigation_properties {
            let id = NavigationPropertyId::from_index(self.model.navigation_properties.len());
            let location = cx.locate(nav.location, || format!("{}/{}", full_name, nav.name));
            self.model.navigation_properties.push(NavigationProperty {
                name: nav.name.clone(),
                declaring_type: type_id,
                type_ref: LazyTypeRef::new(DeclaredType::new(
                    nav.r#type.clone(),
                    nav.nullable,
                    Facets::default(),
                )),
                partner: nav.partner.clone(),
                contains_target: nav.contains_target,
                referential_constraints: nav
                    .referential_constraints
                    .iter()
                    .map(|c| ReferentialConstraint {
                        dependent_property: c.property.clone(),
                        principal_property: c.referenced_property.clone(),
                    })
                    .collect(),
                location,
            });
            register(&mut members, &nav.name, MemberId::Navigation(id));
            navigation_ids.push(id);
        }

        StructuredType {
            base_type: base_type.cloned(),
            is_abstract,
            is_open,
            properties: property_ids,
            navigation_properties: navigation_ids,
            members,
            resolved_base: OnceCell::new(),
        }
    }

    fn next_type_id(&self) -> TypeId {
        TypeId::from_index(self.model.types.len())
    }

    fn add_entity_type(&mut self, cx: &DocContext<'_>, ns: &str, ty: &CsdlEntityType) {
        let id = self.next_type_id();
        let full_name = qualify(ns, &ty.name);
        let structure = self.add_structure(
            cx,
            id,
            &full_name,
            ty.base_type.as_ref(),
            ty.r#abstract,
            ty.open_type,
            &ty.properties,
            &ty.navigation_properties,
        );
        let location = cx.locate(ty.location, || full_name.clone());
        self.model.types.push(SchemaType {
            name: ty.name.clone(),
            namespace: ns.to_string(),
            location,
            def: SchemaTypeDef::Entity(EntityType {
                structure,
                // `"Key": []` declares no key
                key: ty.key.clone().filter(|key| !key.is_empty()),
                has_stream: ty.has_stream,
            }),
        });
    }

    fn add_complex_type(&mut self, cx: &DocContext<'_>, ns: &str, ty: &CsdlComplexType) {
        let id = self.next_type_id();
        let full_name = qualify(ns, &ty.name);
        let structure = self.add_structure(
            cx,
            id,
            &full_name,
            ty.base_type.as_ref(),
            ty.r#abstract,
            ty.open_type,
            &ty.properties,
            &ty.navigation_properties,
        );
        let location = cx.locate(ty.location, || full_name.clone());
        self.model.types.push(SchemaType {
            name: ty.name.clone(),
            namespace: ns.to_string(),
            location,
            def: SchemaTypeDef::Complex(structure),
        });
    }

    fn add_enum_type(&mut self, cx: &DocContext<'_>, ns: &str, ty: &CsdlEnumType) {
        let underlying = ty
            .underlying_type
            .clone()
            .unwrap_or_else(|| PrimitiveKind::Int32.to_string());

        // Implicit values continue from the previous member.
        let mut next = 0i64;
        let members = ty
            .members
            .iter()
            .map(|m| {
                let value = m.value.unwrap_or(next);
                next = value.saturating_add(1);
                EnumMember {
                    name: m.name.clone(),
                    value,
                    explicit: m.value.is_some(),
                }
            })
            .collect();

        let location = cx.locate(ty.location, || qualify(ns, &ty.name));
        self.model.types.push(SchemaType {
            name: ty.name.clone(),
            namespace: ns.to_string(),
            location,
            def: SchemaTypeDef::Enum(EnumType {
                underlying: LazyTypeRef::new(DeclaredType::new(underlying, false, Facets::default())),
                is_flags: ty.is_flags,
                members,
            }),
        });
    }

    fn add_type_definition(&mut self, cx: &DocContext<'_>, ns: &str, ty: &CsdlTypeDefinition) {
        let location = cx.locate(ty.location, || qualify(ns, &ty.name));
        self.model.types.push(SchemaType {
            name: ty.name.clone(),
            namespace: ns.to_string(),
            location,
            def: SchemaTypeDef::TypeDefinition(TypeDefinitionType {
                underlying: LazyTypeRef::new(DeclaredType::new(
                    ty.underlying_type.clone(),
                    true,
                    Facets::from(ty.facets),
                )),
            }),
        });
    }

    fn add_operation(&mut self, cx: &DocContext<'_>, ns: &str, op: &CsdlOperation) {
        let location = cx.locate(op.location, || qualify(ns, &op.name));
        self.model.operations.push(Operation {
            kind: op.kind,
            name: op.name.clone(),
            namespace: ns.to_string(),
            is_bound: op.is_bound,
            is_composable: op.is_composable,
            entity_set_path: op.entity_set_path.clone(),
            parameters: op
                .parameters
                .iter()
                .map(|p| OperationParameter {
                    name: p.name.clone(),
                    type_ref: LazyTypeRef::new(declared(&p.type_ref)),
                })
                .collect(),
            return_type: op.return_type.as_ref().map(declared),
            location,
            resolved_return: OnceCell::new(),
        });
    }

    fn add_term(&mut self, cx: &DocContext<'_>, ns: &str, term: &CsdlTerm) {
        let location = cx.locate(term.location, || qualify(ns, &term.name));
        self.model.terms.push(Term {
            name: term.name.clone(),
            namespace: ns.to_string(),
            type_ref: LazyTypeRef::new(declared(&term.type_ref)),
            base_term: term.base_term.clone(),
            applies_to: term.applies_to.clone(),
            default_value: term.default_value.clone(),
            location,
        });
    }

    fn add_container(&mut self, cx: &DocContext<'_>, ns: &str, csdl: &CsdlEntityContainer) {
        let container_id = ContainerId::from_index(self.model.containers.len());
        let full_name = qualify(ns, &csdl.name);
        let mut members = IndexMap::new();
        let mut entity_sets = Vec::new();
        let mut singletons = Vec::new();
        let mut operation_imports = Vec::new();

        for set in &csdl.entity_sets {
            let id = EntitySetId::from_index(self.model.entity_sets.len());
            let set_path = format!("{}/{}", full_name, set.name);
            let bindings = self.add_bindings(
                cx,
                &set_path,
                NavigationSource::EntitySet(id),
                &set.navigation_property_bindings,
            );
            let location = cx.locate(set.location, || set_path.clone());
            self.model.entity_sets.push(EntitySet {
                name: set.name.clone(),
                container: container_id,
                entity_type: LazyTypeRef::new(DeclaredType::new(
                    set.entity_type.clone(),
                    false,
                    Facets::default(),
                )),
                include_in_service_document: set.include_in_service_document,
                bindings,
                location,
            });
            register(&mut members, &set.name, ContainerMember::EntitySet(id));
            entity_sets.push(id);
        }

        for singleton in &csdl.singletons {
            let id = SingletonId::from_index(self.model.singletons.len());
            let singleton_path = format!("{}/{}", full_name, singleton.name);
            let bindings = self.add_bindings(
                cx,
                &singleton_path,
                NavigationSource::Singleton(id),
                &singleton.navigation_property_bindings,
            );
            let location = cx.locate(singleton.location, || singleton_path.clone());
            self.model.singletons.push(Singleton {
                name: singleton.name.clone(),
                container: container_id,
                entity_type: LazyTypeRef::new(DeclaredType::new(
                    singleton.r#type.clone(),
                    false,
                    Facets::default(),
                )),
                bindings,
                location,
            });
            register(&mut members, &singleton.name, ContainerMember::Singleton(id));
            singletons.push(id);
        }

        for import in &csdl.operation_imports {
            let id = OperationImportId::from_index(self.model.operation_imports.len());
            let location = cx.locate(import.location, || format!("{}/{}", full_name, import.name));
            self.model.operation_imports.push(OperationImport {
                kind: import.kind,
                name: import.name.clone(),
                container: container_id,
                operation: import.operation.clone(),
                entity_set: import.entity_set.clone(),
                location,
            });
            register(&mut members, &import.name, ContainerMember::OperationImport(id));
            operation_imports.push(id);
        }

        let location = cx.locate(csdl.location, || full_name.clone());
        self.model.containers.push(EntityContainer {
            name: csdl.name.clone(),
            namespace: ns.to_string(),
            extends: csdl.extends.clone(),
            entity_sets,
            singletons,
            operation_imports,
            location,
            members,
        });
    }

    fn add_bindings(
        &mut self,
        cx: &DocContext<'_>,
        source_path: &str,
        source: NavigationSource,
        bindings: &[CsdlNavigationPropertyBinding],
    ) -> Vec<BindingId> {
        bindings
            .iter()
            .map(|b| {
                let id = BindingId::from_index(self.model.bindings.len());
                let location = cx.locate(b.location, || format!("{}/{}", source_path, b.path));
                self.model.bindings.push(NavigationPropertyBinding {
                    path: b.path.clone(),
                    target: b.target.clone(),
                    source,
                    location,
                });
                id
            })
            .collect()
    }
}

impl EdmModel {
    /// Build a model from any number of documents.
    pub fn from_documents<'a>(docs: impl IntoIterator<Item = &'a CsdlDocument>) -> EdmModel {
        let mut builder = ModelBuilder::new();
        for doc in docs {
            builder.add_document(doc);
        }
        builder.finish()
    }
}
