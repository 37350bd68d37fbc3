//! Lazy reference resolution.
//!
//! Textual references are resolved the first time they are dereferenced and
//! the result is cached on the model. A reference that does not bind yields a
//! sentinel value (an [`UnresolvedType`], an [`UnresolvedPath`] or an
//! [`UnresolvedEntitySet`]) instead of an error, so callers can keep walking
//! a broken model and report everything at once.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::diagnostic::{Diagnostic, ErrorCode, Location};
use crate::index::LookupResult;
use crate::model::{
    BindingId, ContainerId, ContainerMember, EdmModel, MemberId, NavigationPropertyId,
    NavigationSource, OperationId, TermId, TypeId,
};
use crate::typeref::{OperationReturn, TypeDefinition, TypeReference, UnresolvedReason, UnresolvedType};
use crate::types::{Facets, PathKind, PrimitiveKind, TypeKind, PATH_SEPARATOR, UNTYPED_NAME};

/// Syntactic shape of a type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeNameSyntax<'a> {
    /// `Collection(T)`
    Collection(&'a str),
    /// `Ref(T)`, an entity reference.
    Reference(&'a str),
    Named(&'a str),
    Malformed,
}

/// Classify a type name without looking anything up.
pub fn parse_type_name(text: &str) -> TypeNameSyntax<'_> {
    let text = text.trim();
    if text.is_empty() {
        return TypeNameSyntax::Malformed;
    }
    if let Some(rest) = text.strip_prefix("Collection(") {
        return match wrapped(rest) {
            Some(inner) => TypeNameSyntax::Collection(inner),
            None => TypeNameSyntax::Malformed,
        };
    }
    if let Some(rest) = text.strip_prefix("Ref(") {
        return match wrapped(rest) {
            Some(inner) => TypeNameSyntax::Reference(inner),
            None => TypeNameSyntax::Malformed,
        };
    }
    if text.contains(['(', ')']) {
        return TypeNameSyntax::Malformed;
    }
    TypeNameSyntax::Named(text)
}

fn wrapped(rest: &str) -> Option<&str> {
    let inner = rest.strip_suffix(')')?.trim();
    (!inner.is_empty()).then_some(inner)
}

/// A resolved or unresolved named type, used for base types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NamedTypeRef {
    Resolved(TypeId),
    Unresolved(UnresolvedType),
}

impl NamedTypeRef {
    pub fn id(&self) -> Option<TypeId> {
        match self {
            NamedTypeRef::Resolved(id) => Some(*id),
            NamedTypeRef::Unresolved(_) => None,
        }
    }
}

/// The base-type chain of a structured type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestry {
    /// Ancestors nearest first, each listed once.
    pub chain: Vec<TypeId>,
    /// The walk revisited a type.
    pub cyclic: bool,
    /// The walk came back to the starting type itself.
    pub in_cycle: bool,
    /// The first base type that failed to resolve.
    pub broken: Option<UnresolvedType>,
}

/// Navigation-property half of a binding resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingPathResolution {
    Resolved(NavigationPropertyId),
    UnresolvedPath(UnresolvedPath),
}

/// A binding path that did not lead to a navigation property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedPath {
    pub name: String,
    pub diagnostic: Diagnostic,
}

/// Target half of a binding resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingTargetResolution {
    Resolved(NavigationSource),
    UnresolvedEntitySet(UnresolvedEntitySet),
}

/// A binding target that names no entity set or singleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedEntitySet {
    pub name: String,
    pub diagnostic: Diagnostic,
}

/// Both halves of a navigation property binding, resolved independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationBindingResolution {
    pub navigation_property: BindingPathResolution,
    pub target: BindingTargetResolution,
}

impl NavigationBindingResolution {
    pub fn is_resolved(&self) -> bool {
        self.navigation_property_id().is_some() && self.target_source().is_some()
    }

    pub fn navigation_property_id(&self) -> Option<NavigationPropertyId> {
        match &self.navigation_property {
            BindingPathResolution::Resolved(id) => Some(*id),
            BindingPathResolution::UnresolvedPath(_) => None,
        }
    }

    pub fn target_source(&self) -> Option<NavigationSource> {
        match &self.target {
            BindingTargetResolution::Resolved(source) => Some(*source),
            BindingTargetResolution::UnresolvedEntitySet(_) => None,
        }
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        let path = match &self.navigation_property {
            BindingPathResolution::UnresolvedPath(p) => Some(&p.diagnostic),
            BindingPathResolution::Resolved(_) => None,
        };
        let target = match &self.target {
            BindingTargetResolution::UnresolvedEntitySet(t) => Some(&t.diagnostic),
            BindingTargetResolution::Resolved(_) => None,
        };
        path.into_iter().chain(target)
    }
}

/// What an annotation target path names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationTarget {
    Type(TypeId),
    Member(TypeId, MemberId),
    Term(TermId),
    Operations(Vec<OperationId>),
    Container(ContainerId),
    ContainerMember(ContainerId, ContainerMember),
}

fn unresolved_ref(name: &str, reason: UnresolvedReason, nullable: bool) -> TypeReference {
    TypeReference::new(
        TypeDefinition::Unresolved(UnresolvedType {
            name: name.to_string(),
            reason,
        }),
        nullable,
    )
}

impl EdmModel {
    /// Resolve a type name as written in CSDL.
    ///
    /// Never fails: names that do not bind come back as
    /// [`TypeDefinition::Unresolved`].
    pub fn resolve_type_name(&self, name: &str, nullable: bool, facets: Facets) -> TypeReference {
        match parse_type_name(name) {
            TypeNameSyntax::Collection(inner) => {
                let element = self.resolve_type_name(inner, nullable, facets);
                TypeReference::new(TypeDefinition::Collection(Box::new(element)), nullable)
            }
            TypeNameSyntax::Reference(inner) => {
                let target = self.resolve_type_name(inner, nullable, Facets::default());
                match target.definition {
                    TypeDefinition::Entity(id) => {
                        TypeReference::new(TypeDefinition::EntityReference(id), nullable)
                    }
                    TypeDefinition::Unresolved(u) => {
                        TypeReference::new(TypeDefinition::Unresolved(u), nullable)
                    }
                    other => {
                        debug!(name, "entity reference to non-entity type");
                        unresolved_ref(name, UnresolvedReason::WrongKind(other.type_kind()), nullable)
                    }
                }
            }
            TypeNameSyntax::Malformed => {
                debug!(name, "malformed type name");
                unresolved_ref(name, UnresolvedReason::Malformed, nullable)
            }
            TypeNameSyntax::Named(named) => self.resolve_named_type(named, nullable, facets),
        }
    }

    fn resolve_named_type(&self, name: &str, nullable: bool, facets: Facets) -> TypeReference {
        if name == UNTYPED_NAME {
            return TypeReference::new(TypeDefinition::Untyped, nullable);
        }
        if let Some(kind) = PrimitiveKind::from_qualified_name(name) {
            return TypeReference::primitive(kind, nullable).with_facets(facets);
        }
        if let Some(kind) = PathKind::from_qualified_name(name) {
            return TypeReference::new(TypeDefinition::Path(kind), nullable);
        }

        match self.find_type(name) {
            LookupResult::Found(id) => {
                let definition = match self.schema_type(id).type_kind() {
                    TypeKind::Entity => TypeDefinition::Entity(id),
                    TypeKind::Complex => TypeDefinition::Complex(id),
                    TypeKind::Enum => TypeDefinition::Enum(id),
                    _ => TypeDefinition::TypeDefinition(id),
                };
                TypeReference::new(definition, nullable).with_facets(facets)
            }
            LookupResult::Ambiguous(candidates) => {
                debug!(name, candidates = candidates.len(), "ambiguous type reference");
                unresolved_ref(name, UnresolvedReason::Ambiguous(candidates), nullable)
            }
            LookupResult::NotFound(_) => {
                debug!(name, "unresolved type reference");
                unresolved_ref(name, UnresolvedReason::NotFound, nullable)
            }
        }
    }

    /// Resolved base type of a structured type; `None` when none is declared.
    pub fn base_type(&self, id: TypeId) -> Option<&NamedTypeRef> {
        let structure = self.structured(id)?;
        structure
            .resolved_base
            .get_or_init(|| {
                let name = structure.base_type.as_deref()?;
                let resolved = match self.find_type(name) {
                    LookupResult::Found(base) if self.schema_type(base).type_kind().is_structured() => {
                        NamedTypeRef::Resolved(base)
                    }
                    LookupResult::Found(base) => NamedTypeRef::Unresolved(UnresolvedType {
                        name: name.to_string(),
                        reason: UnresolvedReason::WrongKind(self.schema_type(base).type_kind()),
                    }),
                    LookupResult::Ambiguous(candidates) => NamedTypeRef::Unresolved(UnresolvedType {
                        name: name.to_string(),
                        reason: UnresolvedReason::Ambiguous(candidates),
                    }),
                    LookupResult::NotFound(_) => {
                        NamedTypeRef::Unresolved(UnresolvedType::not_found(name))
                    }
                };
                if let NamedTypeRef::Unresolved(u) = &resolved {
                    debug!(base = %u.name, "unresolved base type");
                }
                Some(resolved)
            })
            .as_ref()
    }

    /// Base-type chain of `id`, computed once per type.
    pub fn ancestry(&self, id: TypeId) -> Arc<Ancestry> {
        self.ancestry.get_or_insert_with(id, || {
            let ancestry = self.compute_ancestry(id);
            debug!(
                type_name = %self.schema_type(id).full_name(),
                depth = ancestry.chain.len(),
                cyclic = ancestry.cyclic,
                "cached ancestry"
            );
            Arc::new(ancestry)
        })
    }

    fn compute_ancestry(&self, id: TypeId) -> Ancestry {
        let mut ancestry = Ancestry {
            chain: Vec::new(),
            cyclic: false,
            in_cycle: false,
            broken: None,
        };
        let mut seen = HashSet::from([id]);
        let mut current = id;
        loop {
            match self.base_type(current) {
                None => break,
                Some(NamedTypeRef::Unresolved(u)) => {
                    ancestry.broken = Some(u.clone());
                    break;
                }
                Some(NamedTypeRef::Resolved(base)) => {
                    if !seen.insert(*base) {
                        ancestry.cyclic = true;
                        ancestry.in_cycle = *base == id;
                        break;
                    }
                    ancestry.chain.push(*base);
                    current = *base;
                }
            }
        }
        ancestry
    }

    /// True when `ty` is `base` or one of its descendants.
    pub fn is_self_or_derived_from(&self, ty: TypeId, base: TypeId) -> bool {
        ty == base || self.ancestry(ty).chain.contains(&base)
    }

    /// Look up a property by name on `ty` and then its ancestors.
    ///
    /// The nearest declaring type wins; a name declared twice on that type is
    /// ambiguous.
    pub fn find_property(&self, ty: TypeId, name: &str) -> LookupResult<MemberId> {
        let ancestry = self.ancestry(ty);
        for candidate in std::iter::once(ty).chain(ancestry.chain.iter().copied()) {
            if let Some(binding) = self
                .structured(candidate)
                .and_then(|s| s.members.get(name))
            {
                return binding.to_lookup();
            }
        }
        LookupResult::NotFound(name.to_string())
    }

    pub fn find_navigation_property(&self, ty: TypeId, name: &str) -> Option<NavigationPropertyId> {
        match self.find_property(ty, name) {
            LookupResult::Found(MemberId::Navigation(id)) => Some(id),
            _ => None,
        }
    }

    /// Key of an entity type: its own, or the nearest ancestor's.
    pub fn declared_key(&self, ty: TypeId) -> Option<(TypeId, &[String])> {
        let ancestry = self.ancestry(ty);
        std::iter::once(ty)
            .chain(ancestry.chain.iter().copied())
            .find_map(|id| {
                self.schema_type(id)
                    .as_entity()
                    .and_then(|e| e.key.as_deref())
                    .map(|key| (id, key))
            })
    }

    /// Resolved return type of an operation; `None` for actions without one.
    pub fn return_type(&self, id: OperationId) -> Option<&OperationReturn> {
        let op = self.operation(id);
        op.resolved_return
            .get_or_init(|| {
                op.return_type.as_ref().map(|declared| {
                    OperationReturn::new(
                        self.resolve_type_name(&declared.name, declared.nullable, declared.facets),
                        id,
                    )
                })
            })
            .as_ref()
    }

    /// Container named by `extends`, if declared.
    pub fn extended_container(&self, id: ContainerId) -> Option<LookupResult<ContainerId>> {
        let extends = self.container(id).extends.as_deref()?;
        Some(self.find_entity_container(extends))
    }

    /// Look up a container member in `id` and then the containers it extends.
    pub fn find_container_member(&self, id: ContainerId, name: &str) -> LookupResult<ContainerMember> {
        let mut seen = HashSet::new();
        let mut current = id;
        while seen.insert(current) {
            if let Some(binding) = self.container(current).members.get(name) {
                return binding.to_lookup();
            }
            match self.extended_container(current) {
                Some(LookupResult::Found(next)) => current = next,
                _ => break,
            }
        }
        LookupResult::NotFound(name.to_string())
    }

    /// Resolve a binding `path` and `target` from `source`.
    ///
    /// Diagnostics are placed at the source's location; declared bindings
    /// go through [`EdmModel::navigation_binding`] instead.
    pub fn resolve_navigation_binding(
        &self,
        source: NavigationSource,
        path: &str,
        target: &str,
    ) -> NavigationBindingResolution {
        let location = self.navigation_source_location(source).clone();
        self.resolve_binding_at(source, path, target, &location)
    }

    /// Cached resolution of a declared binding. Repeated calls return the same `Arc`.
    pub fn navigation_binding(&self, id: BindingId) -> Arc<NavigationBindingResolution> {
        self.resolved_bindings.get_or_insert_with(id, || {
            let binding = self.binding(id);
            let resolution =
                self.resolve_binding_at(binding.source, &binding.path, &binding.target, &binding.location);
            debug!(
                path = %binding.path,
                target = %binding.target,
                resolved = resolution.is_resolved(),
                "cached navigation binding"
            );
            Arc::new(resolution)
        })
    }

    fn resolve_binding_at(
        &self,
        source: NavigationSource,
        path: &str,
        target: &str,
        location: &Location,
    ) -> NavigationBindingResolution {
        NavigationBindingResolution {
            navigation_property: self.resolve_binding_path(source, path, location),
            target: self.resolve_binding_target(source, target, location),
        }
    }

    fn resolve_binding_path(
        &self,
        source: NavigationSource,
        path: &str,
        location: &Location,
    ) -> BindingPathResolution {
        let unresolved = |name: &str, message: String| {
            debug!(path, "unresolved navigation binding path");
            BindingPathResolution::UnresolvedPath(UnresolvedPath {
                name: name.to_string(),
                diagnostic: Diagnostic::error(
                    location.clone(),
                    ErrorCode::BadUnresolvedNavigationPropertyPath,
                    message,
                ),
            })
        };

        if path.is_empty() {
            return unresolved("", "navigation binding path is empty".to_string());
        }

        let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
        if segments.len() > 2 {
            return unresolved(path, format!("bad binding path '{}'", path));
        }

        let Some(start) = self.navigation_source_entity_type(source) else {
            return unresolved(
                path,
                format!(
                    "cannot resolve '{}': '{}' is not typed by an entity type",
                    path,
                    self.navigation_source_name(source)
                ),
            );
        };

        let (ty, nav_name) = match segments.as_slice() {
            [qualifier, nav] => match self.find_type(qualifier) {
                LookupResult::Found(ty) if self.is_self_or_derived_from(ty, start) => (ty, *nav),
                LookupResult::Found(_) => {
                    return unresolved(
                        path,
                        format!(
                            "type '{}' is not derived from '{}'",
                            qualifier,
                            self.schema_type(start).full_name()
                        ),
                    )
                }
                _ => return unresolved(path, format!("type '{}' not found", qualifier)),
            },
            _ => (start, path),
        };

        if nav_name.is_empty() {
            return unresolved(path, format!("binding path '{}' names no navigation property", path));
        }

        match self.find_navigation_property(ty, nav_name) {
            Some(id) => BindingPathResolution::Resolved(id),
            None => unresolved(
                path,
                format!(
                    "navigation property '{}' not found on '{}'",
                    nav_name,
                    self.schema_type(ty).full_name()
                ),
            ),
        }
    }

    fn resolve_binding_target(
        &self,
        source: NavigationSource,
        target: &str,
        location: &Location,
    ) -> BindingTargetResolution {
        let found = match target.split_once(PATH_SEPARATOR) {
            Some((container, member)) => match self.find_entity_container(container) {
                LookupResult::Found(id) => self.find_container_member(id, member),
                _ => LookupResult::NotFound(target.to_string()),
            },
            None => self.find_container_member(self.navigation_source_container(source), target),
        };

        match found.found().and_then(|m| m.as_navigation_source()) {
            Some(resolved) => BindingTargetResolution::Resolved(resolved),
            None => {
                debug!(target, "unresolved navigation binding target");
                BindingTargetResolution::UnresolvedEntitySet(UnresolvedEntitySet {
                    name: target.to_string(),
                    diagnostic: Diagnostic::error(
                        location.clone(),
                        ErrorCode::BadUnresolvedEntitySet,
                        format!("entity set '{}' not found", target),
                    ),
                })
            }
        }
    }

    /// Resolve an annotation target such as `NS.Customer/Name` or `NS.Container/People`.
    pub fn resolve_annotation_target(&self, target: &str) -> Option<AnnotationTarget> {
        let (head, member) = match target.split_once(PATH_SEPARATOR) {
            Some((head, member)) => (head, Some(member)),
            None => (target, None),
        };
        // Overload signatures such as `NS.Fn(Edm.String)` annotate the group.
        let head = head.split_once('(').map_or(head, |(name, _)| name);

        if let LookupResult::Found(ty) = self.find_type(head) {
            return match member {
                None => Some(AnnotationTarget::Type(ty)),
                Some(name) => self
                    .find_property(ty, name)
                    .found()
                    .map(|m| AnnotationTarget::Member(ty, m)),
            };
        }
        if let LookupResult::Found(container) = self.find_entity_container(head) {
            return match member {
                None => Some(AnnotationTarget::Container(container)),
                Some(name) => self
                    .find_container_member(container, name)
                    .found()
                    .map(|m| AnnotationTarget::ContainerMember(container, m)),
            };
        }
        if member.is_some() {
            return None;
        }
        if let LookupResult::Found(term) = self.find_term(head) {
            return Some(AnnotationTarget::Term(term));
        }
        match self.find_operations(head) {
            [] => None,
            group => Some(AnnotationTarget::Operations(group.to_vec())),
        }
    }
}
