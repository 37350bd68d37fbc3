//! Single-pass validation over the element graph.
//!
//! Every element is a [`Node`]. A node reports all the [`NodeKind`]s it
//! satisfies, and the rules registered for each of those kinds run once when
//! the node is first entered. Traversal follows owned edges and containment
//! edges; reference edges are never followed. A containment edge that comes
//! back to a node still being visited is a complex-type cycle.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, trace};

use crate::diagnostic::{Diagnostic, ErrorCode, Location};
use crate::model::{
    AnnotationId, BindingId, ContainerId, EdmModel, EntitySetId, NavigationPropertyId,
    OperationId, OperationImportId, PropertyId, SingletonId, TermId, TypeId,
};
use crate::ruleset::{get_ruleset, RuleSet};
use crate::typeref::TypeDefinition;
use crate::types::{EdmVersion, TypeKind};

/// Rule bucket key. A node belongs to several at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeKind {
    Model,
    Element,
    SchemaElement,
    SchemaType,
    StructuredType,
    EntityType,
    ComplexType,
    EnumType,
    TypeDefinition,
    Property,
    StructuralProperty,
    NavigationProperty,
    Operation,
    OperationImport,
    Term,
    EntityContainer,
    NavigationSource,
    EntitySet,
    Singleton,
    NavigationPropertyBinding,
    VocabularyAnnotation,
}

/// One visitable element of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Model,
    Type(TypeId),
    Property(PropertyId),
    NavigationProperty(NavigationPropertyId),
    Operation(OperationId),
    Term(TermId),
    Container(ContainerId),
    EntitySet(EntitySetId),
    Singleton(SingletonId),
    OperationImport(OperationImportId),
    Binding(BindingId),
    Annotation(AnnotationId),
}

/// How a node reaches a neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Parent to child, e.g. type to property.
    Owned,
    /// Non-nullable single-valued complex property to its type.
    Containment,
    /// Any other cross reference; not traversed.
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Visited,
}

impl Node {
    /// Every kind this node satisfies, general to specific.
    pub fn kinds(&self, model: &EdmModel) -> &'static [NodeKind] {
        use NodeKind as K;
        match self {
            Node::Model => &[K::Model],
            Node::Type(id) => match model.schema_type(*id).type_kind() {
                TypeKind::Entity => &[
                    K::Element,
                    K::SchemaElement,
                    K::SchemaType,
                    K::StructuredType,
                    K::EntityType,
                ],
                TypeKind::Complex => &[
                    K::Element,
                    K::SchemaElement,
                    K::SchemaType,
                    K::StructuredType,
                    K::ComplexType,
                ],
                TypeKind::Enum => &[K::Element, K::SchemaElement, K::SchemaType, K::EnumType],
                _ => &[
                    K::Element,
                    K::SchemaElement,
                    K::SchemaType,
                    K::TypeDefinition,
                ],
            },
            Node::Property(_) => &[K::Element, K::Property, K::StructuralProperty],
            Node::NavigationProperty(_) => &[K::Element, K::Property, K::NavigationProperty],
            Node::Operation(_) => &[K::Element, K::SchemaElement, K::Operation],
            Node::Term(_) => &[K::Element, K::SchemaElement, K::Term],
            Node::Container(_) => &[K::Element, K::SchemaElement, K::EntityContainer],
            Node::EntitySet(_) => &[K::Element, K::NavigationSource, K::EntitySet],
            Node::Singleton(_) => &[K::Element, K::NavigationSource, K::Singleton],
            Node::OperationImport(_) => &[K::Element, K::OperationImport],
            Node::Binding(_) => &[K::NavigationPropertyBinding],
            Node::Annotation(_) => &[K::VocabularyAnnotation],
        }
    }

    /// Declared name; `None` for nodes that have none.
    pub fn name<'m>(&self, model: &'m EdmModel) -> Option<&'m str> {
        let name = match self {
            Node::Model | Node::Binding(_) | Node::Annotation(_) => return None,
            Node::Type(id) => &model.schema_type(*id).name,
            Node::Property(id) => &model.property(*id).name,
            Node::NavigationProperty(id) => &model.navigation_property(*id).name,
            Node::Operation(id) => &model.operation(*id).name,
            Node::Term(id) => &model.term(*id).name,
            Node::Container(id) => &model.container(*id).name,
            Node::EntitySet(id) => &model.entity_set(*id).name,
            Node::Singleton(id) => &model.singleton(*id).name,
            Node::OperationImport(id) => &model.operation_import(*id).name,
        };
        Some(name.as_str())
    }

    /// Namespace of schema elements.
    pub fn namespace<'m>(&self, model: &'m EdmModel) -> Option<&'m str> {
        let namespace = match self {
            Node::Type(id) => &model.schema_type(*id).namespace,
            Node::Operation(id) => &model.operation(*id).namespace,
            Node::Term(id) => &model.term(*id).namespace,
            Node::Container(id) => &model.container(*id).namespace,
            _ => return None,
        };
        Some(namespace.as_str())
    }

    pub fn location(&self, model: &EdmModel) -> Location {
        match self {
            Node::Model => Location::element(""),
            Node::Type(id) => model.schema_type(*id).location.clone(),
            Node::Property(id) => model.property(*id).location.clone(),
            Node::NavigationProperty(id) => model.navigation_property(*id).location.clone(),
            Node::Operation(id) => model.operation(*id).location.clone(),
            Node::Term(id) => model.term(*id).location.clone(),
            Node::Container(id) => model.container(*id).location.clone(),
            Node::EntitySet(id) => model.entity_set(*id).location.clone(),
            Node::Singleton(id) => model.singleton(*id).location.clone(),
            Node::OperationImport(id) => model.operation_import(*id).location.clone(),
            Node::Binding(id) => model.binding(*id).location.clone(),
            Node::Annotation(id) => model.annotation(*id).location.clone(),
        }
    }

    /// Outgoing edges in traversal order.
    pub fn edges(&self, model: &EdmModel) -> Vec<(Edge, Node)> {
        match self {
            Node::Model => {
                let mut edges: Vec<(Edge, Node)> = Vec::new();
                edges.extend(model.type_ids().map(|id| (Edge::Owned, Node::Type(id))));
                edges.extend(model.operation_ids().map(|id| (Edge::Owned, Node::Operation(id))));
                edges.extend(model.term_ids().map(|id| (Edge::Owned, Node::Term(id))));
                edges.extend(model.container_ids().map(|id| (Edge::Owned, Node::Container(id))));
                edges.extend(model.annotation_ids().map(|id| (Edge::Owned, Node::Annotation(id))));
                edges
            }
            Node::Type(id) => match model.structured(*id) {
                Some(structure) => structure
                    .properties
                    .iter()
                    .map(|p| (Edge::Owned, Node::Property(*p)))
                    .chain(
                        structure
                            .navigation_properties
                            .iter()
                            .map(|n| (Edge::Owned, Node::NavigationProperty(*n))),
                    )
                    .collect(),
                None => Vec::new(),
            },
            Node::Property(id) => {
                let type_ref = model.property(*id).type_ref.get(model);
                match type_ref.definition {
                    TypeDefinition::Complex(target) if !type_ref.nullable => {
                        vec![(Edge::Containment, Node::Type(target))]
                    }
                    _ => match type_ref.definition.schema_type_id() {
                        Some(target) => vec![(Edge::Reference, Node::Type(target))],
                        None => Vec::new(),
                    },
                }
            }
            Node::NavigationProperty(id) => {
                match model.navigation_property(*id).type_ref.get(model).entity_type() {
                    Some(target) => vec![(Edge::Reference, Node::Type(target))],
                    None => Vec::new(),
                }
            }
            Node::Container(id) => {
                let container = model.container(*id);
                container
                    .entity_sets
                    .iter()
                    .map(|s| (Edge::Owned, Node::EntitySet(*s)))
                    .chain(
                        container
                            .singletons
                            .iter()
                            .map(|s| (Edge::Owned, Node::Singleton(*s))),
                    )
                    .chain(
                        container
                            .operation_imports
                            .iter()
                            .map(|i| (Edge::Owned, Node::OperationImport(*i))),
                    )
                    .collect()
            }
            Node::EntitySet(id) => model
                .entity_set(*id)
                .bindings
                .iter()
                .map(|b| (Edge::Owned, Node::Binding(*b)))
                .collect(),
            Node::Singleton(id) => model
                .singleton(*id)
                .bindings
                .iter()
                .map(|b| (Edge::Owned, Node::Binding(*b)))
                .collect(),
            Node::Operation(_)
            | Node::Term(_)
            | Node::OperationImport(_)
            | Node::Binding(_)
            | Node::Annotation(_) => Vec::new(),
        }
    }
}

/// Rule-facing view of one validation pass.
pub struct ValidationContext<'m> {
    model: &'m EdmModel,
    diagnostics: Vec<Diagnostic>,
}

impl<'m> ValidationContext<'m> {
    fn new(model: &'m EdmModel) -> Self {
        Self {
            model,
            diagnostics: Vec::new(),
        }
    }

    pub fn model(&self) -> &'m EdmModel {
        self.model
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, location: Location, code: ErrorCode, message: impl Into<String>) {
        self.report(Diagnostic::error(location, code, message));
    }

    pub fn warning(&mut self, location: Location, code: ErrorCode, message: impl Into<String>) {
        self.report(Diagnostic::warning(location, code, message));
    }
}

struct Walker<'m, 'r> {
    context: ValidationContext<'m>,
    rules: &'r RuleSet,
    states: HashMap<Node, VisitState>,
}

impl Walker<'_, '_> {
    /// Depth-first walk from `root` on an explicit stack of pending edges.
    fn walk(&mut self, root: Node) {
        let mut stack = vec![self.enter(root)];

        while let Some((node, edges)) = stack.last_mut() {
            let node = *node;
            let Some((edge, next)) = edges.next() else {
                self.states.insert(node, VisitState::Visited);
                stack.pop();
                continue;
            };

            match (edge, self.states.get(&next)) {
                (Edge::Reference, _) => {}
                (Edge::Containment, Some(VisitState::Visiting)) => {
                    let model = self.context.model;
                    let target = model.schema_type_name(next);
                    self.context.error(
                        node.location(model),
                        ErrorCode::BadCyclicComplex,
                        format!("complex type '{}' contains itself", target),
                    );
                }
                (_, Some(_)) => {}
                (_, None) => stack.push(self.enter(next)),
            }
        }
    }

    fn enter(&mut self, node: Node) -> (Node, std::vec::IntoIter<(Edge, Node)>) {
        let model = self.context.model;
        self.states.insert(node, VisitState::Visiting);
        trace!(?node, "visiting");

        for kind in node.kinds(model) {
            for rule in self.rules.rules_for(*kind) {
                rule.evaluate(&mut self.context, node);
            }
        }

        (node, node.edges(model).into_iter())
    }
}

impl EdmModel {
    fn schema_type_name(&self, node: Node) -> String {
        match node {
            Node::Type(id) => self.schema_type(id).full_name(),
            other => other.name(self).unwrap_or_default().to_string(),
        }
    }
}

/// Run `rules` over every element of `model` exactly once.
///
/// Diagnostics come back in visit order; no rule can stop the walk.
pub fn validate(model: &EdmModel, rules: &RuleSet) -> Vec<Diagnostic> {
    let mut walker = Walker {
        context: ValidationContext::new(model),
        rules,
        states: HashMap::new(),
    };
    walker.walk(Node::Model);

    let diagnostics = walker.context.diagnostics;
    info!(
        nodes = walker.states.len(),
        rules = rules.len(),
        diagnostics = diagnostics.len(),
        "validation finished"
    );
    diagnostics
}

/// Validate with the built-in rule set for `version`.
pub fn validate_version(model: &EdmModel, version: EdmVersion) -> Vec<Diagnostic> {
    validate(model, get_ruleset(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csdl::CsdlDocument;
    use serde_json::json;

    fn model(value: serde_json::Value) -> EdmModel {
        let doc: CsdlDocument = serde_json::from_value(value).unwrap();
        EdmModel::from_documents([&doc])
    }

    #[test]
    fn entity_type_reports_all_its_kinds() {
        let model = model(json!({
            "Schemas": [{ "Namespace": "NS", "EntityTypes": [{ "Name": "E", "Key": [] }] }]
        }));
        let id = model.type_ids().next().unwrap();
        let kinds = Node::Type(id).kinds(&model);
        assert!(kinds.contains(&NodeKind::Element));
        assert!(kinds.contains(&NodeKind::SchemaElement));
        assert!(kinds.contains(&NodeKind::StructuredType));
        assert!(kinds.contains(&NodeKind::EntityType));
        assert!(!kinds.contains(&NodeKind::ComplexType));
    }

    #[test]
    fn only_non_nullable_complex_properties_contain() {
        let model = model(json!({
            "Schemas": [{
                "Namespace": "NS",
                "ComplexTypes": [
                    { "Name": "A", "Properties": [
                        { "Name": "Required", "Type": "NS.A", "Nullable": false },
                        { "Name": "Optional", "Type": "NS.A" },
                        { "Name": "Many", "Type": "Collection(NS.A)", "Nullable": false }
                    ]}
                ]
            }]
        }));
        let a = model.type_ids().next().unwrap();
        let props = &model.structured(a).unwrap().properties;
        let edge = |i: usize| Node::Property(props[i]).edges(&model)[0].0;
        assert_eq!(edge(0), Edge::Containment);
        assert_eq!(edge(1), Edge::Reference);
        assert!(Node::Property(props[2]).edges(&model).is_empty());
    }

    #[test]
    fn containment_cycle_is_reported_once() {
        let model = model(json!({
            "Schemas": [{
                "Namespace": "NS",
                "ComplexTypes": [
                    { "Name": "A", "Properties": [{ "Name": "B", "Type": "NS.B", "Nullable": false }] },
                    { "Name": "B", "Properties": [{ "Name": "A", "Type": "NS.A", "Nullable": false }] }
                ]
            }]
        }));
        let empty = RuleSet::default();
        let diagnostics = validate(&model, &empty);
        let cycles: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.code == ErrorCode::BadCyclicComplex)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].location, Location::element("NS.B/A"));
    }

    #[test]
    fn long_containment_chain_does_not_overflow() {
        let depth = 20_000;
        let types: Vec<_> = (0..depth)
            .map(|i| {
                let properties = if i + 1 < depth {
                    json!([{ "Name": "Next", "Type": format!("NS.T{}", i + 1), "Nullable": false }])
                } else {
                    json!([{ "Name": "Leaf", "Type": "Edm.String" }])
                };
                json!({ "Name": format!("T{}", i), "Properties": properties })
            })
            .collect();
        let model = model(json!({
            "Schemas": [{ "Namespace": "NS", "ComplexTypes": types }]
        }));

        let diagnostics = validate(&model, &RuleSet::default());
        assert!(diagnostics.is_empty());
    }
}
