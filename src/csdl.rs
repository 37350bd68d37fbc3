//! Parsed CSDL syntax consumed by the model builder.
//!
//! These structs are the hand-off point from a CSDL reader: every cross
//! reference is still a plain string (`"NS.Customer"`,
//! `"Collection(NS.Order)"`, `"Orders"`). Nothing here is resolved.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Facets, OperationKind};

/// Line/column position recorded by a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

/// One CSDL document: a version and the schemas it declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub schemas: Vec<CsdlSchema>,
    /// Document name used in source locations; set by the loader.
    #[serde(skip)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlSchema {
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub entity_types: Vec<CsdlEntityType>,
    #[serde(default)]
    pub complex_types: Vec<CsdlComplexType>,
    #[serde(default)]
    pub enum_types: Vec<CsdlEnumType>,
    #[serde(default)]
    pub type_definitions: Vec<CsdlTypeDefinition>,
    #[serde(default)]
    pub operations: Vec<CsdlOperation>,
    #[serde(default)]
    pub terms: Vec<CsdlTerm>,
    #[serde(default)]
    pub entity_containers: Vec<CsdlEntityContainer>,
    #[serde(default)]
    pub annotations: Vec<CsdlAnnotations>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlEntityType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    #[serde(default)]
    pub r#abstract: bool,
    #[serde(default)]
    pub open_type: bool,
    #[serde(default)]
    pub has_stream: bool,
    /// Key property names; `None` when no key element is declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Vec<String>>,
    #[serde(default)]
    pub properties: Vec<CsdlProperty>,
    #[serde(default)]
    pub navigation_properties: Vec<CsdlNavigationProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlComplexType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    #[serde(default)]
    pub r#abstract: bool,
    #[serde(default)]
    pub open_type: bool,
    #[serde(default)]
    pub properties: Vec<CsdlProperty>,
    #[serde(default)]
    pub navigation_properties: Vec<CsdlNavigationProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

/// A typed slot: property, parameter, return type or term type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlTypeRef {
    /// `Edm.String`, `NS.Address`, `Collection(NS.Order)`.
    pub r#type: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(flatten)]
    pub facets: CsdlFacets,
}

impl CsdlTypeRef {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            r#type: type_name.into(),
            nullable: true,
            facets: CsdlFacets::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlFacets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unicode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default, rename = "SRID", skip_serializing_if = "Option::is_none")]
    pub srid: Option<i32>,
}

impl From<CsdlFacets> for Facets {
    fn from(f: CsdlFacets) -> Self {
        Facets {
            max_length: f.max_length,
            unicode: f.unicode,
            precision: f.precision,
            scale: f.scale,
            srid: f.srid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlProperty {
    pub name: String,
    #[serde(flatten)]
    pub type_ref: CsdlTypeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlNavigationProperty {
    pub name: String,
    /// `NS.Order` or `Collection(NS.Order)`.
    pub r#type: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<String>,
    #[serde(default)]
    pub contains_target: bool,
    #[serde(default)]
    pub referential_constraints: Vec<CsdlReferentialConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlReferentialConstraint {
    /// Dependent property on the declaring type.
    pub property: String,
    /// Principal property on the target type.
    pub referenced_property: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlEnumType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_type: Option<String>,
    #[serde(default)]
    pub is_flags: bool,
    #[serde(default)]
    pub members: Vec<CsdlEnumMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlEnumMember {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlTypeDefinition {
    pub name: String,
    pub underlying_type: String,
    #[serde(flatten)]
    pub facets: CsdlFacets,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlOperation {
    #[serde(default)]
    pub kind: OperationKind,
    pub name: String,
    #[serde(default)]
    pub is_bound: bool,
    #[serde(default)]
    pub is_composable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_set_path: Option<String>,
    #[serde(default)]
    pub parameters: Vec<CsdlParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<CsdlTypeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlParameter {
    pub name: String,
    #[serde(flatten)]
    pub type_ref: CsdlTypeRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlTerm {
    pub name: String,
    #[serde(flatten)]
    pub type_ref: CsdlTypeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_term: Option<String>,
    #[serde(default)]
    pub applies_to: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlEntityContainer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub entity_sets: Vec<CsdlEntitySet>,
    #[serde(default)]
    pub singletons: Vec<CsdlSingleton>,
    #[serde(default)]
    pub operation_imports: Vec<CsdlOperationImport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlEntitySet {
    pub name: String,
    pub entity_type: String,
    #[serde(default = "default_true")]
    pub include_in_service_document: bool,
    #[serde(default)]
    pub navigation_property_bindings: Vec<CsdlNavigationPropertyBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlSingleton {
    pub name: String,
    pub r#type: String,
    #[serde(default)]
    pub navigation_property_bindings: Vec<CsdlNavigationPropertyBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlNavigationPropertyBinding {
    pub path: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlOperationImport {
    #[serde(default)]
    pub kind: OperationKind,
    pub name: String,
    /// Qualified name of the imported action or function.
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

/// Annotations applied to one target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlAnnotations {
    pub target: String,
    #[serde(default)]
    pub annotations: Vec<CsdlAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CsdlAnnotation {
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn property_defaults_to_nullable() {
        let prop: CsdlProperty = serde_json::from_value(json!({
            "Name": "Title",
            "Type": "Edm.String",
            "MaxLength": 40
        }))
        .unwrap();
        assert!(prop.type_ref.nullable);
        assert_eq!(prop.type_ref.facets.max_length, Some(40));
    }

    #[test]
    fn entity_type_reads_keywords() {
        let ty: CsdlEntityType = serde_json::from_value(json!({
            "Name": "Customer",
            "Abstract": true,
            "OpenType": true,
            "Key": ["Id"],
            "Properties": [
                { "Name": "Id", "Type": "Edm.Int32", "Nullable": false }
            ]
        }))
        .unwrap();
        assert!(ty.r#abstract);
        assert!(ty.open_type);
        assert_eq!(ty.key.as_deref(), Some(&["Id".to_string()][..]));
        assert!(!ty.properties[0].type_ref.nullable);
    }

    #[test]
    fn operation_kind_defaults_to_function() {
        let op: CsdlOperation = serde_json::from_value(json!({
            "Name": "GetTop",
            "ReturnType": { "Type": "Collection(NS.Customer)" }
        }))
        .unwrap();
        assert_eq!(op.kind, OperationKind::Function);
        assert_eq!(
            op.return_type.map(|r| r.r#type),
            Some("Collection(NS.Customer)".to_string())
        );
    }
}
