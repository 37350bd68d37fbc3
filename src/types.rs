//! Core vocabulary types for EDM resolution: type kinds, primitive kinds,
//! protocol versions and type facets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RuleSetError;

/// Namespace of the built-in primitive, path and untyped types.
pub const EDM_NAMESPACE: &str = "Edm";

/// Separator between segments of navigation-binding paths and annotation targets.
pub const PATH_SEPARATOR: char = '/';

/// Discriminator reported by every type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// No type at all (e.g. an action without a return type).
    None,
    Primitive,
    Complex,
    Entity,
    Enum,
    Collection,
    EntityReference,
    TypeDefinition,
    Path,
    Untyped,
    /// A named reference that could not be bound to a definition.
    Unresolved,
}

impl TypeKind {
    pub fn is_structured(&self) -> bool {
        matches!(self, TypeKind::Entity | TypeKind::Complex)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeKind::None => "None",
            TypeKind::Primitive => "Primitive",
            TypeKind::Complex => "Complex",
            TypeKind::Entity => "Entity",
            TypeKind::Enum => "Enum",
            TypeKind::Collection => "Collection",
            TypeKind::EntityReference => "EntityReference",
            TypeKind::TypeDefinition => "TypeDefinition",
            TypeKind::Path => "Path",
            TypeKind::Untyped => "Untyped",
            TypeKind::Unresolved => "Unresolved",
        };
        f.write_str(s)
    }
}

/// Built-in primitive types of the `Edm` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Binary,
    Boolean,
    Byte,
    Date,
    DateTimeOffset,
    Decimal,
    Double,
    Duration,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    Single,
    Stream,
    String,
    TimeOfDay,
    Geography,
    GeographyPoint,
    GeographyLineString,
    GeographyPolygon,
    GeographyCollection,
    Geometry,
    GeometryPoint,
    GeometryLineString,
    GeometryPolygon,
    GeometryCollection,
}

const PRIMITIVE_NAMES: &[(PrimitiveKind, &str)] = &[
    (PrimitiveKind::Binary, "Binary"),
    (PrimitiveKind::Boolean, "Boolean"),
    (PrimitiveKind::Byte, "Byte"),
    (PrimitiveKind::Date, "Date"),
    (PrimitiveKind::DateTimeOffset, "DateTimeOffset"),
    (PrimitiveKind::Decimal, "Decimal"),
    (PrimitiveKind::Double, "Double"),
    (PrimitiveKind::Duration, "Duration"),
    (PrimitiveKind::Guid, "Guid"),
    (PrimitiveKind::Int16, "Int16"),
    (PrimitiveKind::Int32, "Int32"),
    (PrimitiveKind::Int64, "Int64"),
    (PrimitiveKind::SByte, "SByte"),
    (PrimitiveKind::Single, "Single"),
    (PrimitiveKind::Stream, "Stream"),
    (PrimitiveKind::String, "String"),
    (PrimitiveKind::TimeOfDay, "TimeOfDay"),
    (PrimitiveKind::Geography, "Geography"),
    (PrimitiveKind::GeographyPoint, "GeographyPoint"),
    (PrimitiveKind::GeographyLineString, "GeographyLineString"),
    (PrimitiveKind::GeographyPolygon, "GeographyPolygon"),
    (PrimitiveKind::GeographyCollection, "GeographyCollection"),
    (PrimitiveKind::Geometry, "Geometry"),
    (PrimitiveKind::GeometryPoint, "GeometryPoint"),
    (PrimitiveKind::GeometryLineString, "GeometryLineString"),
    (PrimitiveKind::GeometryPolygon, "GeometryPolygon"),
    (PrimitiveKind::GeometryCollection, "GeometryCollection"),
];

impl PrimitiveKind {
    /// Parse a qualified primitive name such as `Edm.Int32`.
    ///
    /// Returns `None` for anything outside the `Edm` namespace or for
    /// non-primitive `Edm` names (`Edm.Untyped`, path types).
    pub fn from_qualified_name(name: &str) -> Option<Self> {
        let simple = name.strip_prefix(EDM_NAMESPACE)?.strip_prefix('.')?;
        PRIMITIVE_NAMES
            .iter()
            .find(|(_, n)| *n == simple)
            .map(|(kind, _)| *kind)
    }

    /// Unqualified name, e.g. `Int32`.
    pub fn name(&self) -> &'static str {
        PRIMITIVE_NAMES
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, n)| *n)
            .unwrap_or("Unknown")
    }

    /// Inclusive value range for integral kinds, `None` otherwise.
    pub fn integral_range(&self) -> Option<(i64, i64)> {
        match self {
            PrimitiveKind::Byte => Some((u8::MIN as i64, u8::MAX as i64)),
            PrimitiveKind::SByte => Some((i8::MIN as i64, i8::MAX as i64)),
            PrimitiveKind::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            PrimitiveKind::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            PrimitiveKind::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    pub fn is_integral(&self) -> bool {
        self.integral_range().is_some()
    }

    pub fn is_spatial(&self) -> bool {
        self.name().starts_with("Geography") || self.name().starts_with("Geometry")
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::DateTimeOffset | PrimitiveKind::Duration | PrimitiveKind::TimeOfDay
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", EDM_NAMESPACE, self.name())
    }
}

/// Built-in path types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathKind {
    AnnotationPath,
    PropertyPath,
    NavigationPropertyPath,
}

impl PathKind {
    pub fn from_qualified_name(name: &str) -> Option<Self> {
        match name {
            "Edm.AnnotationPath" => Some(PathKind::AnnotationPath),
            "Edm.PropertyPath" => Some(PathKind::PropertyPath),
            "Edm.NavigationPropertyPath" => Some(PathKind::NavigationPropertyPath),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PathKind::AnnotationPath => "Edm.AnnotationPath",
            PathKind::PropertyPath => "Edm.PropertyPath",
            PathKind::NavigationPropertyPath => "Edm.NavigationPropertyPath",
        }
    }
}

/// Qualified name of the untyped type.
pub const UNTYPED_NAME: &str = "Edm.Untyped";

/// Protocol versions with a dedicated validation rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdmVersion {
    V1,
    V1_1,
    V1_2,
    V2,
    V3,
    V4,
}

impl EdmVersion {
    /// Every supported version, oldest first.
    pub const ALL: [EdmVersion; 6] = [
        EdmVersion::V1,
        EdmVersion::V1_1,
        EdmVersion::V1_2,
        EdmVersion::V2,
        EdmVersion::V3,
        EdmVersion::V4,
    ];

    /// The most recent version, used when a document does not declare one.
    pub const LATEST: EdmVersion = EdmVersion::V4;

    pub fn as_str(&self) -> &'static str {
        match self {
            EdmVersion::V1 => "1.0",
            EdmVersion::V1_1 => "1.1",
            EdmVersion::V1_2 => "1.2",
            EdmVersion::V2 => "2.0",
            EdmVersion::V3 => "3.0",
            EdmVersion::V4 => "4.0",
        }
    }
}

impl fmt::Display for EdmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdmVersion {
    type Err = RuleSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.0" | "1" => Ok(EdmVersion::V1),
            "1.1" => Ok(EdmVersion::V1_1),
            "1.2" => Ok(EdmVersion::V1_2),
            "2.0" | "2" => Ok(EdmVersion::V2),
            "3.0" | "3" => Ok(EdmVersion::V3),
            "4.0" | "4" => Ok(EdmVersion::V4),
            other => Err(RuleSetError::UnknownVersion {
                version: other.to_string(),
            }),
        }
    }
}

/// Category of schema element a qualified-name lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Type,
    Term,
    EntityContainer,
    Operation,
}

impl Capability {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "type" => Some(Capability::Type),
            "term" => Some(Capability::Term),
            "container" | "entitycontainer" => Some(Capability::EntityContainer),
            "operation" | "function" | "action" => Some(Capability::Operation),
            _ => None,
        }
    }
}

/// Action or function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperationKind {
    Action,
    #[default]
    Function,
}

/// Facets attached to a type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Facets {
    pub max_length: Option<u32>,
    pub unicode: Option<bool>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub srid: Option<i32>,
}

impl Facets {
    pub fn is_empty(&self) -> bool {
        *self == Facets::default()
    }
}

/// Returns true if `name` is a valid simple identifier: a letter or
/// underscore followed by letters, digits or underscores.
pub fn is_simple_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Split `Namespace.Name` at the last dot. Unqualified names get an empty namespace.
pub fn split_qualified_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => (&name[..idx], &name[idx + 1..]),
        None => ("", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_from_qualified_name() {
        assert_eq!(
            PrimitiveKind::from_qualified_name("Edm.Int32"),
            Some(PrimitiveKind::Int32)
        );
        assert_eq!(
            PrimitiveKind::from_qualified_name("Edm.GeographyPoint"),
            Some(PrimitiveKind::GeographyPoint)
        );
        assert_eq!(PrimitiveKind::from_qualified_name("Int32"), None);
        assert_eq!(PrimitiveKind::from_qualified_name("Edm.Untyped"), None);
        assert_eq!(PrimitiveKind::from_qualified_name("NS.Int32"), None);
    }

    #[test]
    fn primitive_display_is_qualified() {
        assert_eq!(PrimitiveKind::String.to_string(), "Edm.String");
        assert!(PrimitiveKind::GeometryPolygon.is_spatial());
        assert!(!PrimitiveKind::Decimal.is_spatial());
    }

    #[test]
    fn integral_ranges() {
        assert_eq!(PrimitiveKind::Byte.integral_range(), Some((0, 255)));
        assert_eq!(PrimitiveKind::SByte.integral_range(), Some((-128, 127)));
        assert!(PrimitiveKind::Int64.is_integral());
        assert!(!PrimitiveKind::Double.is_integral());
    }

    #[test]
    fn version_parse_roundtrips_known_values() {
        for version in EdmVersion::ALL {
            assert_eq!(version.as_str().parse::<EdmVersion>(), Ok(version));
        }
    }

    #[test]
    fn version_parse_rejects_unknown() {
        assert!(matches!(
            "5.0".parse::<EdmVersion>(),
            Err(RuleSetError::UnknownVersion { version }) if version == "5.0"
        ));
        assert!("".parse::<EdmVersion>().is_err());
    }

    #[test]
    fn simple_identifiers() {
        assert!(is_simple_identifier("Customer"));
        assert!(is_simple_identifier("_id2"));
        assert!(!is_simple_identifier(""));
        assert!(!is_simple_identifier("2nd"));
        assert!(!is_simple_identifier("Order.Line"));
        assert!(!is_simple_identifier("a b"));
    }

    #[test]
    fn split_names() {
        assert_eq!(split_qualified_name("FQ.NS.Customer"), ("FQ.NS", "Customer"));
        assert_eq!(split_qualified_name("Customer"), ("", "Customer"));
    }
}
