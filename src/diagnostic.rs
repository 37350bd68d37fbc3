//! Diagnostics produced by reference resolution and validation.

use std::fmt;

use serde::Serialize;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Where a diagnostic applies.
///
/// Parsers that track positions supply `Source`; elements built without
/// positions get an `Element` path such as `NS.Customer/Orders`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Location {
    Element {
        path: String,
    },
    Source {
        #[serde(skip_serializing_if = "Option::is_none")]
        document: Option<String>,
        line: u32,
        column: u32,
    },
}

impl Location {
    pub fn element(path: impl Into<String>) -> Self {
        Location::Element { path: path.into() }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Element { path } => f.write_str(path),
            Location::Source {
                document: Some(doc),
                line,
                column,
            } => write!(f, "{}:{}:{}", doc, line, column),
            Location::Source {
                document: None,
                line,
                column,
            } => write!(f, "({}, {})", line, column),
        }
    }
}

/// Machine-readable diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    // Naming
    InvalidName,
    InvalidNamespaceName,
    AlreadyDefined,
    InvalidMemberNameMatchesTypeName,
    BadAmbiguousElementBinding,

    // Unresolved references
    BadUnresolvedType,
    BadUnresolvedProperty,
    BadUnresolvedTerm,
    BadUnresolvedTarget,
    BadUnresolvedOperation,
    BadUnresolvedEntityContainer,
    BadUnresolvedEntitySet,
    BadUnresolvedNavigationPropertyPath,
    BadUnresolvedNavigationPropertyPartner,

    // Type hierarchy
    BadCyclicEntity,
    BadCyclicComplex,
    BadCyclicEntityContainer,
    InvalidBaseType,

    // Keys
    KeyMissingOnEntityType,
    InvalidKey,
    DuplicatePropertyNameSpecifiedInEntityKey,
    EntityKeyMustBeScalar,
    EntitySetTypeHasNoKeys,

    // Structured and enum types
    InvalidAbstractComplexType,
    InvalidPolymorphicComplexType,
    OpenTypeNotSupported,
    ComplexTypeMustHaveProperties,
    EnumMustHaveIntegerUnderlyingType,
    EnumMemberValueOutOfRange,
    InvalidTypeDefinitionUnderlyingType,
    NullableComplexTypeProperty,
    ScaleOutOfRange,

    // Navigation
    InvalidNavigationPropertyType,
    TypeMismatchRelationshipConstraint,
    InvalidNavigationPropertyPartner,
    BindingTargetTypeMismatch,

    // Operations
    FunctionsNotSupportedBeforeV2,
    BoundOperationMustHaveParameters,
    FunctionMustHaveReturnType,
    UnboundFunctionOverloadHasIncorrectReturnType,
    OperationImportCannotImportBoundOperation,

    // Containers
    DuplicateEntityContainerMemberName,
    NavigationSourceTypeMustBeEntityType,
    SingletonsNotSupportedBeforeV4,

    // Vocabulary
    VocabularyAnnotationsNotSupportedBeforeV3,
    DuplicateAnnotation,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidName => "InvalidName",
            ErrorCode::InvalidNamespaceName => "InvalidNamespaceName",
            ErrorCode::AlreadyDefined => "AlreadyDefined",
            ErrorCode::InvalidMemberNameMatchesTypeName => "InvalidMemberNameMatchesTypeName",
            ErrorCode::BadAmbiguousElementBinding => "BadAmbiguousElementBinding",
            ErrorCode::BadUnresolvedType => "BadUnresolvedType",
            ErrorCode::BadUnresolvedProperty => "BadUnresolvedProperty",
            ErrorCode::BadUnresolvedTerm => "BadUnresolvedTerm",
            ErrorCode::BadUnresolvedTarget => "BadUnresolvedTarget",
            ErrorCode::BadUnresolvedOperation => "BadUnresolvedOperation",
            ErrorCode::BadUnresolvedEntityContainer => "BadUnresolvedEntityContainer",
            ErrorCode::BadUnresolvedEntitySet => "BadUnresolvedEntitySet",
            ErrorCode::BadUnresolvedNavigationPropertyPath => "BadUnresolvedNavigationPropertyPath",
            ErrorCode::BadUnresolvedNavigationPropertyPartner => {
                "BadUnresolvedNavigationPropertyPartner"
            }
            ErrorCode::BadCyclicEntity => "BadCyclicEntity",
            ErrorCode::BadCyclicComplex => "BadCyclicComplex",
            ErrorCode::BadCyclicEntityContainer => "BadCyclicEntityContainer",
            ErrorCode::InvalidBaseType => "InvalidBaseType",
            ErrorCode::KeyMissingOnEntityType => "KeyMissingOnEntityType",
            ErrorCode::InvalidKey => "InvalidKey",
            ErrorCode::DuplicatePropertyNameSpecifiedInEntityKey => {
                "DuplicatePropertyNameSpecifiedInEntityKey"
            }
            ErrorCode::EntityKeyMustBeScalar => "EntityKeyMustBeScalar",
            ErrorCode::EntitySetTypeHasNoKeys => "EntitySetTypeHasNoKeys",
            ErrorCode::InvalidAbstractComplexType => "InvalidAbstractComplexType",
            ErrorCode::InvalidPolymorphicComplexType => "InvalidPolymorphicComplexType",
            ErrorCode::OpenTypeNotSupported => "OpenTypeNotSupported",
            ErrorCode::ComplexTypeMustHaveProperties => "ComplexTypeMustHaveProperties",
            ErrorCode::EnumMustHaveIntegerUnderlyingType => "EnumMustHaveIntegerUnderlyingType",
            ErrorCode::EnumMemberValueOutOfRange => "EnumMemberValueOutOfRange",
            ErrorCode::InvalidTypeDefinitionUnderlyingType => "InvalidTypeDefinitionUnderlyingType",
            ErrorCode::NullableComplexTypeProperty => "NullableComplexTypeProperty",
            ErrorCode::ScaleOutOfRange => "ScaleOutOfRange",
            ErrorCode::InvalidNavigationPropertyType => "InvalidNavigationPropertyType",
            ErrorCode::TypeMismatchRelationshipConstraint => "TypeMismatchRelationshipConstraint",
            ErrorCode::InvalidNavigationPropertyPartner => "InvalidNavigationPropertyPartner",
            ErrorCode::BindingTargetTypeMismatch => "BindingTargetTypeMismatch",
            ErrorCode::FunctionsNotSupportedBeforeV2 => "FunctionsNotSupportedBeforeV2",
            ErrorCode::BoundOperationMustHaveParameters => "BoundOperationMustHaveParameters",
            ErrorCode::FunctionMustHaveReturnType => "FunctionMustHaveReturnType",
            ErrorCode::UnboundFunctionOverloadHasIncorrectReturnType => {
                "UnboundFunctionOverloadHasIncorrectReturnType"
            }
            ErrorCode::OperationImportCannotImportBoundOperation => {
                "OperationImportCannotImportBoundOperation"
            }
            ErrorCode::DuplicateEntityContainerMemberName => "DuplicateEntityContainerMemberName",
            ErrorCode::NavigationSourceTypeMustBeEntityType => {
                "NavigationSourceTypeMustBeEntityType"
            }
            ErrorCode::SingletonsNotSupportedBeforeV4 => "SingletonsNotSupportedBeforeV4",
            ErrorCode::VocabularyAnnotationsNotSupportedBeforeV3 => {
                "VocabularyAnnotationsNotSupportedBeforeV3"
            }
            ErrorCode::DuplicateAnnotation => "DuplicateAnnotation",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub location: Location,
    pub code: ErrorCode,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(location: Location, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            location,
            code,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(location: Location, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            location,
            code,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}[{}]: {}",
            self.location, self.severity, self.code, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display() {
        let diag = Diagnostic::error(
            Location::element("NS.Container/People"),
            ErrorCode::BadUnresolvedEntitySet,
            "entity set 'Missing' not found",
        );
        assert_eq!(
            diag.to_string(),
            "NS.Container/People: error[BadUnresolvedEntitySet]: entity set 'Missing' not found"
        );
        assert!(diag.is_error());
    }

    #[test]
    fn source_location_display() {
        let loc = Location::Source {
            document: Some("model.json".into()),
            line: 12,
            column: 4,
        };
        assert_eq!(loc.to_string(), "model.json:12:4");
    }

    #[test]
    fn diagnostic_serializes_code_as_name() {
        let diag = Diagnostic::warning(
            Location::element("NS.T"),
            ErrorCode::OpenTypeNotSupported,
            "open types require 1.2",
        );
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["code"], "OpenTypeNotSupported");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["location"]["path"], "NS.T");
    }
}
