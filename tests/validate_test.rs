//! Integration tests for rule sets and model validation.

use std::cell::Cell;

use edm_schema::{
    base_ruleset, csdl::CsdlDocument, get_ruleset, rules, validate, validate_version, EdmModel,
    EdmVersion, ErrorCode, Node, NodeKind, RuleSet, RuleSetError, ValidationContext,
    ValidationRule,
};
use serde_json::{json, Value};

fn model(value: Value) -> EdmModel {
    let doc: CsdlDocument = serde_json::from_value(value).unwrap();
    EdmModel::from_documents([&doc])
}

fn codes(model: &EdmModel, version: EdmVersion) -> Vec<ErrorCode> {
    validate_version(model, version)
        .into_iter()
        .map(|d| d.code)
        .collect()
}

fn sales() -> EdmModel {
    model(json!({
        "Version": "4.0",
        "Schemas": [{
            "Namespace": "Sales",
            "ComplexTypes": [
                { "Name": "Address", "Properties": [{ "Name": "Street", "Type": "Edm.String" }] }
            ],
            "EntityTypes": [
                {
                    "Name": "Customer",
                    "Key": ["Id"],
                    "Properties": [
                        { "Name": "Id", "Type": "Edm.Int32", "Nullable": false },
                        { "Name": "Home", "Type": "Sales.Address", "Nullable": false }
                    ],
                    "NavigationProperties": [
                        { "Name": "Orders", "Type": "Collection(Sales.Order)", "Partner": "Buyer" }
                    ]
                },
                {
                    "Name": "Order",
                    "Key": ["Id"],
                    "Properties": [
                        { "Name": "Id", "Type": "Edm.Int64", "Nullable": false },
                        { "Name": "ShipTo", "Type": "Sales.Address", "Nullable": false },
                        { "Name": "Total", "Type": "Edm.Decimal", "Precision": 10, "Scale": 2 }
                    ],
                    "NavigationProperties": [
                        { "Name": "Buyer", "Type": "Sales.Customer", "Partner": "Orders" }
                    ]
                }
            ],
            "EntityContainers": [{
                "Name": "Default",
                "EntitySets": [
                    { "Name": "Customers", "EntityType": "Sales.Customer",
                      "NavigationPropertyBindings": [{ "Path": "Orders", "Target": "Orders" }] },
                    { "Name": "Orders", "EntityType": "Sales.Order",
                      "NavigationPropertyBindings": [{ "Path": "Buyer", "Target": "Customers" }] }
                ]
            }]
        }]
    }))
}

// === Rule sets ===

mod rule_sets {
    use super::*;

    fn noop(_: &mut ValidationContext<'_>, _: Node) {}

    static EXTRA: ValidationRule = ValidationRule::new("Extra", NodeKind::Term, noop);
    static ALSO_ON_TERMS: ValidationRule = ValidationRule::new("AlsoOnTerms", NodeKind::Term, noop);

    #[test]
    fn every_version_has_a_non_empty_rule_set() {
        for version in EdmVersion::ALL {
            assert!(!get_ruleset(version).is_empty(), "{}", version);
        }
    }

    #[test]
    fn unknown_version_is_rejected() {
        let err = "5.0".parse::<EdmVersion>().unwrap_err();
        assert_eq!(
            err,
            RuleSetError::UnknownVersion {
                version: "5.0".into()
            }
        );
    }

    #[test]
    fn duplicate_rule_fails_but_distinct_rules_coexist() {
        let err = RuleSet::new([&EXTRA], [&EXTRA]).unwrap_err();
        assert!(matches!(err, RuleSetError::DuplicateRule { rule: "Extra", .. }));

        let set = RuleSet::new([&EXTRA], [&ALSO_ON_TERMS]).unwrap();
        assert_eq!(set.rules_for(NodeKind::Term).len(), 2);
    }

    #[test]
    fn derivation_swaps_one_rule_and_keeps_the_rest() {
        let base = base_ruleset();
        let removed = &rules::ENTITY_KEY_MUST_BE_DECLARED;
        let derived = base.derive(&[removed], &[&EXTRA]).unwrap();

        assert!(!derived.contains(removed));
        assert!(derived.contains(&EXTRA));
        assert_eq!(derived.len(), base.len());
        for rule in base.iter().filter(|r| *r != removed) {
            assert!(derived.contains(rule), "{}", rule.name());
        }
    }

    #[test]
    fn versions_add_and_drop_rules() {
        let v1 = get_ruleset(EdmVersion::V1);
        let v1_1 = get_ruleset(EdmVersion::V1_1);
        let v4 = get_ruleset(EdmVersion::V4);

        assert!(v1.contains(&rules::COMPLEX_TYPE_MUST_NOT_BE_ABSTRACT));
        assert!(!v1_1.contains(&rules::COMPLEX_TYPE_MUST_NOT_BE_ABSTRACT));
        assert!(v1_1.contains(&rules::OPEN_TYPES_NOT_SUPPORTED));
        assert!(!get_ruleset(EdmVersion::V3).contains(&rules::NAVIGATION_PARTNER_MUST_EXIST));
        assert!(v4.contains(&rules::NAVIGATION_PARTNER_MUST_EXIST));
        assert!(!v4.contains(&rules::SINGLETONS_NOT_SUPPORTED_BEFORE_V4));
    }

    #[test]
    fn empty_bucket_is_an_empty_slice() {
        assert!(get_ruleset(EdmVersion::V4)
            .rules_for(NodeKind::SchemaType)
            .is_empty());
    }
}

// === Validation walk ===

mod walk {
    use super::*;

    thread_local! {
        static COMPLEX_VISITS: Cell<usize> = Cell::new(0);
    }

    fn count(_: &mut ValidationContext<'_>, _: Node) {
        COMPLEX_VISITS.with(|c| c.set(c.get() + 1));
    }

    static COUNT_COMPLEX: ValidationRule =
        ValidationRule::new("CountComplex", NodeKind::ComplexType, count);

    #[test]
    fn shared_complex_type_is_visited_once() {
        let model = sales();
        let rules = RuleSet::new([&COUNT_COMPLEX], []).unwrap();

        COMPLEX_VISITS.with(|c| c.set(0));
        let diagnostics = validate(&model, &rules);

        assert!(diagnostics.is_empty());
        assert_eq!(COMPLEX_VISITS.with(Cell::get), 1);
    }

    #[test]
    fn well_formed_model_is_clean() {
        let model = sales();
        assert_eq!(codes(&model, EdmVersion::V4), vec![]);
        assert_eq!(codes(&model, EdmVersion::V3), vec![]);
    }

    #[test]
    fn declared_version_is_reported() {
        assert_eq!(sales().version(), Ok(Some(EdmVersion::V4)));
    }

    #[test]
    fn unknown_declared_version_is_an_error() {
        let model = model(json!({
            "Version": "4.01",
            "Schemas": [{ "Namespace": "NS" }]
        }));
        assert_eq!(
            model.version(),
            Err(RuleSetError::UnknownVersion {
                version: "4.01".into()
            })
        );
    }

    #[test]
    fn diagnostics_serialize_with_code_names() {
        let model = model(json!({
            "Schemas": [{ "Namespace": "NS", "EntityTypes": [{ "Name": "Keyless" }] }]
        }));
        let diagnostics = validate_version(&model, EdmVersion::V4);
        let value = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(
            value,
            json!([{
                "location": { "path": "NS.Keyless" },
                "code": "KeyMissingOnEntityType",
                "message": "entity type 'NS.Keyless' has no key",
                "severity": "error"
            }])
        );
    }
}

// === Version gating ===

mod versions {
    use super::*;

    #[test]
    fn abstract_complex_types_need_1_1() {
        let model = model(json!({
            "Schemas": [{ "Namespace": "NS", "ComplexTypes": [
                { "Name": "Shape", "Abstract": true, "Properties": [{ "Name": "Sides", "Type": "Edm.Int32" }] }
            ]}]
        }));
        assert!(codes(&model, EdmVersion::V1).contains(&ErrorCode::InvalidAbstractComplexType));
        assert!(!codes(&model, EdmVersion::V1_1).contains(&ErrorCode::InvalidAbstractComplexType));
    }

    #[test]
    fn operations_need_2_0() {
        let model = model(json!({
            "Schemas": [{ "Namespace": "NS", "Operations": [
                { "Kind": "Function", "Name": "Ping", "ReturnType": { "Type": "Edm.Boolean" } }
            ]}]
        }));
        assert_eq!(codes(&model, EdmVersion::V1_2), vec![ErrorCode::FunctionsNotSupportedBeforeV2]);
        assert!(codes(&model, EdmVersion::V2).is_empty());
    }

    #[test]
    fn singletons_need_4_0() {
        let model = model(json!({
            "Schemas": [{
                "Namespace": "NS",
                "EntityTypes": [{ "Name": "Settings", "Key": ["Id"],
                    "Properties": [{ "Name": "Id", "Type": "Edm.Int32", "Nullable": false }] }],
                "EntityContainers": [{ "Name": "C", "Singletons": [{ "Name": "Current", "Type": "NS.Settings" }] }]
            }]
        }));
        assert_eq!(codes(&model, EdmVersion::V3), vec![ErrorCode::SingletonsNotSupportedBeforeV4]);
        assert!(codes(&model, EdmVersion::V4).is_empty());
    }

    #[test]
    fn nullable_complex_properties_need_3_0() {
        let model = model(json!({
            "Schemas": [{ "Namespace": "NS",
                "ComplexTypes": [
                    { "Name": "Address", "Properties": [{ "Name": "Street", "Type": "Edm.String" }] },
                    { "Name": "Person", "Properties": [{ "Name": "Home", "Type": "NS.Address" }] }
                ]
            }]
        }));
        assert_eq!(codes(&model, EdmVersion::V2), vec![ErrorCode::NullableComplexTypeProperty]);
        assert!(codes(&model, EdmVersion::V3).is_empty());
    }

    #[test]
    fn functions_need_return_types_in_4_0() {
        let model = model(json!({
            "Schemas": [{ "Namespace": "NS", "Operations": [{ "Kind": "Function", "Name": "Nothing" }] }]
        }));
        assert!(codes(&model, EdmVersion::V3).is_empty());
        assert_eq!(codes(&model, EdmVersion::V4), vec![ErrorCode::FunctionMustHaveReturnType]);
    }
}
