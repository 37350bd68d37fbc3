//! CLI integration tests for the edm-schema binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("edm-schema"))
}

// Helper to create a temp CSDL file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const VALID: &str = r#"{
    "Schemas": [{
        "Namespace": "Sales",
        "Alias": "S",
        "EntityTypes": [{
            "Name": "Customer",
            "Key": ["Id"],
            "Properties": [{ "Name": "Id", "Type": "Edm.Int32", "Nullable": false }]
        }],
        "EntityContainers": [{
            "Name": "Default",
            "EntitySets": [{ "Name": "Customers", "EntityType": "Sales.Customer" }]
        }]
    }]
}"#;

const KEYLESS: &str = r#"{
    "Schemas": [{
        "Namespace": "Sales",
        "EntityTypes": [{ "Name": "Customer", "Location": { "line": 4, "column": 9 } }]
    }]
}"#;

mod validate_command {
    use super::*;

    #[test]
    fn valid_model_passes() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_file(&dir, "sales.json", VALID);

        cmd()
            .args(["validate", file.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Valid (EDM 4.0)"));
    }

    #[test]
    fn errors_exit_one_with_source_location() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_file(&dir, "keyless.json", KEYLESS);

        cmd()
            .args(["validate", file.to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("KeyMissingOnEntityType"))
            .stdout(predicate::str::contains("keyless.json:4:9"));
    }

    #[test]
    fn json_format() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_file(&dir, "keyless.json", KEYLESS);

        let output = cmd()
            .args(["validate", file.to_str().unwrap(), "--format", "json"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["valid"], false);
        assert_eq!(report["errors"], 1);
        assert_eq!(report["diagnostics"][0]["code"], "KeyMissingOnEntityType");
        assert_eq!(report["diagnostics"][0]["location"]["line"], 4);
    }

    #[test]
    fn strict_fails_on_warnings() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_file(
            &dir,
            "point.json",
            r#"{"Schemas": [{"Namespace": "Geo", "ComplexTypes": [
                {"Name": "Point", "Properties": [{"Name": "Point", "Type": "Edm.Int32"}]}
            ]}]}"#,
        );

        cmd()
            .args(["validate", file.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("InvalidMemberNameMatchesTypeName"))
            .stdout(predicate::str::contains("Valid (EDM 4.0)"));

        cmd()
            .args(["validate", file.to_str().unwrap(), "--strict"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Invalid (EDM 4.0): 0 errors, 1 warnings"));
    }

    #[test]
    fn version_selects_rule_set() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_file(
            &dir,
            "ops.json",
            r#"{"Schemas": [{"Namespace": "NS", "Operations": [
                {"Kind": "Function", "Name": "Ping", "ReturnType": {"Type": "Edm.Boolean"}}
            ]}]}"#,
        );

        cmd()
            .args(["validate", file.to_str().unwrap(), "--edm-version", "1.0"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("FunctionsNotSupportedBeforeV2"));

        cmd()
            .args(["validate", file.to_str().unwrap(), "--edm-version", "2.0"])
            .assert()
            .success();
    }

    #[test]
    fn unknown_version_exits_two() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_file(&dir, "sales.json", VALID);

        cmd()
            .args(["validate", file.to_str().unwrap(), "--edm-version", "9.9"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown EDM version"));
    }

    #[test]
    fn unknown_declared_version_exits_two() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_file(
            &dir,
            "future.json",
            &VALID.replacen('{', r#"{ "Version": "5.0","#, 1),
        );

        cmd()
            .args(["validate", file.to_str().unwrap()])
            .assert()
            .code(2)
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("unknown EDM version"));

        cmd()
            .args(["validate", file.to_str().unwrap(), "--edm-version", "4.0"])
            .assert()
            .success();
    }

    #[test]
    fn missing_file_exits_three() {
        cmd()
            .args(["validate", "/nonexistent/model.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn invalid_json_exits_two() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_file(&dir, "broken.json", "{ not json");

        cmd()
            .args(["validate", file.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid CSDL document"));
    }

    #[test]
    fn files_are_merged_into_one_model() {
        let dir = TempDir::new().unwrap();
        let types = write_temp_file(
            &dir,
            "types.json",
            r#"{"Schemas": [{"Namespace": "A", "EntityTypes": [
                {"Name": "Thing", "Key": ["Id"], "Properties": [{"Name": "Id", "Type": "Edm.Int32", "Nullable": false}]}
            ]}]}"#,
        );
        let container = write_temp_file(
            &dir,
            "container.json",
            r#"{"Schemas": [{"Namespace": "B", "EntityContainers": [
                {"Name": "C", "EntitySets": [{"Name": "Things", "EntityType": "A.Thing"}]}
            ]}]}"#,
        );

        cmd()
            .args(["validate", container.to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("BadUnresolvedType"));

        cmd()
            .args([
                "validate",
                types.to_str().unwrap(),
                container.to_str().unwrap(),
            ])
            .assert()
            .success();
    }
}

mod lookup_command {
    use super::*;

    #[test]
    fn finds_type_through_alias() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_file(&dir, "sales.json", VALID);

        cmd()
            .args(["lookup", file.to_str().unwrap(), "--name", "S.Customer"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Entity type Sales.Customer"));
    }

    #[test]
    fn finds_container_by_bare_name() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_file(&dir, "sales.json", VALID);

        cmd()
            .args([
                "lookup",
                file.to_str().unwrap(),
                "--name",
                "Default",
                "--capability",
                "container",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("entity container Sales.Default"));
    }

    #[test]
    fn ambiguous_name_lists_candidates() {
        let dir = TempDir::new().unwrap();
        let first = write_temp_file(&dir, "a.json", VALID);
        let second = write_temp_file(&dir, "b.json", VALID);

        cmd()
            .args([
                "lookup",
                first.to_str().unwrap(),
                second.to_str().unwrap(),
                "--name",
                "Sales.Customer",
            ])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("ambiguous between 2 elements"));
    }

    #[test]
    fn missing_name_exits_one() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_file(&dir, "sales.json", VALID);

        cmd()
            .args(["lookup", file.to_str().unwrap(), "--name", "Sales.Nobody"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("not found"));
    }

    #[test]
    fn unknown_capability_exits_two() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_file(&dir, "sales.json", VALID);

        cmd()
            .args([
                "lookup",
                file.to_str().unwrap(),
                "--name",
                "Sales.Customer",
                "--capability",
                "widget",
            ])
            .assert()
            .code(2);
    }
}
