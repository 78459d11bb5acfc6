use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const HIERARCHY: &str = r#"{
  "groups": [
    { "id": "gen.0" },
    { "id": "gen.0.0", "parent": "gen.0" },
    { "id": "gen.0.1", "parent": "gen.0" }
  ],
  "instances": [
    { "group": "gen.0.0", "name": "a", "data": [1.0, 2.0] }
  ]
}"#;

fn hiermeasure(config: &Path) -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("hiermeasure");
    let mut cmd = Command::new(bin);
    cmd.args(["--log-level", "warn", "--config", config.to_str().unwrap()]);
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("utf8 output");
    let start = stdout.find(['{', '[']).expect("json start");
    serde_json::from_str(stdout[start..].trim()).expect("valid json")
}

#[test]
fn list_filters_by_group() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    fs::write(&config, "include_builtin: true\n").unwrap();

    let assert = hiermeasure(&config)
        .args(["--output", "json", "list", "--group", "/internal/statistics/histogram"])
        .assert()
        .success();
    let rows = stdout_json(assert.get_output());
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|row| row["group"] == "/internal/statistics/histogram"));
    assert!(rows.iter().all(|row| row["constructed"] == false));
}

#[test]
fn evaluate_auto_compute_and_dump() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    fs::write(&config, "parallelism: 2\ntimeout: 10s\n").unwrap();
    let hierarchy = dir.path().join("hierarchy.json");
    fs::write(&hierarchy, HIERARCHY).unwrap();
    let dump = dir.path().join("measures.csv");

    let assert = hiermeasure(&config)
        .args([
            "--output",
            "json",
            "evaluate",
            hierarchy.to_str().unwrap(),
            "--auto",
            "--dump",
            dump.to_str().unwrap(),
        ])
        .assert()
        .success();
    let report = stdout_json(assert.get_output());
    let outcomes = report["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(|row| row["outcome"] == "computed"));
    let nodes = outcomes
        .iter()
        .find(|row| row["measure"] == "Number of Nodes")
        .unwrap();
    assert_eq!(nodes["value"]["type"], "scalar");
    assert_eq!(nodes["value"]["value"], 3.0);

    let written = fs::read_to_string(&dump).unwrap();
    assert_eq!(
        written,
        "Average Path Length;stdev;Height;stdev;Number of Leaves;stdev;Number of Nodes;stdev;\n\
         1.0;0.0;1.0;0.0;2.0;0.0;3.0;0.0;\n\
         \n"
    );
}

#[test]
fn unknown_measure_fails_the_command() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    fs::write(&config, "").unwrap();
    let hierarchy = dir.path().join("hierarchy.json");
    fs::write(&hierarchy, HIERARCHY).unwrap();

    hiermeasure(&config)
        .args(["evaluate", hierarchy.to_str().unwrap(), "--measure", "Silhouette"])
        .assert()
        .failure();
}

#[test]
fn selected_measures_dump_with_background_statistics() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    fs::write(&config, "").unwrap();
    let hierarchy = dir.path().join("hierarchy.json");
    fs::write(&hierarchy, HIERARCHY).unwrap();
    let dump = dir.path().join("measures.csv");

    let assert = hiermeasure(&config)
        .args([
            "--output",
            "json",
            "evaluate",
            hierarchy.to_str().unwrap(),
            "-m",
            "Nodes Per Level",
            "-m",
            "Nodes Per Level",
            "--dump",
            dump.to_str().unwrap(),
        ])
        .assert()
        .success();
    let report = stdout_json(assert.get_output());
    let outcomes = report["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0]["measure"], "Nodes Per Level");

    let written = fs::read_to_string(&dump).unwrap();
    assert_eq!(
        written,
        "Average Path Length;stdev;Height;stdev;Number of Leaves;stdev;Number of Nodes;stdev;\n\
         1.0;0.0;1.0;0.0;2.0;0.0;3.0;0.0;\n\
         \n\
         Nodes Per Level\n\
         0;1;\n\
         1.0;2.0;\n\
         0.0;0.0;\n\
         \n"
    );
}
