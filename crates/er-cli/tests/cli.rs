//! Command-line tests against the built binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("pedidos.json")
}

fn er_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_er-cli"))
        .args(args)
        .output()
        .expect("er-cli runs")
}

fn read_json(path: &Path) -> Value {
    let raw = std::fs::read_to_string(path).expect("output written");
    serde_json::from_str(&raw).expect("output is JSON")
}

fn element<'a>(document: &'a Value, id: &str) -> &'a Value {
    document["elements"]
        .as_array()
        .expect("elements array")
        .iter()
        .find(|e| e["id"] == id)
        .unwrap_or_else(|| panic!("element {id} missing"))
}

#[test]
fn render_produces_svg_and_settles_cardinalities() {
    let input = fixture();
    let output = er_cli(&["render", input.to_str().expect("utf-8 path"), "--json"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let svg = String::from_utf8(output.stdout).expect("utf-8 svg");
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("viewBox="));
    assert!(svg.contains("Cliente"));
    assert!(!svg.contains("marker-end"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("\"cardinality_patches\": 1"), "stderr: {stderr}");
}

#[test]
fn validate_accepts_the_fixture() {
    let input = fixture();
    let output = er_cli(&["validate", input.to_str().expect("utf-8 path"), "--json"]);
    assert!(output.status.success());
    let result: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(result["valid"], true);
    assert_eq!(result["notation"], "crowsfoot");
    assert_eq!(result["connection_count"], 2);
}

#[test]
fn validate_rejects_entity_pairs_in_chen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut document = read_json(&fixture());
    document["notation"] = Value::from("chen");
    let path = dir.path().join("chen.json");
    std::fs::write(&path, document.to_string()).expect("write input");

    let output = er_cli(&["validate", path.to_str().expect("utf-8 path"), "--json"]);
    assert!(!output.status.success());
    let result: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(result["valid"], false);
    assert_eq!(result["errors"][0]["code"], "E002");
    assert_eq!(result["errors"][0]["element"], "PedidoCliente");
}

#[test]
fn set_falls_back_to_the_default_for_unknown_cardinalities() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("out.json");
    let input = fixture();
    let output = er_cli(&[
        "set",
        input.to_str().expect("utf-8 path"),
        "PedidoCliente",
        "cardinalityTarget",
        "muitos",
        "-o",
        out.to_str().expect("utf-8 path"),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stderr).contains("INVALID_CARDINALITY"));

    let document = read_json(&out);
    let link = element(&document, "PedidoCliente");
    assert_eq!(link["businessObject"]["cardinalityTarget"], "1..N");
    assert_eq!(link["businessObject"]["cardinalitySource"], "0..N");
}

#[test]
fn set_refuses_cardinality_on_attribute_links() {
    let input = fixture();
    let output = er_cli(&[
        "set",
        input.to_str().expect("utf-8 path"),
        "ClienteEndereco",
        "cardinalitySource",
        "1..1",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("CARDINALITY_NOT_ALLOWED"));
}

#[test]
fn resize_below_the_minimum_fails() {
    let input = fixture();
    let output = er_cli(&["resize", input.to_str().expect("utf-8 path"), "Pedido", "30", "60"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("INVALID_DIMENSIONS"));
}

#[test]
fn place_adds_a_child_inside_the_container() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("placed.json");
    let input = fixture();
    let output = er_cli(&[
        "place",
        input.to_str().expect("utf-8 path"),
        "Endereco",
        "Rua",
        "-o",
        out.to_str().expect("utf-8 path"),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let document = read_json(&out);
    let container = element(&document, "Endereco");
    let child_id = container["children"][0].as_str().expect("child id");
    let child = element(&document, child_id);
    assert_eq!(child["parent"], "Endereco");
    assert_eq!(child["businessObject"]["name"], "Rua");
    assert_eq!(child["businessObject"]["isSubAttribute"], true);

    let frame = &container["bounds"];
    let bounds = &child["bounds"];
    let right = |b: &Value| b["x"].as_f64().unwrap_or(0.0) + b["width"].as_f64().unwrap_or(0.0);
    assert!(right(bounds) <= right(frame));
}

#[test]
fn config_file_sets_locale() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{ "locale": "en" }"#).expect("write config");

    let mut document = read_json(&fixture());
    document["elements"][1]["businessObject"]["name"] = Value::Null;
    let input = dir.path().join("unnamed.json");
    std::fs::write(&input, document.to_string()).expect("write input");

    let output = er_cli(&[
        "render",
        input.to_str().expect("utf-8 path"),
        "--config",
        config.to_str().expect("utf-8 path"),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Weak Entity"));
}
