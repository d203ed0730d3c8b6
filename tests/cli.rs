//! Integration tests for the rosetta-construct CLI.

#![allow(deprecated)] // cargo_bin deprecation doesn't affect standard builds

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;

const SIGNED: &str = "tests/fixtures/signed_transaction.hex";
const UNSIGNED: &str = "tests/fixtures/unsigned_transaction.hex";

const KEY: &str = "1B400D60AAF34EAF6DCBAB9BBA46001A23497886CF11066F7846933D30E5AD3F";
const ADDRESS: &str = "addr1vxa5pudxg77g3sdaddecmw8tvc6hmynywn49lltt4fmvn7cpnkcpx";
const TX_HASH: &str = "2f23fd8cca835af21f3ac375bac601f97ead75f2e79143bdf71fe2c4be043e8f";

/// Blake2b-256 of the body of the signed fixture.
const SIGNED_HASH: &str = "4108ffbdf90f7f3fb2dd14f9675ea313edca2df17c6a4823c8941e0232134ef0";

/// The binary with a clean environment.
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("rosetta-construct").unwrap();
    cmd.env_remove("ROSETTA_NETWORK")
        .env_remove("ROSETTA_PROTOCOL_PARAMS")
        .env_remove("ROSETTA_SUBMIT_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn operations(output_value: u64) -> Value {
    json!([
        {
            "operation_identifier": {"index": 0},
            "type": "input",
            "account": {"address": ADDRESS},
            "amount": {"value": "-90000", "currency": {"symbol": "ADA", "decimals": 6}},
            "coin_change": {
                "coin_identifier": {"identifier": format!("{TX_HASH}:1")},
                "coin_action": "coin_spent"
            }
        },
        {
            "operation_identifier": {"index": 1},
            "related_operations": [{"index": 0}],
            "type": "output",
            "account": {"address": ADDRESS},
            "amount": {"value": output_value.to_string(), "currency": {"symbol": "ADA", "decimals": 6}}
        }
    ])
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout is JSON")
}

#[test]
fn test_show_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rosetta Construction API engine for Cardano"));
}

#[test]
fn test_show_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rosetta-construct"));
}

#[test]
fn test_derive_inline() {
    let request = json!({"public_key": {"hex_bytes": KEY, "curve_type": "edwards25519"}});
    cmd()
        .args(["derive", &request.to_string(), "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(ADDRESS));
}

#[test]
fn test_derive_network_from_env() {
    let request = json!({
        "public_key": {"hex_bytes": KEY, "curve_type": "edwards25519"},
        "metadata": {
            "address_type": "Base",
            "staking_credential": {"hex_bytes": KEY, "curve_type": "edwards25519"}
        }
    });
    cmd()
        .env("ROSETTA_NETWORK", "preprod")
        .arg("derive")
        .write_stdin(request.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "addr_test1qza5pudxg77g3sdaddecmw8tvc6hmynywn49lltt4fmvn7amgrc6v3au3rqm66mn3kuwke340kfxga82tl7kh2nke8aslzyvu5",
        ));
}

#[test]
fn test_derive_invalid_address_type() {
    let request = json!({
        "public_key": {"hex_bytes": KEY, "curve_type": "edwards25519"},
        "metadata": {"address_type": "Pointer"}
    });
    cmd()
        .args(["derive", &request.to_string()])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Provided address type is invalid"));
}

#[test]
fn test_preprocess_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preprocess.json");
    fs::write(&path, json!({"operations": operations(50000)}).to_string()).unwrap();

    let output = cmd()
        .args(["preprocess", path.to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let response = stdout_json(&output.stdout);
    assert_eq!(response["options"]["relative_ttl"], 1000);
    assert!(response["options"]["transaction_size"].as_u64().unwrap() > 100);
}

#[test]
fn test_metadata_tip_slot_flag() {
    let request = json!({"options": {"relative_ttl": 1000, "transaction_size": 227}});
    let output = cmd()
        .args(["metadata", &request.to_string(), "--tip-slot", "100", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let response = stdout_json(&output.stdout);
    assert_eq!(response["metadata"]["ttl"], "1100");
    assert_eq!(response["suggested_fee"][0]["value"], "165457");
}

#[test]
fn test_metadata_with_protocol_params_file() {
    let dir = tempfile::tempdir().unwrap();
    let params = dir.path().join("params.json");
    fs::write(&params, json!({"minFeeCoefficient": 1, "minFeeConstant": 10}).to_string())
        .unwrap();
    let request = json!({"options": {"relative_ttl": 10, "transaction_size": 200}, "tip_slot": 5});
    let output = cmd()
        .env("ROSETTA_PROTOCOL_PARAMS", &params)
        .args(["metadata", &request.to_string(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let response = stdout_json(&output.stdout);
    // 1 * 200 + 10
    assert_eq!(response["suggested_fee"][0]["value"], "210");
}

#[test]
fn test_payloads_then_parse() {
    let request = json!({"operations": operations(50000), "metadata": {"ttl": "1000"}});
    let output = cmd()
        .args(["payloads", &request.to_string(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let response = stdout_json(&output.stdout);
    assert_eq!(response["payloads"][0]["account_identifier"]["address"], ADDRESS);
    let unsigned = response["unsigned_transaction"].as_str().unwrap();

    let parsed = cmd()
        .args(["parse", unsigned, "--json"])
        .output()
        .unwrap();
    assert!(parsed.status.success());
    let parsed = stdout_json(&parsed.stdout);
    assert_eq!(parsed["operations"][0]["type"], "input");
    assert_eq!(parsed["operations"][0]["amount"]["value"], "-90000");
    assert_eq!(parsed["operations"][1]["type"], "output");
}

#[test]
fn test_payloads_outputs_exceed_inputs() {
    let request = json!({"operations": operations(100000), "metadata": {"ttl": "1000"}});
    cmd()
        .args(["payloads", &request.to_string()])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("more outputs than inputs"));
}

#[test]
fn test_parse_signed_fixture() {
    let output = cmd()
        .args(["parse", "--signed", SIGNED, "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let response = stdout_json(&output.stdout);
    let ops = response["operations"].as_array().unwrap();
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[0]["amount"]["value"], "-90000");
    assert_eq!(ops[0]["coin_change"]["coin_action"], "coin_spent");
    assert_eq!(ops[0]["status"], "success");
    assert!(!response["account_identifier_signers"].as_array().unwrap().is_empty());
}

#[test]
fn test_parse_unsigned_fixture_pretty() {
    cmd()
        .args(["parse", UNSIGNED, "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Operations (4)"))
        .stdout(predicate::str::contains("stakeKeyDeregistration"));
}

#[test]
fn test_parse_signed_flag_mismatch() {
    cmd()
        .args(["parse", UNSIGNED, "--signed"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Cant create signed transaction"));
}

#[test]
fn test_hash_from_file() {
    cmd()
        .args(["hash", SIGNED, "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(SIGNED_HASH));
}

#[test]
fn test_hash_from_stdin() {
    let hex = fs::read_to_string(SIGNED).unwrap();
    cmd()
        .arg("hash")
        .write_stdin(hex)
        .assert()
        .success()
        .stdout(predicate::str::contains("Hash:"))
        .stdout(predicate::str::contains(SIGNED_HASH));
}

#[test]
fn test_combine_invalid_transaction() {
    let request = json!({"unsigned_transaction": "zz", "signatures": []});
    cmd()
        .args(["combine", &request.to_string()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Can't decode Transaction"));
}

#[test]
fn test_invalid_json_document() {
    cmd()
        .args(["preprocess", "{\"operations\": 5}"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid request document"));
}

#[test]
fn test_file_not_found() {
    cmd()
        .args(["payloads", "/nonexistent/payloads.json"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_submit_requires_url() {
    cmd()
        .args(["submit", SIGNED])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--submit-url"));
}

#[test]
fn test_submit_unreachable_node() {
    cmd()
        .args(["submit", SIGNED, "--timeout", "2"])
        .env("ROSETTA_SUBMIT_URL", "http://127.0.0.1:1")
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("Error when sending the transaction"));
}

#[test]
fn test_address_decode() {
    cmd()
        .args(["addr", ADDRESS, "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"enterprise\""))
        .stdout(predicate::str::contains("\"network\": \"mainnet\""));
}

#[test]
fn test_no_color_flag() {
    cmd()
        .args(["hash", SIGNED, "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1b[").not());
}
