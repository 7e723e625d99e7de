//! Integration tests for the cyclic CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd on a small data file
//! imported from generated text files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const E_MOD: f64 = 200_000.0;
const YIELD_STRESS: f64 = 300.0;
const HARDENING: f64 = 20_000.0;
const STRAIN_AMPLITUDE: f64 = 0.004;
const STEPS_PER_QUARTER: usize = 50;

/// Helper to get a cyclic command isolated from the user's configuration
fn cyclic(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cyclic").unwrap();
    cmd.current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"))
        .env_remove("CYCLIC_DATA_FILE")
        .env_remove("CYCLIC_REVERSE_TORSION")
        .env_remove("RUST_LOG");
    cmd
}

/// Strain controlled uniaxial cycles with linear kinematic hardening
///
/// Columns: time, force, axial strain, torque, rotation, axial count, torsion count.
/// The axial count increases at every strain reversal.
fn generate_test_file(path: &Path) {
    let area = std::f64::consts::PI * (7.0_f64.powi(2) - 6.0_f64.powi(2));
    let de = STRAIN_AMPLITUDE / STEPS_PER_QUARTER as f64;

    // 0 -> +a, then four reversals between -a and +a
    let mut directions = vec![1.0; STEPS_PER_QUARTER];
    for k in 0..4 {
        let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
        directions.extend(std::iter::repeat(sign).take(2 * STEPS_PER_QUARTER));
    }

    let (mut eps, mut sig, mut back, mut count) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
    let mut lines = vec!["# time forc astr torq tstr acnt tcnt".to_string()];
    lines.push("0 0 0 0 0 0 0".to_string());
    for (i, dir) in directions.iter().enumerate() {
        eps += dir * de;
        let trial = sig + E_MOD * dir * de;
        let f = (trial - back).abs() - YIELD_STRESS;
        if f > 0.0 {
            let n = (trial - back).signum();
            let dl = f / (E_MOD + HARDENING);
            sig = trial - E_MOD * dl * n;
            back += HARDENING * dl * n;
        } else {
            sig = trial;
        }
        if directions.get(i + 1).is_some_and(|next| next != dir) {
            count += 1.0;
        }
        lines.push(format!(
            "{} {} {} 0 0 {} 0",
            (i + 1) as f64 * 0.01,
            sig * area,
            eps,
            count
        ));
    }
    fs::write(path, lines.join("\n")).unwrap();
}

const MANIFEST: &str = r#"
columns: { time: 0, forc: 1, astr: 2, torq: 3, tstr: 4, acnt: 5, tcnt: 6 }
dtypes: { acnt: i32, tcnt: i32 }
bars:
  - name: T01
    file: raw/T01.txt
    attributes:
      inner_diameter: 12.0
      outer_diameter: 14.0
      gauge_length: 12.0
      load_type: axial
      pdef_level: 1
  - name: T02
    file: raw/T01.txt
    attributes:
      inner_diameter: 12.0
      outer_diameter: 14.0
      gauge_length: 12.0
      load_type: torsion
      pdef_level: 2
"#;

/// Helper to create a temp directory with raw data and an import manifest
fn setup_raw_data() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("raw")).unwrap();
    generate_test_file(&tmp.path().join("raw/T01.txt"));
    fs::write(tmp.path().join("import.yaml"), MANIFEST).unwrap();
    tmp
}

/// Helper to create a temp directory with an imported data file
fn setup_data_file() -> (TempDir, PathBuf) {
    let tmp = setup_raw_data();
    let data = tmp.path().join("data.hdf5");
    cyclic(&tmp)
        .args(["import", "import.yaml", "--output"])
        .arg(&data)
        .assert()
        .success();
    (tmp, data)
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// General
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let tmp = TempDir::new().unwrap();
    cyclic(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("yield"))
        .stdout(predicate::str::contains("smooth"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    cyclic(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cyclic"));
}

#[test]
fn test_completions_to_file() {
    let tmp = TempDir::new().unwrap();
    let script = tmp.path().join("cyclic.fish");
    cyclic(&tmp)
        .args(["completions", "fish", "-o"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    let content = fs::read_to_string(&script).unwrap();
    assert!(content.contains("complete -c cyclic"));
}

#[test]
fn test_missing_data_file_is_reported() {
    let tmp = TempDir::new().unwrap();
    cyclic(&tmp)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No HDF5 data file given"));
}

// ============================================================================
// Import
// ============================================================================

#[test]
fn test_import_template() {
    let tmp = TempDir::new().unwrap();
    cyclic(&tmp)
        .args(["import", "--template"])
        .assert()
        .success()
        .stdout(predicate::str::contains("columns:"))
        .stdout(predicate::str::contains("inner_diameter"));
}

#[test]
fn test_import_creates_file() {
    let (tmp, data) = setup_data_file();
    assert!(data.exists());

    // Existing output is not overwritten without --force when not on a terminal
    cyclic(&tmp)
        .args(["import", "import.yaml", "--output"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    cyclic(&tmp)
        .args(["import", "import.yaml", "--force", "--output"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("T02"));
}

#[test]
fn test_import_dry_run_reports_problems() {
    let tmp = setup_raw_data();
    cyclic(&tmp)
        .args(["import", "import.yaml", "--dry-run", "--output", "out.hdf5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run complete"));
    assert!(!tmp.path().join("out.hdf5").exists());

    let broken = MANIFEST.replace("gauge_length: 12.0\n      load_type: axial", "load_type: axial");
    fs::write(tmp.path().join("broken.yaml"), broken).unwrap();
    cyclic(&tmp)
        .args(["import", "broken.yaml", "--dry-run", "--output", "out.hdf5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gauge_length"));
}

// ============================================================================
// Listing and inspection
// ============================================================================

#[test]
fn test_list_and_filter() {
    let (tmp, data) = setup_data_file();
    cyclic(&tmp)
        .arg("--file")
        .arg(&data)
        .args(["list", "-f", "tsv", "--columns", "load_type,pdef_level"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bar\tload_type\tpdef_level"))
        .stdout(predicate::str::contains("T01\taxial\t1"))
        .stdout(predicate::str::contains("T02\ttorsion\t2"));

    cyclic(&tmp)
        .arg("--file")
        .arg(&data)
        .args(["list", "--names", "--where", "load_type=torsion"])
        .assert()
        .success()
        .stdout("T02\n");

    cyclic(&tmp)
        .arg("--file")
        .arg(&data)
        .args(["list", "--names", "--where", "pdef_level=1.0"])
        .assert()
        .success()
        .stdout("T01\n");
}

#[test]
fn test_list_uses_local_config() {
    let (tmp, _data) = setup_data_file();
    fs::write(tmp.path().join("cyclic.yaml"), "data_file: data.hdf5\n").unwrap();
    cyclic(&tmp)
        .args(["list", "--names"])
        .assert()
        .success()
        .stdout("T01\nT02\n");
}

#[test]
fn test_show_bar() {
    let (tmp, data) = setup_data_file();
    let value = json_output(
        cyclic(&tmp)
            .arg("--file")
            .arg(&data)
            .args(["show", "T01", "-f", "json"]),
    );
    assert_eq!(value["name"], "T01");
    assert_eq!(value["attributes"]["load_type"], "axial");
    let channels = value["channels"].as_array().unwrap();
    assert_eq!(channels.len(), 6);
    assert_eq!(channels[0]["len"], 4 * 2 * STEPS_PER_QUARTER + STEPS_PER_QUARTER + 1);

    cyclic(&tmp)
        .arg("--file")
        .arg(&data)
        .args(["show", "T99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_html_table() {
    let (tmp, data) = setup_data_file();
    cyclic(&tmp)
        .arg("--file")
        .arg(&data)
        .args(["table", "--attrs", "load_type,pdef_level", "--formats", "s,03d", "-o", "html"])
        .assert()
        .success();

    let html = fs::read_to_string(tmp.path().join("html/test_data.html")).unwrap();
    assert!(html.contains("<td>001</td>"));
    assert!(html.contains("<th>load_type</th>"));
    assert!(tmp.path().join("html/table.js").exists());

    cyclic(&tmp)
        .arg("--file")
        .arg(&data)
        .args(["table", "--attrs", "load_type,pdef_level", "--formats", "s"])
        .assert()
        .failure();
}

// ============================================================================
// Analysis
// ============================================================================

#[test]
fn test_cycles_indices() {
    let (tmp, data) = setup_data_file();
    cyclic(&tmp)
        .arg("--file")
        .arg(&data)
        .args(["cycles", "T01", "--indices", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("type,cycle,index,time,stp"))
        .stdout(predicate::str::contains(format!("1,0,{},", STEPS_PER_QUARTER)));
}

#[test]
fn test_cycles_segment_values() {
    let (tmp, data) = setup_data_file();
    let value = json_output(
        cyclic(&tmp)
            .arg("--file")
            .arg(&data)
            .args(["cycles", "T01", "-c", "eps", "-f", "json"]),
    );
    let rows = value.as_array().unwrap();
    assert!(!rows.is_empty());
    // Peak to valley spans twice the strain amplitude
    let peak_to_valley = rows
        .iter()
        .find(|r| r["type"] == 1)
        .unwrap();
    let diff = peak_to_valley["diff_eps"].as_f64().unwrap();
    assert!((diff + 2.0 * STRAIN_AMPLITUDE).abs() < 1e-9);
}

#[test]
fn test_vm_series() {
    let (tmp, data) = setup_data_file();
    cyclic(&tmp)
        .arg("--file")
        .arg(&data)
        .args(["vm", "T01", "--every", "50", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("time\tvm\tevm\tangle"));
}

#[test]
fn test_yield_points() {
    let (tmp, data) = setup_data_file();
    let value = json_output(
        cyclic(&tmp)
            .arg("--file")
            .arg(&data)
            .args(["yield", "T01", "--no-shear", "-f", "json"]),
    );
    let rows = value.as_array().unwrap();
    assert!(!rows.is_empty());

    let first = &rows[0];
    let emod = first["emod"].as_f64().unwrap();
    assert!((emod - E_MOD).abs() / E_MOD < 1e-6, "emod = {}", emod);
    assert!(first["gmod"].is_null());

    // Yield at an offset of 0.001 lies beyond the initial yield stress
    let sig = first["sig"].as_f64().unwrap();
    assert!(sig > YIELD_STRESS && sig < YIELD_STRESS + 0.01 * HARDENING);
}

#[test]
fn test_smooth_local_and_cycle() {
    let (tmp, data) = setup_data_file();
    cyclic(&tmp)
        .arg("--file")
        .arg(&data)
        .args(["smooth", "T01", "--deg", "3", "--residual", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("channel,rms,max"))
        .stdout(predicate::str::contains("sig,"));

    cyclic(&tmp)
        .arg("--file")
        .arg(&data)
        .args([
            "smooth", "T01", "-m", "cycle", "--period", "2.0", "--knots", "3", "--knot-order", "1",
            "--every", "25", "-f", "tsv",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("time\tstp\tsig\teps\ttau\tgam"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_init_and_show() {
    let tmp = TempDir::new().unwrap();
    cyclic(&tmp).args(["config", "init"]).assert().success();
    assert!(tmp.path().join("cyclic.yaml").exists());
    cyclic(&tmp).args(["config", "init"]).assert().failure();

    fs::write(tmp.path().join("cyclic.yaml"), "num_per_cycle: 4\n").unwrap();
    cyclic(&tmp)
        .args(["config", "show", "num_per_cycle"])
        .assert()
        .success()
        .stdout("4\n");

    cyclic(&tmp)
        .args(["config", "keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("yield_offset"));
}
