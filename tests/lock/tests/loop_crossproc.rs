//! Cross-process determinism: the `loop_fixture` binary prints identical
//! output under different working directories and environment variables.

use std::path::Path;
use std::process::Command;

fn fixture_path() -> String {
    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("tests/ exists")
        .parent()
        .expect("workspace root exists");
    workspace_root
        .join("tests/fixtures/escalation_fallback.json")
        .to_string_lossy()
        .to_string()
}

fn run_variant(args: &[&str], work_dir: &str, env_overrides: &[(&str, &str)]) -> String {
    let mut command = Command::new(env!("CARGO_BIN_EXE_loop_fixture"));
    command
        .args(args)
        .current_dir(work_dir)
        .env_remove("LC_ALL")
        .env_remove("LC_COLLATE")
        .env_remove("LANG")
        .env_remove("RUST_LOG");
    for &(key, val) in env_overrides {
        command.env(key, val);
    }

    let output = command
        .output()
        .unwrap_or_else(|e| panic!("failed to spawn loop_fixture: {e}"));
    assert!(
        output.status.success(),
        "loop_fixture failed in {work_dir}: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout is UTF-8")
}

fn assert_stable(args: &[&str]) -> String {
    let tmp = tempfile::tempdir().unwrap();
    let tmp_dir = tmp.path().to_string_lossy().to_string();
    let baseline = run_variant(args, env!("CARGO_MANIFEST_DIR"), &[]);
    let variants = [
        run_variant(args, &tmp_dir, &[]),
        run_variant(args, env!("CARGO_MANIFEST_DIR"), &[("LC_ALL", "C"), ("TZ", "UTC")]),
        run_variant(
            args,
            &tmp_dir,
            &[("LANG", "tr_TR.UTF-8"), ("RUST_LOG", "trace"), ("TZ", "Asia/Tokyo")],
        ),
    ];
    for (i, variant) in variants.iter().enumerate() {
        assert_eq!(&baseline, variant, "variant {i} diverged for {args:?}");
    }
    baseline
}

#[test]
fn catalog_scenario_output_is_process_independent() {
    let output = assert_stable(&["priority_escalation"]);
    assert!(output.contains("loops=4\n"), "{output}");
    assert!(output.contains("loop=A(idle)->B(idle)->A\n"), "{output}");
    assert!(output.starts_with("bundle_digest=sha256:"));
}

#[test]
fn snapshot_file_output_is_process_independent() {
    let fixture = fixture_path();
    let output = assert_stable(&["--snapshot", &fixture]);
    let loops: Vec<&str> = output
        .lines()
        .filter_map(|l| l.strip_prefix("loop="))
        .collect();
    assert_eq!(
        loops,
        [
            "A(idle)->B(idle)->A",
            "A(idle)->B(active)->A",
            "A(active)->B(idle)->A",
            "A(active)->B(active)->A",
        ]
    );
}
