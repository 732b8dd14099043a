//! `loop_scan`: analyze a cell snapshot file for persistent handoff loops.
//!
//! ```text
//! loop_scan <snapshot.json> [--policy <policy.json>] [--out <dir>]
//! ```
//!
//! Loops are logged at `warn` as they are found (`RUST_LOG` controls the
//! filter, default `info`). A `key=value` summary goes to stdout. With
//! `--out`, the verified artifact bundle is written to `<dir>`.
//!
//! Exit codes: 0 no loops, 1 loops found, 2 usage or input error.

use std::path::{Path, PathBuf};

use handoff_harness::bundle::verify_bundle;
use handoff_harness::bundle_dir::write_bundle_dir;
use handoff_harness::contract::LoadedScenario;
use handoff_harness::policy::PolicyConfig;
use handoff_harness::runner::run_analysis;
use handoff_search::contract::TracingSink;
use tracing_subscriber::{prelude::*, EnvFilter};

struct Args {
    snapshot: PathBuf,
    policy: Option<PathBuf>,
    out: Option<PathBuf>,
}

fn main() {
    init_logging();
    let exit_code = match run(std::env::args().skip(1).collect()) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{error}");
            2
        }
    };
    std::process::exit(exit_code);
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn usage() -> String {
    [
        "loop_scan usage:",
        "  loop_scan <snapshot.json> [--policy <policy.json>] [--out <dir>]",
        "",
        "exit codes:",
        "  0  no persistent loops",
        "  1  persistent loops found",
        "  2  CLI/input error",
        "",
        "RUST_LOG sets the log filter (default: info).",
    ]
    .join("\n")
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut snapshot = None;
    let mut policy = None;
    let mut out = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--policy" => {
                let value = iter.next().ok_or("--policy requires a path")?;
                policy = Some(PathBuf::from(value));
            }
            "--out" => {
                let value = iter.next().ok_or("--out requires a path")?;
                out = Some(PathBuf::from(value));
            }
            flag if flag.starts_with("--") => {
                return Err(format!("unknown flag '{flag}'\n\n{}", usage()));
            }
            path if snapshot.is_none() => snapshot = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument '{extra}'\n\n{}", usage())),
        }
    }
    Ok(Args {
        snapshot: snapshot.ok_or_else(usage)?,
        policy,
        out,
    })
}

fn read(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()))
}

fn run(args: Vec<String>) -> Result<i32, String> {
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", usage());
        return Ok(0);
    }
    let args = parse_args(&args)?;

    let config = match &args.policy {
        Some(path) => PolicyConfig::from_json_bytes(&read(path)?)
            .map_err(|e| format!("{}: {e}", path.display()))?,
        None => PolicyConfig::default(),
    };
    let scenario_id = args
        .snapshot
        .file_stem()
        .map_or_else(|| "snapshot".to_string(), |s| s.to_string_lossy().into_owned());
    let scenario = LoadedScenario::from_json_bytes(scenario_id, &read(&args.snapshot)?)
        .map_err(|e| format!("{}: {e}", args.snapshot.display()))?;

    let bundle = run_analysis(&scenario, &config, &mut TracingSink).map_err(|e| e.to_string())?;
    let report: serde_json::Value = serde_json::from_slice(
        &bundle
            .artifacts
            .get("loop_report.json")
            .ok_or("bundle has no loop_report.json")?
            .content,
    )
    .map_err(|e| e.to_string())?;
    let metadata = &report["metadata"];

    println!("cells={}", metadata["cell_count"]);
    println!("rounds={}", metadata["total_rounds"]);
    println!("frames_pushed={}", metadata["total_frames_pushed"]);
    println!("truncated_rounds={}", metadata["truncated_rounds"]);
    println!("loops={}", metadata["total_loops"]);
    println!("bundle_digest={}", bundle.digest);

    if let Some(dir) = &args.out {
        verify_bundle(&bundle).map_err(|e| format!("bundle verification failed: {e}"))?;
        write_bundle_dir(&bundle, dir).map_err(|e| e.to_string())?;
        println!("bundle_dir={}", dir.display());
    }

    Ok(if metadata["total_loops"].as_u64().unwrap_or(0) > 0 {
        1
    } else {
        0
    })
}
