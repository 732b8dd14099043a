//! Binary that runs one catalog scenario through the harness and prints
//! deterministic output lines for cross-process verification.
//!
//! Usage: `loop_fixture <scenario_id>` or `loop_fixture --snapshot <file>`
//! Output: `key=value` lines:
//!   `bundle_digest`=sha256:...
//!   `snapshot_hash`=sha256:...
//!   `report_hash`=sha256:...
//!   `loops`=N
//!   `loop`=<path> (one line per loop, in report order)

use handoff_harness::contract::{LoadedScenario, ScenarioV1};
use handoff_harness::policy::PolicyConfig;
use handoff_harness::runner::run_analysis;
use handoff_harness::scenarios::catalog;
use handoff_search::contract::NullSink;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let scenario: Box<dyn ScenarioV1> = match args.as_slice() {
        [flag, path] if flag == "--snapshot" => {
            let bytes = std::fs::read(path).expect("cannot read snapshot file");
            Box::new(LoadedScenario::from_json_bytes("fixture", &bytes).expect("invalid snapshot"))
        }
        [id] => catalog::by_id(id).unwrap_or_else(|| panic!("unknown scenario '{id}'")),
        _ => panic!("usage: loop_fixture <scenario_id> | --snapshot <file>"),
    };

    let bundle = run_analysis(scenario.as_ref(), &PolicyConfig::default(), &mut NullSink)
        .expect("harness run failed");

    let report = bundle
        .artifacts
        .get("loop_report.json")
        .expect("missing loop_report.json");
    let report_json: serde_json::Value =
        serde_json::from_slice(&report.content).expect("invalid report JSON");
    let snapshot = bundle
        .artifacts
        .get("cell_snapshot.json")
        .expect("missing cell_snapshot.json");

    println!("bundle_digest={}", bundle.digest.as_str());
    println!("snapshot_hash={}", snapshot.content_hash.as_str());
    println!("report_hash={}", report.content_hash.as_str());
    let loops = report_json["loops"].as_array().expect("loops array");
    println!("loops={}", loops.len());
    for l in loops {
        println!("loop={}", l["path"].as_str().expect("loop path"));
    }
}
