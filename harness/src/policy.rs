//! Policy snapshot: the auditable conditions under which a loop report was
//! produced.
//!
//! The runner resolves a [`PolicyConfig`] of optional overrides against the
//! defaults into a [`PolicySnapshotV1`]: canonical JSON bytes plus the typed
//! values those bytes encode. The bytes are a normative bundle artifact, so
//! the bundle digest commits to the policy, and replay verification parses
//! them back with [`PolicySnapshotV1::from_bytes`].

use handoff_kernel::proof::canon::canonical_json_bytes;
use handoff_kernel::proof::hash::{canonical_hash, ContentHash, HashDomain};
use handoff_search::policy::{AnalysisPolicyV1, RootClosurePolicyV1};

/// Domain prefix for policy snapshot hashing (harness-originated).
pub const DOMAIN_POLICY_SNAPSHOT: HashDomain = HashDomain::PolicySnapshot;

const POLICY_SCHEMA_VERSION: &str = "policy.v1";
const DEFAULT_MAX_REPORT_BYTES: usize = 4 * 1024 * 1024;

const CONFIG_KEYS: &[&str] = &[
    "log_cell_configs",
    "max_frames_per_round",
    "max_report_bytes",
    "root_closure",
    "suppress_repeat_reports",
];

/// Optional overrides of the default policy.
///
/// Every `None` field takes its default when resolved by [`build_policy`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Non-persistent root closure handling. Default: extend through root.
    pub root_closure: Option<RootClosurePolicyV1>,
    /// Fresh-frame cap per round. Default: unbounded.
    pub max_frames_per_round: Option<u64>,
    /// Dump every cell configuration at `info` before a pass. Default: off.
    pub log_cell_configs: Option<bool>,
    /// Forward each distinct loop only once across passes. Default: off.
    pub suppress_repeat_reports: Option<bool>,
    /// Byte budget for `loop_report.json`. Default: 4 MiB.
    pub max_report_bytes: Option<usize>,
}

impl PolicyConfig {
    /// Parse overrides from a JSON object. Absent or `null` keys keep their
    /// defaults; unknown keys are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyBuildError::Parse`] for malformed JSON or
    /// [`PolicyBuildError::InvalidConfig`] for unknown keys and bad values.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, PolicyBuildError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| PolicyBuildError::Parse {
                detail: e.to_string(),
            })?;
        let obj = value.as_object().ok_or_else(|| PolicyBuildError::Parse {
            detail: "policy config must be a JSON object".into(),
        })?;
        if let Some(key) = obj.keys().find(|k| !CONFIG_KEYS.contains(&k.as_str())) {
            return Err(PolicyBuildError::InvalidConfig {
                detail: format!("unknown key {key:?}"),
            });
        }

        let field = |key: &str| obj.get(key).filter(|v| !v.is_null());
        let root_closure = field("root_closure")
            .map(|v| {
                v.as_str()
                    .and_then(RootClosurePolicyV1::parse)
                    .ok_or_else(|| invalid("root_closure", v))
            })
            .transpose()?;
        let max_frames_per_round = field("max_frames_per_round")
            .map(|v| v.as_u64().ok_or_else(|| invalid("max_frames_per_round", v)))
            .transpose()?;
        let log_cell_configs = field("log_cell_configs")
            .map(|v| v.as_bool().ok_or_else(|| invalid("log_cell_configs", v)))
            .transpose()?;
        let suppress_repeat_reports = field("suppress_repeat_reports")
            .map(|v| {
                v.as_bool()
                    .ok_or_else(|| invalid("suppress_repeat_reports", v))
            })
            .transpose()?;
        let max_report_bytes = field("max_report_bytes")
            .map(|v| {
                v.as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| invalid("max_report_bytes", v))
            })
            .transpose()?;

        Ok(Self {
            root_closure,
            max_frames_per_round,
            log_cell_configs,
            suppress_repeat_reports,
            max_report_bytes,
        })
    }
}

fn invalid(key: &str, value: &serde_json::Value) -> PolicyBuildError {
    PolicyBuildError::InvalidConfig {
        detail: format!("{key}: unexpected value {value}"),
    }
}

/// Resolved policy for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySnapshotV1 {
    /// Canonical JSON bytes of the policy snapshot.
    pub bytes: Vec<u8>,
    /// Search-level settings handed to the explorer.
    pub analysis: AnalysisPolicyV1,
    pub log_cell_configs: bool,
    pub suppress_repeat_reports: bool,
    pub max_report_bytes: usize,
}

impl PolicySnapshotV1 {
    /// Digest bound into every report produced under this policy.
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        canonical_hash(DOMAIN_POLICY_SNAPSHOT, &self.bytes)
    }

    /// Rebuild a snapshot from its canonical bytes.
    ///
    /// The bytes must be exactly what [`build_policy`] would emit for the
    /// values they carry.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyBuildError`] if the bytes do not parse, carry an
    /// unknown schema version, or are not in canonical form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PolicyBuildError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| PolicyBuildError::Parse {
                detail: e.to_string(),
            })?;
        let version = value["schema_version"].as_str().unwrap_or("");
        if version != POLICY_SCHEMA_VERSION {
            return Err(PolicyBuildError::InvalidConfig {
                detail: format!("unsupported policy schema_version {version:?}"),
            });
        }
        let root_closure = value["analysis"]["root_closure"]
            .as_str()
            .and_then(RootClosurePolicyV1::parse)
            .ok_or_else(|| invalid("analysis.root_closure", &value["analysis"]["root_closure"]))?;
        let max_frames = &value["analysis"]["max_frames_per_round"];
        let max_frames_per_round = if max_frames.is_null() {
            None
        } else {
            Some(
                max_frames
                    .as_u64()
                    .ok_or_else(|| invalid("analysis.max_frames_per_round", max_frames))?,
            )
        };
        let flag = |section: &str, key: &str| {
            value[section][key]
                .as_bool()
                .ok_or_else(|| invalid(key, &value[section][key]))
        };
        let config = PolicyConfig {
            root_closure: Some(root_closure),
            max_frames_per_round,
            log_cell_configs: Some(flag("reporting", "log_cell_configs")?),
            suppress_repeat_reports: Some(flag("reporting", "suppress_repeat_reports")?),
            max_report_bytes: Some(
                value["budgets"]["max_report_bytes"]
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| {
                        invalid("budgets.max_report_bytes", &value["budgets"]["max_report_bytes"])
                    })?,
            ),
        };

        let rebuilt = build_policy(&config)?;
        if rebuilt.bytes != bytes {
            return Err(PolicyBuildError::InvalidConfig {
                detail: "policy snapshot bytes are not canonical".into(),
            });
        }
        Ok(rebuilt)
    }
}

/// Error building or parsing a policy snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyBuildError {
    /// Input is not the expected JSON shape.
    Parse { detail: String },
    /// A value is out of range or unrecognized.
    InvalidConfig { detail: String },
    /// Canonical JSON serialization failed.
    CanonError { detail: String },
}

impl std::fmt::Display for PolicyBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse { detail } => write!(f, "policy parse error: {detail}"),
            Self::InvalidConfig { detail } => write!(f, "invalid policy: {detail}"),
            Self::CanonError { detail } => write!(f, "canonical JSON error: {detail}"),
        }
    }
}

impl std::error::Error for PolicyBuildError {}

/// Error enforcing a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    /// `loop_report.json` exceeds `max_report_bytes`.
    ReportByteBudgetExceeded { max_bytes: usize, actual: usize },
}

impl std::fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReportByteBudgetExceeded { max_bytes, actual } => write!(
                f,
                "loop report is {actual} bytes, over the {max_bytes} byte budget"
            ),
        }
    }
}

impl std::error::Error for PolicyViolation {}

/// Resolve `config` against the defaults.
///
/// # Errors
///
/// Returns [`PolicyBuildError::InvalidConfig`] if the analysis settings do
/// not validate, or [`PolicyBuildError::CanonError`] if serialization fails.
pub fn build_policy(config: &PolicyConfig) -> Result<PolicySnapshotV1, PolicyBuildError> {
    let analysis = AnalysisPolicyV1 {
        root_closure: config
            .root_closure
            .unwrap_or(RootClosurePolicyV1::ExtendThroughRoot),
        max_frames_per_round: config.max_frames_per_round,
    };
    analysis
        .validate()
        .map_err(|e| PolicyBuildError::InvalidConfig {
            detail: e.to_string(),
        })?;
    let log_cell_configs = config.log_cell_configs.unwrap_or(false);
    let suppress_repeat_reports = config.suppress_repeat_reports.unwrap_or(false);
    let max_report_bytes = config.max_report_bytes.unwrap_or(DEFAULT_MAX_REPORT_BYTES);

    let snapshot_value = serde_json::json!({
        "analysis": analysis.to_json_value(),
        "budgets": {
            "max_report_bytes": max_report_bytes,
        },
        "determinism_contract": {
            "integer_margins": true,
            "repository_order": true,
        },
        "reporting": {
            "log_cell_configs": log_cell_configs,
            "suppress_repeat_reports": suppress_repeat_reports,
        },
        "schema_version": POLICY_SCHEMA_VERSION,
    });

    let bytes =
        canonical_json_bytes(&snapshot_value).map_err(|e| PolicyBuildError::CanonError {
            detail: format!("{e:?}"),
        })?;

    Ok(PolicySnapshotV1 {
        bytes,
        analysis,
        log_cell_configs,
        suppress_repeat_reports,
        max_report_bytes,
    })
}

/// Check the serialized loop report against its byte budget.
///
/// # Errors
///
/// Returns [`PolicyViolation::ReportByteBudgetExceeded`] if it is too large.
pub fn enforce_report_bytes(
    report_bytes: &[u8],
    policy: &PolicySnapshotV1,
) -> Result<(), PolicyViolation> {
    if report_bytes.len() > policy.max_report_bytes {
        return Err(PolicyViolation::ReportByteBudgetExceeded {
            max_bytes: policy.max_report_bytes,
            actual: report_bytes.len(),
        });
    }
    Ok(())
}
