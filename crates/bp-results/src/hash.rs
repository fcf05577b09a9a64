//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};

use bp_config::{PackConfig, TestCase};

/// Hash of the pack configuration, excluding the test list.
pub fn compute_config_hash(config: &PackConfig) -> String {
    let shared = PackConfig {
        tests: Vec::new(),
        ..config.clone()
    };
    let mut hasher = Sha256::new();
    let config_json = serde_json::to_string(&shared).unwrap_or_default();
    hasher.update(config_json.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Run ID of one test: pack configuration, the test's own parameters and the
/// solver that produced it. Other tests in the same config do not affect it.
pub fn compute_run_id(config: &PackConfig, test: &TestCase, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    hasher.update(compute_config_hash(config).as_bytes());
    hasher.update(test.name.as_bytes());
    hasher.update(test.current_a.to_le_bytes());
    hasher.update(config.ambient_for(test).to_le_bytes());
    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
