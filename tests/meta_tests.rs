//! Meta-tests that verify test suite integrity
//!
//! These tests ensure that:
//! - E2E test files exist and are not empty
//! - No test in the suite is marked ignored

use std::path::Path;

const E2E_FILES: [&str; 3] = ["e2e_stream.rs", "e2e_http_source.rs", "e2e_config.rs"];

/// Verify E2E test files exist and are not empty
#[test]
fn e2e_tests_exist() {
    for file in E2E_FILES {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join(file);

        assert!(
            path.exists(),
            "Missing E2E test file: {}. All E2E tests must be present.",
            file
        );

        let metadata = std::fs::metadata(&path).expect("Failed to get file metadata");
        assert!(
            metadata.len() > 100,
            "E2E test file {} appears to be empty or too small ({} bytes)",
            file,
            metadata.len()
        );
    }
}

/// Ignored tests can hide regressions; scan sources instead of shelling out to cargo
#[test]
fn no_ignored_tests() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let dirs = [
        root.join("tests"),
        root.join("src"),
        root.join("crates/zaino-core/src"),
    ];
    let marker = concat!("#[", "ignore");

    let mut offenders = Vec::new();
    let mut stack = dirs.to_vec();
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                let contents = std::fs::read_to_string(&path).unwrap_or_default();
                if contents.contains(marker) {
                    offenders.push(path.display().to_string());
                }
            }
        }
    }

    assert!(
        offenders.is_empty(),
        "Found ignored tests - all tests must run:\n{}",
        offenders.join("\n")
    );
}
