//! sbomkit.toml 통합 설정 테스트
//!
//! - sbomkit.toml.example 파싱 테스트
//! - 환경변수 우선순위 테스트
//! - 잘못된 형식 에러 테스트

use sbomkit_core::config::SbomkitConfig;
use sbomkit_core::error::{ConfigError, SbomkitError};

// =============================================================================
// sbomkit.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../sbomkit.toml.example");
    let config = SbomkitConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.files.base_path, "/var/lib/sbomkit/drop");
    assert_eq!(config.files.algorithms, vec!["sha1", "sha256"]);
    assert_eq!(config.files.exclude, vec!["**/.git"]);
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../sbomkit.toml.example");
    let config = SbomkitConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn unknown_fields_in_section_are_ignored() {
    let toml = r#"
[files]
base_path = "/drop"
some_future_option = true
"#;
    let config = SbomkitConfig::parse(toml).expect("should parse");
    assert_eq!(config.files.base_path, "/drop");
}

#[test]
fn wrong_type_is_parse_error() {
    let toml = r#"
[files]
worker_count = "many"
"#;
    let err = SbomkitConfig::parse(toml).unwrap_err();
    assert!(matches!(
        err,
        SbomkitError::Config(ConfigError::ParseFailed { .. })
    ));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[files]
worker_count = 2
"#;

    let original = std::env::var("SBOMKIT_FILES_WORKER_COUNT").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SBOMKIT_FILES_WORKER_COUNT", "12");
    }

    let mut config = SbomkitConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.files.worker_count;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SBOMKIT_FILES_WORKER_COUNT", val),
            None => std::env::remove_var("SBOMKIT_FILES_WORKER_COUNT"),
        }
    }

    assert_eq!(result, 12);
}

#[test]
#[serial_test::serial]
fn env_override_csv_splits_and_trims() {
    let original = std::env::var("SBOMKIT_FILES_ALGORITHMS").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SBOMKIT_FILES_ALGORITHMS", "sha256, md5 ,,blake3");
    }

    let mut config = SbomkitConfig::default();
    config.apply_env_overrides();
    let result = config.files.algorithms.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SBOMKIT_FILES_ALGORITHMS", val),
            None => std::env::remove_var("SBOMKIT_FILES_ALGORITHMS"),
        }
    }

    assert_eq!(result, vec!["sha256", "md5", "blake3"]);
}

#[test]
#[serial_test::serial]
fn env_override_with_unparsable_value_is_ignored() {
    let original = std::env::var("SBOMKIT_FILES_FOLLOW_LINKS").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SBOMKIT_FILES_FOLLOW_LINKS", "sometimes");
    }

    let mut config = SbomkitConfig::default();
    config.apply_env_overrides();
    let result = config.files.follow_links;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SBOMKIT_FILES_FOLLOW_LINKS", val),
            None => std::env::remove_var("SBOMKIT_FILES_FOLLOW_LINKS"),
        }
    }

    // 기본값 유지
    assert!(result);
}

#[tokio::test]
#[serial_test::serial]
async fn load_applies_env_then_validates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sbomkit.toml");
    std::fs::write(&path, "[general]\nlog_level = \"debug\"\n").unwrap();

    let original = std::env::var("SBOMKIT_FILES_DUPLICATE_POLICY").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SBOMKIT_FILES_DUPLICATE_POLICY", "whatever");
    }

    let result = SbomkitConfig::load(&path).await;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SBOMKIT_FILES_DUPLICATE_POLICY", val),
            None => std::env::remove_var("SBOMKIT_FILES_DUPLICATE_POLICY"),
        }
    }

    let err = result.unwrap_err();
    assert!(err.to_string().contains("duplicate_policy"));
}
