//! spm.toml 통합 설정 테스트
//!
//! - spm.toml.example 파싱 테스트
//! - 파일 로딩 및 환경변수 우선순위 테스트
//! - 잘못된 형식 에러 테스트

use std::io::Write;

use spm_core::config::SpmConfig;
use spm_core::error::{ConfigError, SpmError};

// =============================================================================
// spm.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../spm.toml.example");
    let config = SpmConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.mapdb.rule_max, 1024);
    assert_eq!(config.mapdb.default_pcp, 0);
    assert_eq!(config.mapdb.rules_path, "/etc/spm/rules.toml");
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../spm.toml.example");
    let config = SpmConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

// =============================================================================
// 파일 로딩
// =============================================================================

#[tokio::test]
async fn from_file_reads_written_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[mapdb]\nrule_max = 16\ndefault_pcp = 4").unwrap();

    let config = SpmConfig::from_file(file.path()).await.unwrap();
    assert_eq!(config.mapdb.rule_max, 16);
    assert_eq!(config.mapdb.default_pcp, 4);
}

#[tokio::test]
async fn from_file_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[mapdb]\ndefault_pcp = 9").unwrap();

    let err = SpmConfig::from_file(file.path()).await.unwrap_err();
    assert!(matches!(
        err,
        SpmError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[tokio::test]
#[serial_test::serial]
async fn load_applies_env_overrides_over_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[mapdb]\nrule_max = 16").unwrap();

    // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
    unsafe { std::env::set_var("SPM_MAPDB_RULE_MAX", "32") };
    let config = SpmConfig::load(file.path()).await;
    unsafe { std::env::remove_var("SPM_MAPDB_RULE_MAX") };

    assert_eq!(config.unwrap().mapdb.rule_max, 32);
}

#[tokio::test]
#[serial_test::serial]
async fn load_validates_after_env_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[general]\nlog_level = \"info\"").unwrap();

    // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
    unsafe { std::env::set_var("SPM_GENERAL_LOG_FORMAT", "xml") };
    let result = SpmConfig::load(file.path()).await;
    unsafe { std::env::remove_var("SPM_GENERAL_LOG_FORMAT") };

    let err = result.unwrap_err();
    assert!(err.to_string().contains("log_format"));
}

// =============================================================================
// 에러 케이스
// =============================================================================

#[test]
fn unknown_section_is_ignored() {
    let config = SpmConfig::parse("[daemon]\npid = 1\n").expect("should parse");
    assert_eq!(config.mapdb.rule_max, 1024);
}

#[test]
fn wrong_type_is_parse_error() {
    let err = SpmConfig::parse("[mapdb]\nrule_max = \"many\"\n").unwrap_err();
    assert!(matches!(
        err,
        SpmError::Config(ConfigError::ParseFailed { .. })
    ));
}
