//! 설정 관리 -- spm.toml 파싱 및 런타임 설정
//!
//! [`SpmConfig`]는 로깅과 규칙 테이블 설정을 담는 최상위 구조체입니다.
//!
//! 값은 뒤에 오는 것이 앞의 것을 덮어씁니다:
//! 기본값 → `spm.toml` → `SPM_*` 환경변수 → CLI 플래그(`--log-level`).
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), spm_core::error::SpmError> {
//! use spm_core::config::SpmConfig;
//!
//! let from_disk = SpmConfig::load("spm.toml").await?;
//! let inline = SpmConfig::parse("[mapdb]\nrule_max = 2048")?;
//! assert_eq!(inline.mapdb.rule_max, 2048);
//! # let _ = from_disk;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SpmError};

/// 규칙 테이블 최대 크기 기본값
pub const DEFAULT_RULE_MAX: u32 = 1024;

/// 규칙 테이블 최대 크기 상한
pub const RULE_MAX_LIMIT: u32 = 65_535;

/// spm 통합 설정
///
/// `spm.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpmConfig {
    /// 로깅 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 규칙 테이블 설정
    #[serde(default)]
    pub mapdb: MapDbConfig,
}

impl SpmConfig {
    /// 파일을 읽고 `SPM_*` 환경변수를 덮어쓴 뒤 다시 검증합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SpmError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일 내용만으로 설정을 만듭니다. 환경변수는 보지 않습니다.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SpmError> {
        let path = path.as_ref();
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문서를 파싱합니다. 빠진 섹션과 필드는 기본값으로 채워집니다.
    pub fn parse(document: &str) -> Result<Self, SpmError> {
        let config = toml::from_str(document).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SPM_{SECTION}_{FIELD}`
    /// 예: `SPM_MAPDB_DEFAULT_PCP=3`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SPM_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SPM_GENERAL_LOG_FORMAT");

        // MapDb
        override_parsed(&mut self.mapdb.rule_max, "SPM_MAPDB_RULE_MAX");
        override_parsed(&mut self.mapdb.default_pcp, "SPM_MAPDB_DEFAULT_PCP");
        override_string(&mut self.mapdb.rules_path, "SPM_MAPDB_RULES_PATH");
    }

    /// 설정값을 검사하고 첫 번째 위반 항목을 반환합니다.
    pub fn validate(&self) -> Result<(), SpmError> {
        one_of("general.log_level", &self.general.log_level, &LOG_LEVELS)?;
        one_of("general.log_format", &self.general.log_format, &LOG_FORMATS)?;

        if !(1..=RULE_MAX_LIMIT).contains(&self.mapdb.rule_max) {
            return Err(invalid("mapdb.rule_max", format!("must be between 1 and {RULE_MAX_LIMIT}")));
        }
        // PCP는 3비트 값
        if self.mapdb.default_pcp > 7 {
            return Err(invalid("mapdb.default_pcp", "must be between 0 and 7".to_owned()));
        }
        if self.mapdb.rules_path.trim().is_empty() {
            return Err(invalid("mapdb.rules_path", "rules path must not be empty".to_owned()));
        }
        Ok(())
    }
}

/// 허용되는 로그 레벨
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 허용되는 로그 출력 형식
pub const LOG_FORMATS: [&str; 2] = ["json", "pretty"];

fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), SpmError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("'{value}' is not one of {}", allowed.join("|"))))
    }
}

fn invalid(field: &str, reason: String) -> SpmError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 로깅 설정 (`[general]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// [`LOG_LEVELS`] 중 하나
    pub log_level: String,
    /// [`LOG_FORMATS`] 중 하나
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 규칙 테이블 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapDbConfig {
    /// 동시에 유지할 수 있는 최대 규칙 수
    pub rule_max: u32,
    /// 매칭 실패 또는 비-IP 프레임에 적용할 기본 PCP
    pub default_pcp: u8,
    /// 시작 시 적재할 규칙 파일 경로
    pub rules_path: String,
}

impl Default for MapDbConfig {
    fn default() -> Self {
        Self {
            rule_max: DEFAULT_RULE_MAX,
            default_pcp: 0,
            rules_path: "/etc/spm/rules.toml".to_owned(),
        }
    }
}

// ─── 환경변수 ───

fn override_string(target: &mut String, env_key: &str) {
    if let Some(val) = std::env::var(env_key).ok().filter(|v| !v.is_empty()) {
        *target = val;
    }
}

/// 파싱에 실패한 값은 경고만 남기고 무시합니다.
fn override_parsed<T: FromStr>(target: &mut T, env_key: &str) {
    let Ok(raw) = std::env::var(env_key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(parsed) => *target = parsed,
        Err(_) => warn!(
            env_key,
            value = raw.as_str(),
            expected = std::any::type_name::<T>(),
            "ignoring unparsable environment override"
        ),
    }
}
