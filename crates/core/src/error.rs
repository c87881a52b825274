//! 에러 타입 -- 도메인별 에러 정의

/// spm 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SpmError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 규칙 파일/규칙 정의 에러
    #[error("rule error: {0}")]
    Rule(#[from] RuleError),

    /// 규칙 테이블 갱신 에러
    #[error("update rejected: {0}")]
    Update(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 규칙 정의 에러
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// 규칙 파일 파싱 실패
    #[error("failed to parse rule file '{path}': {reason}")]
    ParseFailed { path: String, reason: String },

    /// 규칙 필드 검증 실패
    #[error("invalid rule {rule_id}: {reason}")]
    Validation { rule_id: u32, reason: String },

    /// 입력 데이터 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },
}
