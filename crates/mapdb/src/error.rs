//! 규칙 테이블 에러 타입
//!
//! [`UpdateError`]는 갱신 경로의 거절 사유이고, [`MapDbError`]는 규칙 파일 로딩 등
//! 테이블 밖의 실패를 표현합니다. 둘 다 `SpmError`로 변환되어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use spm_core::error::{RuleError, SpmError};

/// 갱신 에러 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 입력을 고쳐서 다시 시도해야 하는 에러
    CallerInput,
    /// 할당 실패 (부분 작업은 롤백됨)
    Resource,
    /// 다른 writer가 진행 중
    Contention,
}

/// 규칙 갱신 거절 사유
///
/// 어떤 에러든 테이블 상태는 바뀌지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    /// 규칙 수가 최대치에 도달
    #[error("rule table is full")]
    TableFull,

    /// 비어 있는 테이블에서 삭제 시도
    #[error("rule table is empty")]
    TableEmpty,

    /// (id, 타입) 규칙이 없음
    #[error("rule not found")]
    RuleNotFound,

    /// 출력 선택자가 유효 범위를 벗어남
    #[error("invalid rule entry")]
    InvalidEntry,

    /// 노드 또는 인덱스 항목 할당 실패
    #[error("allocation failed")]
    AllocationFailed,

    /// 알 수 없는 갱신 명령
    #[error("unknown update command")]
    UnknownCommand,

    /// 다른 writer가 테이블을 갱신 중
    #[error("another writer is updating the rule table")]
    WriterBusy,

    /// 요청이 없음
    #[error("null update request")]
    NullRequest,
}

impl UpdateError {
    /// 에러 분류
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AllocationFailed => ErrorKind::Resource,
            Self::WriterBusy => ErrorKind::Contention,
            Self::TableFull
            | Self::TableEmpty
            | Self::RuleNotFound
            | Self::InvalidEntry
            | Self::UnknownCommand
            | Self::NullRequest => ErrorKind::CallerInput,
        }
    }

    /// 같은 요청을 그대로 재시도해 볼 만한지 여부
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::CallerInput)
    }

    /// 메트릭 레이블 값
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::TableFull => "table_full",
            Self::TableEmpty => "table_empty",
            Self::RuleNotFound => "rule_not_found",
            Self::InvalidEntry => "invalid_entry",
            Self::AllocationFailed => "allocation_failed",
            Self::UnknownCommand => "unknown_command",
            Self::WriterBusy => "writer_busy",
            Self::NullRequest => "null_request",
        }
    }
}

impl From<UpdateError> for SpmError {
    fn from(err: UpdateError) -> Self {
        SpmError::Update(err.to_string())
    }
}

/// 규칙 테이블 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum MapDbError {
    /// 규칙 파일 로딩 실패
    #[error("rule load error: {path}: {reason}")]
    RuleLoad {
        /// 규칙 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 규칙 유효성 검증 실패
    #[error("rule validation error: rule {rule_id}: {reason}")]
    RuleValidation {
        /// 문제가 된 규칙 id
        rule_id: u32,
        /// 검증 실패 사유
        reason: String,
    },

    /// 갱신 거절
    #[error("update error: {0}")]
    Update(#[from] UpdateError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MapDbError> for SpmError {
    fn from(err: MapDbError) -> Self {
        match err {
            MapDbError::RuleLoad { path, reason } => {
                SpmError::Rule(RuleError::ParseFailed { path, reason })
            }
            MapDbError::RuleValidation { rule_id, reason } => {
                SpmError::Rule(RuleError::Validation { rule_id, reason })
            }
            MapDbError::Update(e) => e.into(),
            MapDbError::Io(e) => SpmError::Io(e),
        }
    }
}
