#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`rule`]: 규칙 레코드, 출력 선택자, 빌더, 갱신 요청
//! - [`flags`]: MESH / SAWF 매치 플래그 비트
//! - [`store`]: 우선순위 버킷 + (id, 타입) 인덱스 동시성 저장소
//! - [`matcher`]: 규칙 종류별 필드 매칭
//! - [`classifier`]: 분류 API (MESH, SAWF, SCS, MSCS, 지연 파라미터)
//! - [`updater`]: 추가/수정/삭제/flush 상태 머신
//! - [`notify`]: 규칙 변경 관찰자
//! - [`dump`]: 재개 가능한 규칙 덤프
//! - [`loader`]: TOML 규칙 파일 로더
//! - [`engine`]: 위 구성 요소를 묶는 [`MapDb`] 인스턴스
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! admin -> RuleLoader -> MapDb::update --(writer token)--> RuleStore --> observers
//!                                                             |
//! data path -> MapDb::classify_* --(lock-free scan 254..0)----+--> Matcher
//! ```

pub mod classifier;
pub mod dump;
pub mod engine;
pub mod error;
pub mod flags;
pub mod loader;
pub mod matcher;
pub mod notify;
pub mod rule;
pub mod store;
pub mod updater;

// --- 주요 타입 re-export ---

// 엔진
pub use engine::{MapDb, TableConfig};

// 규칙
pub use rule::{Rule, RuleBuilder, RuleCommand, RuleKey, RuleOutput, RuleRequest, RuleType};

// 갱신
pub use updater::UpdateOutcome;

// 분류 결과
pub use classifier::{LatencyParams, PriorityDecision, SawfDecision};

// 알림
pub use notify::{ObserverId, RuleEvent, RuleObserver};

// 덤프
pub use dump::{DumpCursor, RuleDump};

// 저장소 통계
pub use store::TableStats;

// 로더
pub use loader::RuleLoader;

// 에러
pub use error::{ErrorKind, MapDbError, UpdateError};
