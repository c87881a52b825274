//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `spm_`
//! - 모듈명: `mapdb_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(spm_core::metrics::MAPDB_WRITER_BUSY_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (added, modified, moved, deleted, rejected 등)
pub const LABEL_RESULT: &str = "result";

/// 분류 종류 레이블 키 (mesh, sawf, scs, mscs, latency)
pub const LABEL_FLAVOR: &str = "flavor";

/// 규칙 타입 레이블 키
pub const LABEL_RULE_TYPE: &str = "rule_type";

// ─── MapDb 메트릭 ─────────────────────────────────────────────────

/// MapDb: 규칙 갱신 요청 수 (counter, label: result)
pub const MAPDB_UPDATES_TOTAL: &str = "spm_mapdb_updates_total";

/// MapDb: writer 경합으로 거절된 갱신 수 (counter)
pub const MAPDB_WRITER_BUSY_TOTAL: &str = "spm_mapdb_writer_busy_total";

/// MapDb: 분류 호출 수 (counter, label: flavor, result)
pub const MAPDB_CLASSIFY_TOTAL: &str = "spm_mapdb_classify_total";

/// MapDb: 현재 적재된 규칙 수 (gauge)
pub const MAPDB_RULES: &str = "spm_mapdb_rules";

/// MapDb: 전체 flush 횟수 (counter)
pub const MAPDB_FLUSHES_TOTAL: &str = "spm_mapdb_flushes_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// recorder 설치 이후 한 번 호출합니다.
/// recorder가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        MAPDB_UPDATES_TOTAL,
        "Total rule update requests processed, by result and rule type"
    );
    describe_counter!(
        MAPDB_WRITER_BUSY_TOTAL,
        "Rule updates rejected because another writer held the table"
    );
    describe_counter!(
        MAPDB_CLASSIFY_TOTAL,
        "Classification lookups, by flavor and match result"
    );
    describe_gauge!(MAPDB_RULES, "Number of live rules in the table");
    describe_counter!(MAPDB_FLUSHES_TOTAL, "Number of full table flushes");
}
