//! 규칙 테이블 엔진 -- 저장소, 관찰자, 설정을 묶는 인스턴스
//!
//! 전역 싱글턴이 아니라 명시적으로 생성/해제하는 인스턴스입니다.
//! 분류(read path)는 [`crate::classifier`], 갱신(write path)은 [`crate::updater`]에서
//! `MapDb`에 메서드를 추가합니다.

use std::sync::Arc;

use spm_core::config::{DEFAULT_RULE_MAX, MapDbConfig};
use tracing::{debug, info};

use crate::dump::{DumpCursor, RuleDump};
use crate::error::UpdateError;
use crate::notify::{NotifierChain, ObserverId, RuleObserver};
use crate::rule::{Rule, RuleKey, RuleType};
use crate::store::{RuleStore, TableStats};

/// 테이블 동작 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    /// 최대 규칙 수
    pub rule_max: u32,
    /// 매칭 실패/비-IP 프레임에 적용할 기본 PCP
    pub default_pcp: u8,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            rule_max: DEFAULT_RULE_MAX,
            default_pcp: 0,
        }
    }
}

impl From<&MapDbConfig> for TableConfig {
    fn from(config: &MapDbConfig) -> Self {
        Self {
            rule_max: config.rule_max,
            default_pcp: config.default_pcp,
        }
    }
}

/// 우선순위 매핑 규칙 테이블
///
/// # 사용 예시
/// ```
/// use spm_mapdb::{MapDb, Rule, RuleRequest, RuleType, TableConfig};
/// use spm_core::types::PacketFields;
///
/// let db = MapDb::new(TableConfig::default());
/// let rule = Rule::builder(1)
///     .rule_type(RuleType::Mesh)
///     .always_true()
///     .output(5)
///     .build();
/// db.apply(&RuleRequest::add(rule)).unwrap();
///
/// assert_eq!(db.classify_mesh(&PacketFields::default()), 5);
/// ```
pub struct MapDb {
    pub(crate) store: RuleStore,
    pub(crate) notifier: NotifierChain,
    pub(crate) config: TableConfig,
}

impl MapDb {
    /// 빈 테이블을 생성합니다.
    pub fn new(config: TableConfig) -> Self {
        debug!(
            rule_max = config.rule_max,
            default_pcp = config.default_pcp,
            "rule table initialized"
        );
        Self {
            store: RuleStore::with_capacity(config.rule_max as usize),
            notifier: NotifierChain::new(),
            config,
        }
    }

    /// `[mapdb]` 설정 섹션으로 테이블을 생성합니다.
    pub fn from_config(config: &MapDbConfig) -> Self {
        Self::new(TableConfig::from(config))
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// 살아 있는 규칙 수
    pub fn count(&self) -> u32 {
        self.store.count()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// (id, 타입)으로 규칙을 조회합니다.
    pub fn query(&self, id: u32, rule_type: RuleType) -> Option<Rule> {
        self.store
            .find(&RuleKey::new(id, rule_type))
            .map(|node| node.rule().clone())
    }

    /// 높은 우선순위부터 모든 규칙을 순회합니다.
    pub fn dump(&self) -> RuleDump<'_> {
        RuleDump::new(&self.store, DumpCursor::start())
    }

    /// 이전 덤프가 멈춘 위치부터 순회를 재개합니다.
    pub fn dump_from(&self, cursor: DumpCursor) -> RuleDump<'_> {
        RuleDump::new(&self.store, cursor)
    }

    /// 타입별 규칙 수와 버킷 점유 현황
    pub fn stats(&self) -> TableStats {
        self.store.stats()
    }

    /// 관찰자를 등록합니다.
    pub fn register_observer(&self, observer: Arc<dyn RuleObserver>) -> ObserverId {
        let id = self.notifier.register(observer);
        debug!(observers = self.notifier.len(), "rule observer registered");
        id
    }

    /// 관찰자를 해제합니다.
    pub fn unregister_observer(&self, id: ObserverId) -> bool {
        self.notifier.unregister(id)
    }

    /// 모든 규칙을 비우고 테이블을 내립니다.
    ///
    /// [`MapDb::flush`]와 같이 writer가 진행 중이면 `WriterBusy`입니다.
    pub fn shutdown(&self) -> Result<u32, UpdateError> {
        let removed = self.flush()?;
        info!(removed, "rule table shut down");
        Ok(removed)
    }
}

impl Drop for MapDb {
    fn drop(&mut self) {
        // 배타적 소유이므로 다른 writer는 있을 수 없음
        if let Some(mut writer) = self.store.try_begin_write() {
            let removed = writer.clear();
            if removed > 0 {
                debug!(removed, "rule table dropped");
            }
        }
    }
}

impl Default for MapDb {
    fn default() -> Self {
        Self::new(TableConfig::default())
    }
}
