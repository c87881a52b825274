//! 규칙 변경 알림 -- 등록된 관찰자에게 추가/수정/삭제 이벤트 전달
//!
//! 관찰자는 writer 구간 안에서 등록 순서대로 동기 호출됩니다.
//! 관찰자 안에서 다시 `update`를 호출하면 `WriterBusy`가 반환됩니다.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;

use crate::rule::Rule;

/// 규칙 변경 이벤트
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleEvent {
    Add,
    Modify,
    Remove,
}

impl fmt::Display for RuleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Modify => "modify",
            Self::Remove => "remove",
        })
    }
}

/// 규칙 변경 관찰자
///
/// 추가/수정 시에는 새 규칙, 삭제 시에는 삭제된 규칙이 전달됩니다.
pub trait RuleObserver: Send + Sync {
    fn on_rule_event(&self, rule: &Rule, event: RuleEvent);
}

impl<F> RuleObserver for F
where
    F: Fn(&Rule, RuleEvent) + Send + Sync,
{
    fn on_rule_event(&self, rule: &Rule, event: RuleEvent) {
        self(rule, event)
    }
}

/// 관찰자 등록 핸들
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// 등록 순서를 유지하는 관찰자 목록
#[derive(Default)]
pub struct NotifierChain {
    observers: RwLock<Vec<(ObserverId, Arc<dyn RuleObserver>)>>,
    next_id: AtomicU64,
}

impl NotifierChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// 관찰자를 목록 끝에 등록합니다.
    pub fn register(&self, observer: Arc<dyn RuleObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        id
    }

    /// 관찰자를 해제합니다. 등록되어 있지 않았으면 `false`입니다.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// 모든 관찰자에게 이벤트를 전달합니다.
    pub fn notify(&self, rule: &Rule, event: RuleEvent) {
        // 호출 중 등록/해제가 가능하도록 목록을 복사한 뒤 호출
        let observers: Vec<Arc<dyn RuleObserver>> = self
            .observers
            .read()
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        for observer in observers {
            observer.on_rule_event(rule, event);
        }
    }
}

impl fmt::Debug for NotifierChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierChain")
            .field("observers", &self.len())
            .finish()
    }
}
