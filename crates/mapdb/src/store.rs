//! 규칙 저장소 -- 우선순위 버킷 + (id, 타입) 인덱스
//!
//! # 동시성 모델
//! - 각 우선순위 버킷은 `ArcSwap<Vec<NodeRef>>`로 게시되는 불변 스냅샷입니다.
//!   reader는 락 없이 스냅샷을 읽고, writer는 새 벡터를 만든 뒤 원자적으로 교체합니다.
//! - 교체된 노드는 마지막 reader 스냅샷이 해제될 때 `Arc` 참조 카운트로 회수됩니다.
//! - writer 진입은 `try_lock` 한 번으로 결정되며, 실패하면 호출자가 `WriterBusy`를 받습니다.
//! - 인덱스 뮤텍스는 writer 구간 안에서 버킷 교체와 인덱스 수정을 묶는 더 좁은 구간입니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use arc_swap::ArcSwap;
use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use crate::error::UpdateError;
use crate::rule::{PRECEDENCE_BUCKETS, Rule, RuleKey, RuleType};

/// 게시된 규칙 노드에 대한 공유 참조
pub type NodeRef = Arc<RuleNode>;

/// 버킷 스냅샷
pub type BucketSnapshot = Arc<Vec<NodeRef>>;

/// 테이블에 게시된 불변 규칙 노드
#[derive(Debug)]
pub struct RuleNode {
    rule: Rule,
}

impl RuleNode {
    fn new(rule: Rule) -> Self {
        Self { rule }
    }

    /// 노드가 담고 있는 규칙
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn key(&self) -> RuleKey {
        self.rule.key()
    }

    pub fn precedence(&self) -> u8 {
        self.rule.precedence
    }
}

impl Drop for RuleNode {
    fn drop(&mut self) {
        trace!(
            rule_id = self.rule.id,
            rule_type = %self.rule.rule_type,
            "reclaimed rule node"
        );
    }
}

/// 타입별 규칙 수와 버킷 점유 현황
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TableStats {
    /// 전체 규칙 수
    pub rules: u32,
    /// 타입별 규칙 수
    pub per_type: Vec<(RuleType, u32)>,
    /// 규칙이 하나 이상 있는 버킷 수
    pub occupied_buckets: usize,
}

/// 우선순위 버킷과 인덱스를 소유하는 동시성 저장소
pub struct RuleStore {
    /// 우선순위별 버킷 (인덱스 = 우선순위)
    buckets: Box<[ArcSwap<Vec<NodeRef>>]>,
    /// (id, 타입) -> 노드
    index: Mutex<HashMap<RuleKey, NodeRef>>,
    /// 살아 있는 규칙 수
    count: AtomicU32,
    /// 단일 writer 토큰
    writer: Mutex<()>,
    /// 실패 전까지 허용할 예약 횟수 (`u32::MAX` = 제한 없음)
    #[cfg(test)]
    reserve_budget: AtomicU32,
}

impl RuleStore {
    /// 빈 저장소를 생성합니다. 인덱스는 `capacity`만큼 미리 확보합니다.
    pub fn with_capacity(capacity: usize) -> Self {
        let buckets = (0..PRECEDENCE_BUCKETS)
            .map(|_| ArcSwap::from_pointee(Vec::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            buckets,
            index: Mutex::new(HashMap::with_capacity(capacity)),
            count: AtomicU32::new(0),
            writer: Mutex::new(()),
            #[cfg(test)]
            reserve_budget: AtomicU32::new(u32::MAX),
        }
    }

    /// 살아 있는 규칙 수
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// 버킷 스냅샷을 가져옵니다.
    pub fn bucket(&self, precedence: u8) -> BucketSnapshot {
        self.buckets
            .get(usize::from(precedence))
            .map(|b| b.load_full())
            .unwrap_or_default()
    }

    /// 높은 우선순위부터 낮은 우선순위로 노드를 순회하며 첫 `Some` 결과를 반환합니다.
    ///
    /// 버킷 안에서는 먼저 추가된 노드일수록 뒤에 있습니다.
    #[inline]
    pub fn scan<T>(&self, mut f: impl FnMut(&RuleNode) -> Option<T>) -> Option<T> {
        for bucket in self.buckets.iter().rev() {
            let snapshot = bucket.load();
            for node in snapshot.iter() {
                if let Some(found) = f(node) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// 키로 노드를 찾습니다.
    pub fn find(&self, key: &RuleKey) -> Option<NodeRef> {
        self.index.lock().get(key).cloned()
    }

    /// 타입별 통계를 계산합니다.
    pub fn stats(&self) -> TableStats {
        let index = self.index.lock();
        let per_type = RuleType::ALL
            .iter()
            .map(|t| {
                let n = index.keys().filter(|k| k.rule_type == *t).count();
                (*t, u32::try_from(n).unwrap_or(u32::MAX))
            })
            .collect();
        drop(index);

        let occupied_buckets = self
            .buckets
            .iter()
            .filter(|b| !b.load().is_empty())
            .count();

        TableStats {
            rules: self.count(),
            per_type,
            occupied_buckets,
        }
    }

    /// writer 토큰을 한 번 시도합니다. 다른 writer가 있으면 `None`입니다.
    pub fn try_begin_write(&self) -> Option<StoreWriter<'_>> {
        self.writer.try_lock().map(|guard| StoreWriter {
            store: self,
            _guard: guard,
        })
    }

    /// 다음 `allowed`번의 예약 뒤에는 모든 예약을 실패시킵니다.
    #[cfg(test)]
    pub(crate) fn fail_reservations_after(&self, allowed: u32) {
        self.reserve_budget.store(allowed, Ordering::Relaxed);
    }

    /// 모든 메모리 예약이 거치는 지점
    fn admit_reservation(&self) -> Result<(), UpdateError> {
        #[cfg(test)]
        {
            let left = self.reserve_budget.load(Ordering::Relaxed);
            if left == 0 {
                return Err(UpdateError::AllocationFailed);
            }
            if left != u32::MAX {
                self.reserve_budget.store(left - 1, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// `node`를 맨 앞에 둔 새 버킷 벡터
    fn with_head(&self, current: &[NodeRef], node: &NodeRef) -> Result<Vec<NodeRef>, UpdateError> {
        let mut next = self.reserve_vec(current.len() + 1)?;
        next.push(Arc::clone(node));
        next.extend(current.iter().cloned());
        Ok(next)
    }

    /// `node`를 제외한 새 버킷 벡터
    fn without(&self, current: &[NodeRef], node: &NodeRef) -> Result<Vec<NodeRef>, UpdateError> {
        let mut next = self.reserve_vec(current.len().saturating_sub(1))?;
        next.extend(current.iter().filter(|n| !Arc::ptr_eq(n, node)).cloned());
        Ok(next)
    }

    fn reserve_vec(&self, len: usize) -> Result<Vec<NodeRef>, UpdateError> {
        self.admit_reservation()?;
        let mut next = Vec::new();
        next.try_reserve_exact(len)
            .map_err(|_| UpdateError::AllocationFailed)?;
        Ok(next)
    }

    fn reserve_index_slot(&self, index: &mut HashMap<RuleKey, NodeRef>) -> Result<(), UpdateError> {
        self.admit_reservation()?;
        index
            .try_reserve(1)
            .map_err(|_| UpdateError::AllocationFailed)
    }

    fn slot(&self, precedence: u8) -> &ArcSwap<Vec<NodeRef>> {
        // 버킷 배열 크기와 우선순위 정규화가 인덱스 범위를 보장합니다.
        &self.buckets[usize::from(precedence).min(PRECEDENCE_BUCKETS - 1)]
    }
}

/// 단일 writer 구간
///
/// 모든 구조 변경은 이 타입을 통해서만 이루어집니다.
/// 각 연산은 필요한 메모리를 먼저 확보한 뒤 게시하므로, 실패 시 아무것도 보이지 않습니다.
pub struct StoreWriter<'a> {
    store: &'a RuleStore,
    _guard: MutexGuard<'a, ()>,
}

impl StoreWriter<'_> {
    /// 키로 노드를 찾습니다.
    pub fn find(&self, key: &RuleKey) -> Option<NodeRef> {
        self.store.find(key)
    }

    /// 살아 있는 규칙 수
    pub fn count(&self) -> u32 {
        self.store.count()
    }

    /// 새 규칙을 버킷 맨 앞에 게시하고 인덱스에 등록합니다.
    pub fn insert(&mut self, rule: Rule) -> Result<NodeRef, UpdateError> {
        let key = rule.key();
        let slot = self.store.slot(rule.precedence);
        let node = Arc::new(RuleNode::new(rule));

        let mut index = self.store.index.lock();
        self.store.reserve_index_slot(&mut index)?;
        let next = self.store.with_head(&slot.load(), &node)?;

        slot.store(Arc::new(next));
        index.insert(key, Arc::clone(&node));
        self.store.count.fetch_add(1, Ordering::AcqRel);
        Ok(node)
    }

    /// 같은 버킷 안에서 기존 노드를 새 규칙으로 교체합니다.
    ///
    /// 기존 노드는 reader 스냅샷이 모두 해제될 때 회수됩니다.
    pub fn replace(&mut self, old: &NodeRef, rule: Rule) -> Result<NodeRef, UpdateError> {
        let key = rule.key();
        let slot = self.store.slot(old.precedence());
        let node = Arc::new(RuleNode::new(rule));

        let mut index = self.store.index.lock();
        let current = slot.load();
        let mut next = self.store.reserve_vec(current.len())?;
        next.extend(current.iter().map(|n| {
            if Arc::ptr_eq(n, old) {
                Arc::clone(&node)
            } else {
                Arc::clone(n)
            }
        }));

        slot.store(Arc::new(next));
        index.insert(key, Arc::clone(&node));
        Ok(node)
    }

    /// 기존 노드를 원래 버킷에서 떼어내고 새 규칙을 다른 버킷 맨 앞에 게시합니다.
    pub fn relocate(&mut self, old: &NodeRef, rule: Rule) -> Result<NodeRef, UpdateError> {
        let key = rule.key();
        let from = self.store.slot(old.precedence());
        let to = self.store.slot(rule.precedence);
        let node = Arc::new(RuleNode::new(rule));

        let mut index = self.store.index.lock();
        let detached = self.store.without(&from.load(), old)?;
        let attached = self.store.with_head(&to.load(), &node)?;

        from.store(Arc::new(detached));
        to.store(Arc::new(attached));
        index.insert(key, Arc::clone(&node));
        Ok(node)
    }

    /// 규칙을 버킷과 인덱스에서 제거하고 제거된 노드를 반환합니다.
    pub fn remove(&mut self, key: &RuleKey) -> Result<NodeRef, UpdateError> {
        let mut index = self.store.index.lock();
        let node = index.get(key).cloned().ok_or(UpdateError::RuleNotFound)?;
        let slot = self.store.slot(node.precedence());
        let detached = self.store.without(&slot.load(), &node)?;

        slot.store(Arc::new(detached));
        index.remove(key);
        self.store.count.fetch_sub(1, Ordering::AcqRel);
        Ok(node)
    }

    /// 모든 버킷과 인덱스를 비우고 제거된 규칙 수를 반환합니다.
    pub fn clear(&mut self) -> u32 {
        let mut index = self.store.index.lock();
        for bucket in self.store.buckets.iter() {
            bucket.store(Arc::new(Vec::new()));
        }
        index.clear();
        self.store.count.swap(0, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleType;

    fn rule(id: u32, precedence: u8) -> Rule {
        Rule::builder(id)
            .rule_type(RuleType::Sawf)
            .precedence(precedence)
            .build()
    }

    fn ids(snapshot: &BucketSnapshot) -> Vec<u32> {
        snapshot.iter().map(|n| n.rule().id).collect()
    }

    #[test]
    fn insert_places_node_at_bucket_head() {
        let store = RuleStore::with_capacity(8);
        let mut w = store.try_begin_write().unwrap();
        w.insert(rule(1, 5)).unwrap();
        w.insert(rule(2, 5)).unwrap();
        drop(w);

        assert_eq!(ids(&store.bucket(5)), vec![2, 1]);
        assert_eq!(store.count(), 2);
        assert!(store.find(&RuleKey::new(1, RuleType::Sawf)).is_some());
    }

    #[test]
    fn second_writer_is_refused() {
        let store = RuleStore::with_capacity(8);
        let _w = store.try_begin_write().unwrap();
        assert!(store.try_begin_write().is_none());
    }

    #[test]
    fn writer_token_is_released_on_drop() {
        let store = RuleStore::with_capacity(8);
        drop(store.try_begin_write().unwrap());
        assert!(store.try_begin_write().is_some());
    }

    #[test]
    fn replace_keeps_position_in_bucket() {
        let store = RuleStore::with_capacity(8);
        let mut w = store.try_begin_write().unwrap();
        let old = w.insert(rule(1, 3)).unwrap();
        w.insert(rule(2, 3)).unwrap();
        let new = w.replace(&old, Rule::builder(1).precedence(3).output(6).build()).unwrap();
        drop(w);

        assert_eq!(ids(&store.bucket(3)), vec![2, 1]);
        let found = store.find(&RuleKey::new(1, RuleType::Sawf)).unwrap();
        assert!(Arc::ptr_eq(&found, &new));
        assert_eq!(found.rule().output.rule_output, 6);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn relocate_moves_between_buckets() {
        let store = RuleStore::with_capacity(8);
        let mut w = store.try_begin_write().unwrap();
        let old = w.insert(rule(1, 7)).unwrap();
        w.relocate(&old, rule(1, 2)).unwrap();
        drop(w);

        assert!(store.bucket(7).is_empty());
        assert_eq!(ids(&store.bucket(2)), vec![1]);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn reader_snapshot_survives_removal() {
        let store = RuleStore::with_capacity(8);
        store.try_begin_write().unwrap().insert(rule(1, 7)).unwrap();

        let snapshot = store.bucket(7);
        store
            .try_begin_write()
            .unwrap()
            .remove(&RuleKey::new(1, RuleType::Sawf))
            .unwrap();

        // 기존 스냅샷은 여전히 유효한 노드를 가리킴
        assert_eq!(ids(&snapshot), vec![1]);
        assert!(store.bucket(7).is_empty());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn remove_missing_key_is_not_found() {
        let store = RuleStore::with_capacity(8);
        let mut w = store.try_begin_write().unwrap();
        w.insert(rule(1, 1)).unwrap();
        let err = w.remove(&RuleKey::new(1, RuleType::Mesh)).unwrap_err();
        assert_eq!(err, UpdateError::RuleNotFound);
        assert_eq!(w.count(), 1);
    }

    #[test]
    fn scan_visits_highest_precedence_first() {
        let store = RuleStore::with_capacity(8);
        let mut w = store.try_begin_write().unwrap();
        w.insert(rule(1, 0)).unwrap();
        w.insert(rule(2, 254)).unwrap();
        w.insert(rule(3, 100)).unwrap();
        drop(w);

        let mut seen = Vec::new();
        let none: Option<()> = store.scan(|n| {
            seen.push(n.rule().id);
            None
        });
        assert!(none.is_none());
        assert_eq!(seen, vec![2, 3, 1]);
    }

    #[test]
    fn clear_empties_everything() {
        let store = RuleStore::with_capacity(8);
        let mut w = store.try_begin_write().unwrap();
        for id in 0..5 {
            w.insert(rule(id, id as u8)).unwrap();
        }
        assert_eq!(w.clear(), 5);
        drop(w);

        assert_eq!(store.count(), 0);
        assert_eq!(store.stats().occupied_buckets, 0);
        assert!(store.find(&RuleKey::new(0, RuleType::Sawf)).is_none());
    }

    #[test]
    fn failed_insert_reservation_publishes_nothing() {
        // 0: 인덱스 예약 실패, 1: 버킷 예약 실패
        for allowed in [0, 1] {
            let store = RuleStore::with_capacity(8);
            let mut w = store.try_begin_write().unwrap();
            w.insert(rule(1, 5)).unwrap();

            store.fail_reservations_after(allowed);
            assert_eq!(w.insert(rule(2, 5)).unwrap_err(), UpdateError::AllocationFailed);
            drop(w);

            assert_eq!(store.count(), 1, "allowed={allowed}");
            assert_eq!(ids(&store.bucket(5)), vec![1]);
            assert!(store.find(&RuleKey::new(2, RuleType::Sawf)).is_none());
        }
    }

    #[test]
    fn failed_relocate_reservation_keeps_both_buckets() {
        let store = RuleStore::with_capacity(8);
        let mut w = store.try_begin_write().unwrap();
        let old = w.insert(rule(1, 7)).unwrap();
        w.insert(rule(2, 2)).unwrap();

        // 원래 버킷 벡터는 확보되고 대상 버킷 벡터에서 실패
        store.fail_reservations_after(1);
        assert_eq!(
            w.relocate(&old, rule(1, 2)).unwrap_err(),
            UpdateError::AllocationFailed
        );
        drop(w);

        assert_eq!(ids(&store.bucket(7)), vec![1]);
        assert_eq!(ids(&store.bucket(2)), vec![2]);
        assert_eq!(store.count(), 2);
        let found = store.find(&RuleKey::new(1, RuleType::Sawf)).unwrap();
        assert!(Arc::ptr_eq(&found, &old));
    }

    #[test]
    fn failed_replace_reservation_keeps_old_node() {
        let store = RuleStore::with_capacity(8);
        let mut w = store.try_begin_write().unwrap();
        let old = w.insert(rule(1, 3)).unwrap();

        store.fail_reservations_after(0);
        let err = w
            .replace(&old, Rule::builder(1).precedence(3).output(6).build())
            .unwrap_err();
        assert_eq!(err, UpdateError::AllocationFailed);
        drop(w);

        let found = store.find(&RuleKey::new(1, RuleType::Sawf)).unwrap();
        assert!(Arc::ptr_eq(&found, &old));
        assert!(Arc::ptr_eq(&store.bucket(3)[0], &old));
    }

    #[test]
    fn stats_counts_per_type() {
        let store = RuleStore::with_capacity(8);
        let mut w = store.try_begin_write().unwrap();
        w.insert(rule(1, 1)).unwrap();
        w.insert(Rule::builder(1).rule_type(RuleType::Mesh).precedence(1).build())
            .unwrap();
        w.insert(Rule::builder(2).rule_type(RuleType::Mesh).precedence(9).build())
            .unwrap();
        drop(w);

        let stats = store.stats();
        assert_eq!(stats.rules, 3);
        assert_eq!(stats.occupied_buckets, 2);
        assert!(stats.per_type.contains(&(RuleType::Mesh, 2)));
        assert!(stats.per_type.contains(&(RuleType::Sawf, 1)));
    }
}
