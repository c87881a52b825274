//! 규칙 덤프 -- 우선순위 내림차순의 지연 순회
//!
//! 버킷 단위 스냅샷을 읽으므로 순회 도중의 갱신은 아직 읽지 않은 버킷에만 반영됩니다.
//! [`RuleDump::cursor`]로 위치를 저장했다가 [`crate::MapDb::dump_from`]으로 이어서 읽을 수 있습니다.

use crate::rule::{PRECEDENCE_BUCKETS, Rule};
use crate::store::{BucketSnapshot, RuleStore};

/// 덤프 재개 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpCursor {
    precedence: u8,
    offset: usize,
    done: bool,
}

impl DumpCursor {
    /// 가장 높은 우선순위 버킷의 처음
    pub fn start() -> Self {
        Self {
            // 버킷 수가 255이므로 마지막 인덱스 254는 u8 범위 안
            precedence: (PRECEDENCE_BUCKETS - 1) as u8,
            offset: 0,
            done: false,
        }
    }

    /// 다음에 읽을 버킷의 우선순위 (끝났으면 `None`)
    pub fn precedence(&self) -> Option<u8> {
        (!self.done).then_some(self.precedence)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl Default for DumpCursor {
    fn default() -> Self {
        Self::start()
    }
}

/// 규칙 덤프 반복자
pub struct RuleDump<'a> {
    store: &'a RuleStore,
    cursor: DumpCursor,
    current: Option<BucketSnapshot>,
}

impl<'a> RuleDump<'a> {
    pub(crate) fn new(store: &'a RuleStore, cursor: DumpCursor) -> Self {
        Self {
            store,
            cursor,
            current: None,
        }
    }

    /// 현재 위치. 이 값으로 순회를 재개하면 아직 반환하지 않은 규칙부터 이어집니다.
    pub fn cursor(&self) -> DumpCursor {
        self.cursor
    }
}

impl Iterator for RuleDump<'_> {
    type Item = Rule;

    fn next(&mut self) -> Option<Rule> {
        loop {
            if self.cursor.done {
                return None;
            }

            let snapshot = self
                .current
                .get_or_insert_with(|| self.store.bucket(self.cursor.precedence));

            if let Some(node) = snapshot.get(self.cursor.offset) {
                self.cursor.offset += 1;
                return Some(node.rule().clone());
            }

            self.current = None;
            if self.cursor.precedence == 0 {
                self.cursor.done = true;
            } else {
                self.cursor.precedence -= 1;
                self.cursor.offset = 0;
            }
        }
    }
}
