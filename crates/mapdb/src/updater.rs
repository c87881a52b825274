//! 갱신 경로 -- 단일 writer 토큰 아래에서 추가/수정/삭제/flush 상태 머신 실행
//!
//! 모든 갱신은 writer 토큰을 한 번만 시도합니다. 다른 writer가 있으면
//! 대기하지 않고 즉시 [`UpdateError::WriterBusy`]를 반환합니다.
//! 관찰자는 게시가 끝난 뒤 writer 구간 안에서 호출됩니다.

use metrics::{counter, gauge};
use serde::Serialize;
use spm_core::metrics::{
    LABEL_RESULT, LABEL_RULE_TYPE, MAPDB_FLUSHES_TOTAL, MAPDB_RULES, MAPDB_UPDATES_TOTAL,
    MAPDB_WRITER_BUSY_TOTAL,
};
use tracing::{debug, info, warn};

use crate::MapDb;
use crate::error::UpdateError;
use crate::notify::RuleEvent;
use crate::rule::{MAX_PRECEDENCE, OUTPUT_NO_MATCH, Rule, RuleCommand, RuleKey, RuleRequest};
use crate::store::StoreWriter;

/// 성공한 갱신의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// 새 규칙 추가
    AddedNew,
    /// 같은 우선순위에서 교체
    ModifiedSamePrecedence {
        /// 우선순위 외 내용이 바뀌었는지 (진단용)
        fields_changed: bool,
    },
    /// 다른 우선순위 버킷으로 이동
    ModifiedMoved {
        old_precedence: u8,
        fields_changed: bool,
    },
    /// 삭제
    Deleted,
}

impl UpdateOutcome {
    /// 메트릭 레이블 값
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::AddedNew => "added",
            Self::ModifiedSamePrecedence { .. } => "modified",
            Self::ModifiedMoved { .. } => "moved",
            Self::Deleted => "deleted",
        }
    }
}

impl MapDb {
    /// 규칙 갱신 요청을 처리합니다.
    ///
    /// 요청이 없으면 `NullRequest`, 다른 writer가 진행 중이면 `WriterBusy`입니다.
    /// 에러가 반환되면 테이블은 변경되지 않습니다.
    pub fn update(&self, request: Option<&RuleRequest>) -> Result<UpdateOutcome, UpdateError> {
        let result = self.update_inner(request);
        let rule_type = request.map_or("none", |r| r.rule.rule_type.as_str());
        match &result {
            Ok(outcome) => {
                counter!(MAPDB_UPDATES_TOTAL, LABEL_RESULT => outcome.as_label(), LABEL_RULE_TYPE => rule_type)
                    .increment(1);
            }
            Err(err) => {
                if *err == UpdateError::WriterBusy {
                    counter!(MAPDB_WRITER_BUSY_TOTAL).increment(1);
                }
                counter!(MAPDB_UPDATES_TOTAL, LABEL_RESULT => err.as_label(), LABEL_RULE_TYPE => rule_type)
                    .increment(1);
                debug!(error = %err, "rule update rejected");
            }
        }
        gauge!(MAPDB_RULES).set(f64::from(self.store.count()));
        result
    }

    /// `update(Some(request))`의 축약형
    pub fn apply(&self, request: &RuleRequest) -> Result<UpdateOutcome, UpdateError> {
        self.update(Some(request))
    }

    fn update_inner(&self, request: Option<&RuleRequest>) -> Result<UpdateOutcome, UpdateError> {
        let request = request.ok_or(UpdateError::NullRequest)?;
        let mut writer = self
            .store
            .try_begin_write()
            .ok_or(UpdateError::WriterBusy)?;

        match request.command {
            RuleCommand::Add => self.add_or_modify(&mut writer, &request.rule),
            RuleCommand::Delete => self.delete(&mut writer, request.rule.key()),
            RuleCommand::Unknown(code) => {
                warn!(code, "unknown rule update command");
                Err(UpdateError::UnknownCommand)
            }
        }
    }

    fn add_or_modify(
        &self,
        writer: &mut StoreWriter<'_>,
        rule: &Rule,
    ) -> Result<UpdateOutcome, UpdateError> {
        // 수정 요청도 테이블이 가득 차 있으면 거절됩니다.
        if writer.count() >= self.config.rule_max {
            return Err(UpdateError::TableFull);
        }
        if rule.output.rule_output >= OUTPUT_NO_MATCH {
            return Err(UpdateError::InvalidEntry);
        }

        let mut rule = rule.clone();
        if rule.precedence == MAX_PRECEDENCE {
            warn!(
                rule_id = rule.id,
                rule_type = %rule.rule_type,
                "precedence {MAX_PRECEDENCE} remapped to 0"
            );
            rule.precedence = 0;
        }

        let Some(old) = writer.find(&rule.key()) else {
            let node = writer.insert(rule)?;
            info!(rule = %node.rule().summary(), "rule added");
            self.notifier.notify(node.rule(), RuleEvent::Add);
            return Ok(UpdateOutcome::AddedNew);
        };

        let fields_changed = old.rule().differs_in_payload(&rule);
        let old_precedence = old.precedence();
        let (node, outcome) = if old_precedence == rule.precedence {
            let node = writer.replace(&old, rule)?;
            (node, UpdateOutcome::ModifiedSamePrecedence { fields_changed })
        } else {
            let node = writer.relocate(&old, rule)?;
            (
                node,
                UpdateOutcome::ModifiedMoved {
                    old_precedence,
                    fields_changed,
                },
            )
        };
        drop(old);

        info!(
            rule = %node.rule().summary(),
            old_precedence,
            fields_changed,
            "rule modified"
        );
        self.notifier.notify(node.rule(), RuleEvent::Modify);
        Ok(outcome)
    }

    fn delete(
        &self,
        writer: &mut StoreWriter<'_>,
        key: RuleKey,
    ) -> Result<UpdateOutcome, UpdateError> {
        if writer.count() == 0 {
            return Err(UpdateError::TableEmpty);
        }
        let node = writer.remove(&key)?;
        info!(rule = %node.rule().summary(), "rule deleted");
        self.notifier.notify(node.rule(), RuleEvent::Remove);
        Ok(UpdateOutcome::Deleted)
    }

    /// 모든 규칙을 제거하고 제거된 규칙 수를 반환합니다.
    ///
    /// 다른 갱신과 같이 writer 토큰을 한 번만 시도하므로, 진행 중인 writer가 있거나
    /// 관찰자 안에서 호출되면 `WriterBusy`입니다. 관찰자에게는 알리지 않습니다.
    pub fn flush(&self) -> Result<u32, UpdateError> {
        let Some(mut writer) = self.store.try_begin_write() else {
            counter!(MAPDB_WRITER_BUSY_TOTAL).increment(1);
            debug!("flush rejected, writer busy");
            return Err(UpdateError::WriterBusy);
        };
        let removed = writer.clear();
        drop(writer);

        counter!(MAPDB_FLUSHES_TOTAL).increment(1);
        gauge!(MAPDB_RULES).set(0.0);
        if removed > 0 {
            info!(removed, "rule table flushed");
        }
        Ok(removed)
    }

    /// 요청 묶음을 순서대로 적용하고 요청별 결과를 돌려줍니다.
    ///
    /// 한 요청의 실패가 나머지 요청을 막지 않습니다.
    pub fn load_requests(
        &self,
        requests: &[RuleRequest],
    ) -> Vec<(RuleKey, Result<UpdateOutcome, UpdateError>)> {
        let results: Vec<_> = requests
            .iter()
            .map(|request| (request.rule.key(), self.apply(request)))
            .collect();

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        info!(
            total = results.len(),
            failed,
            rules = self.store.count(),
            "rule batch applied"
        );
        results
    }
}
