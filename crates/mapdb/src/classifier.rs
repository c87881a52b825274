//! 분류 API -- 패킷 필드에 대해 가장 높은 우선순위의 매칭 규칙을 찾아 결정을 반환
//!
//! 모든 스캔은 버킷 254에서 0 방향으로 진행하고 첫 매칭에서 멈춥니다.
//! 분류는 실패하지 않습니다. 빈 테이블이나 매칭 없음은 센티널 값으로 표현됩니다.

use metrics::counter;
use serde::Serialize;
use spm_core::metrics::{LABEL_FLAVOR, LABEL_RESULT, MAPDB_CLASSIFY_TOTAL};
use spm_core::types::PacketFields;

use crate::MapDb;
use crate::matcher::{match_mesh, match_sawf};
use crate::rule::{
    INVALID_DSCP_REMARK, INVALID_MSCS_TID_BITMAP, INVALID_PRIORITY, INVALID_RULE_ID,
    INVALID_SERVICE_CLASS_ID, INVALID_VLAN_PCP_REMARK, OUTPUT_USE_DSCP, Rule, RuleOutput,
    RuleType,
};

/// SAWF 분류 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SawfDecision {
    /// 원시 출력 선택자 (매칭 없음이면 "DSCP 사용")
    pub priority: u8,
    pub dscp_remark: u8,
    pub vlan_pcp_remark: u8,
    pub service_class_id: u8,
    pub rule_id: u32,
}

impl SawfDecision {
    /// 매칭 없음
    pub const NO_MATCH: Self = Self {
        priority: OUTPUT_USE_DSCP,
        dscp_remark: INVALID_DSCP_REMARK,
        vlan_pcp_remark: INVALID_VLAN_PCP_REMARK,
        service_class_id: INVALID_SERVICE_CLASS_ID,
        rule_id: INVALID_RULE_ID,
    };

    fn from_rule(rule: &Rule) -> Self {
        Self {
            priority: rule.output.rule_output,
            dscp_remark: rule.output.dscp_remark,
            vlan_pcp_remark: rule.output.vlan_pcp_remark,
            service_class_id: rule.output.service_class_id,
            rule_id: rule.id,
        }
    }

    pub fn is_match(&self) -> bool {
        self.rule_id != INVALID_RULE_ID
    }
}

impl Default for SawfDecision {
    fn default() -> Self {
        Self::NO_MATCH
    }
}

/// SCS/MSCS 분류 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriorityDecision {
    pub priority: u8,
    pub rule_id: u32,
}

impl PriorityDecision {
    /// 매칭 없음
    pub const NO_MATCH: Self = Self {
        priority: INVALID_PRIORITY,
        rule_id: INVALID_RULE_ID,
    };

    pub fn is_match(&self) -> bool {
        self.rule_id != INVALID_RULE_ID
    }
}

impl Default for PriorityDecision {
    fn default() -> Self {
        Self::NO_MATCH
    }
}

/// 무선 지연 파라미터 (매칭 없음이면 모두 0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencyParams {
    pub service_interval_dl: u8,
    pub burst_size_dl: u32,
    pub service_interval_ul: u8,
    pub burst_size_ul: u32,
}

impl LatencyParams {
    fn from_rule(rule: &Rule) -> Self {
        Self {
            service_interval_dl: rule.output.service_interval_dl,
            burst_size_dl: rule.output.burst_size_dl,
            service_interval_ul: rule.output.service_interval_ul,
            burst_size_ul: rule.output.burst_size_ul,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

fn record(flavor: &'static str, matched: bool) {
    counter!(
        MAPDB_CLASSIFY_TOTAL,
        LABEL_FLAVOR => flavor,
        LABEL_RESULT => if matched { "hit" } else { "miss" }
    )
    .increment(1);
}

impl MapDb {
    /// MESH 규칙으로 우선순위(PCP)를 결정합니다.
    ///
    /// 빈 테이블은 "DSCP 사용"으로 처리합니다. IP 프레임은 DSCP 상위 3비트,
    /// 비-IP 프레임과 매칭 없음은 설정된 기본 PCP가 됩니다.
    pub fn classify_mesh(&self, fields: &PacketFields) -> u8 {
        let matched = self.mesh_lookup(fields);
        record("mesh", matched.is_some());

        let output = match matched {
            Some(output) => output,
            None if self.store.is_empty() => RuleOutput::UseDscp,
            None => RuleOutput::NoMatch,
        };
        self.resolve_output(output, fields)
    }

    /// 매칭된 MESH 규칙의 출력 선택자. 빈 테이블이면 `None`입니다.
    fn mesh_lookup(&self, fields: &PacketFields) -> Option<RuleOutput> {
        self.store.scan(|node| {
            let rule = node.rule();
            (rule.rule_type == RuleType::Mesh && match_mesh(rule, fields))
                .then(|| rule.output_kind())
        })
    }

    fn resolve_output(&self, output: RuleOutput, fields: &PacketFields) -> u8 {
        match output {
            RuleOutput::Priority(priority) => priority,
            RuleOutput::UseLinkPriority => fields.priority,
            RuleOutput::UseDscp if fields.network.is_ip() => fields.dscp >> 3,
            RuleOutput::UseDscp | RuleOutput::NoMatch => self.config.default_pcp,
        }
    }

    /// SAWF 규칙, 그다음 SAWF_SCS 규칙 순서로 매칭합니다.
    pub fn classify_sawf(&self, fields: &PacketFields) -> SawfDecision {
        if self.store.is_empty() {
            record("sawf", false);
            return SawfDecision::NO_MATCH;
        }

        let decision = [RuleType::Sawf, RuleType::SawfScs]
            .into_iter()
            .find_map(|rule_type| {
                self.store.scan(|node| {
                    let rule = node.rule();
                    (rule.rule_type == rule_type && match_sawf(rule, fields))
                        .then(|| SawfDecision::from_rule(rule))
                })
            })
            .unwrap_or(SawfDecision::NO_MATCH);
        record("sawf", decision.is_match());
        decision
    }

    /// SCS 규칙으로 우선순위를 결정합니다.
    pub fn classify_scs(&self, fields: &PacketFields) -> PriorityDecision {
        let decision = self
            .store
            .scan(|node| {
                let rule = node.rule();
                (rule.rule_type == RuleType::Scs && match_sawf(rule, fields)).then(|| {
                    PriorityDecision {
                        priority: rule.output.rule_output,
                        rule_id: rule.id,
                    }
                })
            })
            .unwrap_or(PriorityDecision::NO_MATCH);
        record("scs", decision.is_match());
        decision
    }

    /// 호출자의 현재 우선순위가 MSCS 규칙의 TID 비트맵에 포함되는지 확인합니다.
    ///
    /// 필드가 매칭되어도 비트맵에 우선순위가 없으면 다음 규칙으로 계속 진행합니다.
    /// 허용되면 우선순위는 바뀌지 않고 그대로 돌아옵니다.
    pub fn classify_mscs(&self, fields: &PacketFields) -> PriorityDecision {
        let priority_bit = 1u8.checked_shl(u32::from(fields.priority)).unwrap_or(0);
        let decision = self
            .store
            .scan(|node| {
                let rule = node.rule();
                let bitmap = rule.output.mscs_tid_bitmap;
                (rule.rule_type == RuleType::Mscs
                    && bitmap != INVALID_MSCS_TID_BITMAP
                    && bitmap & priority_bit != 0
                    && match_sawf(rule, fields))
                .then_some(PriorityDecision {
                    priority: fields.priority,
                    rule_id: rule.id,
                })
            })
            .unwrap_or(PriorityDecision::NO_MATCH);
        record("mscs", decision.is_match());
        decision
    }

    /// 모든 타입의 규칙을 일반 매처로 검사해 첫 매칭 규칙의 지연 파라미터를 반환합니다.
    pub fn get_latency_params(&self, fields: &PacketFields) -> LatencyParams {
        let params = self
            .store
            .scan(|node| {
                let rule = node.rule();
                match_mesh(rule, fields).then(|| LatencyParams::from_rule(rule))
            });
        record("latency", params.is_some());
        params.unwrap_or_default()
    }
}
