//! 규칙 레코드 -- 다섯 가지 규칙 타입이 공유하는 값 타입
//!
//! 규칙은 (id, 타입) 쌍으로 식별됩니다. 같은 id라도 타입이 다르면 별개의 규칙입니다.
//! 매치 필드는 [`MatchFields`], 출력 필드는 [`OutputFields`]에 담기며
//! 어떤 필드가 활성인지는 `mesh_flags`/`sawf_flags` 비트가 결정합니다.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use spm_core::types::MacAddr;

use crate::flags::{mesh, sawf};

/// 우선순위 버킷 수이자 "최대 우선순위" 센티널 값
///
/// 유효한 우선순위는 `0..MAX_PRECEDENCE`이며, 이 값으로 들어온 규칙은 버킷 0에 배치됩니다.
pub const MAX_PRECEDENCE: u8 = 255;

/// 우선순위 버킷 수
pub const PRECEDENCE_BUCKETS: usize = MAX_PRECEDENCE as usize;

/// 출력 선택자: 링크 계층 우선순위 사용
pub const OUTPUT_USE_LINK_PRIORITY: u8 = 8;
/// 출력 선택자: DSCP에서 우선순위 유도
pub const OUTPUT_USE_DSCP: u8 = 9;
/// 출력 선택자: 매칭 없음 (규칙으로는 추가할 수 없음)
pub const OUTPUT_NO_MATCH: u8 = 10;

/// 유효하지 않은 우선순위
pub const INVALID_PRIORITY: u8 = 0xFF;
/// 유효하지 않은 규칙 id
pub const INVALID_RULE_ID: u32 = u32::MAX;
/// 유효하지 않은 DSCP remark
pub const INVALID_DSCP_REMARK: u8 = 0xFF;
/// 유효하지 않은 VLAN PCP remark
pub const INVALID_VLAN_PCP_REMARK: u8 = 0xFF;
/// 유효하지 않은 서비스 클래스 id
pub const INVALID_SERVICE_CLASS_ID: u8 = 0xFF;
/// 유효하지 않은 MSCS TID 비트맵
pub const INVALID_MSCS_TID_BITMAP: u8 = 0;

/// 규칙 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// 일반 메시 규칙 (sense 비트 지원)
    Mesh,
    /// SAWF 규칙
    Sawf,
    /// 로컬 인터페이스를 목적지로 할 수 있는 SAWF 규칙
    SawfScs,
    /// SCS 규칙
    Scs,
    /// MSCS 규칙
    Mscs,
}

impl RuleType {
    /// 모든 규칙 타입
    pub const ALL: [RuleType; 5] = [
        RuleType::Mesh,
        RuleType::Sawf,
        RuleType::SawfScs,
        RuleType::Scs,
        RuleType::Mscs,
    ];

    /// 설정 파일/로그에서 사용하는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::Sawf => "sawf",
            Self::SawfScs => "sawf_scs",
            Self::Scs => "scs",
            Self::Mscs => "mscs",
        }
    }

    /// SAWF 계열 매처를 사용하는 타입인지 여부
    pub fn is_sawf_family(&self) -> bool {
        !matches!(self, Self::Mesh)
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "mesh" => Ok(Self::Mesh),
            "sawf" => Ok(Self::Sawf),
            "sawf_scs" => Ok(Self::SawfScs),
            "scs" => Ok(Self::Scs),
            "mscs" => Ok(Self::Mscs),
            other => Err(format!("unknown rule type: {other}")),
        }
    }
}

/// 규칙의 고유 키
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RuleKey {
    pub id: u32,
    pub rule_type: RuleType,
}

impl RuleKey {
    pub fn new(id: u32, rule_type: RuleType) -> Self {
        Self { id, rule_type }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.rule_type, self.id)
    }
}

/// 해석된 출력 선택자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutput {
    /// 명시적 우선순위 (0-7)
    Priority(u8),
    /// 프레임의 링크 계층 우선순위를 그대로 사용
    UseLinkPriority,
    /// DSCP 상위 3비트를 우선순위로 사용
    UseDscp,
    /// 매칭 없음
    NoMatch,
}

impl RuleOutput {
    /// 원시 출력 값을 해석합니다.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0..=7 => Self::Priority(raw),
            OUTPUT_USE_LINK_PRIORITY => Self::UseLinkPriority,
            OUTPUT_USE_DSCP => Self::UseDscp,
            _ => Self::NoMatch,
        }
    }

    /// 원시 출력 값
    pub fn raw(self) -> u8 {
        match self {
            Self::Priority(p) => p,
            Self::UseLinkPriority => OUTPUT_USE_LINK_PRIORITY,
            Self::UseDscp => OUTPUT_USE_DSCP,
            Self::NoMatch => OUTPUT_NO_MATCH,
        }
    }
}

/// 매치 필드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchFields {
    pub src_mac: MacAddr,
    pub dst_mac: MacAddr,
    pub src_ipv4: Ipv4Addr,
    pub src_ipv4_mask: Ipv4Addr,
    pub dst_ipv4: Ipv4Addr,
    pub dst_ipv4_mask: Ipv4Addr,
    pub src_ipv6: Ipv6Addr,
    pub src_ipv6_mask: Ipv6Addr,
    pub dst_ipv6: Ipv6Addr,
    pub dst_ipv6_mask: Ipv6Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub src_port_range_start: u16,
    pub src_port_range_end: u16,
    pub dst_port_range_start: u16,
    pub dst_port_range_end: u16,
    pub vlan_id: u16,
    pub vlan_pcp: u8,
    pub dscp: u8,
    pub protocol: u8,
    /// 링크 계층 사용자 우선순위 (MESH)
    pub user_priority: u8,
    /// SPI 패턴 값
    pub spi_value: u32,
    /// SPI 패턴 마스크
    pub spi_mask: u32,
    /// SAWF_SCS 로컬 인터페이스 인덱스
    pub ifindex: u32,
    pub ip_version_type: u8,
}

impl Default for MatchFields {
    fn default() -> Self {
        Self {
            src_mac: MacAddr::ZERO,
            dst_mac: MacAddr::ZERO,
            src_ipv4: Ipv4Addr::UNSPECIFIED,
            src_ipv4_mask: Ipv4Addr::UNSPECIFIED,
            dst_ipv4: Ipv4Addr::UNSPECIFIED,
            dst_ipv4_mask: Ipv4Addr::UNSPECIFIED,
            src_ipv6: Ipv6Addr::UNSPECIFIED,
            src_ipv6_mask: Ipv6Addr::UNSPECIFIED,
            dst_ipv6: Ipv6Addr::UNSPECIFIED,
            dst_ipv6_mask: Ipv6Addr::UNSPECIFIED,
            src_port: 0,
            dst_port: 0,
            src_port_range_start: 0,
            src_port_range_end: 0,
            dst_port_range_start: 0,
            dst_port_range_end: 0,
            vlan_id: 0,
            vlan_pcp: 0,
            dscp: 0,
            protocol: 0,
            user_priority: 0,
            spi_value: 0,
            spi_mask: 0,
            ifindex: 0,
            ip_version_type: 0,
        }
    }
}

/// 출력 필드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputFields {
    /// 원시 출력 선택자 (0-7 우선순위, 8 링크 우선순위, 9 DSCP)
    pub rule_output: u8,
    pub dscp_remark: u8,
    pub vlan_pcp_remark: u8,
    pub service_class_id: u8,
    pub mscs_tid_bitmap: u8,
    pub priority_limit: u8,
    pub service_interval_dl: u8,
    pub burst_size_dl: u32,
    pub service_interval_ul: u8,
    pub burst_size_ul: u32,
}

impl Default for OutputFields {
    fn default() -> Self {
        Self {
            rule_output: 0,
            dscp_remark: INVALID_DSCP_REMARK,
            vlan_pcp_remark: INVALID_VLAN_PCP_REMARK,
            service_class_id: INVALID_SERVICE_CLASS_ID,
            mscs_tid_bitmap: INVALID_MSCS_TID_BITMAP,
            priority_limit: 0,
            service_interval_dl: 0,
            burst_size_dl: 0,
            service_interval_ul: 0,
            burst_size_ul: 0,
        }
    }
}

/// 우선순위 매핑 규칙
///
/// 테이블에 게시된 규칙은 불변입니다. 수정은 새 규칙으로 교체하는 방식으로만 이루어집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub id: u32,
    pub rule_type: RuleType,
    pub precedence: u8,
    /// MESH 매치 플래그 ([`crate::flags::mesh`])
    pub mesh_flags: u32,
    /// SAWF 계열 매치 플래그 ([`crate::flags::sawf`])
    pub sawf_flags: u32,
    pub fields: MatchFields,
    pub output: OutputFields,
}

impl Rule {
    /// 규칙 빌더를 생성합니다. 기본 타입은 SAWF입니다.
    pub fn builder(id: u32) -> RuleBuilder {
        RuleBuilder::new(id)
    }

    /// 고유 키
    pub fn key(&self) -> RuleKey {
        RuleKey::new(self.id, self.rule_type)
    }

    /// 해석된 출력 선택자
    pub fn output_kind(&self) -> RuleOutput {
        RuleOutput::from_raw(self.output.rule_output)
    }

    /// 우선순위를 제외한 내용이 다른지 비교합니다.
    pub fn differs_in_payload(&self, other: &Rule) -> bool {
        self.mesh_flags != other.mesh_flags
            || self.sawf_flags != other.sawf_flags
            || self.fields != other.fields
            || self.output != other.output
    }

    /// 한 줄 요약
    pub fn summary(&self) -> RuleSummary<'_> {
        RuleSummary(self)
    }
}

/// [`Rule`]의 한 줄 요약 표시
pub struct RuleSummary<'a>(&'a Rule);

impl fmt::Display for RuleSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = self.0;
        write!(
            f,
            "id={} type={} precedence={} output={}",
            rule.id, rule.rule_type, rule.precedence, rule.output.rule_output
        )?;
        if rule.mesh_flags != 0 {
            write!(f, " mesh_flags={:#x}", rule.mesh_flags)?;
        }
        if rule.sawf_flags != 0 {
            write!(f, " sawf_flags={:#x}", rule.sawf_flags)?;
        }
        if rule.output.service_class_id != INVALID_SERVICE_CLASS_ID {
            write!(f, " service_class={}", rule.output.service_class_id)?;
        }
        Ok(())
    }
}

/// 규칙 빌더
///
/// 필드를 설정하면 대응하는 매치 플래그가 함께 설정됩니다.
/// 마스크가 지정된 주소는 [`build`](Self::build) 시점에 마스크가 적용된 값으로 저장됩니다.
///
/// ```
/// use std::net::Ipv4Addr;
/// use spm_mapdb::rule::{Rule, RuleType};
///
/// let rule = Rule::builder(7)
///     .rule_type(RuleType::Sawf)
///     .precedence(10)
///     .output(5)
///     .dst_ipv4(Ipv4Addr::new(10, 0, 1, 9))
///     .dst_ipv4_mask(Ipv4Addr::new(255, 255, 255, 0))
///     .build();
/// assert_eq!(rule.fields.dst_ipv4, Ipv4Addr::new(10, 0, 1, 0));
/// ```
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    rule: Rule,
}

impl RuleBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new(id: u32) -> Self {
        Self {
            rule: Rule {
                id,
                rule_type: RuleType::Sawf,
                precedence: 0,
                mesh_flags: 0,
                sawf_flags: 0,
                fields: MatchFields::default(),
                output: OutputFields::default(),
            },
        }
    }

    pub fn rule_type(mut self, rule_type: RuleType) -> Self {
        self.rule.rule_type = rule_type;
        self
    }

    pub fn precedence(mut self, precedence: u8) -> Self {
        self.rule.precedence = precedence;
        self
    }

    /// 원시 출력 선택자를 설정합니다.
    pub fn output(mut self, rule_output: u8) -> Self {
        self.rule.output.rule_output = rule_output;
        self
    }

    // ─── SAWF 계열 매치 필드 ───────────────────────────────────────

    pub fn ip_version_type(mut self, version: u8) -> Self {
        self.rule.fields.ip_version_type = version;
        self.rule.sawf_flags |= sawf::IP_VERSION_TYPE;
        self
    }

    pub fn src_mac(mut self, mac: MacAddr) -> Self {
        self.rule.fields.src_mac = mac;
        self.rule.sawf_flags |= sawf::SOURCE_MAC;
        self
    }

    pub fn dst_mac(mut self, mac: MacAddr) -> Self {
        self.rule.fields.dst_mac = mac;
        self.rule.sawf_flags |= sawf::DST_MAC;
        self
    }

    pub fn src_ipv4(mut self, addr: Ipv4Addr) -> Self {
        self.rule.fields.src_ipv4 = addr;
        self.rule.sawf_flags |= sawf::SRC_IPV4;
        self
    }

    pub fn src_ipv4_mask(mut self, mask: Ipv4Addr) -> Self {
        self.rule.fields.src_ipv4_mask = mask;
        self.rule.sawf_flags |= sawf::SRC_IPV4_MASK;
        self
    }

    pub fn dst_ipv4(mut self, addr: Ipv4Addr) -> Self {
        self.rule.fields.dst_ipv4 = addr;
        self.rule.sawf_flags |= sawf::DST_IPV4;
        self
    }

    pub fn dst_ipv4_mask(mut self, mask: Ipv4Addr) -> Self {
        self.rule.fields.dst_ipv4_mask = mask;
        self.rule.sawf_flags |= sawf::DST_IPV4_MASK;
        self
    }

    pub fn src_ipv6(mut self, addr: Ipv6Addr) -> Self {
        self.rule.fields.src_ipv6 = addr;
        self.rule.sawf_flags |= sawf::SRC_IPV6;
        self
    }

    pub fn src_ipv6_mask(mut self, mask: Ipv6Addr) -> Self {
        self.rule.fields.src_ipv6_mask = mask;
        self.rule.sawf_flags |= sawf::SRC_IPV6_MASK;
        self
    }

    pub fn dst_ipv6(mut self, addr: Ipv6Addr) -> Self {
        self.rule.fields.dst_ipv6 = addr;
        self.rule.sawf_flags |= sawf::DST_IPV6;
        self
    }

    pub fn dst_ipv6_mask(mut self, mask: Ipv6Addr) -> Self {
        self.rule.fields.dst_ipv6_mask = mask;
        self.rule.sawf_flags |= sawf::DST_IPV6_MASK;
        self
    }

    pub fn src_port(mut self, port: u16) -> Self {
        self.rule.fields.src_port = port;
        self.rule.sawf_flags |= sawf::SRC_PORT;
        self
    }

    pub fn dst_port(mut self, port: u16) -> Self {
        self.rule.fields.dst_port = port;
        self.rule.sawf_flags |= sawf::DST_PORT;
        self
    }

    /// 출발지 포트 범위 (양 끝 포함)
    pub fn src_port_range(mut self, start: u16, end: u16) -> Self {
        self.rule.fields.src_port_range_start = start;
        self.rule.fields.src_port_range_end = end;
        self.rule.sawf_flags |= sawf::SRC_PORT_RANGE;
        self
    }

    /// 목적지 포트 범위 (양 끝 포함)
    pub fn dst_port_range(mut self, start: u16, end: u16) -> Self {
        self.rule.fields.dst_port_range_start = start;
        self.rule.fields.dst_port_range_end = end;
        self.rule.sawf_flags |= sawf::DST_PORT_RANGE;
        self
    }

    pub fn protocol(mut self, protocol: u8) -> Self {
        self.rule.fields.protocol = protocol;
        self.rule.sawf_flags |= sawf::PROTOCOL;
        self
    }

    pub fn dscp(mut self, dscp: u8) -> Self {
        self.rule.fields.dscp = dscp;
        self.rule.sawf_flags |= sawf::DSCP;
        self
    }

    pub fn vlan_id(mut self, vlan_id: u16) -> Self {
        self.rule.fields.vlan_id = vlan_id;
        self.rule.sawf_flags |= sawf::VLAN_ID;
        self
    }

    pub fn vlan_pcp(mut self, pcp: u8) -> Self {
        self.rule.fields.vlan_pcp = pcp;
        self.rule.sawf_flags |= sawf::VLAN_PCP;
        self
    }

    /// SPI 패턴 (입력 SPI에 `mask`를 적용한 값이 `value`와 같아야 함)
    pub fn spi(mut self, value: u32, mask: u32) -> Self {
        self.rule.fields.spi_value = value;
        self.rule.fields.spi_mask = mask;
        self.rule.sawf_flags |= sawf::SCS_SPI;
        self
    }

    /// SAWF_SCS 목적지 MAC 대체 비교에 쓰이는 인터페이스 인덱스
    pub fn ifindex(mut self, ifindex: u32) -> Self {
        self.rule.fields.ifindex = ifindex;
        self
    }

    // ─── MESH 매치 필드 ────────────────────────────────────────────

    /// 모든 패킷에 매칭되는 MESH 규칙으로 만듭니다.
    pub fn always_true(mut self) -> Self {
        self.rule.mesh_flags |= mesh::ALWAYS_TRUE;
        self
    }

    fn mesh_flag(&mut self, field: u32, sense: bool) {
        self.rule.mesh_flags |= field;
        if sense {
            self.rule.mesh_flags |= mesh::sense_of(field);
        }
    }

    pub fn mesh_user_priority(mut self, up: u8, sense: bool) -> Self {
        self.rule.fields.user_priority = up;
        self.mesh_flag(mesh::UP, sense);
        self
    }

    pub fn mesh_src_mac(mut self, mac: MacAddr, sense: bool) -> Self {
        self.rule.fields.src_mac = mac;
        self.mesh_flag(mesh::SOURCE_MAC, sense);
        self
    }

    pub fn mesh_dst_mac(mut self, mac: MacAddr, sense: bool) -> Self {
        self.rule.fields.dst_mac = mac;
        self.mesh_flag(mesh::DST_MAC, sense);
        self
    }

    pub fn mesh_vlan_id(mut self, vlan_id: u16, sense: bool) -> Self {
        self.rule.fields.vlan_id = vlan_id;
        self.mesh_flag(mesh::VLAN_ID, sense);
        self
    }

    pub fn mesh_src_ipv4(mut self, addr: Ipv4Addr, sense: bool) -> Self {
        self.rule.fields.src_ipv4 = addr;
        self.mesh_flag(mesh::SRC_IPV4, sense);
        self
    }

    pub fn mesh_dst_ipv4(mut self, addr: Ipv4Addr, sense: bool) -> Self {
        self.rule.fields.dst_ipv4 = addr;
        self.mesh_flag(mesh::DST_IPV4, sense);
        self
    }

    pub fn mesh_src_port(mut self, port: u16, sense: bool) -> Self {
        self.rule.fields.src_port = port;
        self.mesh_flag(mesh::SRC_PORT, sense);
        self
    }

    pub fn mesh_dst_port(mut self, port: u16, sense: bool) -> Self {
        self.rule.fields.dst_port = port;
        self.mesh_flag(mesh::DST_PORT, sense);
        self
    }

    pub fn mesh_protocol(mut self, protocol: u8, sense: bool) -> Self {
        self.rule.fields.protocol = protocol;
        self.mesh_flag(mesh::PROTOCOL, sense);
        self
    }

    pub fn mesh_dscp(mut self, dscp: u8, sense: bool) -> Self {
        self.rule.fields.dscp = dscp;
        self.mesh_flag(mesh::DSCP, sense);
        self
    }

    // ─── 출력 필드 ──────────────────────────────────────────────────

    pub fn dscp_remark(mut self, remark: u8) -> Self {
        self.rule.output.dscp_remark = remark;
        self
    }

    pub fn vlan_pcp_remark(mut self, remark: u8) -> Self {
        self.rule.output.vlan_pcp_remark = remark;
        self
    }

    pub fn service_class_id(mut self, id: u8) -> Self {
        self.rule.output.service_class_id = id;
        self
    }

    pub fn mscs_tid_bitmap(mut self, bitmap: u8) -> Self {
        self.rule.output.mscs_tid_bitmap = bitmap;
        self
    }

    pub fn priority_limit(mut self, limit: u8) -> Self {
        self.rule.output.priority_limit = limit;
        self
    }

    /// 하향/상향 서비스 간격과 버스트 크기
    pub fn latency(
        mut self,
        service_interval_dl: u8,
        burst_size_dl: u32,
        service_interval_ul: u8,
        burst_size_ul: u32,
    ) -> Self {
        self.rule.output.service_interval_dl = service_interval_dl;
        self.rule.output.burst_size_dl = burst_size_dl;
        self.rule.output.service_interval_ul = service_interval_ul;
        self.rule.output.burst_size_ul = burst_size_ul;
        self
    }

    /// 마스크를 주소에 적용하고 규칙을 완성합니다.
    pub fn build(mut self) -> Rule {
        let flags = self.rule.sawf_flags;
        let f = &mut self.rule.fields;
        if flags & sawf::SRC_IPV4_MASK != 0 {
            f.src_ipv4 = mask_v4(f.src_ipv4, f.src_ipv4_mask);
        }
        if flags & sawf::DST_IPV4_MASK != 0 {
            f.dst_ipv4 = mask_v4(f.dst_ipv4, f.dst_ipv4_mask);
        }
        if flags & sawf::SRC_IPV6_MASK != 0 {
            f.src_ipv6 = mask_v6(f.src_ipv6, f.src_ipv6_mask);
        }
        if flags & sawf::DST_IPV6_MASK != 0 {
            f.dst_ipv6 = mask_v6(f.dst_ipv6, f.dst_ipv6_mask);
        }
        self.rule
    }
}

/// IPv4 주소에 마스크를 적용합니다.
#[inline]
pub fn mask_v4(addr: Ipv4Addr, mask: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(addr) & u32::from(mask))
}

/// IPv6 주소에 마스크를 적용합니다.
#[inline]
pub fn mask_v6(addr: Ipv6Addr, mask: Ipv6Addr) -> Ipv6Addr {
    Ipv6Addr::from(u128::from(addr) & u128::from(mask))
}

/// 갱신 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCommand {
    /// 추가 또는 수정
    Add,
    /// 삭제
    Delete,
    /// 알 수 없는 명령 코드
    Unknown(u8),
}

impl RuleCommand {
    /// 제어 채널의 명령 코드를 해석합니다 (0 = 삭제, 1 = 추가).
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Delete,
            1 => Self::Add,
            other => Self::Unknown(other),
        }
    }
}

/// 규칙 갱신 요청
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRequest {
    pub command: RuleCommand,
    pub rule: Rule,
}

impl RuleRequest {
    /// 추가/수정 요청
    pub fn add(rule: Rule) -> Self {
        Self {
            command: RuleCommand::Add,
            rule,
        }
    }

    /// 삭제 요청
    pub fn delete(id: u32, rule_type: RuleType) -> Self {
        Self {
            command: RuleCommand::Delete,
            rule: Rule::builder(id).rule_type(rule_type).build(),
        }
    }
}
