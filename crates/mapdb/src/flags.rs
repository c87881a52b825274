//! 매치 플래그 비트 정의
//!
//! MESH 규칙은 [`mesh`]의 비트를, SAWF 계열 규칙(SAWF, SAWF_SCS, SCS, MSCS)은
//! [`sawf`]의 비트를 사용합니다. 두 집합은 서로 다른 플래그 워드에 저장됩니다.

/// MESH 규칙 플래그
///
/// 각 필드 플래그는 짝이 되는 `_SENSE` 플래그를 가지며,
/// `_SENSE`가 설정되면 "같음" 비교가 "다름" 비교로 바뀝니다.
pub mod mesh {
    /// 모든 필드 검사를 건너뛰고 무조건 매칭
    pub const ALWAYS_TRUE: u32 = 1 << 0;
    pub const UP: u32 = 1 << 1;
    pub const UP_SENSE: u32 = 1 << 2;
    pub const SOURCE_MAC: u32 = 1 << 3;
    pub const SOURCE_MAC_SENSE: u32 = 1 << 4;
    pub const DST_MAC: u32 = 1 << 5;
    pub const DST_MAC_SENSE: u32 = 1 << 6;
    pub const SRC_IPV4: u32 = 1 << 7;
    pub const SRC_IPV4_SENSE: u32 = 1 << 8;
    pub const DST_IPV4: u32 = 1 << 9;
    pub const DST_IPV4_SENSE: u32 = 1 << 10;
    pub const SRC_PORT: u32 = 1 << 11;
    pub const SRC_PORT_SENSE: u32 = 1 << 12;
    pub const DST_PORT: u32 = 1 << 13;
    pub const DST_PORT_SENSE: u32 = 1 << 14;
    pub const PROTOCOL: u32 = 1 << 15;
    pub const PROTOCOL_SENSE: u32 = 1 << 16;
    pub const VLAN_ID: u32 = 1 << 17;
    pub const VLAN_ID_SENSE: u32 = 1 << 18;
    pub const DSCP: u32 = 1 << 19;
    pub const DSCP_SENSE: u32 = 1 << 20;

    /// 하나라도 설정되면 프레임이 IPv4여야 하는 플래그 묶음
    pub const IPV4_FAMILY: u32 = SRC_IPV4 | DST_IPV4 | SRC_PORT | DST_PORT | DSCP | PROTOCOL;

    /// 필드 플래그에 대응하는 sense 플래그를 반환합니다.
    pub const fn sense_of(field: u32) -> u32 {
        field << 1
    }
}

/// SAWF 계열 규칙 플래그
///
/// sense 비트가 없으며, `_MASK` 플래그는 입력 값에 마스크를 적용한 뒤 비교하도록 합니다.
pub mod sawf {
    pub const IP_VERSION_TYPE: u32 = 1 << 0;
    pub const SOURCE_MAC: u32 = 1 << 1;
    pub const DST_MAC: u32 = 1 << 2;
    pub const SRC_IPV4: u32 = 1 << 3;
    pub const SRC_IPV4_MASK: u32 = 1 << 4;
    pub const DST_IPV4: u32 = 1 << 5;
    pub const DST_IPV4_MASK: u32 = 1 << 6;
    pub const SRC_IPV6: u32 = 1 << 7;
    pub const SRC_IPV6_MASK: u32 = 1 << 8;
    pub const DST_IPV6: u32 = 1 << 9;
    pub const DST_IPV6_MASK: u32 = 1 << 10;
    pub const SRC_PORT: u32 = 1 << 11;
    pub const DST_PORT: u32 = 1 << 12;
    pub const SRC_PORT_RANGE_START: u32 = 1 << 13;
    pub const SRC_PORT_RANGE_END: u32 = 1 << 14;
    pub const DST_PORT_RANGE_START: u32 = 1 << 15;
    pub const DST_PORT_RANGE_END: u32 = 1 << 16;
    pub const PROTOCOL: u32 = 1 << 17;
    pub const VLAN_ID: u32 = 1 << 18;
    pub const VLAN_PCP: u32 = 1 << 19;
    pub const DSCP: u32 = 1 << 20;
    pub const SCS_SPI: u32 = 1 << 21;

    /// 출발지 포트 범위 (두 경계 플래그가 모두 있어야 검사)
    pub const SRC_PORT_RANGE: u32 = SRC_PORT_RANGE_START | SRC_PORT_RANGE_END;
    /// 목적지 포트 범위 (두 경계 플래그가 모두 있어야 검사)
    pub const DST_PORT_RANGE: u32 = DST_PORT_RANGE_START | DST_PORT_RANGE_END;
}

/// `flags`에 `bits`가 모두 설정되어 있는지 확인합니다.
#[inline]
pub const fn has_all(flags: u32, bits: u32) -> bool {
    flags & bits == bits
}
