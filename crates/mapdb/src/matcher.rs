//! 규칙 매칭 로직 -- 패킷 필드에 대한 규칙 조건 평가
//!
//! 두 가지 매처가 있습니다.
//! - [`match_mesh`]: MESH 규칙용. 필드마다 sense 비트로 비교 결과를 뒤집을 수 있습니다.
//! - [`match_sawf`]: SAWF, SAWF_SCS, SCS, MSCS 규칙용. 동등/범위/마스크 비교만 합니다.
//!
//! 두 매처 모두 활성 플래그를 정해진 순서로 검사하고 첫 실패에서 즉시 `false`를 반환합니다.
//! 입력 필드는 읽기만 합니다.

use std::net::Ipv4Addr;

use spm_core::types::{NetworkLayer, PacketFields};
use tracing::trace;

use crate::flags::{has_all, mesh, sawf};
use crate::rule::{Rule, RuleType, mask_v4, mask_v6};

#[inline]
fn reject(rule: &Rule, field: &'static str) -> bool {
    trace!(rule_id = rule.id, rule_type = %rule.rule_type, field, "rule match failed");
    false
}

/// sense 비트를 반영한 MESH 필드 판정
#[inline]
fn sensed(flags: u32, field: u32, compare_result: bool) -> bool {
    let sense = flags & mesh::sense_of(field) != 0;
    compare_result ^ sense
}

/// MESH 규칙을 평가합니다.
///
/// 검사 순서: 사용자 우선순위, 출발지 MAC, 목적지 MAC, VLAN ID, (IPv4 계열 플래그가 있으면)
/// DSCP, 출발지 IPv4, 목적지 IPv4, 프로토콜, 포트.
/// IPv4 계열 플래그가 하나도 없으면 L2 검사만 통과하면 매칭입니다.
pub fn match_mesh(rule: &Rule, fields: &PacketFields) -> bool {
    let flags = rule.mesh_flags;
    let want = &rule.fields;

    if flags & mesh::ALWAYS_TRUE != 0 {
        return true;
    }

    if flags & mesh::UP != 0 && !sensed(flags, mesh::UP, fields.priority == want.user_priority) {
        return reject(rule, "user_priority");
    }

    if flags & mesh::SOURCE_MAC != 0
        && !sensed(flags, mesh::SOURCE_MAC, fields.src_mac == want.src_mac)
    {
        return reject(rule, "src_mac");
    }

    if flags & mesh::DST_MAC != 0 && !sensed(flags, mesh::DST_MAC, fields.dst_mac == want.dst_mac)
    {
        return reject(rule, "dst_mac");
    }

    if flags & mesh::VLAN_ID != 0 {
        // 태그가 없으면 sense와 관계없이 실패
        let Some(vlan_id) = fields.vlan_id() else {
            return reject(rule, "vlan_tag");
        };
        if !sensed(flags, mesh::VLAN_ID, vlan_id == want.vlan_id) {
            return reject(rule, "vlan_id");
        }
    }

    if flags & mesh::IPV4_FAMILY == 0 {
        return true;
    }

    let NetworkLayer::Ipv4 { src, dst } = fields.network else {
        return reject(rule, "not_ipv4");
    };

    if flags & mesh::DSCP != 0 && !sensed(flags, mesh::DSCP, fields.dscp == want.dscp) {
        return reject(rule, "dscp");
    }

    if flags & mesh::SRC_IPV4 != 0 && !sensed(flags, mesh::SRC_IPV4, src == want.src_ipv4) {
        return reject(rule, "src_ipv4");
    }

    if flags & mesh::DST_IPV4 != 0 && !sensed(flags, mesh::DST_IPV4, dst == want.dst_ipv4) {
        return reject(rule, "dst_ipv4");
    }

    if flags & mesh::PROTOCOL != 0
        && !sensed(flags, mesh::PROTOCOL, fields.protocol == want.protocol)
    {
        return reject(rule, "protocol");
    }

    if flags & (mesh::SRC_PORT | mesh::DST_PORT) != 0 {
        if !fields.has_transport_ports() {
            return reject(rule, "not_tcp_udp");
        }

        if flags & mesh::SRC_PORT != 0
            && !sensed(flags, mesh::SRC_PORT, fields.src_port == want.src_port)
        {
            return reject(rule, "src_port");
        }

        if flags & mesh::DST_PORT != 0
            && !sensed(flags, mesh::DST_PORT, fields.dst_port == want.dst_port)
        {
            return reject(rule, "dst_port");
        }
    }

    true
}

fn ipv4_pair(fields: &PacketFields) -> Option<(Ipv4Addr, Ipv4Addr)> {
    match fields.network {
        NetworkLayer::Ipv4 { src, dst } => Some((src, dst)),
        _ => None,
    }
}

/// SAWF 계열 규칙을 평가합니다.
///
/// SAWF_SCS 규칙의 목적지 MAC 비교가 실패하면 디바이스 자신의 주소와
/// 인터페이스 인덱스로 한 번 더 비교합니다.
pub fn match_sawf(rule: &Rule, fields: &PacketFields) -> bool {
    let flags = rule.sawf_flags;
    let want = &rule.fields;

    if flags & sawf::IP_VERSION_TYPE != 0 && fields.ip_version_type() != want.ip_version_type {
        return reject(rule, "ip_version_type");
    }

    if flags & sawf::DST_MAC != 0 && fields.dst_mac != want.dst_mac {
        let local = rule.rule_type == RuleType::SawfScs
            && fields.dev_addr == want.dst_mac
            && fields.ifindex == want.ifindex;
        if !local {
            return reject(rule, "dst_mac");
        }
    }

    if flags & sawf::DST_PORT != 0 && fields.dst_port != want.dst_port {
        return reject(rule, "dst_port");
    }

    if has_all(flags, sawf::DST_PORT_RANGE)
        && !(want.dst_port_range_start..=want.dst_port_range_end).contains(&fields.dst_port)
    {
        return reject(rule, "dst_port_range");
    }

    if flags & sawf::DST_IPV4 != 0 {
        let Some((_, dst)) = ipv4_pair(fields) else {
            return reject(rule, "dst_ipv4");
        };
        let dst = if flags & sawf::DST_IPV4_MASK != 0 {
            mask_v4(dst, want.dst_ipv4_mask)
        } else {
            dst
        };
        if dst != want.dst_ipv4 {
            return reject(rule, "dst_ipv4");
        }
    }

    if flags & sawf::SOURCE_MAC != 0 && fields.src_mac != want.src_mac {
        return reject(rule, "src_mac");
    }

    if flags & (sawf::SRC_IPV6 | sawf::DST_IPV6) != 0 {
        let NetworkLayer::Ipv6 { src, dst } = fields.network else {
            return reject(rule, "not_ipv6");
        };

        if flags & sawf::SRC_IPV6 != 0 {
            let src = if flags & sawf::SRC_IPV6_MASK != 0 {
                mask_v6(src, want.src_ipv6_mask)
            } else {
                src
            };
            if src != want.src_ipv6 {
                return reject(rule, "src_ipv6");
            }
        }

        if flags & sawf::DST_IPV6 != 0 {
            let dst = if flags & sawf::DST_IPV6_MASK != 0 {
                mask_v6(dst, want.dst_ipv6_mask)
            } else {
                dst
            };
            if dst != want.dst_ipv6 {
                return reject(rule, "dst_ipv6");
            }
        }
    }

    if flags & sawf::SRC_PORT != 0 && fields.src_port != want.src_port {
        return reject(rule, "src_port");
    }

    if has_all(flags, sawf::SRC_PORT_RANGE)
        && !(want.src_port_range_start..=want.src_port_range_end).contains(&fields.src_port)
    {
        return reject(rule, "src_port_range");
    }

    if flags & sawf::SRC_IPV4 != 0 {
        let Some((src, _)) = ipv4_pair(fields) else {
            return reject(rule, "src_ipv4");
        };
        let src = if flags & sawf::SRC_IPV4_MASK != 0 {
            mask_v4(src, want.src_ipv4_mask)
        } else {
            src
        };
        if src != want.src_ipv4 {
            return reject(rule, "src_ipv4");
        }
    }

    if flags & sawf::PROTOCOL != 0 && fields.protocol != want.protocol {
        return reject(rule, "protocol");
    }

    if flags & sawf::DSCP != 0 && fields.dscp != want.dscp {
        return reject(rule, "dscp");
    }

    if flags & sawf::VLAN_PCP != 0 {
        match fields.vlan_pcp() {
            Some(pcp) if pcp == want.vlan_pcp => {}
            Some(_) => return reject(rule, "vlan_pcp"),
            None => return reject(rule, "vlan_tag"),
        }
    }

    if flags & sawf::VLAN_ID != 0 {
        match fields.vlan_id() {
            Some(id) if id == want.vlan_id => {}
            Some(_) => return reject(rule, "vlan_id"),
            None => return reject(rule, "vlan_tag"),
        }
    }

    if flags & sawf::SCS_SPI != 0 && fields.spi & want.spi_mask != want.spi_value {
        return reject(rule, "spi");
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use spm_core::types::{IPPROTO_TCP, IPPROTO_UDP, MacAddr};

    const MAC_A: MacAddr = MacAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    const MAC_B: MacAddr = MacAddr::new([0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb]);
    const MAC_DEV: MacAddr = MacAddr::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);

    fn ipv4_packet(src: [u8; 4], dst: [u8; 4]) -> PacketFields {
        PacketFields {
            src_mac: MAC_A,
            dst_mac: MAC_B,
            network: NetworkLayer::Ipv4 {
                src: Ipv4Addr::from(src),
                dst: Ipv4Addr::from(dst),
            },
            protocol: IPPROTO_UDP,
            src_port: 40000,
            dst_port: 5060,
            dscp: 46,
            ..Default::default()
        }
    }

    fn mesh_rule() -> crate::rule::RuleBuilder {
        Rule::builder(1).rule_type(RuleType::Mesh)
    }

    // =========================================================================
    // MESH 매처
    // =========================================================================

    #[test]
    fn mesh_always_true_matches_non_ip() {
        let rule = mesh_rule().always_true().mesh_dscp(1, false).build();
        assert!(match_mesh(&rule, &PacketFields::default()));
    }

    #[test]
    fn mesh_sense_bit_truth_table() {
        let equal = mesh_rule().mesh_src_mac(MAC_A, false).build();
        let not_equal = mesh_rule().mesh_src_mac(MAC_A, true).build();
        let from_a = ipv4_packet([10, 0, 0, 1], [10, 0, 0, 2]);
        let from_b = PacketFields {
            src_mac: MAC_B,
            ..from_a
        };

        assert!(match_mesh(&equal, &from_a));
        assert!(!match_mesh(&equal, &from_b));
        assert!(!match_mesh(&not_equal, &from_a));
        assert!(match_mesh(&not_equal, &from_b));
    }

    #[test]
    fn mesh_l2_only_rule_matches_non_ip_frames() {
        let rule = mesh_rule().mesh_dst_mac(MAC_B, false).build();
        let frame = PacketFields {
            dst_mac: MAC_B,
            ..Default::default()
        };
        assert!(match_mesh(&rule, &frame));
    }

    #[test]
    fn mesh_ip_rule_rejects_non_ipv4() {
        let rule = mesh_rule().mesh_dscp(46, true).build();
        // sense가 있어도 IPv4가 아니면 실패
        assert!(!match_mesh(&rule, &PacketFields::default()));

        let v6 = PacketFields {
            network: NetworkLayer::Ipv6 {
                src: "2001:db8::1".parse().unwrap(),
                dst: "2001:db8::2".parse().unwrap(),
            },
            dscp: 10,
            ..Default::default()
        };
        assert!(!match_mesh(&rule, &v6));
    }

    #[test]
    fn mesh_vlan_requires_tag() {
        let rule = mesh_rule().mesh_vlan_id(100, true).build();
        assert!(!match_mesh(&rule, &PacketFields::default()));

        let tagged = PacketFields {
            vlan_tci: Some(0x2000 | 200), // PCP 1, VID 200
            ..Default::default()
        };
        assert!(match_mesh(&rule, &tagged));

        let same_vid = PacketFields {
            vlan_tci: Some(0xE000 | 100),
            ..Default::default()
        };
        assert!(!match_mesh(&rule, &same_vid));
    }

    #[test]
    fn mesh_matches_ipv4_five_tuple() {
        let rule = mesh_rule()
            .mesh_src_ipv4(Ipv4Addr::new(10, 0, 0, 1), false)
            .mesh_dst_ipv4(Ipv4Addr::new(10, 0, 0, 2), false)
            .mesh_protocol(IPPROTO_UDP, false)
            .mesh_dst_port(5060, false)
            .mesh_src_port(1234, true)
            .build();
        assert!(match_mesh(&rule, &ipv4_packet([10, 0, 0, 1], [10, 0, 0, 2])));
        assert!(!match_mesh(&rule, &ipv4_packet([10, 0, 0, 9], [10, 0, 0, 2])));
    }

    #[test]
    fn mesh_port_rule_requires_tcp_or_udp() {
        let rule = mesh_rule().mesh_dst_port(5060, true).build();
        let mut icmp = ipv4_packet([1, 1, 1, 1], [2, 2, 2, 2]);
        icmp.protocol = 1;
        assert!(!match_mesh(&rule, &icmp));

        let mut tcp = icmp;
        tcp.protocol = IPPROTO_TCP;
        tcp.dst_port = 80;
        assert!(match_mesh(&rule, &tcp));
    }

    #[test]
    fn mesh_user_priority() {
        let rule = mesh_rule().mesh_user_priority(5, false).build();
        let mut fields = PacketFields::default();
        fields.priority = 5;
        assert!(match_mesh(&rule, &fields));
        fields.priority = 4;
        assert!(!match_mesh(&rule, &fields));
    }

    #[test]
    fn mesh_rule_without_flags_matches_everything() {
        let rule = mesh_rule().build();
        assert!(match_mesh(&rule, &PacketFields::default()));
        assert!(match_mesh(&rule, &ipv4_packet([1, 2, 3, 4], [5, 6, 7, 8])));
    }

    // =========================================================================
    // SAWF 계열 매처
    // =========================================================================

    #[test]
    fn sawf_masked_ipv4_match() {
        let rule = Rule::builder(2)
            .dst_ipv4(Ipv4Addr::new(192, 168, 1, 77))
            .dst_ipv4_mask(Ipv4Addr::new(255, 255, 255, 0))
            .build();
        assert!(match_sawf(&rule, &ipv4_packet([10, 0, 0, 1], [192, 168, 1, 200])));
        assert!(!match_sawf(&rule, &ipv4_packet([10, 0, 0, 1], [192, 168, 2, 200])));
    }

    #[test]
    fn sawf_masked_match_does_not_modify_input() {
        let rule = Rule::builder(2)
            .src_ipv4(Ipv4Addr::new(10, 0, 0, 0))
            .src_ipv4_mask(Ipv4Addr::new(255, 0, 0, 0))
            .build();
        let fields = ipv4_packet([10, 9, 8, 7], [1, 1, 1, 1]);
        let before = fields;
        assert!(match_sawf(&rule, &fields));
        assert!(match_sawf(&rule, &fields));
        assert_eq!(fields, before);
    }

    #[test]
    fn sawf_ipv4_rule_rejects_ipv6_packet() {
        let rule = Rule::builder(2).src_ipv4(Ipv4Addr::new(10, 0, 0, 1)).build();
        let v6 = PacketFields {
            network: NetworkLayer::Ipv6 {
                src: "::1".parse().unwrap(),
                dst: "::2".parse().unwrap(),
            },
            ..Default::default()
        };
        assert!(!match_sawf(&rule, &v6));
    }

    #[test]
    fn sawf_masked_ipv6_match() {
        let rule = Rule::builder(3)
            .src_ipv6("2001:db8:1::".parse().unwrap())
            .src_ipv6_mask("ffff:ffff:ffff::".parse().unwrap())
            .ip_version_type(6)
            .build();
        let fields = PacketFields {
            network: NetworkLayer::Ipv6 {
                src: "2001:db8:1::abcd".parse().unwrap(),
                dst: "2001:db8:2::1".parse().unwrap(),
            },
            ..Default::default()
        };
        assert!(match_sawf(&rule, &fields));
    }

    #[test]
    fn sawf_port_range_is_inclusive() {
        let rule = Rule::builder(4).dst_port_range(5000, 5100).build();
        let mut fields = ipv4_packet([1, 1, 1, 1], [2, 2, 2, 2]);
        for (port, expected) in [(4999, false), (5000, true), (5100, true), (5101, false)] {
            fields.dst_port = port;
            assert_eq!(match_sawf(&rule, &fields), expected, "port {port}");
        }
    }

    #[test]
    fn sawf_half_range_is_ignored() {
        let mut rule = Rule::builder(4).build();
        rule.sawf_flags = sawf::SRC_PORT_RANGE_START;
        rule.fields.src_port_range_start = 10;
        rule.fields.src_port_range_end = 20;
        assert!(match_sawf(&rule, &ipv4_packet([1, 1, 1, 1], [2, 2, 2, 2])));
    }

    #[test]
    fn sawf_scs_dst_mac_falls_back_to_local_interface() {
        let rule = Rule::builder(5)
            .rule_type(RuleType::SawfScs)
            .dst_mac(MAC_DEV)
            .ifindex(7)
            .build();
        let mut fields = ipv4_packet([1, 1, 1, 1], [2, 2, 2, 2]);
        fields.dev_addr = MAC_DEV;
        fields.ifindex = 7;
        assert!(match_sawf(&rule, &fields));

        fields.ifindex = 8;
        assert!(!match_sawf(&rule, &fields));

        // SAWF 규칙에는 대체 비교가 없음
        let plain = Rule::builder(5).dst_mac(MAC_DEV).ifindex(7).build();
        fields.ifindex = 7;
        assert!(!match_sawf(&plain, &fields));
    }

    #[test]
    fn sawf_vlan_fields_fail_without_tag() {
        let rule = Rule::builder(6).vlan_pcp(5).build();
        let mut fields = ipv4_packet([1, 1, 1, 1], [2, 2, 2, 2]);
        assert!(!match_sawf(&rule, &fields));
        fields.vlan_tci = Some(0xA000 | 42);
        assert!(match_sawf(&rule, &fields));

        let by_id = Rule::builder(6).vlan_id(42).build();
        assert!(match_sawf(&by_id, &fields));
        fields.vlan_tci = Some(43);
        assert!(!match_sawf(&by_id, &fields));
    }

    #[test]
    fn sawf_spi_pattern_uses_mask() {
        let rule = Rule::builder(7)
            .rule_type(RuleType::Scs)
            .spi(0x0000_1200, 0x0000_ff00)
            .build();
        let mut fields = PacketFields {
            spi: 0xdead_12ef,
            ..Default::default()
        };
        assert!(match_sawf(&rule, &fields));
        fields.spi = 0xdead_13ef;
        assert!(!match_sawf(&rule, &fields));
    }

    #[test]
    fn sawf_strict_fields() {
        let rule = Rule::builder(8)
            .src_mac(MAC_A)
            .protocol(IPPROTO_UDP)
            .dscp(46)
            .src_port(40000)
            .dst_port(5060)
            .ip_version_type(4)
            .build();
        let fields = ipv4_packet([1, 1, 1, 1], [2, 2, 2, 2]);
        assert!(match_sawf(&rule, &fields));

        let other = PacketFields { dscp: 0, ..fields };
        assert!(!match_sawf(&rule, &other));
    }
}
