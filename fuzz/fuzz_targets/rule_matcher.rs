#![no_main]

use std::net::{Ipv4Addr, Ipv6Addr};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use spm_core::types::{MacAddr, NetworkLayer, PacketFields};
use spm_mapdb::matcher::{match_mesh, match_sawf};
use spm_mapdb::rule::{MatchFields, Rule, RuleType};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    rule_type: u8,
    mesh_flags: u32,
    sawf_flags: u32,
    rule_mac: [u8; 6],
    rule_v4: [u32; 2],
    rule_v6: [u128; 2],
    rule_ports: [u16; 6],
    rule_small: [u8; 6],
    rule_spi: [u32; 2],
    packet: FuzzPacket,
}

#[derive(Arbitrary, Debug)]
struct FuzzPacket {
    macs: [[u8; 6]; 3],
    family: u8,
    v4: [u32; 2],
    v6: [u128; 2],
    protocol: u8,
    ports: [u16; 2],
    dscp: u8,
    vlan_tci: Option<u16>,
    spi: u32,
    priority: u8,
    ifindex: u32,
}

fuzz_target!(|input: FuzzInput| {
    let rule_type = RuleType::ALL[usize::from(input.rule_type) % RuleType::ALL.len()];

    let mut rule = Rule::builder(1).rule_type(rule_type).build();
    rule.mesh_flags = input.mesh_flags;
    rule.sawf_flags = input.sawf_flags;
    rule.fields = MatchFields {
        src_mac: MacAddr::new(input.rule_mac),
        dst_mac: MacAddr::new(input.rule_mac),
        src_ipv4: Ipv4Addr::from(input.rule_v4[0]),
        dst_ipv4: Ipv4Addr::from(input.rule_v4[1]),
        src_ipv6: Ipv6Addr::from(input.rule_v6[0]),
        dst_ipv6: Ipv6Addr::from(input.rule_v6[1]),
        src_port: input.rule_ports[0],
        dst_port: input.rule_ports[1],
        src_port_range_start: input.rule_ports[2],
        src_port_range_end: input.rule_ports[3],
        dst_port_range_start: input.rule_ports[4],
        dst_port_range_end: input.rule_ports[5],
        protocol: input.rule_small[0],
        dscp: input.rule_small[1],
        vlan_pcp: input.rule_small[2],
        user_priority: input.rule_small[3],
        ip_version_type: input.rule_small[4],
        vlan_id: u16::from(input.rule_small[5]),
        spi_value: input.rule_spi[0],
        spi_mask: input.rule_spi[1],
        ..MatchFields::default()
    };

    let p = &input.packet;
    let network = match p.family % 3 {
        0 => NetworkLayer::NonIp,
        1 => NetworkLayer::Ipv4 {
            src: Ipv4Addr::from(p.v4[0]),
            dst: Ipv4Addr::from(p.v4[1]),
        },
        _ => NetworkLayer::Ipv6 {
            src: Ipv6Addr::from(p.v6[0]),
            dst: Ipv6Addr::from(p.v6[1]),
        },
    };
    let fields = PacketFields {
        src_mac: MacAddr::new(p.macs[0]),
        dst_mac: MacAddr::new(p.macs[1]),
        dev_addr: MacAddr::new(p.macs[2]),
        ifindex: p.ifindex,
        network,
        protocol: p.protocol,
        src_port: p.ports[0],
        dst_port: p.ports[1],
        dscp: p.dscp & 0x3F,
        vlan_tci: p.vlan_tci,
        spi: p.spi,
        priority: p.priority,
    };

    // 매처는 입력을 바꾸지 않고 결정적이어야 함
    let before = fields;
    let mesh = match_mesh(&rule, &fields);
    let sawf = match_sawf(&rule, &fields);
    assert_eq!(before, fields);
    assert_eq!(mesh, match_mesh(&rule, &fields));
    assert_eq!(sawf, match_sawf(&rule, &fields));
});
