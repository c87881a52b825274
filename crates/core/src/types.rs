//! 도메인 타입 -- 분류 엔진이 소비하는 정규화된 패킷 필드
//!
//! 프레임에서 필드를 추출하는 작업은 호출자의 책임입니다.
//! 엔진은 이 구조체만 읽고 절대 수정하지 않습니다.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// IP 프로토콜 번호: TCP
pub const IPPROTO_TCP: u8 = 6;
/// IP 프로토콜 번호: UDP
pub const IPPROTO_UDP: u8 = 17;

/// 802.1Q TCI의 PCP 비트
pub const VLAN_PRIO_MASK: u16 = 0xE000;
/// PCP 비트 시프트
pub const VLAN_PRIO_SHIFT: u16 = 13;
/// 802.1Q TCI의 VLAN ID 비트
pub const VLAN_VID_MASK: u16 = 0x0FFF;

/// 48비트 MAC 주소
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// 모든 바이트가 0인 주소
    pub const ZERO: Self = Self([0; 6]);

    /// 바이트 배열에서 생성합니다.
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// 내부 바이트를 반환합니다.
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// MAC 주소 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mac address: {0}")]
pub struct MacParseError(pub String);

impl FromStr for MacAddr {
    type Err = MacParseError;

    /// `aa:bb:cc:dd:ee:ff` 또는 `aa-bb-cc-dd-ee-ff` 형식을 받습니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split([':', '-']);
        for byte in &mut bytes {
            let part = parts.next().ok_or_else(|| MacParseError(s.to_owned()))?;
            if part.len() != 2 {
                return Err(MacParseError(s.to_owned()));
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| MacParseError(s.to_owned()))?;
        }
        if parts.next().is_some() {
            return Err(MacParseError(s.to_owned()));
        }
        Ok(Self(bytes))
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 네트워크 계층 정보
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NetworkLayer {
    /// IPv4 프레임
    Ipv4 { src: Ipv4Addr, dst: Ipv4Addr },
    /// IPv6 프레임
    Ipv6 { src: Ipv6Addr, dst: Ipv6Addr },
    /// IP가 아닌 프레임 (ARP 등)
    #[default]
    NonIp,
}

impl NetworkLayer {
    /// IP 버전 타입 (4, 6, 비-IP는 0)
    pub fn ip_version_type(&self) -> u8 {
        match self {
            Self::Ipv4 { .. } => 4,
            Self::Ipv6 { .. } => 6,
            Self::NonIp => 0,
        }
    }

    /// IP 프레임 여부
    pub fn is_ip(&self) -> bool {
        !matches!(self, Self::NonIp)
    }
}

/// 분류에 필요한 정규화된 패킷 필드
///
/// 포트와 프로토콜은 네트워크 계층이 IP일 때만 의미가 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PacketFields {
    /// 출발지 MAC
    pub src_mac: MacAddr,
    /// 목적지 MAC
    pub dst_mac: MacAddr,
    /// 수신/송신 디바이스 자신의 MAC
    pub dev_addr: MacAddr,
    /// 디바이스 인터페이스 인덱스
    pub ifindex: u32,
    /// 네트워크 계층
    pub network: NetworkLayer,
    /// IP 프로토콜 번호
    pub protocol: u8,
    /// 출발지 포트
    pub src_port: u16,
    /// 목적지 포트
    pub dst_port: u16,
    /// 6비트 DSCP 값
    pub dscp: u8,
    /// 802.1Q TCI (`None`이면 태그 없음)
    pub vlan_tci: Option<u16>,
    /// SPI (Security Parameter Index)
    pub spi: u32,
    /// 현재 링크 계층 우선순위
    pub priority: u8,
}

impl PacketFields {
    /// IP 버전 타입 (4, 6, 비-IP는 0)
    pub fn ip_version_type(&self) -> u8 {
        self.network.ip_version_type()
    }

    /// 전송 계층이 TCP 또는 UDP인지 여부
    pub fn has_transport_ports(&self) -> bool {
        self.network.is_ip() && (self.protocol == IPPROTO_TCP || self.protocol == IPPROTO_UDP)
    }

    /// VLAN PCP (태그가 없으면 `None`)
    pub fn vlan_pcp(&self) -> Option<u8> {
        // 3비트 값이므로 u8 변환은 손실이 없습니다.
        self.vlan_tci
            .map(|tci| ((tci & VLAN_PRIO_MASK) >> VLAN_PRIO_SHIFT) as u8)
    }

    /// VLAN ID (태그가 없으면 `None`)
    pub fn vlan_id(&self) -> Option<u16> {
        self.vlan_tci.map(|tci| tci & VLAN_VID_MASK)
    }
}

impl fmt::Display for PacketFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.network {
            NetworkLayer::Ipv4 { src, dst } => write!(
                f,
                "{}:{} -> {}:{} proto={} dscp={}",
                src, self.src_port, dst, self.dst_port, self.protocol, self.dscp
            ),
            NetworkLayer::Ipv6 { src, dst } => write!(
                f,
                "[{}]:{} -> [{}]:{} proto={} dscp={}",
                src, self.src_port, dst, self.dst_port, self.protocol, self.dscp
            ),
            NetworkLayer::NonIp => write!(
                f,
                "{} -> {} up={}",
                self.src_mac, self.dst_mac, self.priority
            ),
        }
    }
}
