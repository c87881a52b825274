//! 규칙 파일 로더 -- TOML 규칙 파일을 갱신 요청 목록으로 변환합니다.
//!
//! 파일은 `[[rules]]` 테이블의 배열입니다. 알 수 없는 키는 거절하고,
//! 같은 파일 안에서 중복된 (id, 타입)은 경고 로그를 남기고 건너뜁니다.
//!
//! ```toml
//! [[rules]]
//! id = 1
//! type = "mesh"
//! precedence = 10
//! output = 5
//! dscp = 46
//! sense = ["dscp"]
//! ```

use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;

use serde::Deserialize;
use spm_core::config::RULE_MAX_LIMIT;
use spm_core::types::MacAddr;

use crate::error::MapDbError;
use crate::rule::{OUTPUT_NO_MATCH, Rule, RuleBuilder, RuleRequest, RuleType};

/// 규칙 파일 최대 크기
const MAX_RULE_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// `sense` 목록에 쓸 수 있는 MESH 필드 이름
const MESH_SENSE_FIELDS: [&str; 10] = [
    "user_priority",
    "src_mac",
    "dst_mac",
    "vlan_id",
    "src_ipv4",
    "dst_ipv4",
    "src_port",
    "dst_port",
    "protocol",
    "dscp",
];

/// 규칙 파일 최상위 구조
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

/// 파일 안의 규칙 명령
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum EntryCommand {
    #[default]
    Add,
    Delete,
}

/// 무선 지연 파라미터 항목
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct LatencyEntry {
    service_interval_dl: u8,
    burst_size_dl: u32,
    service_interval_ul: u8,
    burst_size_ul: u32,
}

/// `[[rules]]` 항목 하나
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    id: u32,
    #[serde(rename = "type", default = "default_rule_type")]
    rule_type: RuleType,
    #[serde(default)]
    command: EntryCommand,
    #[serde(default)]
    precedence: u8,
    #[serde(default)]
    output: u8,

    // 매치 필드
    ip_version_type: Option<u8>,
    src_mac: Option<MacAddr>,
    dst_mac: Option<MacAddr>,
    src_ipv4: Option<Ipv4Addr>,
    src_ipv4_mask: Option<Ipv4Addr>,
    dst_ipv4: Option<Ipv4Addr>,
    dst_ipv4_mask: Option<Ipv4Addr>,
    src_ipv6: Option<Ipv6Addr>,
    src_ipv6_mask: Option<Ipv6Addr>,
    dst_ipv6: Option<Ipv6Addr>,
    dst_ipv6_mask: Option<Ipv6Addr>,
    src_port: Option<u16>,
    dst_port: Option<u16>,
    src_port_range: Option<Vec<u16>>,
    dst_port_range: Option<Vec<u16>>,
    protocol: Option<u8>,
    dscp: Option<u8>,
    vlan_id: Option<u16>,
    vlan_pcp: Option<u8>,
    spi: Option<u32>,
    spi_mask: Option<u32>,
    ifindex: Option<u32>,
    user_priority: Option<u8>,
    #[serde(default)]
    always_true: bool,
    #[serde(default)]
    sense: Vec<String>,

    // 출력 필드
    dscp_remark: Option<u8>,
    vlan_pcp_remark: Option<u8>,
    service_class_id: Option<u8>,
    mscs_tid_bitmap: Option<u8>,
    priority_limit: Option<u8>,
    latency: Option<LatencyEntry>,
}

fn default_rule_type() -> RuleType {
    RuleType::Sawf
}

fn invalid(id: u32, reason: impl Into<String>) -> MapDbError {
    MapDbError::RuleValidation {
        rule_id: id,
        reason: reason.into(),
    }
}

fn port_range(id: u32, name: &str, range: &[u16]) -> Result<(u16, u16), MapDbError> {
    match *range {
        [start, end] if start <= end => Ok((start, end)),
        [start, end] => Err(invalid(
            id,
            format!("{name}: start {start} is greater than end {end}"),
        )),
        _ => Err(invalid(id, format!("{name} needs exactly [start, end]"))),
    }
}

impl RuleEntry {
    /// 항목을 검증하고 갱신 요청으로 변환합니다.
    fn into_request(self) -> Result<RuleRequest, MapDbError> {
        if self.command == EntryCommand::Delete {
            return Ok(RuleRequest::delete(self.id, self.rule_type));
        }
        if self.output >= OUTPUT_NO_MATCH {
            return Err(invalid(
                self.id,
                format!("output {} out of range (max {})", self.output, OUTPUT_NO_MATCH - 1),
            ));
        }

        let builder = Rule::builder(self.id)
            .rule_type(self.rule_type)
            .precedence(self.precedence)
            .output(self.output);
        let builder = if self.rule_type == RuleType::Mesh {
            self.mesh_match(builder)?
        } else {
            self.sawf_match(builder)?
        };
        Ok(RuleRequest::add(self.outputs(builder).build()))
    }

    fn mesh_match(&self, mut b: RuleBuilder) -> Result<RuleBuilder, MapDbError> {
        let unsupported = [
            ("ip_version_type", self.ip_version_type.is_some()),
            ("src_ipv4_mask", self.src_ipv4_mask.is_some()),
            ("dst_ipv4_mask", self.dst_ipv4_mask.is_some()),
            ("src_ipv6", self.src_ipv6.is_some()),
            ("src_ipv6_mask", self.src_ipv6_mask.is_some()),
            ("dst_ipv6", self.dst_ipv6.is_some()),
            ("dst_ipv6_mask", self.dst_ipv6_mask.is_some()),
            ("src_port_range", self.src_port_range.is_some()),
            ("dst_port_range", self.dst_port_range.is_some()),
            ("vlan_pcp", self.vlan_pcp.is_some()),
            ("spi", self.spi.is_some()),
            ("spi_mask", self.spi_mask.is_some()),
            ("ifindex", self.ifindex.is_some()),
        ];
        if let Some((name, _)) = unsupported.iter().find(|(_, set)| *set) {
            return Err(invalid(self.id, format!("{name} is not supported by mesh rules")));
        }

        for name in &self.sense {
            if !MESH_SENSE_FIELDS.contains(&name.as_str()) {
                return Err(invalid(self.id, format!("unknown sense field '{name}'")));
            }
        }
        let inverted = |name: &str| self.sense.iter().any(|s| s == name);

        if self.always_true {
            b = b.always_true();
        }
        if let Some(up) = self.user_priority {
            b = b.mesh_user_priority(up, inverted("user_priority"));
        }
        if let Some(mac) = self.src_mac {
            b = b.mesh_src_mac(mac, inverted("src_mac"));
        }
        if let Some(mac) = self.dst_mac {
            b = b.mesh_dst_mac(mac, inverted("dst_mac"));
        }
        if let Some(vid) = self.vlan_id {
            b = b.mesh_vlan_id(vid, inverted("vlan_id"));
        }
        if let Some(addr) = self.src_ipv4 {
            b = b.mesh_src_ipv4(addr, inverted("src_ipv4"));
        }
        if let Some(addr) = self.dst_ipv4 {
            b = b.mesh_dst_ipv4(addr, inverted("dst_ipv4"));
        }
        if let Some(port) = self.src_port {
            b = b.mesh_src_port(port, inverted("src_port"));
        }
        if let Some(port) = self.dst_port {
            b = b.mesh_dst_port(port, inverted("dst_port"));
        }
        if let Some(proto) = self.protocol {
            b = b.mesh_protocol(proto, inverted("protocol"));
        }
        if let Some(dscp) = self.dscp {
            b = b.mesh_dscp(dscp, inverted("dscp"));
        }

        // sense만 있고 필드가 없는 경우
        let listed = [
            ("user_priority", self.user_priority.is_some()),
            ("src_mac", self.src_mac.is_some()),
            ("dst_mac", self.dst_mac.is_some()),
            ("vlan_id", self.vlan_id.is_some()),
            ("src_ipv4", self.src_ipv4.is_some()),
            ("dst_ipv4", self.dst_ipv4.is_some()),
            ("src_port", self.src_port.is_some()),
            ("dst_port", self.dst_port.is_some()),
            ("protocol", self.protocol.is_some()),
            ("dscp", self.dscp.is_some()),
        ];
        if let Some((name, _)) = listed.iter().find(|(n, set)| !*set && inverted(n)) {
            return Err(invalid(self.id, format!("sense lists '{name}' but the field is not set")));
        }
        Ok(b)
    }

    fn sawf_match(&self, mut b: RuleBuilder) -> Result<RuleBuilder, MapDbError> {
        if self.always_true || !self.sense.is_empty() || self.user_priority.is_some() {
            return Err(invalid(
                self.id,
                "always_true, sense and user_priority are mesh-only fields",
            ));
        }

        let orphan_masks = [
            ("src_ipv4_mask", self.src_ipv4_mask.is_some() && self.src_ipv4.is_none()),
            ("dst_ipv4_mask", self.dst_ipv4_mask.is_some() && self.dst_ipv4.is_none()),
            ("src_ipv6_mask", self.src_ipv6_mask.is_some() && self.src_ipv6.is_none()),
            ("dst_ipv6_mask", self.dst_ipv6_mask.is_some() && self.dst_ipv6.is_none()),
            ("spi_mask", self.spi_mask.is_some() && self.spi.is_none()),
        ];
        if let Some((name, _)) = orphan_masks.iter().find(|(_, orphan)| *orphan) {
            return Err(invalid(self.id, format!("{name} is set without its address")));
        }

        if let Some(version) = self.ip_version_type {
            b = b.ip_version_type(version);
        }
        if let Some(mac) = self.src_mac {
            b = b.src_mac(mac);
        }
        if let Some(mac) = self.dst_mac {
            b = b.dst_mac(mac);
        }
        if let Some(addr) = self.src_ipv4 {
            b = b.src_ipv4(addr);
        }
        if let Some(mask) = self.src_ipv4_mask {
            b = b.src_ipv4_mask(mask);
        }
        if let Some(addr) = self.dst_ipv4 {
            b = b.dst_ipv4(addr);
        }
        if let Some(mask) = self.dst_ipv4_mask {
            b = b.dst_ipv4_mask(mask);
        }
        if let Some(addr) = self.src_ipv6 {
            b = b.src_ipv6(addr);
        }
        if let Some(mask) = self.src_ipv6_mask {
            b = b.src_ipv6_mask(mask);
        }
        if let Some(addr) = self.dst_ipv6 {
            b = b.dst_ipv6(addr);
        }
        if let Some(mask) = self.dst_ipv6_mask {
            b = b.dst_ipv6_mask(mask);
        }
        if let Some(port) = self.src_port {
            b = b.src_port(port);
        }
        if let Some(port) = self.dst_port {
            b = b.dst_port(port);
        }
        if let Some(range) = &self.src_port_range {
            let (start, end) = port_range(self.id, "src_port_range", range)?;
            b = b.src_port_range(start, end);
        }
        if let Some(range) = &self.dst_port_range {
            let (start, end) = port_range(self.id, "dst_port_range", range)?;
            b = b.dst_port_range(start, end);
        }
        if let Some(proto) = self.protocol {
            b = b.protocol(proto);
        }
        if let Some(dscp) = self.dscp {
            b = b.dscp(dscp);
        }
        if let Some(vid) = self.vlan_id {
            b = b.vlan_id(vid);
        }
        if let Some(pcp) = self.vlan_pcp {
            b = b.vlan_pcp(pcp);
        }
        if let Some(spi) = self.spi {
            b = b.spi(spi, self.spi_mask.unwrap_or(u32::MAX));
        }
        if let Some(ifindex) = self.ifindex {
            b = b.ifindex(ifindex);
        }
        Ok(b)
    }

    fn outputs(&self, mut b: RuleBuilder) -> RuleBuilder {
        if let Some(remark) = self.dscp_remark {
            b = b.dscp_remark(remark);
        }
        if let Some(remark) = self.vlan_pcp_remark {
            b = b.vlan_pcp_remark(remark);
        }
        if let Some(id) = self.service_class_id {
            b = b.service_class_id(id);
        }
        if let Some(bitmap) = self.mscs_tid_bitmap {
            b = b.mscs_tid_bitmap(bitmap);
        }
        if let Some(limit) = self.priority_limit {
            b = b.priority_limit(limit);
        }
        if let Some(l) = self.latency {
            b = b.latency(
                l.service_interval_dl,
                l.burst_size_dl,
                l.service_interval_ul,
                l.burst_size_ul,
            );
        }
        b
    }
}

/// 규칙 파일 로더
#[derive(Debug, Clone, Copy)]
pub struct RuleLoader {
    max_rules: usize,
}

impl Default for RuleLoader {
    fn default() -> Self {
        Self::new(RULE_MAX_LIMIT as usize)
    }
}

impl RuleLoader {
    /// 파일당 허용할 최대 항목 수를 지정해 로더를 만듭니다.
    pub fn new(max_rules: usize) -> Self {
        Self { max_rules }
    }

    /// 파일에서 규칙 요청을 로드합니다.
    ///
    /// # Errors
    /// - 파일을 읽을 수 없거나 크기가 10MB를 넘는 경우
    /// - TOML 파싱 또는 규칙 검증에 실패한 경우
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<Vec<RuleRequest>, MapDbError> {
        let path = path.as_ref();

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| MapDbError::RuleLoad {
                path: path.display().to_string(),
                reason: format!("failed to read file metadata: {e}"),
            })?;

        if metadata.len() > MAX_RULE_FILE_SIZE {
            return Err(MapDbError::RuleLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {MAX_RULE_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| MapDbError::RuleLoad {
                    path: path.display().to_string(),
                    reason: format!("failed to read file: {e}"),
                })?;

        let requests = self.parse_toml(&content, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            count = requests.len(),
            "loaded rule file"
        );
        Ok(requests)
    }

    /// TOML 문자열을 파싱하여 갱신 요청 목록을 만듭니다.
    pub fn parse_toml(&self, content: &str, source: &str) -> Result<Vec<RuleRequest>, MapDbError> {
        let file: RuleFile = toml::from_str(content).map_err(|e| MapDbError::RuleLoad {
            path: source.to_owned(),
            reason: format!("TOML parse error: {e}"),
        })?;

        if file.rules.len() > self.max_rules {
            return Err(MapDbError::RuleLoad {
                path: source.to_owned(),
                reason: format!(
                    "too many rules: {} (max {})",
                    file.rules.len(),
                    self.max_rules
                ),
            });
        }

        let mut seen = HashSet::new();
        let mut requests = Vec::with_capacity(file.rules.len());
        for entry in file.rules {
            let request = entry.into_request()?;
            let key = request.rule.key();
            if !seen.insert(key) {
                tracing::warn!(
                    rule = %key,
                    source,
                    "duplicate rule in file, skipping"
                );
                continue;
            }
            requests.push(request);
        }
        Ok(requests)
    }
}
