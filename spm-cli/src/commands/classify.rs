//! `spm classify` command handler

use std::io::Write;
use std::net::IpAddr;

use serde::Serialize;
use tracing::info;

use spm_core::config::SpmConfig;
use spm_core::types::{MacAddr, NetworkLayer, PacketFields};
use spm_mapdb::{LatencyParams, MapDb, PriorityDecision, SawfDecision};

use super::{load_table, rules_path};
use crate::cli::{ClassifyArgs, Flavor};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `classify` command.
pub async fn execute(
    args: ClassifyArgs,
    config: &SpmConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let fields = packet_fields(&args)?;
    let path = rules_path(args.path.clone(), config);
    let table = load_table(&path, config).await?;

    info!(flavor = ?args.flavor, packet = %fields, rules = table.db.count(), "classifying packet");

    let report = ClassifyReport {
        flavor: args.flavor,
        rules: table.db.count(),
        packet: fields,
        decision: classify(&table.db, args.flavor, &fields),
    };
    writer.render(&report)
}

/// Build the normalized packet fields from command-line flags.
pub fn packet_fields(args: &ClassifyArgs) -> Result<PacketFields, CliError> {
    let network = match (args.src_ip, args.dst_ip) {
        (Some(IpAddr::V4(src)), Some(IpAddr::V4(dst))) => NetworkLayer::Ipv4 { src, dst },
        (Some(IpAddr::V6(src)), Some(IpAddr::V6(dst))) => NetworkLayer::Ipv6 { src, dst },
        (None, None) => NetworkLayer::NonIp,
        _ => {
            return Err(CliError::Command(
                "--src-ip and --dst-ip must both be given and share an address family".to_owned(),
            ));
        }
    };

    Ok(PacketFields {
        src_mac: args.src_mac.unwrap_or(MacAddr::ZERO),
        dst_mac: args.dst_mac.unwrap_or(MacAddr::ZERO),
        dev_addr: args.dev_addr.unwrap_or(MacAddr::ZERO),
        ifindex: args.ifindex,
        network,
        protocol: args.protocol,
        src_port: args.src_port,
        dst_port: args.dst_port,
        dscp: args.dscp,
        vlan_tci: args.vlan_tci,
        spi: args.spi,
        priority: args.priority,
    })
}

/// Run one classification flavor.
pub fn classify(db: &MapDb, flavor: Flavor, fields: &PacketFields) -> Decision {
    match flavor {
        Flavor::Mesh => Decision::Pcp {
            pcp: db.classify_mesh(fields),
        },
        Flavor::Sawf => Decision::Sawf(db.classify_sawf(fields)),
        Flavor::Scs => Decision::Priority(db.classify_scs(fields)),
        Flavor::Mscs => Decision::Priority(db.classify_mscs(fields)),
        Flavor::Latency => Decision::Latency(db.get_latency_params(fields)),
    }
}

/// Result of one classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Decision {
    Pcp { pcp: u8 },
    Sawf(SawfDecision),
    Priority(PriorityDecision),
    Latency(LatencyParams),
}

#[derive(Serialize)]
pub struct ClassifyReport {
    #[serde(serialize_with = "serialize_flavor")]
    pub flavor: Flavor,
    pub rules: u32,
    pub packet: PacketFields,
    pub decision: Decision,
}

fn flavor_name(flavor: Flavor) -> &'static str {
    match flavor {
        Flavor::Mesh => "mesh",
        Flavor::Sawf => "sawf",
        Flavor::Scs => "scs",
        Flavor::Mscs => "mscs",
        Flavor::Latency => "latency",
    }
}

fn serialize_flavor<S: serde::Serializer>(flavor: &Flavor, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(flavor_name(*flavor))
}

impl Render for ClassifyReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Classify ({}) against {} rules",
            flavor_name(self.flavor).bold(),
            self.rules
        )?;
        writeln!(w, "  Packet: {}", self.packet)?;

        match self.decision {
            Decision::Pcp { pcp } => {
                writeln!(w, "  PCP: {}", pcp.to_string().green().bold())?;
            }
            Decision::Sawf(d) if d.is_match() => {
                writeln!(w, "  Rule: {}", d.rule_id.to_string().green())?;
                writeln!(w, "  Priority: {}", d.priority)?;
                writeln!(w, "  DSCP remark: {}", d.dscp_remark)?;
                writeln!(w, "  VLAN PCP remark: {}", d.vlan_pcp_remark)?;
                writeln!(w, "  Service class: {}", d.service_class_id)?;
            }
            Decision::Priority(d) if d.is_match() => {
                writeln!(w, "  Rule: {}", d.rule_id.to_string().green())?;
                writeln!(w, "  Priority: {}", d.priority)?;
            }
            Decision::Sawf(_) | Decision::Priority(_) => {
                writeln!(w, "  {}", "NO MATCH".yellow())?;
            }
            Decision::Latency(p) if p.is_zero() => {
                writeln!(w, "  {}", "NO MATCH".yellow())?;
            }
            Decision::Latency(p) => {
                writeln!(
                    w,
                    "  Downlink: interval {} ms, burst {} bytes",
                    p.service_interval_dl, p.burst_size_dl
                )?;
                writeln!(
                    w,
                    "  Uplink:   interval {} ms, burst {} bytes",
                    p.service_interval_ul, p.burst_size_ul
                )?;
            }
        }
        Ok(())
    }
}
