//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use spm_core::types::MacAddr;
use spm_mapdb::RuleType;

/// spm -- packet priority mapping rule engine.
///
/// Use `spm <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "spm", version, about, long_about = None)]
pub struct Cli {
    /// Path to the spm.toml configuration file.
    #[arg(short, long, default_value = "spm.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect and validate rule files.
    Rules(RulesArgs),

    /// Classify one packet against a rule file.
    Classify(ClassifyArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- rules ----

/// Inspect and validate rule files.
#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub action: RulesAction,
}

#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// Parse a rule file and apply it to an empty table, reporting rejected entries.
    Validate {
        /// Rule file (default: `mapdb.rules_path` from the configuration).
        path: Option<PathBuf>,
    },
    /// List rules in descending precedence order.
    Dump {
        /// Rule file (default: `mapdb.rules_path` from the configuration).
        path: Option<PathBuf>,

        /// Only list rules of this type.
        #[arg(long = "type", value_parser = parse_rule_type)]
        rule_type: Option<RuleType>,
    },
    /// Show a single rule by id and type.
    Show {
        /// Rule file (default: `mapdb.rules_path` from the configuration).
        path: Option<PathBuf>,

        /// Rule id.
        #[arg(long)]
        id: u32,

        /// Rule type (mesh, sawf, sawf_scs, scs, mscs).
        #[arg(long = "type", default_value = "sawf", value_parser = parse_rule_type)]
        rule_type: RuleType,
    },
    /// Show per-type rule counts and bucket occupancy.
    Stats {
        /// Rule file (default: `mapdb.rules_path` from the configuration).
        path: Option<PathBuf>,
    },
}

fn parse_rule_type(s: &str) -> Result<RuleType, String> {
    s.parse()
}

// ---- classify ----

/// Classification flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Flavor {
    /// Mesh PCP decision.
    Mesh,
    /// SAWF decision (SAWF, then SAWF_SCS rules).
    Sawf,
    /// SCS priority.
    Scs,
    /// MSCS TID bitmap check of the current priority.
    Mscs,
    /// Wireless latency parameters.
    Latency,
}

/// Classify one packet described by flags.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Rule file (default: `mapdb.rules_path` from the configuration).
    pub path: Option<PathBuf>,

    /// Which decision to compute.
    #[arg(long, default_value = "mesh")]
    pub flavor: Flavor,

    /// Source MAC address.
    #[arg(long)]
    pub src_mac: Option<MacAddr>,

    /// Destination MAC address.
    #[arg(long)]
    pub dst_mac: Option<MacAddr>,

    /// MAC address of the device itself.
    #[arg(long)]
    pub dev_addr: Option<MacAddr>,

    /// Interface index of the device.
    #[arg(long, default_value_t = 0)]
    pub ifindex: u32,

    /// Source IP address (IPv4 or IPv6). Omit for a non-IP frame.
    #[arg(long, requires = "dst_ip")]
    pub src_ip: Option<IpAddr>,

    /// Destination IP address (same family as --src-ip).
    #[arg(long, requires = "src_ip")]
    pub dst_ip: Option<IpAddr>,

    /// IP protocol number (6 = TCP, 17 = UDP).
    #[arg(long, default_value_t = 0)]
    pub protocol: u8,

    /// Source transport port.
    #[arg(long, default_value_t = 0)]
    pub src_port: u16,

    /// Destination transport port.
    #[arg(long, default_value_t = 0)]
    pub dst_port: u16,

    /// 6-bit DSCP value.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..64))]
    pub dscp: u8,

    /// 802.1Q TCI of a tagged frame.
    #[arg(long)]
    pub vlan_tci: Option<u16>,

    /// Security parameter index.
    #[arg(long, default_value_t = 0)]
    pub spi: u32,

    /// Current link-layer priority of the frame.
    #[arg(long, default_value_t = 0)]
    pub priority: u8,
}

// ---- config ----

/// Manage spm configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, mapdb).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::try_parse_from(["spm", "config", "validate"]).expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("spm.toml"));
        assert!(cli.log_level.is_none());
        assert!(matches!(cli.output, OutputFormat::Text));
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "spm",
            "rules",
            "validate",
            "--output",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("parse succeeded");
        assert!(matches!(cli.output, OutputFormat::Json));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_cli_parse_rules_dump_with_type() {
        let cli = Cli::try_parse_from(["spm", "rules", "dump", "r.toml", "--type", "sawf-scs"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Rules(RulesArgs {
                action: RulesAction::Dump { path, rule_type },
            }) => {
                assert_eq!(path, Some(PathBuf::from("r.toml")));
                assert_eq!(rule_type, Some(RuleType::SawfScs));
            }
            _ => panic!("expected rules dump command"),
        }
    }

    #[test]
    fn test_cli_parse_rules_show_requires_id() {
        assert!(Cli::try_parse_from(["spm", "rules", "show"]).is_err());

        let cli = Cli::try_parse_from(["spm", "rules", "show", "--id", "7", "--type", "scs"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Rules(RulesArgs {
                action: RulesAction::Show { path, id, rule_type },
            }) => {
                assert!(path.is_none());
                assert_eq!(id, 7);
                assert_eq!(rule_type, RuleType::Scs);
            }
            _ => panic!("expected rules show command"),
        }
    }

    #[test]
    fn test_cli_parse_rules_invalid_type() {
        let result = Cli::try_parse_from(["spm", "rules", "dump", "--type", "bogus"]);
        assert!(result.is_err(), "unknown rule type should be rejected");
    }

    #[test]
    fn test_cli_parse_classify_fields() {
        let cli = Cli::try_parse_from([
            "spm",
            "classify",
            "rules.toml",
            "--flavor",
            "sawf",
            "--src-ip",
            "10.0.0.1",
            "--dst-ip",
            "10.0.0.2",
            "--protocol",
            "17",
            "--dst-port",
            "5004",
            "--dscp",
            "46",
            "--src-mac",
            "02:00:00:00:00:01",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Classify(args) => {
                assert_eq!(args.flavor, Flavor::Sawf);
                assert_eq!(args.dscp, 46);
                assert_eq!(args.dst_port, 5004);
                assert_eq!(args.src_mac, Some(MacAddr::new([2, 0, 0, 0, 0, 1])));
            }
            _ => panic!("expected classify command"),
        }
    }

    #[test]
    fn test_cli_parse_classify_dscp_out_of_range() {
        let result = Cli::try_parse_from(["spm", "classify", "--dscp", "64"]);
        assert!(result.is_err(), "dscp is a 6-bit value");
    }

    #[test]
    fn test_cli_parse_classify_ip_pair_required() {
        let result = Cli::try_parse_from(["spm", "classify", "--src-ip", "10.0.0.1"]);
        assert!(result.is_err(), "--src-ip requires --dst-ip");
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["spm", "config", "show", "--section", "mapdb"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(ConfigArgs {
                action: ConfigAction::Show { section },
            }) => assert_eq!(section.as_deref(), Some("mapdb")),
            _ => panic!("expected config show command"),
        }
    }
}
