//! `spm rules` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use spm_core::config::SpmConfig;
use spm_mapdb::{MapDb, Rule, RuleLoader, RuleType, TableStats};

use super::{RejectedRule, load_table, rules_path};
use crate::cli::{RulesAction, RulesArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `rules` command.
pub async fn execute(
    args: RulesArgs,
    config: &SpmConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        RulesAction::Validate { path } => {
            execute_validate(&rules_path(path, config), config, writer).await
        }
        RulesAction::Dump { path, rule_type } => {
            execute_dump(&rules_path(path, config), rule_type, config, writer).await
        }
        RulesAction::Show {
            path,
            id,
            rule_type,
        } => execute_show(&rules_path(path, config), id, rule_type, config, writer).await,
        RulesAction::Stats { path } => {
            execute_stats(&rules_path(path, config), config, writer).await
        }
    }
}

async fn execute_validate(
    path: &Path,
    config: &SpmConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %path.display(), "validating rule file");

    let loader = RuleLoader::new(config.mapdb.rule_max as usize);
    let report = match loader.load_file(path).await {
        Ok(requests) => {
            let db = MapDb::from_config(&config.mapdb);
            let rejected: Vec<_> = db
                .load_requests(&requests)
                .into_iter()
                .filter_map(|(key, result)| {
                    result.err().map(|e| RejectedRule {
                        rule: key.to_string(),
                        error: e.to_string(),
                    })
                })
                .collect();
            RuleValidationReport {
                path: path.display().to_string(),
                valid: rejected.is_empty(),
                entries: requests.len(),
                rules: db.count(),
                rejected,
                errors: Vec::new(),
            }
        }
        Err(e) => RuleValidationReport {
            path: path.display().to_string(),
            valid: false,
            entries: 0,
            rules: 0,
            rejected: Vec::new(),
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Rule(format!(
            "{} is invalid",
            path.display()
        )));
    }
    Ok(())
}

async fn execute_dump(
    path: &Path,
    rule_type: Option<RuleType>,
    config: &SpmConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let table = load_table(path, config).await?;
    let rules: Vec<Rule> = table
        .db
        .dump()
        .filter(|r| rule_type.is_none_or(|t| r.rule_type == t))
        .collect();

    let report = RuleDumpReport {
        path: path.display().to_string(),
        total: rules.len(),
        rules,
    };
    writer.render(&report)
}

async fn execute_show(
    path: &Path,
    id: u32,
    rule_type: RuleType,
    config: &SpmConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let table = load_table(path, config).await?;
    let rule = table
        .db
        .query(id, rule_type)
        .ok_or_else(|| CliError::Command(format!("rule {rule_type}/{id} not found")))?;
    writer.render(&RuleShowReport { rule })
}

async fn execute_stats(
    path: &Path,
    config: &SpmConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let table = load_table(path, config).await?;
    let report = RuleStatsReport {
        path: path.display().to_string(),
        rule_max: config.mapdb.rule_max,
        applied: table.applied,
        rejected: table.rejected.len(),
        stats: table.db.stats(),
    };
    writer.render(&report)
}

// ─── 보고서 ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct RuleValidationReport {
    pub path: String,
    pub valid: bool,
    /// Entries parsed from the file
    pub entries: usize,
    /// Rules live after applying every entry
    pub rules: u32,
    pub rejected: Vec<RejectedRule>,
    pub errors: Vec<String>,
}

impl Render for RuleValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Rule Validation: {}", self.path.bold())?;
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
        }
        writeln!(
            w,
            "  Entries: {}, live rules: {}, rejected: {}",
            self.entries,
            self.rules,
            if self.rejected.is_empty() {
                "0".normal()
            } else {
                self.rejected.len().to_string().red()
            }
        )?;

        for r in &self.rejected {
            writeln!(w, "  Rejected {}: {}", r.rule.yellow(), r.error)?;
        }
        for e in &self.errors {
            writeln!(w, "  Error: {}", e.red())?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct RuleDumpReport {
    pub path: String,
    pub total: usize,
    pub rules: Vec<Rule>,
}

impl Render for RuleDumpReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Rules in {} ({} total)",
            self.path,
            self.total.to_string().bold()
        )?;
        writeln!(w)?;
        writeln!(
            w,
            "{:<12} {:<10} {:<10} {:<8} Flags",
            "ID", "Type", "Precedence", "Output"
        )?;
        writeln!(w, "{}", "-".repeat(60))?;

        for r in &self.rules {
            let flags = if r.rule_type == RuleType::Mesh {
                r.mesh_flags
            } else {
                r.sawf_flags
            };
            writeln!(
                w,
                "{:<12} {:<10} {:<10} {:<8} {:#010x}",
                r.id,
                r.rule_type.as_str().cyan(),
                r.precedence,
                r.output.rule_output,
                flags
            )?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct RuleShowReport {
    pub rule: Rule,
}

impl Render for RuleShowReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let r = &self.rule;
        writeln!(w, "Rule {}", r.key().to_string().bold())?;
        writeln!(w, "  {}", r.summary())?;
        writeln!(w, "  mesh_flags:       {:#010x}", r.mesh_flags)?;
        writeln!(w, "  sawf_flags:       {:#010x}", r.sawf_flags)?;
        writeln!(w, "  dscp_remark:      {}", r.output.dscp_remark)?;
        writeln!(w, "  vlan_pcp_remark:  {}", r.output.vlan_pcp_remark)?;
        writeln!(w, "  service_class_id: {}", r.output.service_class_id)?;
        writeln!(w, "  mscs_tid_bitmap:  {:#04x}", r.output.mscs_tid_bitmap)?;
        writeln!(
            w,
            "  latency:          dl {}ms/{}B, ul {}ms/{}B",
            r.output.service_interval_dl,
            r.output.burst_size_dl,
            r.output.service_interval_ul,
            r.output.burst_size_ul
        )?;
        Ok(())
    }
}

#[derive(Serialize)]
pub struct RuleStatsReport {
    pub path: String,
    pub rule_max: u32,
    pub applied: usize,
    pub rejected: usize,
    pub stats: TableStats,
}

impl Render for RuleStatsReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Rule Table: {}", self.path.bold())?;
        writeln!(
            w,
            "  Rules: {}/{} ({} buckets occupied)",
            self.stats.rules, self.rule_max, self.stats.occupied_buckets
        )?;
        for (rule_type, count) in &self.stats.per_type {
            writeln!(w, "    {:<10} {}", rule_type.as_str(), count)?;
        }
        if self.rejected > 0 {
            writeln!(
                w,
                "  Rejected while loading: {}",
                self.rejected.to_string().red()
            )?;
        }
        Ok(())
    }
}
