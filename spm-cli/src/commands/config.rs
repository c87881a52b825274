//! `spm config` command handler

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use spm_core::config::SpmConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Sections accepted by `config show --section`.
const SECTIONS: [&str; 2] = ["general", "mapdb"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => check(config_path, writer).await,
        ConfigAction::Show { section } => show(config_path, section, writer).await,
    }
}

/// Strict load: a missing file is an error here, unlike every other command.
async fn check(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "checking configuration");

    let problem = SpmConfig::load(config_path).await.err().map(|e| e.to_string());
    let verdict = ConfigVerdict {
        source: config_path.display().to_string(),
        valid: problem.is_none(),
        problem,
    };
    writer.render(&verdict)?;

    match verdict.problem {
        Some(problem) => Err(CliError::Config(problem)),
        None => Ok(()),
    }
}

async fn show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    if let Some(name) = section.as_deref()
        && !SECTIONS.contains(&name)
    {
        return Err(CliError::Command(format!(
            "unknown section '{name}' (expected one of: {})",
            SECTIONS.join(", ")
        )));
    }

    let config = super::load_config(config_path).await?;
    let mut settings = toml::Value::try_from(&config)
        .map_err(|e| CliError::Command(format!("cannot render configuration: {e}")))?;
    if let Some(name) = section.as_deref()
        && let Some(inner) = settings.get(name).cloned()
    {
        settings = inner;
    }

    writer.render(&EffectiveConfig {
        source: config_path.display().to_string(),
        section,
        settings,
    })
}

/// Effective settings after defaults and `SPM_*` overrides.
#[derive(Serialize)]
pub struct EffectiveConfig {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub settings: toml::Value,
}

impl Render for EffectiveConfig {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "# effective configuration from {}", self.source.dimmed())?;
        if let Some(section) = &self.section {
            writeln!(w, "[{}]", section.bold())?;
        }
        let body = toml::to_string_pretty(&self.settings).map_err(std::io::Error::other)?;
        write!(w, "{body}")
    }
}

/// Result of `config validate`.
#[derive(Serialize)]
pub struct ConfigVerdict {
    pub source: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

impl Render for ConfigVerdict {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match &self.problem {
            None => writeln!(w, "{} {}", "ok".green().bold(), self.source),
            Some(problem) => {
                writeln!(w, "{} {}", "invalid".red().bold(), self.source)?;
                writeln!(w, "  {problem}")
            }
        }
    }
}
