//! Report rendering for `--output text|json`.
//!
//! Command handlers build a report value and hand it to [`OutputWriter`];
//! they never print directly.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Writes reports in the format chosen on the command line.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Write `report` to stdout.
    pub fn render<T: Render + Serialize>(&self, report: &T) -> Result<(), CliError> {
        self.render_to(report, &mut std::io::stdout().lock())
    }

    /// Write `report` to `w`. JSON output is pretty-printed and newline-terminated.
    pub fn render_to<T: Render + Serialize>(
        &self,
        report: &T,
        w: &mut dyn Write,
    ) -> Result<(), CliError> {
        if matches!(self.format, OutputFormat::Json) {
            serde_json::to_writer_pretty(&mut *w, report)?;
            writeln!(w)?;
        } else {
            report.render_text(w)?;
        }
        Ok(())
    }
}

/// Human-readable form of a report.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct PcpReport {
        rule_id: u32,
        pcp: u8,
    }

    impl Render for PcpReport {
        fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
            writeln!(w, "rule {} -> pcp {}", self.rule_id, self.pcp)
        }
    }

    fn write_with(format: OutputFormat) -> String {
        let mut buffer = Vec::new();
        OutputWriter::new(format)
            .render_to(&PcpReport { rule_id: 7, pcp: 5 }, &mut buffer)
            .expect("render");
        String::from_utf8(buffer).expect("utf-8")
    }

    #[test]
    fn test_text_uses_render_impl() {
        assert_eq!(write_with(OutputFormat::Text), "rule 7 -> pcp 5\n");
    }

    #[test]
    fn test_json_is_newline_terminated_object() {
        let out = write_with(OutputFormat::Json);
        assert!(out.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["rule_id"], 7);
        assert_eq!(value["pcp"], 5);
    }
}
