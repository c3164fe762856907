use anyhow::Result;
use clap::ValueEnum;
use std::io::Write;
use trailstop_indicators::TrendPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for reading in a terminal
    Table,
    /// One CSV row per bar
    Csv,
    /// One JSON object per line
    Json,
}

/// Writes trend points in the selected format.
pub struct ReportWriter<W: Write> {
    format: OutputFormat,
    decimals: u32,
    csv: Option<csv::Writer<W>>,
    out: Option<W>,
    header_written: bool,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W, format: OutputFormat, decimals: u32) -> Self {
        let (csv, out) = match format {
            OutputFormat::Csv => (Some(csv::Writer::from_writer(out)), None),
            _ => (None, Some(out)),
        };
        Self {
            format,
            decimals,
            csv,
            out,
            header_written: false,
        }
    }

    pub fn write(&mut self, point: &TrendPoint) -> Result<()> {
        if let Some(writer) = self.csv.as_mut() {
            writer.serialize(point)?;
            return Ok(());
        }
        let Some(out) = self.out.as_mut() else {
            return Ok(());
        };
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, point)?;
                writeln!(out)?;
            }
            _ => {
                if !self.header_written {
                    writeln!(
                        out,
                        "{:<25} {:>12} {:>12} {:>12} {:>6} {:>6} {:>5}",
                        "timestamp", "close", "true_range", "level", "dir", "ready", "flip"
                    )?;
                    self.header_written = true;
                }
                let direction = point.direction.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
                writeln!(
                    out,
                    "{:<25} {:>12} {:>12} {:>12} {:>6} {:>6} {:>5}",
                    point.timestamp.to_rfc3339(),
                    point.close.round_dp(self.decimals).to_string(),
                    point.true_range.round_dp(self.decimals).to_string(),
                    point.level.round_dp(self.decimals).to_string(),
                    direction,
                    point.ready,
                    if point.flipped { "*" } else { "" },
                )?;
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        if let Some(mut writer) = self.csv.take() {
            writer.flush()?;
        }
        if let Some(mut out) = self.out.take() {
            out.flush()?;
        }
        Ok(())
    }
}
