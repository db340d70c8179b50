use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::LedgerError;

use super::ReportPayload;

/// Lays a computed payload out as a document.
pub trait ReportRenderer {
    /// File extension of the rendered document, without the dot.
    fn extension(&self) -> &'static str;

    fn render(&self, payload: &ReportPayload) -> Result<Vec<u8>, LedgerError>;
}

/// Renders the payload as JSON for downstream layout tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportRenderer {
    pub pretty: bool,
}

impl JsonReportRenderer {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ReportRenderer for JsonReportRenderer {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, payload: &ReportPayload) -> Result<Vec<u8>, LedgerError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(payload)?
        } else {
            serde_json::to_vec(payload)?
        };
        Ok(bytes)
    }
}

/// Renders into `<dir>/<file_stem>.<extension>` and returns the written path.
pub fn write_report(
    renderer: &dyn ReportRenderer,
    payload: &ReportPayload,
    dir: &Path,
) -> Result<PathBuf, LedgerError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", payload.file_stem, renderer.extension()));
    let bytes = renderer.render(payload)?;
    fs::write(&path, bytes)?;
    info!(path = %path.display(), "report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::ledger::{Ledger, PeriodFilter};
    use crate::report::build_report;

    #[test]
    fn json_report_lands_under_its_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let payload = build_report(&Ledger::default(), PeriodFilter::Year(2024), &Settings::default());
        let path = write_report(&JsonReportRenderer::pretty(), &payload, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "Annual_Report_2024.json");
        let back: ReportPayload = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(back, payload);
    }
}
