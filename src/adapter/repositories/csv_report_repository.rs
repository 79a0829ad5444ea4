//! CSV Report Repository Implementation
//!
//! ReportRepositoryのCSV実装（`;` 区切り）

use anyhow::{anyhow, Context, Result};
use csv::{Writer, WriterBuilder};

use crate::domain::entities::ledger::ErrorLedger;
use crate::domain::entities::outcome::ProcessingOutcome;
use crate::domain::repositories::report_repository::ReportRepository;

const MANIFEST_HEADER: [&str; 4] = ["sku", "pzns_in_set", "bundle type", "cross-country"];
const LEDGER_HEADER: [&str; 2] = ["PZN Bundle", "PZN with image missing"];

/// CSVベースのレポートリポジトリ
pub struct CsvReportRepository {
    delimiter: u8,
}

impl CsvReportRepository {
    pub fn new() -> Self {
        Self { delimiter: b';' }
    }

    fn writer(&self) -> Writer<Vec<u8>> {
        WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new())
    }

    fn finish(writer: Writer<Vec<u8>>) -> Result<Vec<u8>> {
        writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush CSV: {}", e.error()))
    }
}

impl Default for CsvReportRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRepository for CsvReportRepository {
    fn render_manifest(&self, outcomes: &[ProcessingOutcome]) -> Result<Vec<u8>> {
        let mut writer = self.writer();
        writer
            .write_record(MANIFEST_HEADER)
            .context("Failed to write manifest header")?;

        for outcome in outcomes {
            let cross_country = if outcome.cross_country { "Yes" } else { "No" };
            writer
                .write_record([
                    outcome.bundle_code.as_str(),
                    outcome.members_joined().as_str(),
                    outcome.category.label().as_str(),
                    cross_country,
                ])
                .context(format!("Failed to write manifest row {}", outcome.bundle_code))?;
        }

        Self::finish(writer)
    }

    fn render_ledger(&self, ledger: &ErrorLedger) -> Result<Vec<u8>> {
        let mut writer = self.writer();
        writer
            .write_record(LEDGER_HEADER)
            .context("Failed to write ledger header")?;

        for summary in ledger.aggregate() {
            writer
                .write_record([summary.bundle_code.as_str(), summary.missing_joined().as_str()])
                .context(format!("Failed to write ledger row {}", summary.bundle_code))?;
        }

        Self::finish(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::input_row::InputRow;

    fn outcome(bundle: &str, members: &str, cross_country: bool) -> ProcessingOutcome {
        let row = InputRow::parse(bundle, members).unwrap();
        let mut outcome = ProcessingOutcome::for_row(&row);
        outcome.cross_country = cross_country;
        outcome
    }

    #[test]
    fn test_render_manifest() {
        let repo = CsvReportRepository::new();
        let outcomes = vec![outcome("B1", "100,100", false), outcome("B2", "200,300", true)];

        let csv = String::from_utf8(repo.render_manifest(&outcomes).unwrap()).unwrap();

        assert_eq!(
            csv,
            "sku;pzns_in_set;bundle type;cross-country\n\
             B1;100,100;bundle of 2;No\n\
             B2;200,300;mixed;Yes\n"
        );
    }

    #[test]
    fn test_render_manifest_empty() {
        let repo = CsvReportRepository::new();
        let csv = String::from_utf8(repo.render_manifest(&[]).unwrap()).unwrap();
        assert_eq!(csv, "sku;pzns_in_set;bundle type;cross-country\n");
    }

    #[test]
    fn test_render_ledger_aggregates() {
        let repo = CsvReportRepository::new();
        let mut ledger = ErrorLedger::new();
        ledger.record("B2", "300");
        ledger.record("B4", "700");
        ledger.record("B2", "250");
        ledger.record("B2", "300");

        let csv = String::from_utf8(repo.render_ledger(&ledger).unwrap()).unwrap();

        assert_eq!(
            csv,
            "PZN Bundle;PZN with image missing\nB2;250,300\nB4;700\n"
        );
    }

    #[test]
    fn test_render_quotes_fields_containing_delimiter() {
        let repo = CsvReportRepository::new();
        let outcomes = vec![outcome("B;1", "100", false)];

        let csv = String::from_utf8(repo.render_manifest(&outcomes).unwrap()).unwrap();

        assert!(csv.contains("\"B;1\";100;bundle of 1;No"));
    }
}
