// ============================================================
// Layer 4 — CSV Record Loader
// ============================================================
// Loads customer records from a headered CSV file.
//
// The classic telco export and our own snake_case exports use
// different header spellings, so every column is resolved
// through an alias list ("PaymentMethod" or "payment_method",
// "customerID" or "customer_id", ...).
//
// Cleaning rules applied per row:
//   - TotalCharges empty or unparseable     → 0.0
//     (brand-new customers have a blank cell there)
//   - tenure or MonthlyCharges unparseable  → row skipped with a
//     warning, never a hard failure
//   - Churn must be "Yes" or "No" when the column exists;
//     anything else skips the row
//
// One bad row must not kill a 7000-row import, so row-level
// problems are logged and skipped while file-level problems
// (missing file, missing header) are real errors.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use csv::StringRecord;

use crate::domain::customer::CustomerRecord;
use crate::domain::traits::RecordSource;

/// Loads all records from a single CSV file.
/// Implements the RecordSource trait from Layer 3.
pub struct CsvRecordSource {
    /// Path to the CSV file
    path: String,
}

impl CsvRecordSource {
    /// Create a new CsvRecordSource pointed at a file
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for CsvRecordSource {
    fn load_all(&self) -> Result<Vec<CustomerRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open CSV file '{}'", self.path))?;

        let headers = reader
            .headers()
            .with_context(|| format!("Cannot read CSV header in '{}'", self.path))?
            .clone();
        let columns = ColumnIndex::resolve(&headers)?;

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (i, row) in reader.records().enumerate() {
            let row = row.with_context(|| format!("CSV read error in '{}'", self.path))?;
            // Header is line 1, so the first data row is line 2
            let line = i + 2;

            match columns.parse_row(&row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("Skipping line {} of '{}': {}", line, self.path, e);
                }
            }
        }

        tracing::info!(
            "Loaded {} records from '{}' ({} skipped)",
            records.len(),
            self.path,
            skipped
        );
        Ok(records)
    }
}

// ─── Header Resolution ────────────────────────────────────────────────────────
/// Column positions after alias resolution. The id and label
/// columns are optional; everything else must exist.
struct ColumnIndex {
    customer_id:       Option<usize>,
    tenure:            usize,
    phone_service:     usize,
    contract:          usize,
    paperless_billing: usize,
    payment_method:    usize,
    monthly_charges:   usize,
    total_charges:     usize,
    churn:             Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |aliases: &[&str]| -> Option<usize> {
            headers
                .iter()
                .position(|h| aliases.iter().any(|a| h == *a))
        };
        let require = |aliases: &[&str]| -> Result<usize> {
            match find(aliases) {
                Some(i) => Ok(i),
                None => bail!("missing required CSV column '{}'", aliases[0]),
            }
        };

        Ok(Self {
            customer_id:       find(&["customer_id", "customerID"]),
            tenure:            require(&["tenure"])?,
            phone_service:     require(&["phone_service", "PhoneService"])?,
            contract:          require(&["contract", "Contract"])?,
            paperless_billing: require(&["paperless_billing", "PaperlessBilling"])?,
            payment_method:    require(&["payment_method", "PaymentMethod"])?,
            monthly_charges:   require(&["monthly_charges", "MonthlyCharges"])?,
            total_charges:     require(&["total_charges", "TotalCharges"])?,
            churn:             find(&["churn", "Churn"]),
        })
    }

    fn parse_row(&self, row: &StringRecord) -> Result<CustomerRecord> {
        let cell = |i: usize| row.get(i).unwrap_or("");

        let tenure: i64 = cell(self.tenure)
            .parse()
            .with_context(|| format!("tenure '{}' is not an integer", cell(self.tenure)))?;

        let monthly_charges: f64 = cell(self.monthly_charges).parse().with_context(|| {
            format!(
                "monthly_charges '{}' is not a number",
                cell(self.monthly_charges)
            )
        })?;

        // Blank for customers in their first billing cycle
        let total_charges: f64 = cell(self.total_charges).parse().unwrap_or(0.0);

        let churn = match self.churn.map(cell) {
            None | Some("") => None,
            Some("Yes") => Some(true),
            Some("No") => Some(false),
            Some(other) => bail!("churn label '{}' is neither 'Yes' nor 'No'", other),
        };

        let mut record = CustomerRecord::new(
            tenure,
            cell(self.phone_service),
            cell(self.contract),
            cell(self.paperless_billing),
            cell(self.payment_method),
            monthly_charges,
            total_charges,
        );
        if let Some(i) = self.customer_id {
            let id = cell(i);
            if !id.is_empty() {
                record = record.with_customer_id(id);
            }
        }
        if let Some(churned) = churn {
            record = record.with_churn(churned);
        }
        Ok(record)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_loads_telco_headers() {
        let f = write_csv(
            "customerID,tenure,PhoneService,Contract,PaperlessBilling,PaymentMethod,MonthlyCharges,TotalCharges,Churn\n\
             0001-A,12,Yes,Month-to-month,Yes,Electronic check,70.35,820.5,No\n\
             0002-B,48,No,Two year,No,Mailed check,20.0,960.0,Yes\n",
        );
        let records = CsvRecordSource::new(f.path().to_str().unwrap())
            .load_all()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].customer_id.as_deref(), Some("0001-A"));
        assert_eq!(records[0].churn, Some(false));
        assert_eq!(records[1].tenure, 48);
        assert_eq!(records[1].churn, Some(true));
    }

    #[test]
    fn test_loads_snake_case_headers() {
        let f = write_csv(
            "tenure,phone_service,contract,paperless_billing,payment_method,monthly_charges,total_charges,churn\n\
             5,Yes,One year,No,Credit card (automatic),55.0,275.0,No\n",
        );
        let records = CsvRecordSource::new(f.path().to_str().unwrap())
            .load_all()
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].contract, "One year");
        assert!(records[0].customer_id.is_none());
    }

    #[test]
    fn test_empty_total_charges_becomes_zero() {
        let f = write_csv(
            "tenure,PhoneService,Contract,PaperlessBilling,PaymentMethod,MonthlyCharges,TotalCharges,Churn\n\
             0,Yes,Month-to-month,Yes,Electronic check,45.0,,No\n",
        );
        let records = CsvRecordSource::new(f.path().to_str().unwrap())
            .load_all()
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_charges, 0.0);
    }

    #[test]
    fn test_bad_tenure_row_is_skipped_not_fatal() {
        let f = write_csv(
            "tenure,PhoneService,Contract,PaperlessBilling,PaymentMethod,MonthlyCharges,TotalCharges,Churn\n\
             twelve,Yes,Month-to-month,Yes,Electronic check,45.0,540.0,No\n\
             8,No,One year,No,Mailed check,30.0,240.0,Yes\n",
        );
        let records = CsvRecordSource::new(f.path().to_str().unwrap())
            .load_all()
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tenure, 8);
    }

    #[test]
    fn test_missing_required_column_is_an_error() {
        let f = write_csv("tenure,PhoneService\n1,Yes\n");
        let result = CsvRecordSource::new(f.path().to_str().unwrap()).load_all();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = CsvRecordSource::new("does/not/exist.csv").load_all();
        assert!(result.is_err());
    }
}
