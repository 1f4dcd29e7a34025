// ============================================================
// Layer 3 — Customer Record Domain Type
// ============================================================
// Represents a single telco customer as the rest of the system
// sees it: four categorical attributes, three numeric usage
// attributes, and an optional churn label.
//
// This is a plain data struct. Parsing (CSV headers, empty
// TotalCharges cells) happens in the data layer; tensor bridging
// happens behind the feature encoder. By the time a
// CustomerRecord exists, the values are typed but NOT yet
// validated — call validate() before encoding.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

use crate::domain::errors::ChurnError;

/// One customer, labelled or not.
///
/// `churn` is `Some(true)` when the customer left, `Some(false)`
/// when they stayed, and `None` for records that only exist to be
/// scored (prediction requests).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Upstream identifier, echoed back in prediction responses
    pub customer_id: Option<String>,

    /// Months the customer has been with the company
    pub tenure: i64,

    /// "Yes" / "No"
    pub phone_service: String,

    /// e.g. "Month-to-month", "One year", "Two year"
    pub contract: String,

    /// "Yes" / "No"
    pub paperless_billing: String,

    /// e.g. "Electronic check", "Mailed check", "Credit card (automatic)"
    pub payment_method: String,

    /// Current monthly charge in account currency
    pub monthly_charges: f64,

    /// Lifetime charges; 0.0 for brand-new customers
    pub total_charges: f64,

    /// Ground-truth churn label, when known
    pub churn: Option<bool>,
}

impl CustomerRecord {
    /// Create an unlabelled record from its feature values.
    /// Uses impl Into<String> so callers can pass &str or String.
    pub fn new(
        tenure:            i64,
        phone_service:     impl Into<String>,
        contract:          impl Into<String>,
        paperless_billing: impl Into<String>,
        payment_method:    impl Into<String>,
        monthly_charges:   f64,
        total_charges:     f64,
    ) -> Self {
        Self {
            customer_id:       None,
            tenure,
            phone_service:     phone_service.into(),
            contract:          contract.into(),
            paperless_billing: paperless_billing.into(),
            payment_method:    payment_method.into(),
            monthly_charges,
            total_charges,
            churn:             None,
        }
    }

    /// Attach a churn label (builder style, used heavily in tests)
    pub fn with_churn(mut self, churned: bool) -> Self {
        self.churn = Some(churned);
        self
    }

    /// Attach the upstream customer identifier
    pub fn with_customer_id(mut self, id: impl Into<String>) -> Self {
        self.customer_id = Some(id.into());
        self
    }

    /// Check the record is encodable.
    ///
    /// Rules:
    ///   - tenure must be >= 0
    ///   - both charge fields must be finite and >= 0
    ///   - every categorical value must be non-empty
    ///
    /// Violations are `ChurnError::InvalidRecord` so service callers
    /// get a typed rejection rather than a crash further down.
    pub fn validate(&self) -> Result<(), ChurnError> {
        if self.tenure < 0 {
            return Err(ChurnError::InvalidRecord(format!(
                "tenure must be >= 0, got {}",
                self.tenure
            )));
        }
        for (name, value) in [
            ("monthly_charges", self.monthly_charges),
            ("total_charges", self.total_charges),
        ] {
            if !value.is_finite() {
                return Err(ChurnError::InvalidRecord(format!(
                    "{name} must be a finite number"
                )));
            }
            if value < 0.0 {
                return Err(ChurnError::InvalidRecord(format!(
                    "{name} must be >= 0, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("phone_service", &self.phone_service),
            ("contract", &self.contract),
            ("paperless_billing", &self.paperless_billing),
            ("payment_method", &self.payment_method),
        ] {
            if value.trim().is_empty() {
                return Err(ChurnError::InvalidRecord(format!("{name} is empty")));
            }
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CustomerRecord {
        CustomerRecord::new(
            12,
            "Yes",
            "Month-to-month",
            "No",
            "Electronic check",
            70.35,
            820.5,
        )
    }

    #[test]
    fn test_valid_record_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_negative_monthly_charges_rejected() {
        let mut r = sample();
        r.monthly_charges = -10.0;
        let err = r.validate().unwrap_err();
        assert!(matches!(err, ChurnError::InvalidRecord(_)));
    }

    #[test]
    fn test_negative_tenure_rejected() {
        let mut r = sample();
        r.tenure = -1;
        assert!(matches!(
            r.validate().unwrap_err(),
            ChurnError::InvalidRecord(_)
        ));
    }

    #[test]
    fn test_nan_total_charges_rejected() {
        let mut r = sample();
        r.total_charges = f64::NAN;
        assert!(matches!(
            r.validate().unwrap_err(),
            ChurnError::InvalidRecord(_)
        ));
    }

    #[test]
    fn test_empty_category_rejected() {
        let mut r = sample();
        r.contract = "  ".to_string();
        assert!(matches!(
            r.validate().unwrap_err(),
            ChurnError::InvalidRecord(_)
        ));
    }

    #[test]
    fn test_builder_attaches_label_and_id() {
        let r = sample().with_churn(true).with_customer_id("0001-ABCD");
        assert_eq!(r.churn, Some(true));
        assert_eq!(r.customer_id.as_deref(), Some("0001-ABCD"));
    }
}
