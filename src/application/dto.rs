// ============================================================
// Layer 2 — Request / Response Types
// ============================================================
// The JSON shapes clients exchange with the prediction service.
// Field names are part of the contract — changing one breaks
// every integration, so they are pinned by serde tests below.
//
// Reference: Rust Book §10 (Derive Macros)

use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerRecord;

/// One customer to score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub tenure:            i64,
    pub phone_service:     String,
    pub contract:          String,
    pub paperless_billing: String,
    pub payment_method:    String,
    pub monthly_charges:   f64,
    pub total_charges:     f64,

    /// Optional caller-side identifier, echoed back untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

/// The service's answer for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Sigmoid output, in [0, 1]
    pub churn_probability: f64,

    /// "Yes" when churn_probability is above the threshold
    pub churn_prediction: String,

    /// Echo of the request's identifier; an explicit null when the
    /// caller sent none
    pub customer_id: Option<String>,
}

impl From<PredictionRequest> for CustomerRecord {
    fn from(request: PredictionRequest) -> Self {
        Self {
            customer_id:       request.customer_id,
            tenure:            request.tenure,
            phone_service:     request.phone_service,
            contract:          request.contract,
            paperless_billing: request.paperless_billing,
            payment_method:    request.payment_method,
            monthly_charges:   request.monthly_charges,
            total_charges:     request.total_charges,
            churn:             None,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parses_contract_field_names() {
        let json = r#"{
            "tenure": 12,
            "phone_service": "Yes",
            "contract": "Month-to-month",
            "paperless_billing": "No",
            "payment_method": "Electronic check",
            "monthly_charges": 70.35,
            "total_charges": 820.5,
            "customer_id": "7590-VHVEG"
        }"#;

        let request: PredictionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.tenure, 12);
        assert_eq!(request.payment_method, "Electronic check");
        assert_eq!(request.customer_id.as_deref(), Some("7590-VHVEG"));
    }

    #[test]
    fn test_customer_id_is_optional() {
        let json = r#"{
            "tenure": 1,
            "phone_service": "No",
            "contract": "One year",
            "paperless_billing": "Yes",
            "payment_method": "Mailed check",
            "monthly_charges": 20.0,
            "total_charges": 20.0
        }"#;

        let request: PredictionRequest = serde_json::from_str(json).unwrap();
        assert!(request.customer_id.is_none());
    }

    #[test]
    fn test_request_converts_to_unlabelled_record() {
        let request = PredictionRequest {
            tenure:            3,
            phone_service:     "Yes".to_string(),
            contract:          "Two year".to_string(),
            paperless_billing: "Yes".to_string(),
            payment_method:    "Mailed check".to_string(),
            monthly_charges:   45.0,
            total_charges:     135.0,
            customer_id:       Some("0001".to_string()),
        };

        let record: CustomerRecord = request.into();
        assert_eq!(record.customer_id.as_deref(), Some("0001"));
        assert!(record.churn.is_none());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_response_serialises_contract_field_names() {
        let response = PredictionResponse {
            churn_probability: 0.87,
            churn_prediction:  "Yes".to_string(),
            customer_id:       Some("7590-VHVEG".to_string()),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"churn_probability\":0.87"));
        assert!(json.contains("\"churn_prediction\":\"Yes\""));
        assert!(json.contains("\"customer_id\":\"7590-VHVEG\""));
    }

    #[test]
    fn test_response_serialises_missing_customer_id_as_null() {
        let response = PredictionResponse {
            churn_probability: 0.12,
            churn_prediction:  "No".to_string(),
            customer_id:       None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"customer_id\":null"));
    }
}
