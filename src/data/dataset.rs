use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::encoder::FeatureEncoder;
use crate::domain::customer::CustomerRecord;
use crate::domain::errors::ChurnError;

/// One encoded, labelled training sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnSample {
    pub features: Vec<f32>,
    pub label:    i32,
}

#[derive(Debug)]
pub struct ChurnDataset {
    samples: Vec<ChurnSample>,
}

impl ChurnDataset {
    pub fn new(samples: Vec<ChurnSample>) -> Self {
        Self { samples }
    }

    /// Encode a labelled partition with an already-fitted encoder.
    pub fn from_records(
        encoder: &FeatureEncoder,
        records: &[CustomerRecord],
    ) -> Result<Self, ChurnError> {
        let samples = records
            .iter()
            .map(|record| {
                let churned = record.churn.ok_or_else(|| {
                    ChurnError::InvalidRecord(
                        "record without a churn label cannot join a training set".to_string(),
                    )
                })?;
                Ok(ChurnSample {
                    features: encoder.transform(record)?,
                    label:    churned as i32,
                })
            })
            .collect::<Result<Vec<_>, ChurnError>>()?;
        Ok(Self { samples })
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl Dataset<ChurnSample> for ChurnDataset {
    fn get(&self, index: usize) -> Option<ChurnSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled() -> Vec<CustomerRecord> {
        vec![
            CustomerRecord::new(2, "Yes", "Month-to-month", "Yes", "Electronic check", 75.0, 150.0)
                .with_churn(true),
            CustomerRecord::new(30, "No", "Two year", "No", "Mailed check", 25.0, 750.0)
                .with_churn(false),
        ]
    }

    #[test]
    fn test_from_records_encodes_and_labels() {
        let records = labelled();
        let encoder = FeatureEncoder::fit(&records).unwrap();
        let dataset = ChurnDataset::from_records(&encoder, &records).unwrap();

        assert_eq!(dataset.sample_count(), 2);
        assert_eq!(dataset.get(0).unwrap().label, 1);
        assert_eq!(dataset.get(1).unwrap().label, 0);
        assert!(dataset.get(2).is_none());
    }

    #[test]
    fn test_unlabelled_record_is_rejected() {
        let records = labelled();
        let encoder = FeatureEncoder::fit(&records).unwrap();

        let mut with_unlabelled = records.clone();
        with_unlabelled[1].churn = None;

        assert!(matches!(
            ChurnDataset::from_records(&encoder, &with_unlabelled).unwrap_err(),
            ChurnError::InvalidRecord(_)
        ));
    }
}
