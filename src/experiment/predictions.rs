use crate::error::ExperimentError;
use csv::WriterBuilder;

/// The prediction for one test row.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Class index of the predicted label.
    pub predicted: usize,
    /// Class probabilities in class-index order.
    pub distribution: Vec<f64>,
    /// Class index of the true label, if the row has one.
    pub actual: Option<usize>,
}

impl Prediction {
    pub fn new(predicted: usize, distribution: Vec<f64>, actual: Option<usize>) -> Self {
        Self {
            predicted,
            distribution,
            actual,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PredictionRow {
    repeat: usize,
    fold: usize,
    sample: Option<usize>,
    row_id: usize,
    prediction: Prediction,
}

/// The predictions of a run, one row per test row of every split.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTable {
    class_labels: Vec<String>,
    has_samples: bool,
    rows: Vec<PredictionRow>,
}

impl PredictionTable {
    pub fn new(class_labels: Vec<String>, has_samples: bool) -> Self {
        Self {
            class_labels,
            has_samples,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec!["repeat".to_string(), "fold".to_string()];
        if self.has_samples {
            columns.push("sample".to_string());
        }
        columns.push("row_id".to_string());
        columns.push("prediction".to_string());
        columns.extend(self.class_labels.iter().map(|label| format!("confidence.{}", label)));
        columns.push("correct".to_string());
        columns
    }

    /// Adds the predictions of one split. `row_ids[i]` is the dataset row `predictions[i]` is for.
    pub fn add_batch(
        &mut self,
        repeat: usize,
        fold: usize,
        sample: Option<usize>,
        row_ids: &[usize],
        predictions: Vec<Prediction>,
    ) -> Result<(), ExperimentError> {
        if row_ids.len() != predictions.len() {
            return Err(ExperimentError::BatchSizeMismatch {
                predictions: predictions.len(),
                rows: row_ids.len(),
            });
        }

        let num_classes = self.class_labels.len();
        for (&row_id, prediction) in row_ids.iter().zip(&predictions) {
            let out_of_range = prediction.predicted >= num_classes
                || prediction.actual.is_some_and(|actual| actual >= num_classes)
                || prediction.distribution.len() > num_classes;
            if out_of_range {
                return Err(ExperimentError::UnknownClassIndex(row_id));
            }
        }

        self.rows.extend(
            row_ids
                .iter()
                .zip(predictions)
                .map(|(&row_id, prediction)| PredictionRow {
                    repeat,
                    fold,
                    sample,
                    row_id,
                    prediction,
                }),
        );
        Ok(())
    }

    pub fn to_csv(&self) -> Result<String, ExperimentError> {
        let table_error = |message: String| ExperimentError::Table {
            table: "predictions".to_string(),
            message,
        };

        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer
            .write_record(self.columns())
            .map_err(|e| table_error(e.to_string()))?;

        for row in &self.rows {
            let mut record = vec![row.repeat.to_string(), row.fold.to_string()];
            if self.has_samples {
                record.push(row.sample.unwrap_or_default().to_string());
            }
            record.push(row.row_id.to_string());
            record.push(self.class_labels[row.prediction.predicted].clone());
            record.extend((0..self.class_labels.len()).map(|class| {
                row.prediction
                    .distribution
                    .get(class)
                    .copied()
                    .unwrap_or(0.0)
                    .to_string()
            }));
            record.push(match row.prediction.actual {
                Some(actual) => self.class_labels[actual].clone(),
                None => "?".to_string(),
            });
            writer
                .write_record(&record)
                .map_err(|e| table_error(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| table_error(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| table_error(e.to_string()))
    }
}
