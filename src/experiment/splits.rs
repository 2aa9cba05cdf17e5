use super::{EstimationProcedure, ProcedureKind, Task};
use crate::error::SplitError;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SplitRole {
    Train,
    Test,
}

/// One row of a split-assignment table: the role of a dataset row in one split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAssignment {
    #[serde(rename = "type")]
    pub role: SplitRole,
    #[serde(rename = "rowid")]
    pub row_id: usize,
    #[serde(default)]
    pub repeat: usize,
    #[serde(default)]
    pub fold: usize,
    #[serde(default)]
    pub sample: usize,
}

impl SplitAssignment {
    pub fn new(role: SplitRole, row_id: usize, repeat: usize, fold: usize, sample: usize) -> Self {
        Self {
            role,
            row_id,
            repeat,
            fold,
            sample,
        }
    }
}

/// Reads a split-assignment table with a `type,rowid,repeat,fold,sample` header.
///
/// `repeat`, `fold` and `sample` columns may be absent and default to 0.
pub fn read_assignments<R: Read>(reader: R) -> Result<Vec<SplitAssignment>, SplitError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);
    reader
        .deserialize()
        .map(|record| record.map_err(|e| SplitError::Read(e.to_string())))
        .collect()
}

pub fn write_assignments<W: Write>(
    writer: W,
    assignments: &[SplitAssignment],
) -> Result<(), SplitError> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for assignment in assignments {
        writer
            .serialize(assignment)
            .map_err(|e| SplitError::Write(e.to_string()))?;
    }
    writer.flush().map_err(|e| SplitError::Write(e.to_string()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Split {
    train: Vec<usize>,
    test: Vec<usize>,
}

/// The train/test partition of every (repeat, fold, sample) triple of a task.
///
/// Construction validates the partition: every row id is in range, no row appears twice within a
/// split, and outside learning-curve tasks every dataset row is either trained or tested on in
/// every split. Leave-one-out splits test exactly one row.
#[derive(Debug, Clone)]
pub struct DataSplits {
    procedure: EstimationProcedure,
    dataset_id: u32,
    num_rows: usize,
    repeats: usize,
    folds: usize,
    samples: usize,
    has_samples: bool,
    splits: Vec<Split>,
}

impl DataSplits {
    pub fn new(
        task: &Task,
        procedure: &EstimationProcedure,
        num_rows: usize,
        assignments: &[SplitAssignment],
    ) -> Result<Self, SplitError> {
        if task.estimation_procedure.id != procedure.id {
            return Err(SplitError::IncompatibleProcedure {
                task_procedure: task.estimation_procedure.id,
                given: procedure.id,
            });
        }

        let (repeats, folds) = procedure.dimensions(num_rows);
        let has_samples = task.has_samples();
        let samples = if has_samples {
            assignments.iter().map(|a| a.sample + 1).max().unwrap_or(1)
        } else {
            1
        };

        let mut data_splits = Self {
            procedure: procedure.clone(),
            dataset_id: task.dataset_id,
            num_rows,
            repeats,
            folds,
            samples,
            has_samples,
            splits: vec![Split::default(); repeats * folds * samples],
        };

        for assignment in assignments {
            if assignment.row_id >= num_rows {
                return Err(SplitError::RowOutOfRange {
                    row_id: assignment.row_id,
                    num_rows,
                });
            }
            let index =
                data_splits.index_of(assignment.repeat, assignment.fold, assignment.sample)?;
            let split = &mut data_splits.splits[index];
            match assignment.role {
                SplitRole::Train => split.train.push(assignment.row_id),
                SplitRole::Test => split.test.push(assignment.row_id),
            }
        }

        data_splits.validate()?;
        debug!(
            dataset_id = data_splits.dataset_id,
            repeats, folds, samples, "Materialized data splits"
        );
        Ok(data_splits)
    }

    /// Builds the splits from a CSV split-assignment table.
    pub fn from_csv_reader<R: Read>(
        task: &Task,
        procedure: &EstimationProcedure,
        num_rows: usize,
        reader: R,
    ) -> Result<Self, SplitError> {
        let assignments = read_assignments(reader)?;
        Self::new(task, procedure, num_rows, &assignments)
    }

    fn index_of(&self, repeat: usize, fold: usize, sample: usize) -> Result<usize, SplitError> {
        if repeat >= self.repeats || fold >= self.folds || sample >= self.samples {
            return Err(SplitError::IndexOutOfRange {
                repeat,
                fold,
                sample,
            });
        }
        Ok((repeat * self.folds + fold) * self.samples + sample)
    }

    fn validate(&self) -> Result<(), SplitError> {
        for (repeat, fold, sample) in self.indices() {
            let split = &self.splits[self.index_of(repeat, fold, sample)?];

            if self.procedure.kind == ProcedureKind::LeaveOneOut && split.test.len() != 1 {
                return Err(SplitError::LeaveOneOutSize {
                    fold,
                    size: split.test.len(),
                });
            }

            let mut rows: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
            rows.sort_unstable();
            if let Some(pair) = rows.windows(2).find(|pair| pair[0] == pair[1]) {
                return Err(SplitError::DuplicateRow {
                    row_id: pair[0],
                    repeat,
                    fold,
                    sample,
                });
            }

            // Learning-curve training sets are subsamples.
            if !self.has_samples {
                if let Some(row_id) = (0..self.num_rows).find(|&i| rows.get(i) != Some(&i)) {
                    return Err(SplitError::MissingRow {
                        row_id,
                        repeat,
                        fold,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn train_rows(&self, repeat: usize, fold: usize, sample: usize) -> Result<&[usize], SplitError> {
        Ok(&self.splits[self.index_of(repeat, fold, sample)?].train)
    }

    pub fn test_rows(&self, repeat: usize, fold: usize, sample: usize) -> Result<&[usize], SplitError> {
        Ok(&self.splits[self.index_of(repeat, fold, sample)?].test)
    }

    /// Every (repeat, fold, sample) triple, in execution order.
    pub fn indices(&self) -> impl Iterator<Item = (usize, usize, usize)> {
        iproduct!(0..self.repeats, 0..self.folds, 0..self.samples)
    }

    /// The number of prediction batches a complete run consists of.
    pub fn num_runs(&self) -> usize {
        self.repeats * self.folds * self.samples
    }

    pub fn repeats(&self) -> usize {
        self.repeats
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn has_samples(&self) -> bool {
        self.has_samples
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn dataset_id(&self) -> u32 {
        self.dataset_id
    }

    pub fn procedure(&self) -> &EstimationProcedure {
        &self.procedure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::TaskType;

    fn task(procedure: EstimationProcedure, task_type: TaskType) -> Task {
        Task {
            id: 1,
            task_type,
            estimation_procedure: procedure,
            dataset_id: 61,
            target_feature: "class".to_string(),
            class_labels: vec!["a".to_string(), "b".to_string()],
            missing_labels: false,
        }
    }

    fn holdout_assignments() -> Vec<SplitAssignment> {
        vec![
            SplitAssignment::new(SplitRole::Train, 0, 0, 0, 0),
            SplitAssignment::new(SplitRole::Train, 1, 0, 0, 0),
            SplitAssignment::new(SplitRole::Test, 2, 0, 0, 0),
        ]
    }

    #[test]
    fn holdout_partition() {
        let procedure = EstimationProcedure::holdout(7, 1);
        let task = task(procedure.clone(), TaskType::Classification);
        let splits = DataSplits::new(&task, &procedure, 3, &holdout_assignments()).unwrap();
        assert_eq!(splits.num_runs(), 1);
        assert_eq!(splits.train_rows(0, 0, 0).unwrap(), &[0, 1]);
        assert_eq!(splits.test_rows(0, 0, 0).unwrap(), &[2]);
    }

    #[test]
    fn procedure_must_match_task() {
        let task = task(EstimationProcedure::holdout(7, 1), TaskType::Classification);
        let other = EstimationProcedure::holdout(8, 1);
        assert_eq!(
            DataSplits::new(&task, &other, 3, &holdout_assignments()).unwrap_err(),
            SplitError::IncompatibleProcedure {
                task_procedure: 7,
                given: 8
            }
        );
    }

    #[test]
    fn rows_must_be_partitioned() {
        let procedure = EstimationProcedure::holdout(7, 1);
        let task = task(procedure.clone(), TaskType::Classification);

        let mut duplicated = holdout_assignments();
        duplicated.push(SplitAssignment::new(SplitRole::Test, 0, 0, 0, 0));
        assert!(matches!(
            DataSplits::new(&task, &procedure, 3, &duplicated),
            Err(SplitError::DuplicateRow { row_id: 0, .. })
        ));

        assert!(matches!(
            DataSplits::new(&task, &procedure, 4, &holdout_assignments()),
            Err(SplitError::MissingRow { row_id: 3, .. })
        ));

        assert!(matches!(
            DataSplits::new(&task, &procedure, 2, &holdout_assignments()),
            Err(SplitError::RowOutOfRange { row_id: 2, .. })
        ));
    }

    #[test]
    fn fold_outside_procedure_is_rejected() {
        let procedure = EstimationProcedure::holdout(7, 1);
        let task = task(procedure.clone(), TaskType::Classification);
        let mut assignments = holdout_assignments();
        assignments[0].fold = 1;
        assert!(matches!(
            DataSplits::new(&task, &procedure, 3, &assignments),
            Err(SplitError::IndexOutOfRange { fold: 1, .. })
        ));
    }

    #[test]
    fn learning_curve_counts_samples() {
        let procedure = EstimationProcedure::holdout(7, 1);
        let task = task(procedure.clone(), TaskType::LearningCurve);
        let assignments = vec![
            SplitAssignment::new(SplitRole::Train, 0, 0, 0, 0),
            SplitAssignment::new(SplitRole::Test, 3, 0, 0, 0),
            SplitAssignment::new(SplitRole::Train, 0, 0, 0, 1),
            SplitAssignment::new(SplitRole::Train, 1, 0, 0, 1),
            SplitAssignment::new(SplitRole::Test, 3, 0, 0, 1),
        ];
        let splits = DataSplits::new(&task, &procedure, 4, &assignments).unwrap();
        assert!(splits.has_samples());
        assert_eq!(splits.samples(), 2);
        assert_eq!(splits.num_runs(), 2);
        assert_eq!(splits.train_rows(0, 0, 1).unwrap(), &[0, 1]);
    }

    #[test]
    fn reads_csv_with_missing_columns() {
        let table = "type,rowid\nTRAIN,0\nTRAIN,1\nTEST,2\n";
        let assignments = read_assignments(table.as_bytes()).unwrap();
        assert_eq!(assignments, holdout_assignments());
    }
}
