use crate::error::ExperimentError;
use csv::WriterBuilder;

const PARAMETER_PREFIX: &str = "parameter_";

/// One configuration tried by a parameter search.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceIteration {
    /// Command line of the evaluated configuration.
    pub setup_string: String,
    pub evaluation: f64,
    /// Swept parameter values, in sweep order.
    pub parameters: Vec<(String, String)>,
    /// Whether the search picked this configuration.
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct TraceRow {
    repeat: usize,
    fold: usize,
    iteration: usize,
    entry: TraceIteration,
}

/// The search iterations of every fold of a run.
///
/// The swept parameter columns are fixed by the first fold that is added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizationTrace {
    parameters: Vec<String>,
    rows: Vec<TraceRow>,
}

impl OptimizationTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn add_fold(
        &mut self,
        repeat: usize,
        fold: usize,
        iterations: Vec<TraceIteration>,
    ) -> Result<(), ExperimentError> {
        if self.rows.is_empty() {
            if let Some(first) = iterations.first() {
                self.parameters = first.parameters.iter().map(|(name, _)| name.clone()).collect();
            }
        }

        for (iteration, entry) in iterations.into_iter().enumerate() {
            if let Some((name, _)) = entry
                .parameters
                .iter()
                .find(|(name, _)| !self.parameters.contains(name))
            {
                return Err(ExperimentError::Table {
                    table: "trace".to_string(),
                    message: format!("Unknown swept parameter '{}'", name),
                });
            }
            self.rows.push(TraceRow {
                repeat,
                fold,
                iteration,
                entry,
            });
        }
        Ok(())
    }

    pub fn to_csv(&self) -> Result<String, ExperimentError> {
        let table_error = |message: String| ExperimentError::Table {
            table: "trace".to_string(),
            message,
        };

        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        let header = ["repeat", "fold", "iteration", "setup_string", "evaluation", "selected"]
            .into_iter()
            .map(str::to_string)
            .chain(self.parameters.iter().map(|name| format!("{}{}", PARAMETER_PREFIX, name)));
        writer
            .write_record(header)
            .map_err(|e| table_error(e.to_string()))?;

        for row in &self.rows {
            let parameters = self.parameters.iter().map(|name| {
                row.entry
                    .parameters
                    .iter()
                    .find(|(parameter, _)| parameter == name)
                    .map(|(_, value)| value.clone())
                    .unwrap_or_default()
            });
            let record = [
                row.repeat.to_string(),
                row.fold.to_string(),
                row.iteration.to_string(),
                row.entry.setup_string.clone(),
                row.entry.evaluation.to_string(),
                row.entry.selected.to_string(),
            ]
            .into_iter()
            .chain(parameters);
            writer
                .write_record(record)
                .map_err(|e| table_error(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| table_error(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| table_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iteration(c: &str, evaluation: f64, selected: bool) -> TraceIteration {
        TraceIteration {
            setup_string: format!("J48 -C {}", c),
            evaluation,
            parameters: vec![("C".to_string(), c.to_string())],
            selected,
        }
    }

    #[test]
    fn writes_parameter_columns() {
        let mut trace = OptimizationTrace::new();
        trace
            .add_fold(0, 1, vec![iteration("0.1", 0.8, false), iteration("0.2", 0.9, true)])
            .unwrap();
        let csv = trace.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "repeat,fold,iteration,setup_string,evaluation,selected,parameter_C");
        assert_eq!(lines[2], "0,1,1,J48 -C 0.2,0.9,true,0.2");
    }

    #[test]
    fn rejects_unknown_parameter() {
        let mut trace = OptimizationTrace::new();
        trace.add_fold(0, 0, vec![iteration("0.1", 0.8, true)]).unwrap();
        let mut other = iteration("0.3", 0.7, true);
        other.parameters = vec![("M".to_string(), "4".to_string())];
        assert!(trace.add_fold(0, 1, vec![other]).is_err());
    }
}
