use thiserror::Error;

/// Errors raised while splitting, joining or consuming option tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("Unterminated quote in option string: {0}")]
    UnterminatedQuote(String),

    #[error("Option '-{0}' expects a value, but none followed it")]
    MissingValue(String),
}

/// Errors raised by the component registry or while configuring a component.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("Component type '{0}' is not registered")]
    UnknownType(String),

    #[error("Cannot instantiate a component from an empty specification")]
    EmptySpecification,

    #[error("Component '{type_name}' does not accept options: {remaining:?}")]
    IllegalOptions {
        type_name: String,
        remaining: Vec<String>,
    },

    #[error("Component '{type_name}' expects a '{expected}' for option '-{option}', got '{found}'")]
    WrongComponentFamily {
        type_name: String,
        option: String,
        expected: String,
        found: String,
    },

    #[error(transparent)]
    Options(#[from] OptionsError),
}

/// Errors that abort serialization of a configured component into a flow.
#[derive(Error, Debug, Clone)]
pub enum SerializationError {
    #[error("Component '{component}' declares parameter '{parameter}' more than once")]
    DuplicateParameter { component: String, parameter: String },

    #[error("Component '{component}' declares a parameter with an empty name")]
    EmptyParameterName { component: String },

    #[error("Parameter '{parameter}' of '{component}' is ambiguous: {message}")]
    AmbiguousParameter {
        component: String,
        parameter: String,
        message: String,
    },

    #[error("Component '{component}' contains an unsupported parameter type: '{parameter}'")]
    UnsupportedParameter { component: String, parameter: String },

    #[error("Parameter '{parameter}' of '{component}' was inferred as nested, but no values are set")]
    MissingNestedValues { component: String, parameter: String },

    #[error("Flow name of {length} characters exceeds the limit of {limit}: '{name}'")]
    NameTooLong {
        name: String,
        length: usize,
        limit: usize,
    },

    #[error("Flow '{component}' declares {count} parameters, the limit is {limit}")]
    TooManyParameters {
        component: String,
        count: usize,
        limit: usize,
    },

    #[error(
        "Encoded value of parameter '{parameter}' in '{component}' is {length} characters, the limit is {limit}"
    )]
    ValueTooLong {
        component: String,
        parameter: String,
        length: usize,
        limit: usize,
    },

    #[error("Failed to encode parameter values: {0}")]
    Encoding(String),

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Options(#[from] OptionsError),
}

/// Errors raised while turning a flow or a setup back into option tokens.
#[derive(Error, Debug, Clone)]
pub enum ReconstructionError {
    #[error("Can only work with setups based on flows with ids. Flow: {0}")]
    MissingFlowId(String),

    #[error("Flow '{flow}' has no component at slot '{slot}'")]
    MissingComponent { flow: String, slot: String },

    #[error("Flow '{flow}' has no parameter named '{parameter}'")]
    UnknownParameter { flow: String, parameter: String },

    #[error("Found multiple values in single-valued parameter '{parameter}' of '{flow}'")]
    MultipleValues { flow: String, parameter: String },

    #[error("Parameter '{parameter}' of '{flow}' holds an invalid value: {message}")]
    InvalidValue {
        flow: String,
        parameter: String,
        message: String,
    },

    #[error("Component {component_id} receives conflicting values for setting '{parameter}'")]
    ConflictingSettings { component_id: u32, parameter: String },

    #[error(
        "Setting '{parameter}' of '{flow}' encodes to {length} characters, the limit is {limit}"
    )]
    ValueTooLong {
        flow: String,
        parameter: String,
        length: usize,
        limit: usize,
    },

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Options(#[from] OptionsError),
}

/// Errors surfaced by an experiment-tracking service.
#[derive(Error, Debug, Clone)]
pub enum TrackerError {
    #[error("Flow {0} not found")]
    FlowNotFound(u32),

    #[error("Setup {0} not found")]
    SetupNotFound(u32),

    #[error("Flow '{0}' has no id; upload it before referencing it")]
    UnregisteredFlow(String),

    #[error("Markup error: {0}")]
    Markup(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Remote call failed: {0}")]
    Remote(String),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Reconstruction(#[from] ReconstructionError),

    #[error(transparent)]
    Component(#[from] ComponentError),
}

/// Errors raised while materializing the train/test partition of a task.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplitError {
    #[error("Task uses estimation procedure {task_procedure}, but procedure {given} was supplied")]
    IncompatibleProcedure { task_procedure: u32, given: u32 },

    #[error("Row {row_id} is out of range for a dataset with {num_rows} rows")]
    RowOutOfRange { row_id: usize, num_rows: usize },

    #[error("Split index out of range: repeat {repeat}, fold {fold}, sample {sample}")]
    IndexOutOfRange {
        repeat: usize,
        fold: usize,
        sample: usize,
    },

    #[error("Row {row_id} appears more than once in repeat {repeat}, fold {fold}, sample {sample}")]
    DuplicateRow {
        row_id: usize,
        repeat: usize,
        fold: usize,
        sample: usize,
    },

    #[error("Row {row_id} is missing from repeat {repeat}, fold {fold}")]
    MissingRow {
        row_id: usize,
        repeat: usize,
        fold: usize,
    },

    #[error("Leave-one-out fold {fold} has {size} test rows, expected exactly 1")]
    LeaveOneOutSize { fold: usize, size: usize },

    #[error("Failed to read split assignments: {0}")]
    Read(String),

    #[error("Failed to write split assignments: {0}")]
    Write(String),
}

/// Errors raised by the experiment driver and result listener.
#[derive(Error, Debug, Clone)]
pub enum ExperimentError {
    #[error("Prediction batch has {predictions} predictions for {rows} test rows")]
    BatchSizeMismatch { predictions: usize, rows: usize },

    #[error("Prediction for row {0} references an unknown class index")]
    UnknownClassIndex(usize),

    #[error("Failed to write {table} table: {message}")]
    Table { table: String, message: String },

    #[error("Task {task_id} has type {task_type}, which cannot be run")]
    UnsupportedTask { task_id: u32, task_type: String },

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("Run ended after {batches} of {expected} prediction batches")]
    Incomplete { batches: usize, expected: usize },

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Reconstruction(#[from] ReconstructionError),

    #[error(transparent)]
    Component(#[from] ComponentError),
}

/// Errors raised while loading configuration.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for configuration key '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("Parameter kind '{0}' cannot appear in the nested kind precedence")]
    InvalidPrecedence(String),
}
