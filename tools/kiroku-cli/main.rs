use clap::{Parser, Subcommand, ValueEnum};
use kiroku::experiment::ProcedureKind;
use kiroku::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serialize option-configured components into flows and setups
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the flow document of a component command line
    Flow {
        /// Component command line, e.g. "Bagging -I 25 -W REPTree -- -M 4"
        command_line: String,
    },
    /// Serialize, register, extract the setup and rebuild a component, then compare options
    Roundtrip {
        command_line: String,

        /// Tracker snapshot to load before and save after the round trip
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
    /// Summarize a split-assignment CSV under an estimation procedure
    Splits {
        /// Path to the split-assignment CSV
        path: PathBuf,

        /// Number of rows in the dataset
        #[arg(short, long)]
        rows: usize,

        #[arg(short, long, value_enum, default_value_t = ProcedureCli::CrossValidation)]
        procedure: ProcedureCli,

        #[arg(long, default_value_t = 1)]
        repeats: usize,

        #[arg(long, default_value_t = 10)]
        folds: usize,

        /// Treat the table as a learning-curve task with samples
        #[arg(long)]
        learning_curve: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProcedureCli {
    Holdout,
    CrossValidation,
    LeaveOneOut,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load configuration: {}", e))),
        None => Config::default(),
    };
    if let Err(e) = config.validate() {
        exit_with_error(&format!("Invalid configuration: {}", e));
    }
    let serializer = FlowSerializer::builder().with_config(&config).build();

    match cli.command {
        Command::Flow { command_line } => run_flow(&serializer, &config, &command_line),
        Command::Roundtrip {
            command_line,
            store,
        } => run_roundtrip(&serializer, &config, &command_line, store.as_deref()),
        Command::Splits {
            path,
            rows,
            procedure,
            repeats,
            folds,
            learning_curve,
        } => run_splits(&path, rows, procedure, repeats, folds, learning_curve),
    }
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "kiroku=info,warn",
        1 => "kiroku=debug,info",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn create_component(serializer: &FlowSerializer, command_line: &str) -> Box<dyn OptionHandler> {
    serializer
        .registry()
        .create_from_spec(command_line)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to configure component: {}", e)))
}

fn run_flow(serializer: &FlowSerializer, config: &Config, command_line: &str) {
    let component = create_component(serializer, command_line);
    let flow = serializer
        .serialize(component.as_ref(), &config.tags)
        .unwrap_or_else(|e| exit_with_error(&format!("Serialization failed: {}", e)));
    let markup =
        to_markup(&flow).unwrap_or_else(|e| exit_with_error(&format!("Markup failed: {}", e)));
    println!("{}", markup);
}

fn run_roundtrip(
    serializer: &FlowSerializer,
    config: &Config,
    command_line: &str,
    store: Option<&Path>,
) {
    let start = Instant::now();
    let mut tracker = match store {
        Some(path) if path.exists() => LocalTracker::load(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load store: {}", e))),
        _ => LocalTracker::new(),
    };

    let component = create_component(serializer, command_line);
    let original = component.get_options();
    debug!(options = ?original, "Configured component");

    let flow = serializer
        .serialize(component.as_ref(), &config.tags)
        .unwrap_or_else(|e| exit_with_error(&format!("Serialization failed: {}", e)));
    let flow_id = register_flow(&mut tracker, &flow)
        .unwrap_or_else(|e| exit_with_error(&format!("Flow registration failed: {}", e)));
    let stored = tracker
        .flow_get(flow_id)
        .unwrap_or_else(|e| exit_with_error(&format!("Flow lookup failed: {}", e)));

    let settings = serializer
        .extract_setup(&original, &stored)
        .unwrap_or_else(|e| exit_with_error(&format!("Setup extraction failed: {}", e)));
    let rebuilt = serializer
        .deserialize_setup(&settings, &stored)
        .unwrap_or_else(|e| exit_with_error(&format!("Reconstruction failed: {}", e)));
    let reconstructed = rebuilt.get_options();

    println!("Component:     {}", component.to_command_line());
    println!("Flow:          {} (id {})", stored.name, flow_id);
    println!("Components:    {}", stored.count_components());
    println!("Settings:      {}", settings.len());
    println!("Original:      {}", join_options(&original));
    println!("Reconstructed: {}", join_options(&reconstructed));
    println!("Elapsed:       {:?}", start.elapsed());

    if let Some(path) = store {
        tracker
            .save(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save store: {}", e)));
        info!(path = %path.display(), flows = tracker.flow_count(), "Saved store");
    }

    if reconstructed != original {
        exit_with_error("Reconstructed options differ from the original");
    }
    println!("Round trip OK");
}

fn run_splits(
    path: &Path,
    rows: usize,
    procedure: ProcedureCli,
    repeats: usize,
    folds: usize,
    learning_curve: bool,
) {
    let procedure = match procedure {
        ProcedureCli::Holdout => EstimationProcedure::holdout(1, repeats),
        ProcedureCli::CrossValidation => EstimationProcedure::cross_validation(1, repeats, folds),
        ProcedureCli::LeaveOneOut => EstimationProcedure::leave_one_out(1),
    };
    let task = Task {
        id: 0,
        task_type: if learning_curve {
            TaskType::LearningCurve
        } else {
            TaskType::Classification
        },
        estimation_procedure: procedure.clone(),
        dataset_id: 0,
        target_feature: "class".to_string(),
        class_labels: Vec::new(),
        missing_labels: false,
    };

    let file = File::open(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to open '{}': {}", path.display(), e))
    });
    let splits = DataSplits::from_csv_reader(&task, &procedure, rows, file)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid split table: {}", e)));

    let kind = match splits.procedure().kind {
        ProcedureKind::Holdout => "holdout",
        ProcedureKind::CrossValidation => "cross-validation",
        ProcedureKind::LeaveOneOut => "leave-one-out",
    };
    println!("Procedure: {}", kind);
    println!(
        "Repeats: {}  Folds: {}  Samples: {}  Splits: {}",
        splits.repeats(),
        splits.folds(),
        splits.samples(),
        splits.num_runs()
    );
    for (repeat, fold, sample) in splits.indices().take(20) {
        let train = splits.train_rows(repeat, fold, sample).map_or(0, <[usize]>::len);
        let test = splits.test_rows(repeat, fold, sample).map_or(0, <[usize]>::len);
        println!(
            "  repeat {:>2}  fold {:>3}  sample {:>2}  train {:>6}  test {:>6}",
            repeat, fold, sample, train, test
        );
    }
    if splits.num_runs() > 20 {
        println!("  ... {} more", splits.num_runs() - 20);
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
