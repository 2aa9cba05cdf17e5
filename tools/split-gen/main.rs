use clap::{Parser, ValueEnum};
use kiroku::experiment::{SplitAssignment, SplitRole, write_assignments};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::fs::File;
use std::io;

/// A CLI tool to generate split-assignment tables for estimation procedures
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Number of rows in the dataset
    #[arg(short, long)]
    rows: usize,

    #[arg(short, long, value_enum, default_value_t = Procedure::CrossValidation)]
    procedure: Procedure,

    #[arg(long, default_value_t = 1)]
    repeats: usize,

    #[arg(long, default_value_t = 10)]
    folds: usize,

    /// Percentage of rows held out for testing (holdout only)
    #[arg(long, default_value_t = 33.0)]
    test_percentage: f64,

    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// The path to write the CSV to; standard output if omitted
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Procedure {
    Holdout,
    CrossValidation,
    LeaveOneOut,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.rows == 0 {
        eprintln!("Error: --rows must be positive");
        std::process::exit(1);
    }
    if matches!(cli.procedure, Procedure::CrossValidation) && !(2..=cli.rows).contains(&cli.folds) {
        eprintln!(
            "Error: --folds ({}) must be between 2 and the number of rows ({})",
            cli.folds, cli.rows
        );
        std::process::exit(1);
    }
    if !(0.0..=100.0).contains(&cli.test_percentage) {
        eprintln!("Error: --test-percentage must be between 0 and 100");
        std::process::exit(1);
    }

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let assignments = match cli.procedure {
        Procedure::Holdout => holdout(&mut rng, cli.rows, cli.repeats, cli.test_percentage),
        Procedure::CrossValidation => cross_validation(&mut rng, cli.rows, cli.repeats, cli.folds),
        Procedure::LeaveOneOut => leave_one_out(cli.rows),
    };

    match &cli.output {
        Some(path) => {
            write_assignments(File::create(path)?, &assignments)?;
            eprintln!(
                "Wrote {} assignments for {:?} to '{}'",
                assignments.len(),
                cli.procedure,
                path
            );
        }
        None => write_assignments(io::stdout().lock(), &assignments)?,
    }

    Ok(())
}

fn shuffled_rows(rng: &mut StdRng, rows: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows).collect();
    order.shuffle(rng);
    order
}

fn holdout(rng: &mut StdRng, rows: usize, repeats: usize, percentage: f64) -> Vec<SplitAssignment> {
    let test_size = ((rows as f64) * percentage / 100.0).round() as usize;
    let mut assignments = Vec::with_capacity(rows * repeats);
    for repeat in 0..repeats {
        for (position, row_id) in shuffled_rows(rng, rows).into_iter().enumerate() {
            let role = if position < test_size {
                SplitRole::Test
            } else {
                SplitRole::Train
            };
            assignments.push(SplitAssignment::new(role, row_id, repeat, 0, 0));
        }
    }
    assignments
}

fn cross_validation(
    rng: &mut StdRng,
    rows: usize,
    repeats: usize,
    folds: usize,
) -> Vec<SplitAssignment> {
    let mut assignments = Vec::with_capacity(rows * repeats * folds);
    for repeat in 0..repeats {
        let order = shuffled_rows(rng, rows);
        for fold in 0..folds {
            for (position, &row_id) in order.iter().enumerate() {
                let role = if position % folds == fold {
                    SplitRole::Test
                } else {
                    SplitRole::Train
                };
                assignments.push(SplitAssignment::new(role, row_id, repeat, fold, 0));
            }
        }
    }
    assignments
}

fn leave_one_out(rows: usize) -> Vec<SplitAssignment> {
    (0..rows)
        .flat_map(|fold| {
            (0..rows).map(move |row_id| {
                let role = if row_id == fold {
                    SplitRole::Test
                } else {
                    SplitRole::Train
                };
                SplitAssignment::new(role, row_id, 0, fold, 0)
            })
        })
        .collect()
}
