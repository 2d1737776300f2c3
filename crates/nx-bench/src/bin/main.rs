//! Standalone accuracy sweep for the finite difference estimator.

use clap::Parser;
use nx_bench::{
    AccuracyCase, SweepRecord, best_per_method, decade_steps, default_cases, find_case, sweep,
};
use nx_diff::DifferentiationMethod;
use tracing::info;

#[derive(Parser)]
#[command(name = "nx-bench")]
#[command(about = "Finite difference Jacobian accuracy sweep", long_about = None)]
struct Cli {
    /// Case to sweep (quadratic, trig, linear); all cases when omitted
    #[arg(long)]
    case: Option<String>,
    /// Differentiation method (newton, symmetric, second-order); repeatable
    #[arg(long = "method")]
    methods: Vec<DifferentiationMethod>,
    /// Smallest step as a power of ten
    #[arg(long, default_value_t = -12, allow_hyphen_values = true)]
    min_exp: i32,
    /// Largest step as a power of ten
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    max_exp: i32,
    /// Timed evaluations per sweep point
    #[arg(long, default_value_t = 5)]
    repeats: usize,
    /// Print records as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let cases: Vec<AccuracyCase> = match &cli.case {
        Some(name) => vec![find_case(name)?],
        None => default_cases(),
    };
    let methods = if cli.methods.is_empty() {
        DifferentiationMethod::ALL.to_vec()
    } else {
        cli.methods.clone()
    };
    let steps = decade_steps(cli.min_exp, cli.max_exp)?;

    let mut records = Vec::new();
    for case in &cases {
        info!(case = case.name, steps = steps.len(), "sweeping");
        records.extend(sweep(case, &methods, &steps, cli.repeats)?);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for case in &cases {
        let case_records: Vec<SweepRecord> = records
            .iter()
            .filter(|r| r.case == case.name)
            .cloned()
            .collect();
        print_case(case, &case_records);
    }

    Ok(())
}

fn print_case(case: &AccuracyCase, records: &[SweepRecord]) {
    println!("{} {}", case.name, case.description);
    println!("  at x = {:?}", case.point);
    println!(
        "  {:<14} {:>10} {:>14} {:>6} {:>12}",
        "method", "step", "max error", "evals", "time (us)"
    );
    for r in records {
        println!(
            "  {:<14} {:>10.1e} {:>14.3e} {:>6} {:>12.2}",
            r.method.name(),
            r.step,
            r.max_abs_error,
            r.evaluations,
            r.elapsed_s * 1e6
        );
    }

    println!("  best step per method:");
    for r in best_per_method(records) {
        println!(
            "    {:<14} h = {:.1e}  error = {:.3e}  (order {})",
            r.method.name(),
            r.step,
            r.max_abs_error,
            r.method.order()
        );
    }
    println!();
}
