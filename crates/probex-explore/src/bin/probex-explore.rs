//! CLI binary for the probabilistic search engine.
//!
//! Explores a Markov chain model with one of the search policies and records
//! the explored part as a DTMC.
//!
//! # Usage
//!
//! ```bash
//! # Explore a model with weighted-random search, writing out/coin.tra
//! probex-explore run --model coin.json --output out/
//!
//! # Softmax search at a lower temperature, Graphviz output with styling
//! probex-explore run --model coin.json --strategy softmax --temperature 0.2 \
//!     --format dot --mark-initial --mark-explored --label-states
//!
//! # Bounded search, continuing past property violations
//! probex-explore run --model coin.json --depth-limit 10 --continue-on-violation
//!
//! # Check a model without exploring it
//! probex-explore validate --model coin.json
//! ```
//!
//! # Output
//!
//! The chain is written to `{output}/{name}.tra` and/or `{output}/{name}.dot`
//! when the search finishes. A search that runs into its depth limit or state
//! budget also writes `{name}_depth.*` or `{name}_budget.*` with the chain as
//! it was at that point. If the final file cannot be written, the chain is
//! printed to stdout after the report instead.

use clap::{Parser, Subcommand};
use probex_explore::model::{load_model, ModelHost};
use probex_explore::statespace::{
    DotSink, ExploredStatesDecorator, InitialStateDecorator, StateLabelDecorator, StateSpace,
    TextSink, TransitionSink, DEFAULT_PRECISION,
};
use probex_explore::{
    format_report, Engine, FrontierKind, SearchConfig, SearchListener, StrategyKind,
};
use std::fs;
use std::io::{self, Write};

#[derive(Parser)]
#[command(name = "probex-explore")]
#[command(about = "Probability-guided state-space search with DTMC output")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Explore a model.
    Run {
        /// Path to the model (JSON).
        #[arg(short, long)]
        model: String,

        /// Search policy: "random", "epsilon-greedy", "softmax", or
        /// "probability-first".
        #[arg(short, long, default_value = "random")]
        strategy: String,

        /// Frontier structure for the weighted policies: "tree" or "list".
        #[arg(long, default_value = "tree")]
        frontier: String,

        /// Probability of a random pick under epsilon-greedy.
        #[arg(long, default_value = "0.1")]
        epsilon: f64,

        /// Softmax temperature.
        #[arg(long, default_value = "0.5")]
        temperature: f64,

        /// Decimals for probability rounding and graph labels.
        #[arg(short, long, default_value_t = DEFAULT_PRECISION)]
        precision: u32,

        /// Do not expand states at this depth.
        #[arg(short, long)]
        depth_limit: Option<u32>,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output directory.
        #[arg(short, long, default_value = ".")]
        output: String,

        /// Output file stem. Defaults to the model name.
        #[arg(short, long)]
        name: Option<String>,

        /// Output format: "tra", "dot", or "both".
        #[arg(short, long, default_value = "tra")]
        format: String,

        /// Draw the initial state with a thick border.
        #[arg(long)]
        mark_initial: bool,

        /// Double-border end states and fully explored states.
        #[arg(long)]
        mark_explored: bool,

        /// Colour states by their model labels.
        #[arg(long)]
        label_states: bool,

        /// Keep searching after a property violation.
        #[arg(long)]
        continue_on_violation: bool,

        /// Also write the search report as JSON to this path.
        #[arg(long)]
        report: Option<String>,
    },

    /// Check a model without exploring it.
    Validate {
        /// Path to the model (JSON).
        #[arg(short, long)]
        model: String,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            model,
            strategy,
            frontier,
            epsilon,
            temperature,
            precision,
            depth_limit,
            seed,
            output,
            name,
            format,
            mark_initial,
            mark_explored,
            label_states,
            continue_on_violation,
            report,
        } => cmd_run(
            model,
            strategy,
            frontier,
            epsilon,
            temperature,
            precision,
            depth_limit,
            seed,
            output,
            name,
            format,
            mark_initial,
            mark_explored,
            label_states,
            continue_on_violation,
            report,
        ),
        Commands::Validate { model } => cmd_validate(model),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    model_path: String,
    strategy: String,
    frontier: String,
    epsilon: f64,
    temperature: f64,
    precision: u32,
    depth_limit: Option<u32>,
    seed: u64,
    output: String,
    name: Option<String>,
    format: String,
    mark_initial: bool,
    mark_explored: bool,
    label_states: bool,
    continue_on_violation: bool,
    report_path: Option<String>,
) {
    let model = match load_model(&model_path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: failed to load model {}: {}", model_path, e);
            std::process::exit(1);
        }
    };

    let strategy_kind = match strategy.as_str() {
        "random" | "rand" => StrategyKind::Random,
        "epsilon-greedy" | "greedy" | "eg" => StrategyKind::EpsilonGreedy,
        "softmax" | "sm" => StrategyKind::Softmax,
        "probability-first" | "pf" => StrategyKind::ProbabilityFirst,
        other => {
            eprintln!(
                "Error: unknown strategy '{}'. Use 'random', 'epsilon-greedy', 'softmax', or 'probability-first'.",
                other
            );
            std::process::exit(1);
        }
    };

    let frontier_kind = match frontier.as_str() {
        "tree" => FrontierKind::Tree,
        "list" => FrontierKind::List,
        other => {
            eprintln!("Error: unknown frontier '{}'. Use 'tree' or 'list'.", other);
            std::process::exit(1);
        }
    };

    let (write_tra, write_dot) = match format.as_str() {
        "tra" | "text" => (true, false),
        "dot" => (false, true),
        "both" => (true, true),
        other => {
            eprintln!("Error: unknown format '{}'. Use 'tra', 'dot', or 'both'.", other);
            std::process::exit(1);
        }
    };

    if let Err(e) = fs::create_dir_all(&output) {
        eprintln!("Error: failed to create output directory: {}", e);
        std::process::exit(1);
    }

    let config = SearchConfig {
        strategy: strategy_kind,
        frontier: frontier_kind,
        epsilon,
        temperature,
        depth_limit,
        stop_on_violation: !continue_on_violation,
        seed,
    };

    let mut engine = match Engine::from_config(&config) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let stem = name.unwrap_or_else(|| model.name.clone());

    let mut text_recorder = None;
    if write_tra {
        match StateSpace::new(TextSink::new(), precision) {
            Ok(r) => text_recorder = Some(r.with_output(&output, stem.clone())),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    let mut dot_recorder = None;
    if write_dot {
        let mut sink = match DotSink::new(precision) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
        if mark_initial {
            sink = sink.with_decorator(Box::new(InitialStateDecorator));
        }
        if mark_explored {
            sink = sink.with_decorator(Box::new(ExploredStatesDecorator::new()));
        }
        if label_states {
            sink = sink.with_decorator(Box::new(StateLabelDecorator::new()));
        }
        match StateSpace::new(sink, precision) {
            Ok(r) => dot_recorder = Some(r.with_output(&output, stem.clone())),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    eprintln!("═══════════════════════════════════════════════════════════════════════");
    eprintln!("  Probabilistic Search");
    eprintln!("═══════════════════════════════════════════════════════════════════════");
    eprintln!();
    eprintln!("Configuration:");
    eprintln!("  Model:          {} ({})", model_path, model.name);
    eprintln!("  Locations:      {}", model.locations.len());
    eprintln!("  Strategy:       {}", engine.name());
    match strategy_kind {
        StrategyKind::EpsilonGreedy => eprintln!("  Epsilon:        {}", epsilon),
        StrategyKind::Softmax => eprintln!("  Temperature:    {}", temperature),
        _ => {}
    }
    if strategy_kind != StrategyKind::ProbabilityFirst {
        eprintln!("  Frontier:       {}", frontier);
    }
    eprintln!("  Seed:           {}", seed);
    if let Some(limit) = depth_limit {
        eprintln!("  Depth limit:    {}", limit);
    }
    if let Some(max) = model.max_states {
        eprintln!("  State budget:   {}", max);
    }
    eprintln!("  Precision:      {}", precision);
    let outputs: Vec<String> = text_recorder
        .iter()
        .map(|r| r.output_path(&stem).display().to_string())
        .chain(
            dot_recorder
                .iter()
                .map(|r| r.output_path(&stem).display().to_string()),
        )
        .collect();
    eprintln!("  Output:         {}", outputs.join(", "));
    eprintln!();
    eprintln!("Starting search...");
    eprintln!();

    let mut host = match ModelHost::new(model) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error: invalid model: {}", e);
            std::process::exit(1);
        }
    };

    let mut listeners: Vec<&mut dyn SearchListener> = Vec::new();
    if let Some(recorder) = text_recorder.as_mut() {
        listeners.push(recorder);
    }
    if let Some(recorder) = dot_recorder.as_mut() {
        listeners.push(recorder);
    }

    let report = match engine.run(&mut host, &mut listeners) {
        Ok(r) => r,
        Err(e) => {
            eprintln!();
            eprintln!("Search failed: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!();
    eprintln!(
        "Search complete: {} states discovered.",
        host.states_discovered()
    );
    eprintln!();

    println!("{}", format_report(&report));

    if let Some(path) = report_path {
        match report.to_json() {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    eprintln!("Warning: failed to save report: {}", e);
                } else {
                    eprintln!("Saved report to: {}", path);
                }
            }
            Err(e) => eprintln!("Warning: failed to serialize report: {}", e),
        }
    }

    if let Some(recorder) = text_recorder.as_ref() {
        print_unsaved(recorder, &stem);
    }
    if let Some(recorder) = dot_recorder.as_ref() {
        print_unsaved(recorder, &stem);
    }

    if !report.violations.is_empty() || !report.listener_failures.is_empty() {
        std::process::exit(1);
    }
}

/// Print the chain of a recorder whose output file could not be written.
fn print_unsaved<S: TransitionSink>(recorder: &StateSpace<S>, stem: &str) {
    if recorder.is_saved() {
        return;
    }
    eprintln!(
        "Warning: {} was not written, printing the chain to stdout",
        recorder.output_path(stem).display()
    );
    if let Err(e) = dump_unsaved(recorder, &mut io::stdout().lock()) {
        eprintln!("Error: failed to print chain: {}", e);
    }
}

/// Write the recorded chain to `out` unless it already reached its file.
/// Returns whether anything was written.
fn dump_unsaved<S: TransitionSink>(
    recorder: &StateSpace<S>,
    out: &mut impl Write,
) -> io::Result<bool> {
    if recorder.is_saved() {
        return Ok(false);
    }
    out.write_all(recorder.render().as_bytes())?;
    out.flush()?;
    Ok(true)
}

fn cmd_validate(model_path: String) {
    let model = match load_model(&model_path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: invalid model {}: {}", model_path, e);
            std::process::exit(1);
        }
    };

    let ends = model
        .locations
        .iter()
        .filter(|l| l.kind.targets().is_empty())
        .count();
    let violations = model
        .locations
        .iter()
        .filter(|l| l.violation.is_some())
        .count();

    println!("Model {} is valid.", model.name);
    println!("  Locations:      {}", model.locations.len());
    println!("  Initial:        {}", model.initial);
    println!("  End locations:  {}", ends);
    println!("  Violations:     {}", violations);
    if let Some(max) = model.max_states {
        println!("  State budget:   {}", max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probex_explore::explore;
    use probex_explore::model::{Location, LocationKind, Model};

    fn coin() -> Model {
        Model::new(vec![
            Location::new(LocationKind::Uniform {
                targets: vec![1, 2],
            }),
            Location::new(LocationKind::End),
            Location::new(LocationKind::End),
        ])
    }

    fn record(recorder: &mut StateSpace<TextSink>) {
        let mut host = ModelHost::new(coin()).unwrap();
        explore(&SearchConfig::default(), &mut host, &mut [recorder]).unwrap();
    }

    #[test]
    fn test_unwritable_output_dumps_chain() {
        let not_a_dir = tempfile::NamedTempFile::new().unwrap();
        let mut recorder = StateSpace::new(TextSink::new(), 2)
            .unwrap()
            .with_output(not_a_dir.path(), "coin");
        record(&mut recorder);

        let mut out = Vec::new();
        assert!(dump_unsaved(&recorder, &mut out).unwrap());
        let dumped = String::from_utf8(out).unwrap();
        assert_eq!(dumped, recorder.render());
        assert!(dumped.starts_with("4 4\n"));
        assert_eq!(dumped.lines().count(), 5);
    }

    #[test]
    fn test_written_chain_not_dumped() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = StateSpace::new(TextSink::new(), 2)
            .unwrap()
            .with_output(dir.path(), "coin");
        record(&mut recorder);

        let mut out = Vec::new();
        assert!(!dump_unsaved(&recorder, &mut out).unwrap());
        assert!(out.is_empty());
        assert!(dir.path().join("coin.tra").exists());
    }
}
