mod http_generator;
mod scenarios;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use heroquiz_game::{ContentProvider, HistoryTracker, Subject};
use http_generator::{GeneratorConfig, HttpGenerator};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use scenarios::{ScenarioResult, list_scenarios, run_scenario};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(name = "heroquiz-tester", version)]
#[command(about = "Automated QA for the Heroquiz battle engine - seeded offline invariant sweeps")]
struct Args {
    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Generator endpoint; when set, one live content fetch runs through
    /// the HTTP generator before the offline scenarios
    #[arg(long)]
    endpoint: Option<String>,

    /// Model name for the live generator
    #[arg(long, default_value = "llama3.2:3b")]
    model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_scenarios {
        let mut target = OutputTarget::new(args.output.clone())?;
        writeln!(target, "Available scenarios:")?;
        for (key, description) in list_scenarios() {
            writeln!(target, "  {key:20} - {description}")?;
        }
        target.flush()?;
        return Ok(());
    }

    println!("{}", "⚔️  Heroquiz Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());

    if let Some(endpoint) = &args.endpoint {
        remote_smoke(endpoint, &args.model).await?;
    }

    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = parse_seeds(&args.seeds)?;
    let start_time = Instant::now();

    let mut results = Vec::new();
    for name in &scenarios {
        match run_scenario(name, &seeds, args.iterations, args.verbose).await {
            Some(result) => {
                announce(&result);
                results.push(result);
            }
            None => eprintln!("⚠️  Unknown scenario: {}", name.yellow()),
        }
    }

    write_report(&args, &results, start_time)?;

    if results.iter().any(|result| !result.passed) {
        std::process::exit(1);
    }
    Ok(())
}

/// One live fetch against a real generator. Fallback content coming back
/// is not a failure; it just means the endpoint was unusable and is worth
/// reading the warn logs for.
async fn remote_smoke(endpoint: &str, model: &str) -> Result<()> {
    println!("{}", "🌐 Live generator fetch".bright_blue().bold());
    let config = GeneratorConfig {
        endpoint: endpoint.to_string(),
        model: model.to_string(),
        ..GeneratorConfig::default()
    };
    let provider = ContentProvider::new(HttpGenerator::new(config)?);
    let mut rng = ChaCha20Rng::seed_from_u64(1337);
    let content = provider
        .fetch_session_content(Subject::Math, 1, &HistoryTracker::new(), &mut rng)
        .await;
    println!(
        "   {} questions, boss {} ({})",
        content.questions.len(),
        content.boss.name,
        if content.boss.taunt_audio.is_some() {
            "with speech"
        } else {
            "no speech"
        }
    );
    Ok(())
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.contains(&"all".to_string()) {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.contains(&key.to_string()) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_seeds(value: &str) -> Result<Vec<u64>> {
    split_csv(value)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed: {token}"))
        })
        .collect()
}

fn announce(result: &ScenarioResult) {
    if result.passed {
        println!(
            "✅ {} ({} iterations, avg {:?})",
            result.scenario_name.green(),
            result.iterations_run,
            result.average_duration
        );
    } else {
        eprintln!(
            "❌ {} ({}/{} iterations failed)",
            result.scenario_name.red(),
            result.failures.len(),
            result.iterations_run
        );
        for failure in &result.failures {
            eprintln!("   {failure}");
        }
    }
}

fn write_report(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut target = OutputTarget::new(args.output.clone())?;

    if args.report == "json" {
        let value: Vec<serde_json::Value> = results
            .iter()
            .map(|result| {
                serde_json::json!({
                    "scenario_name": result.scenario_name,
                    "passed": result.passed,
                    "iterations_run": result.iterations_run,
                    "failures": result.failures,
                    "average_duration_ms": result.average_duration.as_millis(),
                })
            })
            .collect();
        serde_json::to_writer_pretty(&mut target, &value)?;
        writeln!(target)?;
    } else {
        let passed = results.iter().filter(|result| result.passed).count();
        writeln!(target)?;
        writeln!(target, "{passed}/{} scenarios passed", results.len())?;
    }

    writeln!(target, "🏁 Total time: {:?}", start_time.elapsed())?;
    target.flush()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Stdout(w) => w.write(buf),
            Self::File(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
