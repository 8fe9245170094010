use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "minigraph workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pattern benchmarks once per engine policy
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,
    },
}

/// Engine policies, passed to the bench through `MINIGRAPH_BENCH_POLICY`.
/// The first one is the baseline the report compares against.
const POLICIES: &[&str] = &["cost-model", "cache-always", "cache-never", "no-fan-out"];

/// workload -> policy -> ops/s
type Results = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Serialize)]
struct Summary<'a> {
    baseline: &'a str,
    results: &'a Results,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench { quick, report_only } => {
            if !report_only {
                run_benchmarks(quick)?;
            }
            generate_report()?;
        }
    }

    Ok(())
}

fn run_benchmarks(quick: bool) -> Result<()> {
    println!("Compiling benchmarks...");
    let status = Command::new("cargo")
        .args(["build", "--bench", "pattern_benchmark", "--release"])
        .status()?;
    if !status.success() {
        anyhow::bail!("Failed to compile benchmarks");
    }

    for policy in POLICIES {
        println!("\n>>> Benchmarking policy: {policy}");
        let start = Instant::now();

        let mut cmd = Command::new("cargo");
        cmd.env("MINIGRAPH_BENCH_POLICY", policy)
            .args(["bench", "--bench", "pattern_benchmark", "--"])
            .arg("--save-baseline")
            .arg(policy);

        if quick {
            cmd.args(["--measurement-time", "0.1", "--noplot", "--sample-size", "10"]);
        }

        let status = cmd
            .status()
            .with_context(|| format!("Failed to run bench for {policy}"))?;

        if status.success() {
            println!("Finished {policy} in {:.2?}", start.elapsed());
        } else {
            eprintln!("Warning: Benchmark failed for {policy}");
        }
    }

    Ok(())
}

fn generate_report() -> Result<()> {
    println!("\n>>> Generating Report...");
    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    let mut results = Results::new();
    collect_results(criterion_dir, &mut results)?;

    let out_dir = Path::new("benchmark_results");
    fs::create_dir_all(out_dir)?;

    let summary = Summary {
        baseline: POLICIES[0],
        results: &results,
    };
    fs::write(
        out_dir.join("report.json"),
        serde_json::to_string_pretty(&summary)?,
    )?;

    let report_path = out_dir.join("report.md");
    let mut file = fs::File::create(&report_path)?;
    writeln!(file, "# Engine Policy Benchmark Report")?;
    writeln!(file)?;

    write!(file, "| Workload |")?;
    for policy in POLICIES {
        write!(file, " {policy} (Ops/s) | vs {} |", POLICIES[0])?;
    }
    writeln!(file)?;
    write!(file, "|---|")?;
    for _ in POLICIES {
        write!(file, "---|---|")?;
    }
    writeln!(file)?;

    for (workload, by_policy) in &results {
        write!(file, "| {workload} |")?;
        let base = by_policy.get(POLICIES[0]).copied().unwrap_or(0.0);
        for policy in POLICIES {
            match by_policy.get(*policy) {
                Some(&ops) => {
                    let rel = if base > 0.0 { ops / base } else { 0.0 };
                    write!(file, " {} | **{rel:.2}x** |", format_ops(ops))?;
                }
                None => write!(file, " N/A | - |")?,
            }
        }
        writeln!(file)?;
    }

    println!("Report written to {}", report_path.display());
    Ok(())
}

fn format_ops(ops: f64) -> String {
    if ops > 1_000_000.0 {
        format!("{:.2}M", ops / 1_000_000.0)
    } else if ops > 1_000.0 {
        format!("{:.2}K", ops / 1_000.0)
    } else {
        format!("{ops:.0}")
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()?.to_str().map(str::to_owned)
}

fn read_json(path: &Path) -> Option<serde_json::Value> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Walks `.../<workload>/<policy>/estimates.json` files.
fn collect_results(dir: &Path, results: &mut Results) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_results(&path, results)?;
            continue;
        }
        if path.file_name().and_then(|s| s.to_str()) != Some("estimates.json") {
            continue;
        }
        let Some(policy_dir) = path.parent() else { continue };
        let Some(workload_dir) = policy_dir.parent() else { continue };
        let (Some(policy), Some(workload)) = (file_name(policy_dir), file_name(workload_dir)) else {
            continue;
        };
        if !POLICIES.contains(&policy.as_str()) || workload == "report" {
            continue;
        }

        let elements = read_json(&policy_dir.join("benchmark.json"))
            .or_else(|| read_json(&workload_dir.join("benchmark.json")))
            .and_then(|json| json.get("throughput")?.get("Elements")?.as_f64());
        let time_ns = read_json(&path)
            .and_then(|json| json.get("mean")?.get("point_estimate")?.as_f64())
            .unwrap_or(0.0);
        if time_ns > 0.0 {
            let metric = elements.unwrap_or(1.0) * 1e9 / time_ns;
            results.entry(workload).or_default().insert(policy, metric);
        }
    }
    Ok(())
}
