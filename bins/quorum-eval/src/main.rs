mod config;
mod executor;
mod normalize;
mod sandbox;
mod scoring;
mod segment;
mod selection;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use config::EvalConfig;
use executor::MatrixBuilder;
use quorum_common::store::{self, GenerationRecord, GoldenRecord, SelectionRecord};
use quorum_common::types::{AccuracyReport, OutcomeVector, ProblemId, ProblemSet};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sandbox::Sandbox;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "quorum-eval")]
#[command(about = "Consensus evaluation of generated code solutions and tests", long_about = None)]
struct Cli {
    /// Generated solution files (JSONL), one per prompt variant
    #[arg(long = "solutions", required = true, num_args = 1..)]
    solutions: Vec<PathBuf>,

    /// Generated test files (JSONL), one per prompt variant
    #[arg(long = "tests", required = true, num_args = 1..)]
    tests: Vec<PathBuf>,

    /// Ground-truth test file (JSONL), used only for final validation
    #[arg(long)]
    golden: PathBuf,

    /// Evaluation config (falls back to config/eval.json, then defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the tie-break seed from the config
    #[arg(long)]
    seed: Option<u64>,

    /// Evaluate only the first N problems
    #[arg(long)]
    limit: Option<usize>,

    /// Optional JSONL sink for golden-solution selection records
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut cfg = EvalConfig::load_or_default(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        cfg.seed = seed;
    }

    info!(
        python_bin = %cfg.python_bin,
        timeout_ms = cfg.timeout_ms,
        max_concurrency = cfg.max_concurrency,
        seed = cfg.seed,
        "quorum-eval booting..."
    );

    let mut problems = load_problems(&cli.solutions, &cli.tests, &cli.golden)?;
    if let Some(limit) = cli.limit {
        problems = problems.into_iter().take(limit).collect();
    }
    info!(problems = problems.len(), "Dataset loaded");

    let sandbox = Sandbox::new(&cfg.python_bin, cfg.timeout(), cfg.scratch_dir.clone());
    let builder = MatrixBuilder::new(&sandbox, cfg.max_concurrency);

    let start = std::time::Instant::now();
    let matrix = builder.solution_matrix(&problems).await;
    info!(
        execution_ms = start.elapsed().as_millis() as u64,
        "Execution matrix complete"
    );

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut report = AccuracyReport::default();
    let mut selections = Vec::new();

    for (id, set) in &problems {
        let rows = matrix.get(id).map(Vec::as_slice).unwrap_or(&[]);
        match evaluate_problem(*id, set, rows, &sandbox, &mut rng).await {
            Some(selection) => {
                report.record(selection.oracle_correct);
                selections.push(selection);
            }
            None => {
                warn!(problem = id, "Nothing to evaluate; problem skipped");
                report.skip();
            }
        }
    }

    if let Some(out) = &cli.out {
        store::append_records(out, &selections)
            .with_context(|| format!("failed to write selections to {}", out.display()))?;
        info!(path = %out.display(), records = selections.len(), "Selections written");
    }

    info!(
        attempted = report.attempted,
        correct = report.correct,
        skipped = report.skipped,
        "Evaluation complete"
    );

    println!();
    println!("→ Consensus evaluation complete");
    println!("  Problems attempted: {}", report.attempted);
    println!("  Oracle-correct selections: {}", report.correct);
    println!("  Problems skipped: {}", report.skipped);
    println!("  Accuracy: {:.2}%", report.percent());

    Ok(())
}

/// Assemble the per-problem inputs from the generation and ground-truth
/// files. Solution and test variants from multiple files append under the
/// same problem id, in file order. Everything is normalized here, once.
fn load_problems(
    solution_paths: &[PathBuf],
    test_paths: &[PathBuf],
    golden_path: &Path,
) -> Result<BTreeMap<ProblemId, ProblemSet>> {
    let mut problems: BTreeMap<ProblemId, ProblemSet> = BTreeMap::new();

    for path in solution_paths {
        let records: Vec<GenerationRecord> = store::read_records(path)
            .with_context(|| format!("failed to load solutions from {}", path.display()))?;
        for record in records {
            let Some(id) = record.task_id.problem_id() else {
                warn!(path = %path.display(), task_id = ?record.task_id, "Dropping unmappable record");
                continue;
            };
            problems
                .entry(id)
                .or_default()
                .solutions
                .push(normalize::standardize_solution(&record.response_code));
        }
    }

    for path in test_paths {
        let records: Vec<GenerationRecord> = store::read_records(path)
            .with_context(|| format!("failed to load tests from {}", path.display()))?;
        for record in records {
            let Some(id) = record.task_id.problem_id() else {
                warn!(path = %path.display(), task_id = ?record.task_id, "Dropping unmappable record");
                continue;
            };
            let units = segment::split_units(&record.response_code);
            problems
                .entry(id)
                .or_default()
                .tests
                .extend(units.iter().map(|unit| normalize::standardize_unit(unit)));
        }
    }

    let records: Vec<GoldenRecord> = store::read_records(golden_path)
        .with_context(|| format!("failed to load ground truth from {}", golden_path.display()))?;
    for record in records {
        let Some(id) = record.task_id.problem_id() else {
            warn!(path = %golden_path.display(), task_id = ?record.task_id, "Dropping unmappable record");
            continue;
        };
        let asserts = segment::collect_assertions(&record.test);
        problems
            .entry(id)
            .or_default()
            .golden
            .extend(asserts.iter().map(|line| normalize::standardize_assertion(line)));
    }

    Ok(problems)
}

/// Score, select and oracle-validate one problem. `None` means the problem
/// had nothing to evaluate (no solutions, no tests, or no ground truth)
/// and must be skipped in the accuracy accounting.
async fn evaluate_problem(
    id: ProblemId,
    set: &ProblemSet,
    rows: &[OutcomeVector],
    sandbox: &Sandbox,
    rng: &mut StdRng,
) -> Option<SelectionRecord> {
    if set.solutions.is_empty() || set.tests.is_empty() || set.golden.is_empty() {
        return None;
    }

    let scores = scoring::consensus_scores(rows);
    let winning = selection::winners(&scores);
    let chosen = selection::pick_representative(&winning, rng)?;

    // Symmetric pass over the transposed matrix picks the golden subset of
    // generated tests.
    let test_scores = scoring::consensus_scores(&scoring::transpose(rows));
    let golden_test_indices = selection::winners(&test_scores);

    debug!(problem = id, ?scores, ties = winning.len(), chosen, "Consensus selection");

    let candidate = normalize::standardize_solution(&set.solutions[chosen]);
    let validation = selection::validate_against_oracle(sandbox, &candidate, &set.golden).await;

    info!(
        problem = id,
        chosen,
        score = scores[chosen],
        golden_passed = validation.vector.passing(),
        golden_total = validation.vector.len(),
        correct = validation.correct,
        "Oracle validation"
    );

    Some(SelectionRecord {
        task_id: id,
        solution_index: chosen,
        score: scores[chosen],
        solution: candidate,
        golden_test_indices,
        oracle_correct: validation.correct,
        generated_at: Utc::now(),
    })
}
