/// Selection & Oracle Validation
///
/// **Responsibility:**
/// Pick the winning candidate set from a score table, draw one seeded
/// representative from the ties, and cross-check it against the held-out
/// ground-truth tests.
///
/// Ties are not broken by any further criterion: every candidate at the
/// maximum score is equally "best", and the representative is a uniform
/// draw so runs are reproducible under a fixed seed. The oracle never
/// participates in selection; it only judges the pick afterwards.

use crate::sandbox::Sandbox;
use quorum_common::types::OutcomeVector;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Every candidate index achieving the maximum score. Empty scores yield
/// an empty winner set.
pub fn winners(scores: &[u64]) -> Vec<usize> {
    let Some(&best) = scores.iter().max() else {
        return Vec::new();
    };
    scores
        .iter()
        .enumerate()
        .filter(|(_, &score)| score == best)
        .map(|(idx, _)| idx)
        .collect()
}

/// Uniform draw of a single representative from the winner set.
pub fn pick_representative(winners: &[usize], rng: &mut StdRng) -> Option<usize> {
    winners.choose(rng).copied()
}

/// Verdict from running the chosen solution against the golden tests.
#[derive(Debug, Clone)]
pub struct OracleValidation {
    pub vector: OutcomeVector,
    /// True iff every ground-truth outcome is 1.
    pub correct: bool,
}

/// Execute the chosen solution against the ground-truth test sequence via
/// the same sandbox contract used for candidate evaluation.
pub async fn validate_against_oracle(
    sandbox: &Sandbox,
    solution: &str,
    golden_units: &[String],
) -> OracleValidation {
    let outcomes = sandbox.run_suite(solution, golden_units).await;
    let vector = OutcomeVector::from_outcomes(&outcomes);
    let correct = vector.all_pass();
    OracleValidation { vector, correct }
}
