/// Executor Matrix Builder - Bounded Concurrent Fan-Out
///
/// **Responsibility:**
/// Run every (problem, solution) pair against its problem's test sequence,
/// concurrently up to a fixed ceiling, and reassemble the outcome vectors
/// keyed by problem id in original solution order.
///
/// Completion order is meaningless: every task carries its
/// (problem, solution-index) key and results are attached by key, never by
/// arrival. A failed execution yields an all-zero row for that solution
/// and does not disturb its siblings.

use crate::sandbox::Sandbox;
use futures_util::stream::{self, StreamExt};
use quorum_common::types::{OutcomeVector, ProblemId, ProblemSet, UnitOutcome};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Fixed ceiling on in-flight executions across the whole batch.
pub const DEFAULT_MAX_CONCURRENCY: usize = 32;

pub struct MatrixBuilder<'a> {
    sandbox: &'a Sandbox,
    max_concurrency: usize,
}

impl<'a> MatrixBuilder<'a> {
    pub fn new(sandbox: &'a Sandbox, max_concurrency: usize) -> Self {
        MatrixBuilder {
            sandbox,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Execute the full solution×test cross product.
    ///
    /// Output rows per problem are in the same order the solutions were
    /// given, regardless of completion interleaving.
    pub async fn solution_matrix(
        &self,
        problems: &BTreeMap<ProblemId, ProblemSet>,
    ) -> BTreeMap<ProblemId, Vec<OutcomeVector>> {
        let tasks: Vec<(ProblemId, usize, &str, &[String])> = problems
            .iter()
            .flat_map(|(id, set)| {
                set.solutions
                    .iter()
                    .enumerate()
                    .map(move |(idx, solution)| (*id, idx, solution.as_str(), set.tests.as_slice()))
            })
            .collect();

        debug!(
            tasks = tasks.len(),
            max_concurrency = self.max_concurrency,
            "Dispatching execution matrix"
        );

        let completed: Vec<(ProblemId, usize, Vec<UnitOutcome>)> = stream::iter(tasks)
            .map(|(id, idx, solution, tests)| async move {
                let outcomes = self.sandbox.run_suite(solution, tests).await;
                (id, idx, outcomes)
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut by_key: HashMap<(ProblemId, usize), OutcomeVector> =
            HashMap::with_capacity(completed.len());
        for (id, idx, outcomes) in completed {
            for (unit, outcome) in outcomes.iter().enumerate() {
                if let UnitOutcome::Infra(reason) = outcome {
                    warn!(
                        problem = id,
                        solution = idx,
                        unit,
                        %reason,
                        "Execution infrastructure failure; unit counted as fail"
                    );
                }
            }
            by_key.insert((id, idx), OutcomeVector::from_outcomes(&outcomes));
        }

        problems
            .iter()
            .map(|(id, set)| {
                let rows = (0..set.solutions.len())
                    .map(|idx| {
                        by_key
                            .remove(&(*id, idx))
                            .unwrap_or_else(|| OutcomeVector::all_fail(set.tests.len()))
                    })
                    .collect();
                (*id, rows)
            })
            .collect()
    }
}
