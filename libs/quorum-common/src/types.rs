use serde::{Deserialize, Serialize};

/// Stable identifier for one code-generation problem.
pub type ProblemId = u32;

/// Everything the evaluation engine needs for one problem: the generated
/// candidate solutions, the generated test units, and the held-out
/// ground-truth assertions. Solutions and tests are ordered; outcome
/// vectors are only comparable when built from the same ordered sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemSet {
    pub solutions: Vec<String>,
    pub tests: Vec<String>,
    pub golden: Vec<String>,
}

/// Result of running one (solution, test unit) pair in the sandbox.
///
/// Everything except `Pass` collapses to bit 0 for scoring. The tags exist
/// so diagnostics can tell a logical test failure from an execution
/// infrastructure failure (staging, spawning) that never ran the code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Process exited 0 within the timeout with empty stderr.
    Pass,
    /// Process ran but the assertion failed, it crashed, or it wrote to
    /// stderr.
    Fail,
    /// Process was killed at the wall-clock bound.
    Timeout,
    /// The unit never executed: staging or spawn failed.
    Infra(String),
}

impl UnitOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, UnitOutcome::Pass)
    }

    /// Binary outcome as used by the consensus scorer.
    pub fn as_bit(&self) -> u8 {
        self.is_pass() as u8
    }
}

/// Ordered binary outcomes from running one candidate against a fixed test
/// sequence. Grouping is by exact positional equality, hence `Eq + Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeVector(Vec<u8>);

impl OutcomeVector {
    pub fn from_bits(bits: Vec<u8>) -> Self {
        OutcomeVector(bits)
    }

    pub fn from_outcomes(outcomes: &[UnitOutcome]) -> Self {
        OutcomeVector(outcomes.iter().map(UnitOutcome::as_bit).collect())
    }

    /// All-fail vector of the given length, the terminal result for a task
    /// that could not be attributed or executed.
    pub fn all_fail(len: usize) -> Self {
        OutcomeVector(vec![0; len])
    }

    pub fn bits(&self) -> &[u8] {
        &self.0
    }

    /// Number of passing entries.
    pub fn passing(&self) -> usize {
        self.0.iter().filter(|&&b| b == 1).count()
    }

    /// True when every entry passes and the vector is non-empty.
    pub fn all_pass(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|&b| b == 1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Running accuracy over a batch, accumulated across problems and reported
/// once at the end of a run. Skipped problems count in neither the
/// numerator nor the denominator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub attempted: usize,
    pub correct: usize,
    pub skipped: usize,
}

impl AccuracyReport {
    pub fn record(&mut self, correct: bool) {
        self.attempted += 1;
        if correct {
            self.correct += 1;
        }
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    /// `correct / attempted * 100`; zero when nothing was attempted.
    pub fn percent(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.correct as f64 / self.attempted as f64 * 100.0
        }
    }
}
