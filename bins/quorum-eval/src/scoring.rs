/// Consensus Scorer - Frequency-Weighted Voting
///
/// **Core Responsibility:**
/// Turn a collection of outcome vectors into a score per candidate without
/// any ground truth.
///
/// **Scoring Rule:**
/// Vectors group by exact positional equality. For each vector,
/// `score = frequency(vector) × passing(vector)`: candidates that agree
/// with many peers and pass many tests score highest. Candidates sharing
/// an identical vector always share an identical score, so ties are
/// expected and by design.
///
/// The same rule scores test cases: transpose the per-problem matrix and
/// each column vector counts passing solutions instead of passing tests.

use quorum_common::types::OutcomeVector;
use std::collections::HashMap;

/// Candidate index → consensus score.
pub type ScoreTable = Vec<u64>;

/// Score every candidate from its outcome vector. Empty input yields an
/// empty table.
pub fn consensus_scores(vectors: &[OutcomeVector]) -> ScoreTable {
    if vectors.is_empty() {
        return Vec::new();
    }

    let mut frequency: HashMap<&OutcomeVector, u64> = HashMap::new();
    for vector in vectors {
        *frequency.entry(vector).or_insert(0) += 1;
    }

    vectors
        .iter()
        .map(|vector| frequency[vector] * vector.passing() as u64)
        .collect()
}

/// Column view of a solution×test outcome matrix: one vector per test,
/// whose entries are that test's outcome across all solutions. Rows are
/// built from the same ordered test sequence, so they share a width; a
/// short row (defensive, should not happen) contributes 0s.
pub fn transpose(rows: &[OutcomeVector]) -> Vec<OutcomeVector> {
    let Some(width) = rows.first().map(OutcomeVector::len) else {
        return Vec::new();
    };

    (0..width)
        .map(|col| {
            OutcomeVector::from_bits(
                rows.iter()
                    .map(|row| row.bits().get(col).copied().unwrap_or(0))
                    .collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors(raw: &[&[u8]]) -> Vec<OutcomeVector> {
        raw.iter().map(|bits| OutcomeVector::from_bits(bits.to_vec())).collect()
    }

    #[test]
    fn score_is_frequency_times_passes() {
        let scores = consensus_scores(&vectors(&[
            &[1, 1, 1],
            &[1, 1, 1],
            &[1, 1, 1],
            &[1, 0, 0],
        ]));
        assert_eq!(scores, vec![9, 9, 9, 1]);
    }

    #[test]
    fn equal_vectors_get_equal_scores() {
        let scores = consensus_scores(&vectors(&[&[1, 1], &[1, 1], &[0, 1]]));
        assert_eq!(scores, vec![4, 4, 1]);
        assert_eq!(scores[0], scores[1]);
    }

    #[test]
    fn lone_perfect_vector_can_tie_with_a_popular_partial_one() {
        // [1,1,1] once scores 3; [1,0,0] three times scores 3 as well.
        let scores = consensus_scores(&vectors(&[
            &[1, 1, 1],
            &[1, 0, 0],
            &[1, 0, 0],
            &[1, 0, 0],
        ]));
        assert_eq!(scores, vec![3, 3, 3, 3]);
    }

    #[test]
    fn all_fail_vectors_score_zero() {
        let scores = consensus_scores(&vectors(&[&[0, 0], &[0, 0]]));
        assert_eq!(scores, vec![0, 0]);
    }

    #[test]
    fn empty_collection_yields_empty_table() {
        assert!(consensus_scores(&[]).is_empty());
    }

    #[test]
    fn transpose_flips_the_matrix() {
        let columns = transpose(&vectors(&[&[1, 0], &[1, 1], &[0, 1]]));
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0], OutcomeVector::from_bits(vec![1, 1, 0]));
        assert_eq!(columns[1], OutcomeVector::from_bits(vec![0, 1, 1]));
    }

    #[test]
    fn transpose_of_empty_matrix_is_empty() {
        assert!(transpose(&[]).is_empty());
        assert!(transpose(&vectors(&[&[]])).is_empty());
    }

    #[test]
    fn test_perspective_scores_count_passing_solutions() {
        // Three solutions, two tests: test 0 passes under two solutions,
        // test 1 under one. Transposed columns [1,1,0] and [0,0,1] are
        // unique, so scores are 1×2 and 1×1.
        let columns = transpose(&vectors(&[&[1, 0], &[1, 0], &[0, 1]]));
        let scores = consensus_scores(&columns);
        assert_eq!(scores, vec![2, 1]);
    }
}
