/// Sandbox Runner - Isolated Code Execution
///
/// **Core Responsibility:**
/// Execute one code unit (solution + one test unit) in a fresh child
/// process with a hard wall-clock timeout, and map every possible outcome
/// to a binary pass/fail.
///
/// **Critical Properties:**
/// - Knows nothing about scoring or selection.
/// - No execution can hang the caller: a runaway process is killed at the
///   timeout boundary.
/// - No execution leaks state: each unit gets its own process and its own
///   scratch file, removed on every path.
///
/// Pass means the process exited 0 within the timeout with empty stderr.
/// Assertion failures, crashes, timeouts and interpreter warnings all
/// collapse to fail; only staging/spawn problems are tagged separately as
/// infrastructure failures.

use quorum_common::types::UnitOutcome;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

/// Safety limit to keep pathological generations away from the interpreter.
const MAX_PROGRAM_BYTES: usize = 1024 * 1024; // 1MB

/// Scratch file cleanup guard - removes the staged code unit on drop, so
/// cleanup happens on the success, failure and timeout paths alike.
/// Best-effort: a leaked scratch file must never fail the run.
struct ScratchGuard {
    path: PathBuf,
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub struct Sandbox {
    python_bin: String,
    timeout: Duration,
    scratch_dir: PathBuf,
}

impl Sandbox {
    pub fn new(python_bin: impl Into<String>, timeout: Duration, scratch_dir: Option<PathBuf>) -> Self {
        Sandbox {
            python_bin: python_bin.into(),
            timeout,
            scratch_dir: scratch_dir.unwrap_or_else(std::env::temp_dir),
        }
    }

    /// One executable program: solution source followed by the test unit.
    pub fn compose(solution: &str, test_unit: &str) -> String {
        format!("{}\n\n{}", solution, test_unit)
    }

    /// Run one solution against an ordered sequence of test units.
    ///
    /// Each unit executes in its own fresh process. The returned vector has
    /// the same length and order as `tests`; a failure in one unit never
    /// aborts the rest.
    pub async fn run_suite(&self, solution: &str, tests: &[String]) -> Vec<UnitOutcome> {
        let mut outcomes = Vec::with_capacity(tests.len());
        for test in tests {
            outcomes.push(self.run_unit(&Self::compose(solution, test)).await);
        }
        outcomes
    }

    async fn run_unit(&self, program: &str) -> UnitOutcome {
        if program.len() > MAX_PROGRAM_BYTES {
            return UnitOutcome::Infra(format!(
                "code unit exceeds maximum size of {} bytes",
                MAX_PROGRAM_BYTES
            ));
        }

        let path = self.scratch_dir.join(format!("quorum-{}.py", Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&path, program).await {
            return UnitOutcome::Infra(format!("failed to stage code unit: {}", e));
        }
        let _guard = ScratchGuard { path: path.clone() };

        let child = Command::new(&self.python_bin)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                return UnitOutcome::Infra(format!("failed to spawn {}: {}", self.python_bin, e))
            }
        };

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                if output.status.success() && output.stderr.is_empty() {
                    UnitOutcome::Pass
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    debug!(
                        exit = ?output.status.code(),
                        stderr = stderr.lines().next().unwrap_or(""),
                        "Code unit failed"
                    );
                    UnitOutcome::Fail
                }
            }
            Ok(Err(e)) => UnitOutcome::Infra(format!("failed to collect output: {}", e)),
            Err(_) => {
                // Dropping the wait future drops the child handle;
                // kill_on_drop reaps the runaway process.
                debug!(timeout_ms = self.timeout.as_millis() as u64, "Code unit timed out");
                UnitOutcome::Timeout
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn python_sandbox(timeout_ms: u64, scratch: Option<PathBuf>) -> Sandbox {
        Sandbox::new("python3", Duration::from_millis(timeout_ms), scratch)
    }

    #[test]
    fn compose_joins_solution_and_test() {
        let program = Sandbox::compose("def func(x):\n    return x + 1", "assert func(1) == 2");
        assert_eq!(program, "def func(x):\n    return x + 1\n\nassert func(1) == 2");
    }

    #[test]
    fn oversized_program_is_an_infra_outcome() {
        let sandbox = python_sandbox(5000, None);
        let huge = "x".repeat(MAX_PROGRAM_BYTES + 1);
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let outcome = rt.block_on(sandbox.run_unit(&huge));
        assert!(matches!(outcome, UnitOutcome::Infra(_)));
    }

    #[tokio::test]
    async fn missing_interpreter_is_an_infra_outcome() {
        let sandbox = Sandbox::new(
            "quorum-no-such-interpreter",
            Duration::from_millis(1000),
            None,
        );
        let outcomes = sandbox
            .run_suite("def func(x):\n    return x", &["assert func(1) == 1".to_string()])
            .await;
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], UnitOutcome::Infra(_)));
        assert_eq!(outcomes[0].as_bit(), 0);
    }

    #[tokio::test]
    #[ignore] // Requires python3
    async fn passing_and_failing_assertions() {
        let sandbox = python_sandbox(5000, None);
        let outcomes = sandbox
            .run_suite(
                "def func(x):\n    return x + 1",
                &[
                    "assert func(1) == 2".to_string(),
                    "assert func(1) == 3".to_string(),
                ],
            )
            .await;
        assert_eq!(outcomes[0], UnitOutcome::Pass);
        assert_eq!(outcomes[1], UnitOutcome::Fail);
    }

    #[tokio::test]
    #[ignore] // Requires python3
    async fn runtime_errors_fail() {
        let sandbox = python_sandbox(5000, None);
        let outcomes = sandbox
            .run_suite("def func(x):\n    return 1 // 0", &["assert func(1) == 1".to_string()])
            .await;
        assert_eq!(outcomes[0], UnitOutcome::Fail);
    }

    #[tokio::test]
    #[ignore] // Requires python3
    async fn infinite_loop_times_out_and_leaves_no_scratch_file() {
        let scratch = std::env::temp_dir().join(format!("quorum-sandbox-{}", std::process::id()));
        fs::create_dir_all(&scratch).unwrap();

        let sandbox = python_sandbox(1000, Some(scratch.clone()));
        let start = std::time::Instant::now();
        let outcomes = sandbox
            .run_suite(
                "def func(x):\n    while True:\n        pass",
                &["assert func(1) == 1".to_string()],
            )
            .await;

        assert_eq!(outcomes[0], UnitOutcome::Timeout);
        // Timeout plus a small kill/cleanup overhead, nowhere near a hang.
        assert!(start.elapsed() < Duration::from_millis(3000));

        let leftovers: Vec<_> = fs::read_dir(&scratch).unwrap().collect();
        assert!(leftovers.is_empty(), "scratch files must not survive: {leftovers:?}");

        let _ = fs::remove_dir_all(&scratch);
    }

    #[tokio::test]
    #[ignore] // Requires python3
    async fn interpreter_warnings_on_stderr_fail() {
        let sandbox = python_sandbox(5000, None);
        let outcomes = sandbox
            .run_suite(
                "import sys\ndef func(x):\n    print('noise', file=sys.stderr)\n    return x",
                &["assert func(1) == 1".to_string()],
            )
            .await;
        assert_eq!(outcomes[0], UnitOutcome::Fail);
    }
}
