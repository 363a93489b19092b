/// Assertion Segmentation
///
/// Generated test blocks arrive as free-form code: assertions interleaved
/// with setup lines, blank lines, and the occasional stray prose. Two
/// consumers need two shapes:
/// - `split_units` produces self-contained executable units (setup lines
///   attached to the assertion they precede) for the execution matrix.
/// - `collect_assertions` keeps only recognizable assertion lines, used
///   when ingesting ground-truth blocks.

use regex::Regex;
use std::sync::OnceLock;

fn assertion_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"^assert\s",
            r"^self\.assert\w*\s*\(",
            r"^pytest\.assert\w+\s*\(",
            r"^assert_\w+\s*\(",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("assertion pattern is valid"))
        .collect()
    })
}

/// True when the stripped line is an assertion statement: bare `assert`,
/// `assert is/is not/in/not in/isinstance(/issubclass(`, or the
/// unittest/pytest helper families.
pub fn is_assertion(line: &str) -> bool {
    let line = line.trim();
    assertion_patterns().iter().any(|re| re.is_match(line))
}

/// Split a generated test block into self-contained executable units.
///
/// Non-empty stripped lines are scanned in order. An assertion line closes
/// the current setup buffer and emits one unit; other lines accumulate as
/// setup for the next assertion. A trailing non-assert leftover emits one
/// synthetic `assert <leftover>` unit, a defensive fallback for malformed
/// generations that is expected to fail on its own when it is nonsense.
pub fn split_units(block: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut setup: Vec<&str> = Vec::new();

    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_assertion(line) {
            let unit = if setup.is_empty() {
                line.to_string()
            } else {
                format!("{}\n{}", setup.join("\n"), line)
            };
            units.push(unit);
            setup.clear();
        } else {
            setup.push(line);
        }
    }

    if !setup.is_empty() {
        units.push(format!("assert {}", setup.join("\n")));
    }

    units
}

/// Keep only the assertion lines of a block, discarding setup and prose.
pub fn collect_assertions(block: &str) -> Vec<String> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && is_assertion(line))
        .map(str::to_string)
        .collect()
}
