//! "Did you mean" suggestions for unknown commands.

/// Commands offered when the typed executable cannot be resolved.
pub const COMMON_COMMANDS: &[&str] = &[
    "ls", "cd", "pwd", "cp", "mv", "rm", "mkdir", "rmdir", "cat", "grep", "find", "echo", "touch",
    "chmod", "chown", "git", "docker", "npm", "go", "python", "pip", "brew",
];

/// Largest edit distance still considered a likely typo.
pub const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Levenshtein distance over chars (insert, delete, substitute; no transposition).
///
/// Uses a single rolling row sized to the shorter input.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return long.len();
    }

    let mut row: Vec<usize> = (0..=short.len()).collect();
    for (i, lc) in long.iter().enumerate() {
        let mut diag = row[0];
        row[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(lc != sc);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diag + cost);
            diag = above;
        }
    }
    row[short.len()]
}

/// Every candidate within `MAX_SUGGESTION_DISTANCE`, in candidate order.
pub fn similar_in<'a>(name: &str, candidates: &[&'a str]) -> Vec<&'a str> {
    candidates
        .iter()
        .copied()
        .filter(|c| levenshtein(name, c) <= MAX_SUGGESTION_DISTANCE)
        .collect()
}

pub fn similar_commands(name: &str) -> Vec<&'static str> {
    similar_in(name, COMMON_COMMANDS)
}
