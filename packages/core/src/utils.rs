// ABOUTME: Small helpers shared across Kiln packages
// ABOUTME: Shell quoting, label generation, and char-safe truncation

use rand::Rng;

/// Quote a string for POSIX `sh` using single quotes.
///
/// Embedded single quotes are closed, escaped, and reopened (`'\''`).
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Session label for jobs submitted from the command line (`cli-1234`)
pub fn generate_cli_label() -> String {
    let n: u16 = rand::thread_rng().gen_range(1000..10000);
    format!("cli-{}", n)
}

/// Truncate to at most `max` characters without splitting a UTF-8 sequence
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
