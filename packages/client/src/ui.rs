//! Small terminal helpers.

use std::io::Write;

/// Re-print the prompt after an incoming message interrupted it.
pub fn redisplay_prompt(username: &str) {
    print!("{username}> ");
    let _ = std::io::stdout().flush();
}
