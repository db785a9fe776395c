//! Hash-password command

use std::io::{self, BufRead, Write};

use anyhow::Context;

use crate::domain::user::validate_password;
use crate::infrastructure::user::{Argon2Hasher, PasswordHasher};

/// Read one line from stdin and print its Argon2 hash
pub fn run() -> anyhow::Result<()> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;

    let hash = hash_line(&line)?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", hash)?;

    Ok(())
}

fn hash_line(line: &str) -> anyhow::Result<String> {
    let password = line.trim_end_matches(['\r', '\n']);
    validate_password(password)?;

    Ok(Argon2Hasher::new().hash(password)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_line_strips_newline() {
        let hash = hash_line("hunter2\n").unwrap();
        assert!(Argon2Hasher::new().verify("hunter2", &hash));
    }

    #[test]
    fn test_hash_line_rejects_empty() {
        assert!(hash_line("\n").is_err());
    }
}
