//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting an
//! operation that would otherwise fail midway.

use crate::error::{Result, RetoucheError};

/// Requirements for different commands.
#[derive(Debug, Clone, Copy)]
pub enum Requirement {
    /// The full pipeline calls the LLM and needs an API key.
    Run,
    /// Timing checks run offline.
    Qa,
    /// The editor runs offline on an existing context.
    Edit,
}

/// Run pre-flight checks for the given command.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(requirement: Requirement) -> Result<()> {
    match requirement {
        Requirement::Run => check_api_key()?,
        Requirement::Qa | Requirement::Edit => {}
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(RetoucheError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...' (or in .env)"
                .to_string(),
        )),
        Err(_) => Err(RetoucheError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...' (or in .env)"
                .to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_commands_have_no_requirements() {
        assert!(check(Requirement::Qa).is_ok());
        assert!(check(Requirement::Edit).is_ok());
    }
}
