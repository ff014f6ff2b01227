//! Doctor command - verify configuration and API access.

use crate::cli::Output;
use crate::config::Settings;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        eprintln!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            eprintln!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn print_section(title: &str, checks: &[CheckResult]) {
    eprintln!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    eprintln!();
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Retouche Doctor");
    eprintln!();
    eprintln!("Checking configuration...\n");

    let mut checks = Vec::new();

    let api = vec![check_openai_api_key(std::env::var("OPENAI_API_KEY").ok().as_deref())];
    print_section("API Configuration", &api);
    checks.extend(api);

    let config = vec![check_config_file(), check_prompt_dir(settings)];
    print_section("Configuration", &config);
    checks.extend(config);

    let thresholds = check_thresholds(settings);
    print_section("Thresholds", &thresholds);
    checks.extend(thresholds);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Retouche.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Retouche is ready to use.");
    }

    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key(key: Option<&str>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Some("") => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...' (or in .env)",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...' (or in .env). Only 'retouche run' needs it.",
        ),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: retouche config init",
        )
    }
}

/// Check the custom prompt directory, if one is configured.
fn check_prompt_dir(settings: &Settings) -> CheckResult {
    let Some(dir) = settings.prompts.custom_dir.as_deref() else {
        return CheckResult::ok("Prompts", "built-in");
    };

    let path = Settings::expand_path(dir);
    if !path.is_dir() {
        return CheckResult::error(
            "Prompts",
            &format!("{} not found", path.display()),
            "Fix [prompts] custom_dir or remove it",
        );
    }
    if path.join("context.toml").exists() {
        CheckResult::ok("Prompts", &format!("custom ({})", path.display()))
    } else {
        CheckResult::warning(
            "Prompts",
            &format!("{} has no context.toml", path.display()),
            "Built-in context prompt will be used",
        )
    }
}

fn is_probability(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// Sanity-check confidence gates and timing thresholds.
fn check_thresholds(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let editor = &settings.editor;
    if is_probability(editor.glossary_min_confidence) && is_probability(editor.error_min_confidence) {
        results.push(CheckResult::ok(
            "Editor",
            &format!(
                "glossary >= {}, errors >= {}",
                editor.glossary_min_confidence, editor.error_min_confidence
            ),
        ));
    } else {
        results.push(CheckResult::error(
            "Editor",
            "confidence gates must be within [0, 1]",
            "Fix [editor] in the config file",
        ));
    }

    let qa = &settings.qa;
    if qa.gap_threshold_seconds > 0.0 && qa.long_segment_threshold_seconds > 0.0 {
        results.push(CheckResult::ok(
            "QA",
            &format!(
                "gaps >= {}s, long segments >= {}s",
                qa.gap_threshold_seconds, qa.long_segment_threshold_seconds
            ),
        ));
    } else {
        results.push(CheckResult::warning(
            "QA",
            "non-positive thresholds flag every pair",
            "Fix [qa] in the config file",
        ));
    }

    results.push(CheckResult::ok(
        "Context",
        &format!("{} ({})", settings.context.model, settings.context.language),
    ));

    results
}
