use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use jeeves_config::{
    JeevesConfig, Severity, apply_env_overrides, find_config_file, load_config, validate,
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

pub fn handle_config(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(explicit, verbose),
    }
}

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(explicit: Option<&Path>, verbose: bool) -> Result<()> {
    let path = explicit.map(Path::to_path_buf).or_else(find_config_file);
    let mut config = match path {
        Some(ref p) => load_config(p)?,
        None => JeevesConfig::default(),
    };
    apply_env_overrides(&mut config, |k| std::env::var(k).ok());
    let result = validate(&config, path);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
            Severity::Info => CYAN,
        };
        eprintln!(
            "  {BOLD}{color}{}{RESET} [{}] {}: {}",
            d.severity, d.category, d.path, d.message
        );
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}
