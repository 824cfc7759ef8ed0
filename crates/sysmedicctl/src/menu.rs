//! Plain text menu surface.
//!
//! Deliberately simple: numbered menus, blocking reads, no alternate
//! screen. Everything interesting happens in sysmedic_common; this
//! module only renders and routes operator choices.

use crate::interrupt;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use sysmedic_common::checks::{all_checks, Results, Severity};
use sysmedic_common::diagnose::{
    diagnose, diagnose_custom_issue, diagnose_file_permissions, troubleshooting_suggestions,
    Diagnosis, IssueCategory,
};
use sysmedic_common::fixes::{validate, Executor, Fix};
use sysmedic_common::{report, Config, MedicError};

pub fn run_menu(config: &Config, interrupt_flag: Arc<AtomicBool>) -> Result<()> {
    let _ = console::Term::stdout().clear_screen();
    show_header(config);

    loop {
        println!("--- MAIN MENU ---");
        println!();
        println!("  1. Run system check");
        println!("  2. Interactive diagnosis");
        println!("  3. View log directory");
        println!("  4. Exit");
        println!();

        match read_input("Select option (1-4): ").as_str() {
            "1" => run_system_check(config),
            "2" => run_interactive_diagnosis(config, &interrupt_flag),
            "3" => show_log_directory(config),
            "4" | "q" | "Q" => {
                println!("Goodbye.");
                return Ok(());
            }
            _ => println!("\n{}\n", "Invalid option. Please try again.".red()),
        }
    }
}

/// Non-interactive entry: run every check, print the report, execute
/// nothing.
pub fn run_scan_only(config: &Config) {
    println!("Running system checks...");
    let results = collect_results(config, false);
    print_results(&results);
    let summary = report::generate(&results);
    println!("{}", report::format_text(&summary));
}

pub fn run_custom_diagnosis(
    config: &Config,
    description: &str,
    interrupt_flag: Arc<AtomicBool>,
) {
    println!("CUSTOM ISSUE DIAGNOSIS");
    println!("Issue: {}\n", description);

    let diagnosis = diagnose_custom_issue(description);

    println!("ANALYSIS:");
    for finding in &diagnosis.findings {
        println!("  - {}", finding);
    }

    println!("\nGENERAL TROUBLESHOOTING SUGGESTIONS:");
    for (i, suggestion) in troubleshooting_suggestions().iter().take(5).enumerate() {
        println!("  {}. {}", i + 1, suggestion);
    }

    if config.non_interactive {
        print_fix_list(&diagnosis);
        println!("\nTip: run without --non-interactive to execute fixes.");
    } else {
        offer_fixes(config, &diagnosis, &interrupt_flag);
    }
}

fn show_header(config: &Config) {
    println!();
    println!("=====================================");
    println!("            SYSMEDIC                ");
    println!("   system diagnosis and repair      ");
    println!("=====================================");
    println!();
    let status = if config.is_root {
        "full access".green().to_string()
    } else {
        "limited access (not root)".yellow().to_string()
    };
    println!("Status: {}\n", status);
}

fn run_system_check(config: &Config) {
    println!("\nRunning diagnostic scan...\n");
    let results = collect_results(config, true);
    print_results(&results);

    if ask_yes_no("Generate comprehensive system report? (y/n): ") {
        let summary = report::generate(&results);
        println!("\n{}", report::format_text(&summary));
    }
}

fn collect_results(config: &Config, with_progress: bool) -> Results {
    let checks = all_checks(config.is_root);
    let bar = if with_progress {
        let bar = ProgressBar::new(checks.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    } else {
        None
    };

    let mut results = Results::new();
    for check in checks {
        if let Some(bar) = &bar {
            bar.set_message(check.name().to_string());
        }
        results.add(check.run());
        if let Some(bar) = &bar {
            bar.inc(1);
        }
    }
    if let Some(bar) = bar {
        bar.finish_with_message("scan complete");
    }

    results
}

fn print_results(results: &Results) {
    println!();
    for finding in results.all() {
        let label = match finding.severity {
            Severity::Critical => finding.severity.label().magenta().to_string(),
            Severity::Error => finding.severity.label().red().to_string(),
            Severity::Warning => finding.severity.label().yellow().to_string(),
            Severity::Info => finding.severity.label().green().to_string(),
        };
        println!("[{}] {}: {}", label, finding.name, finding.message);
        for detail in &finding.details {
            println!("    {}", detail);
        }
    }

    println!();
    println!(
        "{} error(s), {} warning(s), {} informational",
        results.errors().len(),
        results.warnings().len(),
        results.info().len()
    );
    println!();
}

fn run_interactive_diagnosis(config: &Config, interrupt_flag: &Arc<AtomicBool>) {
    println!("\n--- DIAGNOSIS MODULES ---\n");
    let categories = IssueCategory::all();
    for (i, category) in categories.iter().enumerate() {
        println!("  {}. {}", i + 1, category.label());
    }
    println!("  {}. Describe the issue in your own words", categories.len() + 1);
    println!(
        "  {}. Analyze permissions of a file or directory",
        categories.len() + 2
    );
    println!();

    let choice = read_input("Select module: ");
    let diagnosis = if let Ok(n) = choice.parse::<usize>() {
        if n >= 1 && n <= categories.len() {
            diagnose(categories[n - 1])
        } else if n == categories.len() + 1 {
            let description = read_input("Describe the issue: ");
            diagnose_custom_issue(&description)
        } else if n == categories.len() + 2 {
            let path = read_input("Path to analyze: ");
            diagnose_file_permissions(&path)
        } else {
            println!("\n{}\n", "Invalid option.".red());
            return;
        }
    } else {
        println!("\n{}\n", "Invalid option.".red());
        return;
    };

    println!("\n{}", diagnosis.issue.bold());
    println!("\nFINDINGS:");
    for finding in &diagnosis.findings {
        println!("  - {}", finding);
    }

    offer_fixes(config, &diagnosis, interrupt_flag);
}

fn print_fix_list(diagnosis: &Diagnosis) {
    if diagnosis.fixes.is_empty() {
        return;
    }
    println!("\nRECOMMENDED ACTIONS:");
    for (i, fix) in diagnosis.fixes.iter().enumerate() {
        println!("\n  {}. {}", i + 1, fix.title);
        println!("     {}", fix.description);
        if let Some(first) = fix.commands.first() {
            println!("     Command: {}", first);
            if fix.commands.len() > 1 {
                println!("     (+ {} more commands)", fix.commands.len() - 1);
            }
        }
        println!("     Risk Level: {}", fix.risk_level);
        if fix.requires_root {
            println!("     {}", "Requires root privileges".yellow());
        }
    }
}

/// Show the surviving fixes and let the operator pick some to execute.
/// Fixes the validator rejects are dropped before they are ever shown.
fn offer_fixes(config: &Config, diagnosis: &Diagnosis, interrupt_flag: &Arc<AtomicBool>) {
    let offered: Vec<&Fix> = diagnosis
        .fixes
        .iter()
        .filter(|fix| match validate(fix) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("dropping fix '{}': {}", fix.id, e);
                false
            }
        })
        .collect();

    if offered.is_empty() {
        println!("\nNo applicable fixes.");
        return;
    }

    println!("\nAVAILABLE FIXES:");
    for (i, fix) in offered.iter().enumerate() {
        println!("  {}. {} [{}]", i + 1, fix.title, fix.risk_level);
    }

    loop {
        let choice = read_input("\nSelect a fix to run (number, or Enter to return): ");
        if choice.is_empty() {
            return;
        }
        let Ok(n) = choice.parse::<usize>() else {
            println!("{}", "Not a number.".red());
            continue;
        };
        let Some(fix) = n.checked_sub(1).and_then(|i| offered.get(i)) else {
            println!("{}", "No such fix.".red());
            continue;
        };

        interrupt::reset();
        let mut executor = Executor::new(config).with_interrupt(interrupt_flag.clone());
        match executor.execute(fix) {
            Ok(outcome) if outcome.succeeded() => {
                println!("\n{}\n", "Fix executed successfully.".green());
            }
            Ok(outcome) => {
                println!("\nFix did not complete: {:?}\n", outcome.status);
            }
            Err(e @ MedicError::PermissionDenied { .. }) => {
                println!("\n{} {}\n", "Cannot run:".red(), e);
                println!("Re-run sysmedicctl with sudo to apply this fix.");
            }
            Err(e) => {
                println!("\n{} {}\n", "Cannot run:".red(), e);
            }
        }
    }
}

fn show_log_directory(config: &Config) {
    println!("\nLog directory: {}", config.log_dir.display());
    match std::fs::read_dir(&config.log_dir) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            for name in names.iter().rev().take(10) {
                println!("  {}", name);
            }
        }
        Err(e) => println!("  (cannot list: {})", e),
    }
    println!();
}

fn read_input(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return String::new();
    }
    line.trim().to_string()
}

fn ask_yes_no(prompt: &str) -> bool {
    let answer = read_input(prompt).to_lowercase();
    answer == "y" || answer == "yes"
}
