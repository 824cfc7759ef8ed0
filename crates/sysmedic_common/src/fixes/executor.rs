//! Fix execution state machine.
//!
//! Validated -> permission gate -> confirmation gate -> sequential
//! execution -> terminal outcome. Execution halts at the first failing
//! command; a reversible fix then offers best-effort rollback of the
//! steps that already ran, in reverse order. A cooperative interrupt
//! flag checked between steps leads to the same rollback offer.
//!
//! Commands are never retried: a failing command almost always means an
//! environment mismatch (missing binary, wrong device) that a retry
//! cannot fix.

use super::{validate, Fix, RiskLevel};
use crate::config::Config;
use crate::error::MedicError;
use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Runs one fix command to completion, streaming output to the operator.
/// `Err` carries the exit code, or -1 when the process could not be
/// spawned (including the empty-command case).
pub trait CommandRunner {
    fn run(&mut self, command: &str) -> Result<(), i32>;
}

/// Collects a yes/no answer from the operator.
pub trait Prompter {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Default runner: whitespace-split into program and arguments, spawn as
/// a subprocess with stdout/stderr passed through to the terminal. No
/// shell is involved, so quoting, pipes and redirection are not
/// supported - fix commands must be plain argv sequences.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &str) -> Result<(), i32> {
        let mut parts = command.split_whitespace();
        let Some(program) = parts.next() else {
            return Err(-1);
        };

        let status = Command::new(program)
            .args(parts)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(status.code().unwrap_or(-1)),
            Err(e) => {
                error!("failed to spawn '{}': {}", command, e);
                Err(-1)
            }
        }
    }
}

/// Default prompter: blocking read from stdin, affirmative on "y"/"yes"
/// (case-insensitive). Empty input or read failure counts as no.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{} ", prompt);
        let _ = io::stdout().flush();

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        let answer = line.trim().to_lowercase();
        answer == "y" || answer == "yes"
    }
}

/// Terminal state of one fix execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixStatus {
    /// All commands exited zero.
    Completed,
    /// Operator declined at the confirmation gate; nothing ran.
    Cancelled,
    /// Command at `failed_step` (0-based) exited non-zero or could not
    /// be spawned.
    Failed {
        failed_step: usize,
        rolled_back: bool,
    },
    /// The interrupt flag was raised between steps; `completed_steps`
    /// commands had already finished.
    Interrupted {
        completed_steps: usize,
        rolled_back: bool,
    },
}

/// Transient result of one `execute` call.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub fix_id: String,
    pub status: FixStatus,
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == FixStatus::Completed
    }
}

/// Sequences validation, privilege checks, confirmation, execution and
/// rollback for one fix at a time.
pub struct Executor<'a> {
    config: &'a Config,
    runner: Box<dyn CommandRunner + 'a>,
    prompter: Box<dyn Prompter + 'a>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<'a> Executor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Executor {
            config,
            runner: Box::new(SystemRunner),
            prompter: Box::new(StdinPrompter),
            interrupt: None,
        }
    }

    /// Replace the runner and prompter, for callers that drive execution
    /// programmatically (and for tests).
    pub fn with_parts(
        config: &'a Config,
        runner: Box<dyn CommandRunner + 'a>,
        prompter: Box<dyn Prompter + 'a>,
    ) -> Self {
        Executor {
            config,
            runner,
            prompter,
            interrupt: None,
        }
    }

    /// Attach a cooperative interrupt flag, consulted before each step.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Execute a fix under the full safety gauntlet.
    ///
    /// Validation and permission errors are returned before any side
    /// effect; everything after the confirmation gate is reported through
    /// the returned [`ExecutionOutcome`].
    pub fn execute(&mut self, fix: &Fix) -> Result<ExecutionOutcome, MedicError> {
        validate(fix)?;

        if fix.requires_root && !self.config.is_root {
            return Err(MedicError::PermissionDenied {
                title: fix.title.clone(),
            });
        }

        if !self.config.non_interactive {
            self.show_details(fix);
            if !self.prompter.confirm("\nDo you want to proceed? (y/N):") {
                info!("fix '{}' cancelled by user", fix.title);
                return Ok(ExecutionOutcome {
                    fix_id: fix.id.clone(),
                    status: FixStatus::Cancelled,
                });
            }
        }

        info!("executing fix: {}", fix.title);

        for (i, command) in fix.commands.iter().enumerate() {
            if self.interrupted() {
                warn!("fix '{}' interrupted before step {}", fix.title, i + 1);
                let rolled_back = i > 0 && self.offer_rollback(fix, i - 1);
                return Ok(ExecutionOutcome {
                    fix_id: fix.id.clone(),
                    status: FixStatus::Interrupted {
                        completed_steps: i,
                        rolled_back,
                    },
                });
            }

            info!(
                "running command {}/{}: {}",
                i + 1,
                fix.commands.len(),
                command
            );

            if let Err(code) = self.runner.run(command) {
                let failure = MedicError::CommandFailed {
                    index: i,
                    command: command.clone(),
                    code,
                };
                error!("{}", failure);
                println!("{} {}", "Command failed:".red(), failure);

                let rolled_back = i > 0 && self.offer_rollback(fix, i - 1);
                return Ok(ExecutionOutcome {
                    fix_id: fix.id.clone(),
                    status: FixStatus::Failed {
                        failed_step: i,
                        rolled_back,
                    },
                });
            }
        }

        info!("fix '{}' executed successfully", fix.title);
        Ok(ExecutionOutcome {
            fix_id: fix.id.clone(),
            status: FixStatus::Completed,
        })
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Ask the operator whether to unwind steps 0..=last_completed, and
    /// do so on agreement. In non-interactive mode the rollback is taken
    /// automatically: a half-applied change is worse than a reverted one.
    fn offer_rollback(&mut self, fix: &Fix, last_completed: usize) -> bool {
        if !fix.reversible {
            return false;
        }

        let agreed = if self.config.non_interactive {
            true
        } else {
            println!(
                "\nThis fix is reversible. {} step(s) already took effect.",
                last_completed + 1
            );
            self.prompter
                .confirm("Do you want to undo the changes made so far? (y/N):")
        };

        if !agreed {
            return false;
        }

        self.rollback(fix, last_completed);
        true
    }

    /// Run reverse commands for `last_completed` down to 0. Failures are
    /// logged and skipped - rollback is best effort and never halts.
    fn rollback(&mut self, fix: &Fix, last_completed: usize) {
        info!(
            "reversing fix '{}' from step {} back to 1",
            fix.title,
            last_completed + 1
        );

        for step in (0..=last_completed).rev() {
            let Some(command) = fix.reverse_commands.get(step) else {
                warn!("no reverse command recorded for step {}", step + 1);
                continue;
            };

            info!("reversing step {}: {}", step + 1, command);
            if let Err(code) = self.runner.run(command) {
                warn!(
                    "rollback step {} failed with exit {} - continuing",
                    step + 1,
                    code
                );
            }
        }

        info!("fix reversal completed");
    }

    fn show_details(&self, fix: &Fix) {
        println!("\n{}", "Fix Details:".bold());
        println!("Title: {}", fix.title);
        println!("Description: {}", fix.description);
        println!("Risk Level: {}", colored_risk(fix.risk_level));
        println!("Requires Root: {}", fix.requires_root);
        println!("Reversible: {}", fix.reversible);

        println!("\nCommands to execute:");
        for (i, command) in fix.commands.iter().enumerate() {
            println!("  {}. {}", i + 1, command);
        }

        if fix.risk_level >= RiskLevel::High {
            println!(
                "\n{}",
                format!(
                    "WARNING: This is a {} risk operation! Review the commands carefully before proceeding.",
                    fix.risk_level.label()
                )
                .red()
                .bold()
            );
        }
    }
}

fn colored_risk(level: RiskLevel) -> String {
    match level {
        RiskLevel::Low => level.label().green().to_string(),
        RiskLevel::Medium => level.label().yellow().to_string(),
        RiskLevel::High => level.label().red().to_string(),
        RiskLevel::Critical => level.label().magenta().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    /// Records every command it is asked to run; fails the commands whose
    /// text appears in `fail_on`.
    struct RecordingRunner {
        ran: Rc<RefCell<Vec<String>>>,
        fail_on: Vec<String>,
    }

    impl RecordingRunner {
        fn new(ran: Rc<RefCell<Vec<String>>>) -> Self {
            RecordingRunner {
                ran,
                fail_on: Vec::new(),
            }
        }

        fn failing_on(ran: Rc<RefCell<Vec<String>>>, command: &str) -> Self {
            RecordingRunner {
                ran,
                fail_on: vec![command.to_string()],
            }
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&mut self, command: &str) -> Result<(), i32> {
            self.ran.borrow_mut().push(command.to_string());
            if self.fail_on.iter().any(|f| f == command) {
                Err(1)
            } else {
                Ok(())
            }
        }
    }

    /// Answers prompts from a fixed script, then refuses. Records every
    /// prompt it was asked.
    struct ScriptedPrompter {
        answers: Vec<bool>,
        asked: Rc<RefCell<Vec<String>>>,
    }

    impl ScriptedPrompter {
        fn new(answers: Vec<bool>) -> Self {
            ScriptedPrompter {
                answers,
                asked: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn confirm(&mut self, prompt: &str) -> bool {
            self.asked.borrow_mut().push(prompt.to_string());
            if self.answers.is_empty() {
                false
            } else {
                self.answers.remove(0)
            }
        }
    }

    fn test_config(is_root: bool, non_interactive: bool) -> Config {
        Config {
            log_dir: PathBuf::from("/tmp"),
            is_root,
            verbose: false,
            non_interactive,
        }
    }

    fn three_step_fix() -> Fix {
        Fix::new(
            "swap_setup",
            "Set Up Swap",
            "Three-step fix with full reverse coverage",
            vec![
                "step zero".to_string(),
                "step one".to_string(),
                "step two".to_string(),
            ],
            false,
            RiskLevel::Medium,
        )
        .reversible(vec![
            "undo zero".to_string(),
            "undo one".to_string(),
            "undo two".to_string(),
        ])
    }

    fn run_fix(
        fix: &Fix,
        config: &Config,
        runner: RecordingRunner,
        answers: Vec<bool>,
    ) -> Result<ExecutionOutcome, MedicError> {
        let mut executor = Executor::with_parts(
            config,
            Box::new(runner),
            Box::new(ScriptedPrompter::new(answers)),
        );
        executor.execute(fix)
    }

    #[test]
    fn completes_and_runs_commands_in_order() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let config = test_config(false, false);
        let outcome = run_fix(
            &three_step_fix(),
            &config,
            RecordingRunner::new(ran.clone()),
            vec![true],
        )
        .unwrap();

        assert!(outcome.succeeded());
        assert_eq!(outcome.status, FixStatus::Completed);
        assert_eq!(*ran.borrow(), ["step zero", "step one", "step two"]);
    }

    #[test]
    fn permission_denied_runs_nothing() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let config = test_config(false, true);
        let mut fix = three_step_fix();
        fix.requires_root = true;

        let err = run_fix(&fix, &config, RecordingRunner::new(ran.clone()), vec![]).unwrap_err();

        assert!(matches!(err, MedicError::PermissionDenied { .. }));
        assert_eq!(ran.borrow().len(), 0);
    }

    #[test]
    fn root_requirement_satisfied_when_elevated() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let config = test_config(true, true);
        let mut fix = three_step_fix();
        fix.requires_root = true;

        let outcome = run_fix(&fix, &config, RecordingRunner::new(ran.clone()), vec![]).unwrap();
        assert!(outcome.succeeded());
        assert_eq!(ran.borrow().len(), 3);
    }

    #[test]
    fn invalid_fix_is_rejected_before_any_command() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let config = test_config(false, true);
        let fix = Fix::new(
            "wipe",
            "Wipe",
            "bad",
            vec!["rm -rf /".to_string()],
            false,
            RiskLevel::Critical,
        );

        let err = run_fix(&fix, &config, RecordingRunner::new(ran.clone()), vec![]).unwrap_err();
        assert!(matches!(err, MedicError::InvalidFix { .. }));
        assert_eq!(ran.borrow().len(), 0);
    }

    #[test]
    fn declined_confirmation_cancels_without_commands() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let config = test_config(false, false);

        let outcome = run_fix(
            &three_step_fix(),
            &config,
            RecordingRunner::new(ran.clone()),
            vec![false],
        )
        .unwrap();

        assert_eq!(outcome.status, FixStatus::Cancelled);
        assert!(!outcome.succeeded());
        assert_eq!(ran.borrow().len(), 0);
    }

    #[test]
    fn empty_prompt_script_counts_as_decline() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let config = test_config(false, false);
        let outcome = run_fix(
            &three_step_fix(),
            &config,
            RecordingRunner::new(ran.clone()),
            vec![],
        )
        .unwrap();
        assert_eq!(outcome.status, FixStatus::Cancelled);
    }

    #[test]
    fn failure_mid_sequence_rolls_back_in_reverse_order() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let config = test_config(false, false);

        // Command at index 2 fails; steps 0 and 1 completed. With the
        // operator accepting rollback, the reverses for steps 1 then 0
        // run in that exact order, and step 2's reverse never runs.
        let outcome = run_fix(
            &three_step_fix(),
            &config,
            RecordingRunner::failing_on(ran.clone(), "step two"),
            vec![true, true],
        )
        .unwrap();

        assert_eq!(
            outcome.status,
            FixStatus::Failed {
                failed_step: 2,
                rolled_back: true
            }
        );
        assert_eq!(
            *ran.borrow(),
            ["step zero", "step one", "step two", "undo one", "undo zero"]
        );
    }

    #[test]
    fn declined_rollback_leaves_fix_unreversed() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let config = test_config(false, false);

        let outcome = run_fix(
            &three_step_fix(),
            &config,
            RecordingRunner::failing_on(ran.clone(), "step two"),
            vec![true, false],
        )
        .unwrap();

        assert_eq!(
            outcome.status,
            FixStatus::Failed {
                failed_step: 2,
                rolled_back: false
            }
        );
        assert_eq!(*ran.borrow(), ["step zero", "step one", "step two"]);
    }

    #[test]
    fn failure_at_first_step_never_offers_rollback() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let config = test_config(false, false);

        let prompter = ScriptedPrompter::new(vec![true, true]);
        let asked = prompter.asked.clone();

        let mut executor = Executor::with_parts(
            &config,
            Box::new(RecordingRunner::failing_on(ran.clone(), "step zero")),
            Box::new(prompter),
        );
        let outcome = executor.execute(&three_step_fix()).unwrap();

        assert_eq!(
            outcome.status,
            FixStatus::Failed {
                failed_step: 0,
                rolled_back: false
            }
        );
        assert_eq!(*ran.borrow(), ["step zero"]);
        // Only the confirmation prompt fired; no rollback was offered
        // because nothing had taken effect yet.
        assert_eq!(asked.borrow().len(), 1);
    }

    #[test]
    fn irreversible_fix_fails_without_rollback() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let config = test_config(false, false);
        let mut fix = three_step_fix();
        fix.reversible = false;
        fix.reverse_commands.clear();

        let outcome = run_fix(
            &fix,
            &config,
            RecordingRunner::failing_on(ran.clone(), "step one"),
            vec![true],
        )
        .unwrap();

        assert_eq!(
            outcome.status,
            FixStatus::Failed {
                failed_step: 1,
                rolled_back: false
            }
        );
    }

    #[test]
    fn rollback_continues_past_failing_reverse_step() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let config = test_config(false, true);

        let mut runner = RecordingRunner::failing_on(ran.clone(), "step two");
        runner.fail_on.push("undo one".to_string());

        let mut executor = Executor::with_parts(
            &config,
            Box::new(runner),
            Box::new(ScriptedPrompter::new(vec![])),
        );
        let outcome = executor.execute(&three_step_fix()).unwrap();

        // Non-interactive rollback is automatic; "undo one" fails but
        // "undo zero" still runs.
        assert_eq!(
            outcome.status,
            FixStatus::Failed {
                failed_step: 2,
                rolled_back: true
            }
        );
        assert_eq!(
            *ran.borrow(),
            ["step zero", "step one", "step two", "undo one", "undo zero"]
        );
    }

    #[test]
    fn interrupt_flag_stops_before_next_step_and_offers_rollback() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let config = test_config(false, false);
        let flag = Arc::new(AtomicBool::new(false));

        /// Raises the shared flag after a given number of commands.
        struct InterruptingRunner {
            inner: RecordingRunner,
            flag: Arc<AtomicBool>,
            after: usize,
        }

        impl CommandRunner for InterruptingRunner {
            fn run(&mut self, command: &str) -> Result<(), i32> {
                let result = self.inner.run(command);
                if self.inner.ran.borrow().len() >= self.after {
                    self.flag.store(true, Ordering::SeqCst);
                }
                result
            }
        }

        let runner = InterruptingRunner {
            inner: RecordingRunner::new(ran.clone()),
            flag: flag.clone(),
            after: 1,
        };

        let mut executor = Executor::with_parts(
            &config,
            Box::new(runner),
            Box::new(ScriptedPrompter::new(vec![true, true])),
        )
        .with_interrupt(flag);

        let outcome = executor.execute(&three_step_fix()).unwrap();

        assert_eq!(
            outcome.status,
            FixStatus::Interrupted {
                completed_steps: 1,
                rolled_back: true
            }
        );
        assert_eq!(*ran.borrow(), ["step zero", "undo zero"]);
    }

    #[test]
    fn interrupt_before_any_step_skips_rollback() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let config = test_config(false, true);
        let flag = Arc::new(AtomicBool::new(true));

        let mut executor = Executor::with_parts(
            &config,
            Box::new(RecordingRunner::new(ran.clone())),
            Box::new(ScriptedPrompter::new(vec![])),
        )
        .with_interrupt(flag);

        let outcome = executor.execute(&three_step_fix()).unwrap();
        assert_eq!(
            outcome.status,
            FixStatus::Interrupted {
                completed_steps: 0,
                rolled_back: false
            }
        );
        assert_eq!(ran.borrow().len(), 0);
    }

    #[test]
    fn system_runner_reports_empty_command_as_spawn_failure() {
        let mut runner = SystemRunner;
        assert_eq!(runner.run(""), Err(-1));
        assert_eq!(runner.run("   "), Err(-1));
    }

    #[test]
    fn system_runner_passes_through_exit_codes() {
        let mut runner = SystemRunner;
        assert!(runner.run("true").is_ok());
        assert_eq!(runner.run("false"), Err(1));
        assert_eq!(runner.run("sysmedic-no-such-tool"), Err(-1));
    }
}
