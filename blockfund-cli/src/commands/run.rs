//! `blockfund run`: replay a command script against a fresh engine.
//!
//! Script format:
//!
//! ```json
//! [
//!   { "caller": "0x01…", "op": "buy_tokens", "amount": "100000000000000000000", "payment_wei": "1000000000000000000" },
//!   { "caller": "0x01…", "op": "contribute", "campaign": "0x…", "amount": "100000000000000000000" }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use lib_funding::{Command, EngineSummary, FundingConfig, FundingEngine, FundingError, Outcome};
use lib_types::Address;

use crate::argument_parsing::RunArgs;
use crate::commands::summary_lines;
use crate::error::{CliError, CliResult};
use crate::output::{Output, OutputFormat};

// ============================================================================
// PURE LOGIC
// ============================================================================

/// One script entry: who acts, and what they do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub caller: Address,
    #[serde(flatten)]
    pub command: Command,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// 1-based position in the script
    pub step: usize,
    pub caller: Address,
    pub op: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
    pub failed: usize,
    pub summary: EngineSummary,
    /// First failure: step number, op and error
    #[serde(skip)]
    pub first_failure: Option<(usize, &'static str, FundingError)>,
}

pub fn parse_script(raw: &str) -> CliResult<Vec<ScriptStep>> {
    Ok(serde_json::from_str(raw)?)
}

pub fn load_script(path: &Path) -> CliResult<Vec<ScriptStep>> {
    let raw = fs::read_to_string(path).map_err(|e| CliError::ScriptLoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_script(&raw).map_err(|e| CliError::ScriptLoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Execute `steps` in order. Stops after the first failure unless
/// `keep_going` is set.
pub fn run_script(engine: &mut FundingEngine, steps: Vec<ScriptStep>, keep_going: bool) -> RunReport {
    let mut reports = Vec::with_capacity(steps.len());
    let mut failed = 0;
    let mut first_failure = None;

    for (index, ScriptStep { caller, command }) in steps.into_iter().enumerate() {
        let step = index + 1;
        let op = command.name();

        match engine.execute(caller, command) {
            Ok(outcome) => reports.push(StepReport {
                step,
                caller,
                op,
                ok: true,
                outcome: Some(outcome),
                error_kind: None,
                error: None,
            }),
            Err(err) => {
                failed += 1;
                reports.push(StepReport {
                    step,
                    caller,
                    op,
                    ok: false,
                    outcome: None,
                    error_kind: Some(err.kind()),
                    error: Some(err.to_string()),
                });
                if first_failure.is_none() {
                    first_failure = Some((step, op, err));
                }
                if !keep_going {
                    break;
                }
            }
        }
    }

    RunReport {
        steps: reports,
        failed,
        summary: engine.summary(),
        first_failure,
    }
}

/// One table line per step
pub fn step_line(report: &StepReport) -> String {
    let status = match (&report.outcome, &report.error) {
        (Some(outcome), _) => serde_json::to_string(outcome).unwrap_or_default(),
        (None, Some(error)) => format!("FAILED [{}] {}", report.error_kind.unwrap_or("error"), error),
        (None, None) => String::new(),
    };
    format!("#{:<3} {} {:<28} {}", report.step, report.caller, report.op, status)
}

// ============================================================================
// IMPERATIVE SHELL
// ============================================================================

pub fn handle_run(
    config: &FundingConfig,
    args: &RunArgs,
    format: OutputFormat,
    output: &dyn Output,
) -> CliResult<()> {
    let mut engine = FundingEngine::from_config(config)?;
    let steps = load_script(&args.script)?;
    let total = steps.len();

    tracing::info!(steps = total, keep_going = args.keep_going, "running script");
    let report = run_script(&mut engine, steps, args.keep_going);

    match format {
        OutputFormat::Json => output.print_json(&serde_json::to_value(&report)?)?,
        OutputFormat::Table => {
            output.header("Steps")?;
            for step in &report.steps {
                output.print(&step_line(step))?;
            }
            output.header("Summary")?;
            for line in summary_lines(&report.summary) {
                output.print(&line)?;
            }
        }
    }

    match report.first_failure {
        Some((step, op, source)) if !args.keep_going => {
            output.error(&format!("stopped at step {step} ({op}): {source}"))?;
            Err(CliError::StepFailed {
                step,
                op: op.to_string(),
                source,
            })
        }
        Some(_) => {
            output.error(&format!("{} of {} steps failed", report.failed, total))?;
            Ok(())
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_funding::SingleAdmin;
    use lib_tokens::TokenConfig;
    use lib_types::{tokens, Amount};

    const ADMIN: Address = Address::new([0xAA; 20]);
    const BUYER: Address = Address::new([0x01; 20]);

    fn create_engine() -> FundingEngine {
        let token = TokenConfig::new("Test", "TST", tokens(1_000), Amount::exp10(16));
        FundingEngine::new(token, 1_000, Box::new(SingleAdmin(ADMIN))).unwrap()
    }

    fn buy(amount: u64) -> ScriptStep {
        ScriptStep {
            caller: BUYER,
            command: Command::BuyTokens {
                amount: tokens(amount),
                payment_wei: Amount::exp10(20),
            },
        }
    }

    #[test]
    fn test_parse_script_with_flattened_command() {
        let raw = format!(
            r#"[{{"caller":"{BUYER}","op":"buy_tokens","amount":"5","payment_wei":1}},
                {{"caller":"{BUYER}","op":"claim"}}]"#
        );
        let steps = parse_script(&raw).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0], ScriptStep {
            caller: BUYER,
            command: Command::BuyTokens {
                amount: Amount::from(5u64),
                payment_wei: Amount::one(),
            },
        });
        assert_eq!(steps[1].command, Command::Claim);
    }

    #[test]
    fn test_run_stops_at_first_failure() {
        let mut engine = create_engine();
        let report = run_script(&mut engine, vec![buy(10), buy(5_000), buy(10)], false);

        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.steps[1].error_kind, Some("insufficient_reserve"));
        assert!(matches!(report.first_failure, Some((2, "buy_tokens", _))));
        assert_eq!(engine.balance_of(&BUYER), tokens(10));
    }

    #[test]
    fn test_run_keep_going() {
        let mut engine = create_engine();
        let report = run_script(&mut engine, vec![buy(10), buy(5_000), buy(10)], true);

        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.failed, 1);
        assert!(report.steps[2].ok);
        assert_eq!(engine.balance_of(&BUYER), tokens(20));
    }

    #[test]
    fn test_step_line_shows_failure_kind() {
        let mut engine = create_engine();
        let report = run_script(&mut engine, vec![buy(5_000)], false);
        let line = step_line(&report.steps[0]);
        assert!(line.contains("buy_tokens"));
        assert!(line.contains("FAILED [insufficient_reserve]"));
    }
}
