//! Terminal prompts for actions that need user input
//!
//! Dispatch runs under fzf's `execute(...)`, so the terminal belongs to the
//! dispatch process while it prompts.

use color_eyre::Result;
use kube_pilot_core::{Action, Mode, Step, navigation::plan};
use std::io::{BufRead, Write};

/// Fill in the answers `delete` and `scale` need before dispatch
///
/// Nothing is asked when the action does not apply to `mode` or the answer
/// was already given on the command line.
pub fn complete_action<F>(mode: &Mode, action: Action, mut ask: F) -> Result<Action>
where
    F: FnMut(&str) -> Result<String>,
{
    match plan(mode, action.clone()) {
        Step::Delete {
            resource_type,
            name,
            confirmation,
            force,
        } if confirmation.is_empty() => {
            let verb = if force { "Force delete" } else { "Delete" };
            let answer = ask(&format!("{} {}/{}? [y/N]", verb, resource_type, name))?;
            Ok(Action::Delete {
                target: name,
                confirmation: answer,
                force,
            })
        }
        Step::Scale {
            resource_type,
            name,
            replicas,
        } if replicas.is_empty() => {
            let answer = ask(&format!("Replicas for {}/{}:", resource_type, name))?;
            Ok(Action::Scale {
                target: name,
                replicas: answer,
            })
        }
        _ => Ok(action),
    }
}

/// Print `question` and read one line from `input`
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{} ", question)?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim_end_matches(['\r', '\n']).to_string())
}

/// Ask on the controlling terminal
pub fn ask_terminal(question: &str) -> Result<String> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    ask(&mut input, &mut std::io::stderr(), question)
}

/// Wait for enter so a message stays visible before fzf redraws
pub fn pause(message: &str) -> Result<()> {
    ask_terminal(&format!("{}\n[press enter]", message))?;
    Ok(())
}
