//! Line-oriented operator commands for the terminal console.

use client_core::OperatorEvent;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Operator(OperatorEvent),
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try: click, focus, edit, enter, blur, set, submit, quit)")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim_start();

    let event = match verb {
        "" => return Err(CommandError::Empty),
        "quit" | "exit" => return Ok(Command::Quit),
        "submit" => OperatorEvent::SubmitForm,
        "click" => OperatorEvent::Click {
            element_id: single(rest, "click <element_id>")?,
        },
        "focus" => OperatorEvent::Focus {
            element_id: single(rest, "focus <element_id>")?,
        },
        "enter" => OperatorEvent::Confirm {
            element_id: single(rest, "enter <element_id>")?,
        },
        "blur" => OperatorEvent::Blur {
            element_id: single(rest, "blur <element_id>")?,
        },
        "edit" => {
            let (element_id, value) = pair(rest, "edit <element_id> <text>")?;
            OperatorEvent::Edit { element_id, value }
        }
        "set" => {
            let (field_id, value) = pair(rest, "set <field_id> <value>")?;
            OperatorEvent::EditFormField { field_id, value }
        }
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Command::Operator(event))
}

fn single(rest: &str, usage: &'static str) -> Result<String, CommandError> {
    match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
        [id] => Ok((*id).to_string()),
        _ => Err(CommandError::Usage(usage)),
    }
}

/// First word is the target; the remainder, spaces included, is the value.
fn pair(rest: &str, usage: &'static str) -> Result<(String, String), CommandError> {
    let (target, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    if target.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    Ok((target.to_string(), value.trim_start().to_string()))
}
