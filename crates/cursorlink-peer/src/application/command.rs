//! Line-oriented commands accepted by the touchpad on stdin.
//!
//! ```text
//! move <dx> <dy>    send a raw movement delta
//! touch <x> <y>     finger down at a point
//! drag <x> <y>      finger moved to a point (sends the scaled delta)
//! release           finger lifted
//! click             send a click
//! quit              leave the session
//! ```

use std::str::FromStr;

use thiserror::Error;

/// A parsed touchpad command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchpadCommand {
    Move { dx: f64, dy: f64 },
    Touch { x: f64, y: f64 },
    Drag { x: f64, y: f64 },
    Release,
    Click,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{command}` expects {expected} argument(s), got {got}")]
    Arity {
        command: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("`{0}` is not a finite number")]
    BadNumber(String),
}

impl FromStr for TouchpadCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = words.collect();

        match verb.to_ascii_lowercase().as_str() {
            "move" | "m" => {
                let (dx, dy) = two_numbers("move", &args)?;
                Ok(Self::Move { dx, dy })
            }
            "touch" | "t" => {
                let (x, y) = two_numbers("touch", &args)?;
                Ok(Self::Touch { x, y })
            }
            "drag" | "d" => {
                let (x, y) = two_numbers("drag", &args)?;
                Ok(Self::Drag { x, y })
            }
            "release" | "r" => no_args("release", &args).map(|()| Self::Release),
            "click" | "c" => no_args("click", &args).map(|()| Self::Click),
            "quit" | "q" | "exit" => no_args("quit", &args).map(|()| Self::Quit),
            _ => Err(CommandError::Unknown(verb.to_string())),
        }
    }
}

fn two_numbers(command: &'static str, args: &[&str]) -> Result<(f64, f64), CommandError> {
    match args {
        [a, b] => Ok((number(a)?, number(b)?)),
        _ => Err(CommandError::Arity {
            command,
            expected: 2,
            got: args.len(),
        }),
    }
}

fn no_args(command: &'static str, args: &[&str]) -> Result<(), CommandError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandError::Arity {
            command,
            expected: 0,
            got: args.len(),
        })
    }
}

fn number(word: &str) -> Result<f64, CommandError> {
    word.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| CommandError::BadNumber(word.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
