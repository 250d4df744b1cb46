use std::io::BufRead;
use std::str::FromStr;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// A user action, read as one line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    Start,
    Stop,
    Select(String),
    Stats,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,

    #[error("select needs an exercise, e.g. `select squat`")]
    MissingExercise,

    #[error("unknown command {0:?} (try start, stop, select <exercise>, stats or quit)")]
    Unknown(String),
}

impl FromStr for UiCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandParseError::Empty);
        };

        match verb.to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "stats" => Ok(Self::Stats),
            "quit" | "exit" => Ok(Self::Quit),
            "select" => words
                .next()
                .map(|kind| Self::Select(kind.to_string()))
                .ok_or(CommandParseError::MissingExercise),
            _ => Err(CommandParseError::Unknown(verb.to_string())),
        }
    }
}

/// Forward commands from `reader` until it ends or the receiver goes away.
/// Blank lines are skipped; bad lines are reported on stderr.
pub fn read_commands(reader: impl BufRead, tx: &UnboundedSender<UiCommand>) {
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        match line.parse::<UiCommand>() {
            Ok(command) => {
                if tx.send(command).is_err() {
                    break;
                }
            }
            Err(CommandParseError::Empty) => {}
            Err(e) => eprintln!("{e}"),
        }
    }
    debug!("command input finished");
}

/// Read commands from stdin on a detached thread.
pub fn spawn_stdin_reader(tx: UnboundedSender<UiCommand>) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || read_commands(std::io::stdin().lock(), &tx))?;
    Ok(())
}
