//! Interactive skip prompt.
//!
//! Git redirects a hook's stdin, so the answer is read from the controlling
//! terminal instead. Answering `s` (any case) skips every check.

use crate::core::error::{Error, Result};
use console::style;
use std::io::{BufRead, BufReader, Write};

/// What the user chose at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run lint and tests.
    Proceed,
    /// Skip all checks and let the commit through.
    Skip,
}

/// Where the skip decision comes from.
pub enum Gate {
    /// Never prompt; always proceed.
    Disabled,
    /// Skip without prompting.
    Skip,
    /// Prompt on the controlling terminal.
    Terminal,
    /// Prompt using the given reader, echoing the prompt to stderr.
    Reader(Box<dyn BufRead + Send>),
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Skip => f.write_str("Skip"),
            Self::Terminal => f.write_str("Terminal"),
            Self::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl Gate {
    /// Resolves the gate from the skip and prompt switches.
    #[must_use]
    pub const fn new(skip: bool, prompt: bool) -> Self {
        if skip {
            Self::Skip
        } else if prompt {
            Self::Terminal
        } else {
            Self::Disabled
        }
    }

    /// Asks for a decision. Ctrl-C while waiting returns [`Error::Interrupted`].
    pub async fn decide(self) -> Result<Decision> {
        let (reader, writer): (Box<dyn BufRead + Send>, Box<dyn Write + Send>) = match self {
            Self::Disabled => return Ok(Decision::Proceed),
            Self::Skip => return Ok(Decision::Skip),
            Self::Reader(reader) => (reader, Box::new(std::io::stderr())),
            Self::Terminal => match open_terminal() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::debug!(error = %e, "no controlling terminal, not prompting");
                    return Ok(Decision::Proceed);
                },
            },
        };

        let mut reader = reader;
        let mut writer = writer;
        let answer = tokio::task::spawn_blocking(move || ask(&mut reader, &mut writer));

        tokio::select! {
            joined = answer => joined.map_err(|e| Error::Internal {
                message: format!("prompt task failed: {e}"),
            })?,
            _ = tokio::signal::ctrl_c() => Err(Error::Interrupted),
        }
    }
}

/// Writes the prompt, then reads one line. End of input means proceed.
pub fn ask<R, W>(input: &mut R, output: &mut W) -> Result<Decision>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    write!(
        output,
        "{} Press Enter to run checks, or type {} to skip: ",
        style("?").cyan(),
        style("s").bold()
    )
    .and_then(|()| output.flush())
    .map_err(|e| Error::io("write prompt", e))?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| Error::io("read prompt answer", e))?;

    Ok(decide(&line))
}

/// Maps a raw answer to a decision.
#[must_use]
pub fn decide(answer: &str) -> Decision {
    if answer.trim().to_lowercase() == "s" {
        Decision::Skip
    } else {
        Decision::Proceed
    }
}

#[cfg(unix)]
fn open_terminal() -> std::io::Result<(Box<dyn BufRead + Send>, Box<dyn Write + Send>)> {
    let tty = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/tty")?;
    let writer = tty.try_clone()?;
    Ok((Box::new(BufReader::new(tty)), Box::new(writer)))
}

#[cfg(not(unix))]
fn open_terminal() -> std::io::Result<(Box<dyn BufRead + Send>, Box<dyn Write + Send>)> {
    let console = std::fs::File::open("CONIN$")?;
    Ok((Box::new(BufReader::new(console)), Box::new(std::io::stderr())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    #[rstest]
    #[case("s\n", Decision::Skip)]
    #[case("S\n", Decision::Skip)]
    #[case("  s  \r\n", Decision::Skip)]
    #[case("\n", Decision::Proceed)]
    #[case("", Decision::Proceed)]
    #[case("skip\n", Decision::Proceed)]
    #[case("y\n", Decision::Proceed)]
    fn test_decide(#[case] answer: &str, #[case] expected: Decision) {
        assert_eq!(decide(answer), expected);
    }

    #[test]
    fn test_ask_writes_prompt_and_reads_one_line() {
        let mut input = Cursor::new("s\nignored\n");
        let mut output = Vec::new();

        let decision = ask(&mut input, &mut output).expect("ask");

        assert_eq!(decision, Decision::Skip);
        assert!(String::from_utf8_lossy(&output).contains("to skip"));
        let mut rest = String::new();
        input.read_line(&mut rest).expect("read rest");
        assert_eq!(rest, "ignored\n");
    }

    #[test]
    fn test_ask_eof_proceeds() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        assert_eq!(ask(&mut input, &mut output).expect("ask"), Decision::Proceed);
    }

    #[test]
    fn test_gate_new() {
        assert!(matches!(Gate::new(true, true), Gate::Skip));
        assert!(matches!(Gate::new(false, true), Gate::Terminal));
        assert!(matches!(Gate::new(false, false), Gate::Disabled));
    }

    #[tokio::test]
    async fn test_gate_reader_skip() {
        let gate = Gate::Reader(Box::new(Cursor::new("S\n")));
        assert_eq!(gate.decide().await.expect("decide"), Decision::Skip);
    }

    #[tokio::test]
    async fn test_gate_disabled_proceeds() {
        assert_eq!(
            Gate::Disabled.decide().await.expect("decide"),
            Decision::Proceed
        );
    }
}
