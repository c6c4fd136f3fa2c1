//! Interactive questions asked during a run.

use std::cell::RefCell;
use std::io::{BufRead, Write};

use anyhow::{Context, Result};

/// Invalid answers tolerated before a question counts as cancelled.
pub const MAX_PROMPT_ATTEMPTS: usize = 3;

pub trait Prompter {
    /// Pick one of `options`; `Ok(None)` when the user gives up.
    fn choose(&self, message: &str, options: &[String]) -> Result<Option<usize>>;

    /// Yes/no question; anything but an explicit yes is a no.
    fn confirm(&self, message: &str) -> Result<bool>;
}

/// Prompter for an interactive terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn choose(&self, message: &str, options: &[String]) -> Result<Option<usize>> {
        dialoguer::Select::new()
            .with_prompt(message)
            .items(options)
            .default(0)
            .interact_opt()
            .context("failed to read selection")
    }

    fn confirm(&self, message: &str) -> Result<bool> {
        dialoguer::Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact_opt()
            .map(|answer| answer.unwrap_or(false))
            .context("failed to read confirmation")
    }
}

/// Line-oriented prompter for piped input.
///
/// Options are listed as `1) ...`; the answer is the option number.
pub struct LinePrompter<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }

    /// Ask up to [`MAX_PROMPT_ATTEMPTS`] times until `parse` accepts an answer.
    fn ask<T>(&self, question: &str, parse: impl Fn(&str) -> Option<T>) -> Result<Option<T>> {
        for _ in 0..MAX_PROMPT_ATTEMPTS {
            {
                let mut output = self.output.borrow_mut();
                write!(output, "{question}")?;
                output.flush()?;
            }
            let mut line = String::new();
            let read = self
                .input
                .borrow_mut()
                .read_line(&mut line)
                .context("failed to read answer")?;
            if read == 0 {
                return Ok(None);
            }
            if let Some(value) = parse(line.trim()) {
                return Ok(Some(value));
            }
            writeln!(self.output.borrow_mut(), "Invalid answer: {}", line.trim())?;
        }
        tracing::debug!(question, "prompt cancelled after repeated invalid answers");
        Ok(None)
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn choose(&self, message: &str, options: &[String]) -> Result<Option<usize>> {
        {
            let mut output = self.output.borrow_mut();
            writeln!(output, "{message}")?;
            for (idx, option) in options.iter().enumerate() {
                writeln!(output, "  {}) {option}", idx + 1)?;
            }
        }
        let question = format!("Choice [1-{}]: ", options.len());
        self.ask(&question, |answer| parse_choice(answer, options.len()))
    }

    fn confirm(&self, message: &str) -> Result<bool> {
        let answer = self.ask(&format!("{message} [y/n]: "), parse_yes_no)?;
        Ok(answer.unwrap_or(false))
    }
}

/// Answers every confirmation with yes; choices are delegated.
pub struct AutoConfirm<P> {
    inner: P,
}

impl<P: Prompter> AutoConfirm<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: Prompter> Prompter for AutoConfirm<P> {
    fn choose(&self, message: &str, options: &[String]) -> Result<Option<usize>> {
        self.inner.choose(message, options)
    }

    fn confirm(&self, message: &str) -> Result<bool> {
        tracing::info!("{message} [auto-confirmed]");
        Ok(true)
    }
}

fn parse_choice(answer: &str, count: usize) -> Option<usize> {
    let picked = answer.parse::<usize>().ok()?;
    (1..=count).contains(&picked).then(|| picked - 1)
}

fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
