use colored::Colorize;
use std::fmt::Display;
use std::future::Future;
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::time::Duration;

use crate::error::{BotError, Result};

const SPINNER_FRAMES: [&str; 8] = [
    "▰▱▱▱▱▱▱",
    "▰▰▱▱▱▱▱",
    "▰▰▰▱▱▱▱",
    "▰▰▰▰▱▱▱",
    "▰▰▰▰▰▱▱",
    "▰▰▰▰▰▰▱",
    "▰▰▰▰▰▰▰",
    "▱▱▱▱▱▱▱",
];

/// Ordered label/value pairs shown before any state-changing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    rows: Vec<(String, String)>,
}

impl Preview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, label: impl Into<String>, value: impl Display) -> Self {
        self.rows.push((label.into(), value.to_string()));
        self
    }

    pub fn rows(&self) -> &[(String, String)] {
        &self.rows
    }
}

/// The single interactive input/output stream of a run.
///
/// Generic over reader and writer so workflows can be driven by a script in tests.
pub struct Session<R, W> {
    input: R,
    output: W,
}

impl Session<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn say(&mut self, line: impl Display) {
        let _ = writeln!(self.output, "{line}");
    }

    pub fn success(&mut self, message: impl Display) {
        self.say(format!("{} ✅", message).green());
    }

    pub fn warn(&mut self, message: impl Display) {
        self.say(message.to_string().yellow());
    }

    pub fn error(&mut self, message: impl Display) {
        self.say(format!("{} ❌", message).red());
    }

    pub fn clear(&mut self) {
        let _ = write!(self.output, "\x1B[2J\x1B[1;1H");
        let _ = self.output.flush();
    }

    /// Prints `question` and reads one line. End of input is reported as
    /// [`BotError::InputClosed`].
    pub fn ask(&mut self, question: &str) -> Result<String> {
        let _ = write!(self.output, "{}", question.yellow());
        let _ = self.output.flush();

        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            return Err(BotError::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    /// Shows the preview box and blocks on a yes/no answer. Only `y` or `yes`
    /// (any case) confirm.
    pub fn confirm(&mut self, preview: &Preview) -> Result<bool> {
        self.say("┌─── Transaction Preview ───┐".white());
        for (label, value) in preview.rows() {
            self.say(format!("│ {:<15} : {}", label, value.cyan()));
        }
        self.say("└──────────────────────────┘".white());

        let answer = self.ask("Confirm transaction? (y/n): ")?;
        Ok(is_yes(&answer))
    }

    pub fn pause(&mut self, menu: &str) -> Result<()> {
        self.ask(&format!("Press Enter to return to the {menu} menu..."))?;
        Ok(())
    }

    /// Drives `future` to completion while animating an indeterminate spinner.
    pub async fn with_spinner<F: Future>(&mut self, message: &str, future: F) -> F::Output {
        tokio::pin!(future);
        let mut ticker = tokio::time::interval(Duration::from_millis(100));
        let mut frame = 0usize;

        let output = loop {
            tokio::select! {
                biased;
                result = &mut future => break result,
                _ = ticker.tick() => {
                    let _ = write!(
                        self.output,
                        "\r{} {}",
                        message.yellow(),
                        SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
                    );
                    let _ = self.output.flush();
                    frame += 1;
                }
            }
        };

        let _ = write!(self.output, "\r\x1B[2K");
        let _ = self.output.flush();
        output
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
