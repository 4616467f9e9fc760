//! Line-oriented operator input and output.
//!
//! Wraps any `BufRead`/`Write` pair so menus run the same against a real
//! terminal and against scripted input in tests.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use crossterm::style::{Color, Stylize};

pub struct Prompter<R, W> {
    input: R,
    output: W,
    /// Emit ANSI colours
    color: bool,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W, color: bool) -> Self {
        Self {
            input,
            output,
            color,
        }
    }

    /// Print `label` and read one trimmed line.
    ///
    /// End of input is reported as `UnexpectedEof`.
    pub fn ask(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }

    pub fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    pub fn heading(&mut self, text: &str) -> io::Result<()> {
        let styled = self.paint(text, Color::Cyan);
        writeln!(self.output, "{}", styled)
    }

    pub fn success(&mut self, text: &str) -> io::Result<()> {
        let styled = self.paint(text, Color::Green);
        writeln!(self.output, "{}", styled)
    }

    pub fn error(&mut self, text: &str) -> io::Result<()> {
        let styled = self.paint(text, Color::Red);
        writeln!(self.output, "{}", styled)
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}
