/// The interactive read-eval-print loop.
///
/// Lines are appended to a pending buffer until the session reports a
/// complete statement. The buffer is classified as a special command
/// (`:debug`, `:a <quad>`, `:d <quad>`) or as query text, and query text is
/// executed through [`runner::run_query`]. Only one query is ever in flight:
/// the next prompt appears after its results have been drained.
pub mod command;
pub mod reader;
pub mod runner;

pub use command::{advance, Command, Step};
pub use reader::{LineReader, LineSource, ReadOutcome, MAX_LINE_LEN};
pub use runner::{run_query, RunSummary};

use crate::core::{parse_quad, QuadStore, Result, ShellError};
use crate::session::Session;
use std::io::Write;
use std::mem;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prompt shown when no statement is pending.
pub const PROMPT: &str = "triplesh> ";
/// Prompt shown while a statement spans several lines, aligned with `PROMPT`.
pub const CONTINUATION_PROMPT: &str = "      ... ";

const INVALID_QUAD: &str = "Not a valid quad.";

/// REPL state: the input source, the output sink, the active session and the
/// store that `:a` / `:d` mutate.
pub struct Repl<R, W> {
    reader: R,
    out: W,
    session: Box<dyn Session>,
    store: Arc<dyn QuadStore>,
    pending: String,
}

impl<R: LineSource, W: Write> Repl<R, W> {
    pub fn new(reader: R, out: W, session: Box<dyn Session>, store: Arc<dyn QuadStore>) -> Self {
        Repl {
            reader,
            out,
            session,
            store,
            pending: String::new(),
        }
    }

    /// The text accumulated so far for the statement being entered
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Consumes the REPL, returning its output sink
    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs the loop until end of input.
    ///
    /// # Errors
    ///
    /// Returns `ShellError::LineTooLong` when an input line exceeds the
    /// reader's limit; the caller is expected to abort. Output failures are
    /// also returned. Every other problem is reported inline and the loop
    /// carries on.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.prompt()?;
            match self.reader.read_line() {
                ReadOutcome::Line(line) => self.pending.push_str(&line),
                ReadOutcome::Eof if self.pending.is_empty() => {
                    info!("End of input, leaving REPL");
                    return Ok(());
                }
                ReadOutcome::Eof => {
                    warn!("End of input with an incomplete statement: {:?}", self.pending);
                    writeln!(self.out, "\nDiscarding incomplete statement.")?;
                    self.pending.clear();
                    continue;
                }
                ReadOutcome::Error(e) => {
                    warn!("Read error, discarding pending input: {}", e);
                    self.pending.clear();
                    continue;
                }
                ReadOutcome::Truncated => {
                    return Err(ShellError::LineTooLong {
                        limit: self.reader.max_len(),
                    });
                }
            }

            // Whitespace alone never starts a statement.
            if self.pending.trim().is_empty() {
                self.pending.clear();
                continue;
            }
            self.dispatch()?;
        }
    }

    fn prompt(&mut self) -> Result<()> {
        let prompt = if self.pending.is_empty() {
            PROMPT
        } else {
            CONTINUATION_PROMPT
        };
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;
        Ok(())
    }

    /// Acts on the non-empty pending buffer.
    fn dispatch(&mut self) -> Result<()> {
        match Command::classify(&self.pending) {
            Command::ToggleDebug => {
                let enabled = self.session.toggle_debug();
                debug!("Debug mode {}", enabled);
                writeln!(
                    self.out,
                    "Debug toggled: {}",
                    if enabled { "on" } else { "off" }
                )?;
                self.pending.clear();
            }
            Command::AddQuad(text) => {
                let quad = parse_quad(text);
                self.pending.clear();
                match quad {
                    Some(quad) => {
                        if let Err(e) = self.store.add_quad(quad) {
                            writeln!(self.out, "Error: {}", e)?;
                        }
                    }
                    None => writeln!(self.out, "{}", INVALID_QUAD)?,
                }
            }
            Command::DeleteQuad(text) => {
                let quad = parse_quad(text);
                self.pending.clear();
                match quad {
                    Some(quad) => {
                        if let Err(e) = self.store.remove_quad(&quad) {
                            writeln!(self.out, "Error: {}", e)?;
                        }
                    }
                    None => writeln!(self.out, "{}", INVALID_QUAD)?,
                }
            }
            Command::Query(_) => {
                let outcome = self.session.parse_incremental(&self.pending);
                let (step, next) = advance(mem::take(&mut self.pending), outcome);
                self.pending = next;
                match step {
                    Step::Execute(query) => {
                        run_query(&mut self.out, self.session.as_ref(), &query)?;
                    }
                    Step::Report(message) => writeln!(self.out, "Error: {}", message)?,
                    Step::Wait => {}
                }
            }
        }
        Ok(())
    }
}
