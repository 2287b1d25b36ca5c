use crate::session::ParseOutcome;

/// Prefix that toggles the session debug flag.
pub const DEBUG_PREFIX: &str = ":debug";
/// Prefix that adds the quad following it.
pub const ADD_PREFIX: &str = ":a ";
/// Prefix that removes the quad following it.
pub const DELETE_PREFIX: &str = ":d ";

/// Represents the classified contents of the pending buffer.
#[derive(Debug, PartialEq)]
pub enum Command<'a> {
    ToggleDebug,
    AddQuad(&'a str),
    DeleteQuad(&'a str),
    Query(&'a str),
}

impl<'a> Command<'a> {
    /// Classifies a non-empty pending buffer by its prefix.
    ///
    /// Prefixes are checked in order: `:debug`, `:a `, `:d `. Anything else
    /// is query text for the active session.
    pub fn classify(buffer: &'a str) -> Self {
        if buffer.starts_with(DEBUG_PREFIX) {
            Command::ToggleDebug
        } else if let Some(rest) = buffer.strip_prefix(ADD_PREFIX) {
            Command::AddQuad(rest)
        } else if let Some(rest) = buffer.strip_prefix(DELETE_PREFIX) {
            Command::DeleteQuad(rest)
        } else {
            Command::Query(buffer)
        }
    }
}

/// What the REPL does after a query buffer has been parsed.
#[derive(Debug, PartialEq)]
pub enum Step {
    /// Run the complete statement
    Execute(String),
    /// Print a syntax error
    Report(String),
    /// Keep accumulating lines
    Wait,
}

/// Decides the next step for `buffer` given the session's parse outcome.
///
/// Returns the step together with the buffer to carry into the next read:
/// empty after `Parsed` and `Failed`, unchanged after `NeedsMore`.
pub fn advance(buffer: String, outcome: ParseOutcome) -> (Step, String) {
    match outcome {
        ParseOutcome::Parsed => (Step::Execute(buffer), String::new()),
        ParseOutcome::Failed(message) => (Step::Report(message), String::new()),
        ParseOutcome::NeedsMore => (Step::Wait, buffer),
    }
}
