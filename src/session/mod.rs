/// Query Language Sessions
///
/// A session adapts one query language to the REPL. The REPL only ever sees
/// the [`Session`] trait: it asks the session whether the accumulated input
/// is a complete statement, runs complete statements on a producer thread,
/// and renders each result the session streams back.
///
/// ## Languages
///
/// - **gremlin** (`gremlin.rs`): path traversals such as `g.V("alice").Out("follows")`
/// - **mql** (`mql.rs`): JSON templates filled in from the store
/// - **sexp** (`sexp.rs`): s-expression pattern matching with variables
///
/// The language is chosen once at startup with [`QueryLanguage::from_name`]
/// and instantiated with [`open`].
pub mod gremlin;
pub mod mql;
pub mod sexp;
pub mod stream;

pub use stream::{result_channel, ResultSink, ResultStream, RESULT_BUFFER, RESULT_LIMIT};

use crate::config::SessionConfig;
use crate::core::{QuadStore, Result};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Outcome of incrementally parsing the accumulated input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The input is a complete, valid statement
    Parsed,
    /// The input is a valid prefix; more lines are needed
    NeedsMore,
    /// The input can never become a valid statement
    Failed(String),
}

/// A stateful adapter for one query language.
pub trait Session: Send + Sync {
    /// Checks whether `input` is a complete statement.
    fn parse_incremental(&mut self, input: &str) -> ParseOutcome;

    /// Flips the debug flag and returns its new value.
    fn toggle_debug(&mut self) -> bool;

    /// Runs `query`, pushing results into `sink`.
    ///
    /// Called on a producer thread while the REPL drains the other end of
    /// the stream. Implementations stop as soon as `sink.push` returns
    /// `false` and never produce more than `limit` results. The sink is
    /// consumed so the stream closes whenever this returns.
    fn execute(&self, query: &str, sink: ResultSink, limit: usize) -> Result<()>;

    /// Renders one result as display text, without a trailing newline.
    fn render(&self, result: &Value) -> String;
}

/// The query languages a session can be opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryLanguage {
    #[default]
    Gremlin,
    Mql,
    Sexp,
}

impl QueryLanguage {
    /// Resolves a configured language name.
    ///
    /// Names are case-sensitive. Unknown names fall back to
    /// [`QueryLanguage::Gremlin`], the default language.
    pub fn from_name(name: &str) -> Self {
        match name {
            "gremlin" => QueryLanguage::Gremlin,
            "mql" => QueryLanguage::Mql,
            "sexp" => QueryLanguage::Sexp,
            other => {
                warn!("Unknown query language {:?}, using gremlin", other);
                QueryLanguage::Gremlin
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QueryLanguage::Gremlin => "gremlin",
            QueryLanguage::Mql => "mql",
            QueryLanguage::Sexp => "sexp",
        }
    }
}

impl fmt::Display for QueryLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opens a session for `language` over `store`.
pub fn open(
    language: QueryLanguage,
    store: Arc<dyn QuadStore>,
    config: &SessionConfig,
) -> Box<dyn Session> {
    match language {
        QueryLanguage::Gremlin => Box::new(gremlin::GremlinSession::new(store, config.timeout())),
        QueryLanguage::Mql => Box::new(mql::MqlSession::new(store)),
        QueryLanguage::Sexp => Box::new(sexp::SexpSession::new(store)),
    }
}

/// Pretty JSON rendering shared by sessions in debug mode.
pub(crate) fn render_debug(result: &Value) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemStore;

    #[test]
    fn test_language_names_are_case_sensitive() {
        assert_eq!(QueryLanguage::from_name("gremlin"), QueryLanguage::Gremlin);
        assert_eq!(QueryLanguage::from_name("mql"), QueryLanguage::Mql);
        assert_eq!(QueryLanguage::from_name("sexp"), QueryLanguage::Sexp);
        assert_eq!(QueryLanguage::from_name("MQL"), QueryLanguage::Gremlin);
        assert_eq!(QueryLanguage::from_name("sparql"), QueryLanguage::Gremlin);
        assert_eq!(QueryLanguage::from_name(""), QueryLanguage::Gremlin);
    }

    #[test]
    fn test_open_each_language() {
        let store: Arc<dyn QuadStore> = Arc::new(MemStore::new());
        let config = SessionConfig::default();
        for (language, query) in [
            (QueryLanguage::Gremlin, "g.V().All()"),
            (QueryLanguage::Mql, r#"{"id": null}"#),
            (QueryLanguage::Sexp, "(match (?s ?p ?o))"),
        ] {
            let mut session = open(language, store.clone(), &config);
            assert_eq!(
                session.parse_incremental(query),
                ParseOutcome::Parsed,
                "{} should accept {}",
                language,
                query
            );
        }
    }
}
