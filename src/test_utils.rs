/// # Test Utilities Module
///
/// Scripted stand-ins for the REPL's collaborators:
/// - `ScriptedLines`: a line source replaying fixed read outcomes
/// - `ScriptedSession`: a session replaying fixed parse outcomes and
///   recording what it was asked to parse and execute
/// - `RecordingStore`: a quad store that only records mutations
use crate::core::{Quad, QuadStore, Result};
use crate::repl::{LineSource, ReadOutcome};
use crate::session::{ParseOutcome, ResultSink, Session};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Line source that yields scripted outcomes, then end of input forever.
pub struct ScriptedLines {
    outcomes: VecDeque<ReadOutcome>,
}

impl ScriptedLines {
    pub fn new(lines: &[&str]) -> Self {
        Self::from_outcomes(
            lines
                .iter()
                .map(|line| ReadOutcome::Line(line.to_string()))
                .collect(),
        )
    }

    pub fn from_outcomes(outcomes: Vec<ReadOutcome>) -> Self {
        ScriptedLines {
            outcomes: outcomes.into(),
        }
    }
}

impl LineSource for ScriptedLines {
    fn read_line(&mut self) -> ReadOutcome {
        self.outcomes.pop_front().unwrap_or(ReadOutcome::Eof)
    }
}

/// Session whose parse results are scripted. Once the script runs out every
/// input parses. Executing a query pushes `results` strings
/// `"result 0"`, `"result 1"`, ... until the sink refuses more.
#[derive(Default)]
pub struct ScriptedSession {
    outcomes: VecDeque<ParseOutcome>,
    results: usize,
    debug: bool,
    parsed: Arc<Mutex<Vec<String>>>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSession {
    pub fn with_outcomes(outcomes: Vec<ParseOutcome>) -> Self {
        ScriptedSession {
            outcomes: outcomes.into(),
            ..Self::default()
        }
    }

    pub fn producing(results: usize) -> Self {
        Self::default().producing_results(results)
    }

    pub fn producing_results(mut self, results: usize) -> Self {
        self.results = results;
        self
    }

    /// Inputs passed to `parse_incremental`, in call order
    pub fn parsed_handle(&self) -> Arc<Mutex<Vec<String>>> {
        self.parsed.clone()
    }

    /// Queries passed to `execute`, in call order
    pub fn executed_handle(&self) -> Arc<Mutex<Vec<String>>> {
        self.executed.clone()
    }
}

impl Session for ScriptedSession {
    fn parse_incremental(&mut self, input: &str) -> ParseOutcome {
        self.parsed.lock().unwrap().push(input.to_string());
        self.outcomes.pop_front().unwrap_or(ParseOutcome::Parsed)
    }

    fn toggle_debug(&mut self) -> bool {
        self.debug = !self.debug;
        self.debug
    }

    fn execute(&self, query: &str, mut sink: ResultSink, _limit: usize) -> Result<()> {
        self.executed.lock().unwrap().push(query.to_string());
        for i in 0..self.results {
            if !sink.push(json!(format!("result {}", i))) {
                break;
            }
        }
        Ok(())
    }

    fn render(&self, result: &Value) -> String {
        result
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| result.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Add(Quad),
    Remove(Quad),
}

/// Quad store that records mutations and holds no data.
#[derive(Debug, Default)]
pub struct RecordingStore {
    ops: Mutex<Vec<StoreOp>>,
}

impl RecordingStore {
    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().unwrap().clone()
    }
}

impl QuadStore for RecordingStore {
    fn add_quad(&self, quad: Quad) -> Result<bool> {
        self.ops.lock().unwrap().push(StoreOp::Add(quad));
        Ok(true)
    }

    fn remove_quad(&self, quad: &Quad) -> Result<bool> {
        self.ops.lock().unwrap().push(StoreOp::Remove(quad.clone()));
        Ok(true)
    }

    fn quads_matching(
        &self,
        _subject: Option<&str>,
        _predicate: Option<&str>,
        _object: Option<&str>,
    ) -> Result<Vec<Quad>> {
        Ok(Vec::new())
    }

    fn nodes(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.ops.lock().unwrap().len())
    }
}
