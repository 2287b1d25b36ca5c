//! S-expression pattern session.
//!
//! A query lists triple patterns that must all hold at once:
//!
//! ```text
//! (match (?who <follows> <bob>)
//!        (?who <status> ?status))
//! ```
//!
//! Terms beginning with `?` are variables. Each consistent assignment of the
//! variables is one result.
use super::{render_debug, ParseOutcome, ResultSink, Session};
use crate::core::{QuadStore, Result, ShellError};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Atom(String),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Term {
    Var(String),
    Const(String),
}

type Pattern = [Term; 3];

#[derive(Debug, Clone, PartialEq)]
enum SyntaxError {
    Incomplete,
    Invalid(String),
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '"' => {
                let mut text = String::new();
                loop {
                    match chars.next() {
                        None => return Err(SyntaxError::Incomplete),
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            None => return Err(SyntaxError::Incomplete),
                            Some(escaped) => text.push(escaped),
                        },
                        Some(ch) => text.push(ch),
                    }
                }
                tokens.push(Token::Str(text));
            }
            c if c.is_whitespace() => {}
            c => {
                let mut atom = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '(' | ')' | '"') {
                        break;
                    }
                    atom.push(next);
                    chars.next();
                }
                tokens.push(Token::Atom(atom));
            }
        }
    }
    Ok(tokens)
}

fn term(token: &Token) -> std::result::Result<Term, SyntaxError> {
    match token {
        Token::Str(s) => Ok(Term::Const(s.clone())),
        Token::Atom(a) => {
            if let Some(name) = a.strip_prefix('?') {
                if name.is_empty() {
                    return Err(SyntaxError::Invalid("empty variable name".to_string()));
                }
                return Ok(Term::Var(name.to_string()));
            }
            let value = a
                .strip_prefix('<')
                .and_then(|rest| rest.strip_suffix('>'))
                .unwrap_or(a);
            Ok(Term::Const(value.to_string()))
        }
        other => Err(SyntaxError::Invalid(format!(
            "expected a term, found {:?}",
            other
        ))),
    }
}

fn parse(input: &str) -> std::result::Result<Vec<Pattern>, SyntaxError> {
    let tokens = tokenize(input)?;

    let mut depth: usize = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Open => depth += 1,
            Token::Close if depth == 0 => {
                return Err(SyntaxError::Invalid("unexpected ')'".to_string()))
            }
            Token::Close => {
                depth -= 1;
                if depth == 0 && i + 1 != tokens.len() {
                    return Err(SyntaxError::Invalid(
                        "unexpected input after the query".to_string(),
                    ));
                }
            }
            _ => {}
        }
    }
    if tokens.is_empty() || depth > 0 {
        return Err(SyntaxError::Incomplete);
    }

    match tokens.as_slice() {
        [Token::Open, Token::Atom(head), body @ .., Token::Close] if head == "match" => {
            let mut patterns = Vec::new();
            let mut rest = body;
            while !rest.is_empty() {
                match rest {
                    [Token::Open, s, p, o, Token::Close, tail @ ..] => {
                        patterns.push([term(s)?, term(p)?, term(o)?]);
                        rest = tail;
                    }
                    _ => {
                        return Err(SyntaxError::Invalid(
                            "patterns have the form (subject predicate object)".to_string(),
                        ))
                    }
                }
            }
            if patterns.is_empty() {
                return Err(SyntaxError::Invalid("match needs at least one pattern".to_string()));
            }
            Ok(patterns)
        }
        _ => Err(SyntaxError::Invalid("expected (match ...)".to_string())),
    }
}

/// Variable assignments in order of first binding.
type Bindings = Vec<(String, String)>;

fn lookup<'a>(bindings: &'a Bindings, name: &str) -> Option<&'a str> {
    bindings
        .iter()
        .find(|(var, _)| var == name)
        .map(|(_, value)| value.as_str())
}

/// S-expression session over a quad store.
pub struct SexpSession {
    store: Arc<dyn QuadStore>,
    debug: bool,
}

impl SexpSession {
    pub fn new(store: Arc<dyn QuadStore>) -> Self {
        SexpSession {
            store,
            debug: false,
        }
    }

    /// Depth-first join over `patterns`. `emit` returns `false` to stop the
    /// search; the return value says whether the search should continue.
    fn solve(
        &self,
        patterns: &[Pattern],
        bindings: &mut Bindings,
        emit: &mut dyn FnMut(&Bindings) -> bool,
    ) -> Result<bool> {
        let Some((pattern, remaining)) = patterns.split_first() else {
            return Ok(emit(bindings));
        };

        let resolve = |term: &Term| -> Option<String> {
            match term {
                Term::Const(value) => Some(value.clone()),
                Term::Var(name) => lookup(bindings, name).map(str::to_string),
            }
        };
        let [s, p, o] = pattern;
        let (subject, predicate, object) = (resolve(s), resolve(p), resolve(o));
        let quads = self.store.quads_matching(
            subject.as_deref(),
            predicate.as_deref(),
            object.as_deref(),
        )?;

        for quad in quads {
            let mark = bindings.len();
            let consistent = [(s, &quad.subject), (p, &quad.predicate), (o, &quad.object)]
                .into_iter()
                .all(|(term, value)| match term {
                    Term::Const(_) => true,
                    Term::Var(name) => match lookup(bindings, name) {
                        Some(bound) => bound == value,
                        None => {
                            bindings.push((name.clone(), value.clone()));
                            true
                        }
                    },
                });
            let keep_going = !consistent || self.solve(remaining, bindings, emit)?;
            bindings.truncate(mark);
            if !keep_going {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Session for SexpSession {
    fn parse_incremental(&mut self, input: &str) -> ParseOutcome {
        match parse(input) {
            Ok(_) => ParseOutcome::Parsed,
            Err(SyntaxError::Incomplete) => ParseOutcome::NeedsMore,
            Err(SyntaxError::Invalid(msg)) => ParseOutcome::Failed(msg),
        }
    }

    fn toggle_debug(&mut self) -> bool {
        self.debug = !self.debug;
        self.debug
    }

    fn execute(&self, query: &str, mut sink: ResultSink, limit: usize) -> Result<()> {
        let patterns = parse(query).map_err(|e| match e {
            SyntaxError::Incomplete => ShellError::Query("incomplete query".to_string()),
            SyntaxError::Invalid(msg) => ShellError::Query(msg),
        })?;
        if self.debug {
            info!("sexp patterns: {:?}", patterns);
        }

        let mut produced = 0;
        let mut emit = |bindings: &Bindings| {
            let row: Map<String, Value> = bindings
                .iter()
                .map(|(var, value)| (var.clone(), Value::String(value.clone())))
                .collect();
            produced += 1;
            sink.push(Value::Object(row)) && produced < limit
        };
        self.solve(&patterns, &mut Vec::new(), &mut emit)?;
        Ok(())
    }

    fn render(&self, result: &Value) -> String {
        if self.debug {
            return render_debug(result);
        }
        match result {
            Value::Object(row) if row.is_empty() => "yes".to_string(),
            Value::Object(row) => row
                .iter()
                .map(|(var, value)| match value {
                    Value::String(s) => format!("?{} = {}", var, s),
                    other => format!("?{} = {}", var, other),
                })
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        }
    }
}
