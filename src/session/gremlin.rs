/// Gremlin-style Path Session
///
/// The default query language. A query is a chain of steps starting from a
/// set of vertices:
///
/// ```text
/// g.V("alice").Out("follows").Has("status", "cool").All()
/// ```
///
/// Supported steps are `Out`, `In`, `Both` (each with an optional predicate),
/// `Has(predicate, object)`, `Is(ids...)` and `Unique()`. A chain may end with
/// one terminal: `All()` (the default), `GetLimit(n)` or `Count()`.
use super::{render_debug, ParseOutcome, ResultSink, Session};
use crate::core::{QuadStore, Result, ShellError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(usize),
    Dot,
    LParen,
    RParen,
    Comma,
    Semi,
}

#[derive(Debug, Clone, PartialEq)]
enum SyntaxError {
    /// Input ended where more was expected
    Incomplete,
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Out(Option<String>),
    In(Option<String>),
    Both(Option<String>),
    Has(String, String),
    Is(Vec<String>),
    Unique,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Terminal {
    All,
    GetLimit(usize),
    Count,
}

#[derive(Debug, Clone, PartialEq)]
struct Traversal {
    /// Starting vertices; empty means every vertex in the store
    start: Vec<String>,
    steps: Vec<Step>,
    terminal: Terminal,
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            ';' => {
                chars.next();
                tokens.push(Token::Semi);
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        None => return Err(SyntaxError::Incomplete),
                        Some(ch) if ch == quote => break,
                        Some('\\') => match chars.next() {
                            None => return Err(SyntaxError::Incomplete),
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some(other) => text.push(other),
                        },
                        Some(ch) => text.push(ch),
                    }
                }
                tokens.push(Token::Str(text));
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    chars.next();
                }
                let n = digits
                    .parse()
                    .map_err(|_| SyntaxError::Invalid(format!("number out of range: {}", digits)))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if !(d.is_alphanumeric() || d == '_') {
                        break;
                    }
                    ident.push(d);
                    chars.next();
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(SyntaxError::Invalid(format!(
                    "unexpected character '{}'",
                    other
                )))
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> std::result::Result<Token, SyntaxError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(SyntaxError::Incomplete)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: Token) -> std::result::Result<(), SyntaxError> {
        let token = self.next()?;
        if token == expected {
            Ok(())
        } else {
            Err(SyntaxError::Invalid(format!(
                "expected {:?}, found {:?}",
                expected, token
            )))
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Parses `( arg, ... )` after a step name.
    fn args(&mut self) -> std::result::Result<Vec<Token>, SyntaxError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        loop {
            match self.next()? {
                Token::RParen if args.is_empty() => return Ok(args),
                token @ (Token::Str(_) | Token::Num(_)) => args.push(token),
                other => {
                    return Err(SyntaxError::Invalid(format!(
                        "expected an argument, found {:?}",
                        other
                    )))
                }
            }
            match self.next()? {
                Token::Comma => continue,
                Token::RParen => return Ok(args),
                other => {
                    return Err(SyntaxError::Invalid(format!(
                        "expected ',' or ')', found {:?}",
                        other
                    )))
                }
            }
        }
    }
}

fn strings(name: &str, args: Vec<Token>) -> std::result::Result<Vec<String>, SyntaxError> {
    args.into_iter()
        .map(|arg| match arg {
            Token::Str(s) => Ok(s),
            other => Err(SyntaxError::Invalid(format!(
                "{} expects string arguments, found {:?}",
                name, other
            ))),
        })
        .collect()
}

fn optional_predicate(
    name: &str,
    args: Vec<Token>,
) -> std::result::Result<Option<String>, SyntaxError> {
    let mut args = strings(name, args)?;
    match args.len() {
        0 => Ok(None),
        1 => Ok(args.pop()),
        n => Err(SyntaxError::Invalid(format!(
            "{} takes at most one predicate, got {}",
            name, n
        ))),
    }
}

fn parse(input: &str) -> std::result::Result<Traversal, SyntaxError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };

    match parser.next()? {
        Token::Ident(g) if g == "g" => {}
        other => {
            return Err(SyntaxError::Invalid(format!(
                "queries start with 'g', found {:?}",
                other
            )))
        }
    }
    parser.expect(Token::Dot)?;
    let start = match parser.next()? {
        Token::Ident(name) if name == "V" || name == "Vertex" => strings(&name, parser.args()?)?,
        other => {
            return Err(SyntaxError::Invalid(format!(
                "expected V(...), found {:?}",
                other
            )))
        }
    };

    let mut steps = Vec::new();
    let mut terminal = None;
    loop {
        match parser.next() {
            Err(SyntaxError::Incomplete) => break,
            Err(e) => return Err(e),
            Ok(Token::Semi) if parser.at_end() => break,
            Ok(Token::Dot) => {}
            Ok(other) => {
                return Err(SyntaxError::Invalid(format!(
                    "expected '.', found {:?}",
                    other
                )))
            }
        }
        if terminal.is_some() {
            return Err(SyntaxError::Invalid(
                "no steps may follow a terminal".to_string(),
            ));
        }
        let name = match parser.next()? {
            Token::Ident(name) => name,
            other => {
                return Err(SyntaxError::Invalid(format!(
                    "expected a step name, found {:?}",
                    other
                )))
            }
        };
        let args = parser.args()?;
        match name.as_str() {
            "Out" => steps.push(Step::Out(optional_predicate(&name, args)?)),
            "In" => steps.push(Step::In(optional_predicate(&name, args)?)),
            "Both" => steps.push(Step::Both(optional_predicate(&name, args)?)),
            "Has" => {
                let mut args = strings(&name, args)?;
                if args.len() != 2 {
                    return Err(SyntaxError::Invalid(
                        "Has takes a predicate and an object".to_string(),
                    ));
                }
                let object = args.pop().unwrap_or_default();
                let predicate = args.pop().unwrap_or_default();
                steps.push(Step::Has(predicate, object));
            }
            "Is" => {
                let ids = strings(&name, args)?;
                if ids.is_empty() {
                    return Err(SyntaxError::Invalid("Is takes at least one id".to_string()));
                }
                steps.push(Step::Is(ids));
            }
            "Unique" if args.is_empty() => steps.push(Step::Unique),
            "All" if args.is_empty() => terminal = Some(Terminal::All),
            "Count" if args.is_empty() => terminal = Some(Terminal::Count),
            "GetLimit" => match args.as_slice() {
                [Token::Num(n)] => terminal = Some(Terminal::GetLimit(*n)),
                _ => {
                    return Err(SyntaxError::Invalid(
                        "GetLimit takes one number".to_string(),
                    ))
                }
            },
            "Unique" | "All" | "Count" => {
                return Err(SyntaxError::Invalid(format!("{} takes no arguments", name)))
            }
            other => return Err(SyntaxError::Invalid(format!("unknown step '{}'", other))),
        }
    }

    Ok(Traversal {
        start,
        steps,
        terminal: terminal.unwrap_or(Terminal::All),
    })
}

/// Gremlin-style session over a quad store.
pub struct GremlinSession {
    store: Arc<dyn QuadStore>,
    timeout: Option<Duration>,
    debug: bool,
}

impl GremlinSession {
    /// Creates a session. `timeout` bounds the time spent walking the graph
    /// for a single query; `None` means no limit.
    pub fn new(store: Arc<dyn QuadStore>, timeout: Option<Duration>) -> Self {
        GremlinSession {
            store,
            timeout,
            debug: false,
        }
    }

    fn apply(&self, step: &Step, nodes: Vec<String>, clock: &Clock) -> Result<Vec<String>> {
        let mut next = Vec::new();
        match step {
            Step::Out(predicate) => {
                for node in &nodes {
                    clock.check()?;
                    let quads = self
                        .store
                        .quads_matching(Some(node.as_str()), predicate.as_deref(), None)?;
                    next.extend(quads.into_iter().map(|q| q.object));
                }
            }
            Step::In(predicate) => {
                for node in &nodes {
                    clock.check()?;
                    let quads = self
                        .store
                        .quads_matching(None, predicate.as_deref(), Some(node.as_str()))?;
                    next.extend(quads.into_iter().map(|q| q.subject));
                }
            }
            Step::Both(predicate) => {
                let mut outward = self.apply(&Step::Out(predicate.clone()), nodes.clone(), clock)?;
                outward.extend(self.apply(&Step::In(predicate.clone()), nodes, clock)?);
                next = outward;
            }
            Step::Has(predicate, object) => {
                for node in nodes {
                    clock.check()?;
                    if !self
                        .store
                        .quads_matching(Some(node.as_str()), Some(predicate.as_str()), Some(object.as_str()))?
                        .is_empty()
                    {
                        next.push(node);
                    }
                }
            }
            Step::Is(ids) => {
                next = nodes.into_iter().filter(|n| ids.contains(n)).collect();
            }
            Step::Unique => {
                let mut seen = std::collections::HashSet::new();
                next = nodes
                    .into_iter()
                    .filter(|n| seen.insert(n.clone()))
                    .collect();
            }
        }
        Ok(next)
    }
}

/// Deadline tracking for the optional query timeout.
struct Clock {
    deadline: Option<(Instant, Duration)>,
}

impl Clock {
    fn start(timeout: Option<Duration>) -> Self {
        Clock {
            deadline: timeout.map(|t| (Instant::now() + t, t)),
        }
    }

    fn check(&self) -> Result<()> {
        match self.deadline {
            Some((deadline, budget)) if Instant::now() >= deadline => {
                Err(ShellError::Timeout(budget))
            }
            _ => Ok(()),
        }
    }
}

impl Session for GremlinSession {
    fn parse_incremental(&mut self, input: &str) -> ParseOutcome {
        // A trailing '.' announces another step, as long as what precedes
        // it can still start a traversal.
        let text = match input.trim_end().strip_suffix('.') {
            Some(head) => match parse(head) {
                Ok(_) | Err(SyntaxError::Incomplete) => return ParseOutcome::NeedsMore,
                Err(SyntaxError::Invalid(msg)) => return ParseOutcome::Failed(msg),
            },
            None => input,
        };
        match parse(text) {
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
        let traversal = parse(query).map_err(|e| match e {
            SyntaxError::Incomplete => ShellError::Query("incomplete query".to_string()),
            SyntaxError::Invalid(msg) => ShellError::Query(msg),
        })?;
        if self.debug {
            info!("gremlin plan: {:?}", traversal);
        }

        let clock = Clock::start(self.timeout);
        let known = self.store.nodes()?;
        let mut nodes = if traversal.start.is_empty() {
            known
        } else {
            traversal
                .start
                .iter()
                .filter(|id| known.contains(id))
                .cloned()
                .collect()
        };
        for step in &traversal.steps {
            nodes = self.apply(step, nodes, &clock)?;
            debug!("{:?} -> {} vertices", step, nodes.len());
        }

        let take = match traversal.terminal {
            Terminal::Count => {
                sink.push(json!(nodes.len()));
                return Ok(());
            }
            Terminal::All => limit,
            Terminal::GetLimit(n) => n.min(limit),
        };
        for node in nodes.into_iter().take(take) {
            if !sink.push(json!({ "id": node })) {
                break;
            }
        }
        Ok(())
    }

    fn render(&self, result: &Value) -> String {
        if self.debug {
            return render_debug(result);
        }
        match result {
            Value::Object(fields) => fields
                .iter()
                .map(|(key, value)| match value {
                    Value::String(s) => format!("{} : {}", key, s),
                    other => format!("{} : {}", key, other),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            other => format!("=> {}", other),
        }
    }
}
