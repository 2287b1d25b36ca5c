/// Quad Module
///
/// A quad is the unit of graph data handled by the shell: a subject,
/// predicate and object, optionally qualified by a label. Quads are read
/// from a line-oriented N-Quads style notation.
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Matches one term at the start of the remaining input: an `<iri>`, a
/// `"quoted literal"` or a bare word (which also covers `_:blank` nodes).
static TERM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:<([^<>]*)>|"((?:[^"\\]|\\.)*)"|([^\s"<>]+))"#).unwrap()
});

/// Literal suffixes (`@lang`, `^^<datatype>`) that are accepted and dropped.
static LITERAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(?:@[A-Za-z][A-Za-z0-9-]*|\^\^<[^<>]*>)"#).unwrap());

/// A subject-predicate-object record with an optional label.
///
/// Terms are stored without their delimiters, so `<alice>` and `"alice"`
/// both produce the term `alice`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quad {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub label: Option<String>,
}

impl Quad {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Quad {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(f, &self.subject)?;
        f.write_str(" ")?;
        write_term(f, &self.predicate)?;
        f.write_str(" ")?;
        write_term(f, &self.object)?;
        if let Some(label) = &self.label {
            f.write_str(" ")?;
            write_term(f, label)?;
        }
        f.write_str(" .")
    }
}

fn write_term(f: &mut fmt::Formatter<'_>, term: &str) -> fmt::Result {
    if term.starts_with("_:") && !term.contains(char::is_whitespace) {
        return f.write_str(term);
    }
    let needs_quotes = term
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '<' | '>' | '\\'));
    if !needs_quotes {
        return write!(f, "<{}>", term);
    }
    f.write_str("\"")?;
    for c in term.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            other => write!(f, "{}", other)?,
        }
    }
    f.write_str("\"")
}

/// Parses a single quad statement.
///
/// A statement is three or four terms followed by a terminating `.`.
/// Returns `None` for anything else; callers only distinguish "parsed" from
/// "not a quad".
///
/// # Examples
///
/// ```
/// use triplesh::core::quad::parse_quad;
///
/// let quad = parse_quad(r#"<alice> <follows> <bob> ."#).unwrap();
/// assert_eq!(quad.object, "bob");
/// assert!(parse_quad("not a quad").is_none());
/// ```
pub fn parse_quad(text: &str) -> Option<Quad> {
    let mut rest = text.trim();
    let mut terms: Vec<String> = Vec::with_capacity(4);

    loop {
        rest = rest.trim_start();
        if rest == "." {
            break;
        }
        if rest.is_empty() || terms.len() == 4 {
            return None;
        }

        let caps = TERM.captures(rest)?;
        let matched = caps.get(0)?;
        rest = &rest[matched.end()..];

        if let Some(iri) = caps.get(1) {
            terms.push(iri.as_str().to_string());
        } else if let Some(literal) = caps.get(2) {
            terms.push(unescape(literal.as_str())?);
            if let Some(suffix) = LITERAL_SUFFIX.find(rest) {
                rest = &rest[suffix.end()..];
            }
        } else {
            let word = caps.get(3)?.as_str();
            if word == "." {
                return None;
            }
            // `<s> <p> obj.` ends the statement on the bare word itself.
            if let Some(stripped) = word.strip_suffix('.') {
                if rest.trim().is_empty() {
                    terms.push(stripped.to_string());
                    break;
                }
            }
            terms.push(word.to_string());
        }
    }

    if terms.iter().any(|t| t.is_empty()) {
        return None;
    }

    let mut terms = terms.into_iter();
    match (terms.next(), terms.next(), terms.next(), terms.next()) {
        (Some(subject), Some(predicate), Some(object), label) => Some(Quad {
            subject,
            predicate,
            object,
            label,
        }),
        _ => None,
    }
}

fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            _ => return None,
        }
    }
    Some(out)
}
