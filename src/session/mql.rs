/// MQL Session
///
/// Queries are JSON templates describing the shape of the answer. Keys are
/// `"id"` or predicates; values say what to do with them:
///
/// - a string constrains the field to that value
/// - `null` is filled with the first matching object
/// - `[]` is filled with every matching object
///
/// ```text
/// [{"id": null, "follows": "bob", "status": null}]
/// ```
///
/// Each subject satisfying the template yields one filled-in object.
use super::{render_debug, ParseOutcome, ResultSink, Session};
use crate::core::{QuadStore, Result, ShellError};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
enum FieldSpec {
    Equals(String),
    Fill,
    FillAll,
}

#[derive(Debug, Clone, PartialEq)]
struct Template {
    fields: Vec<(String, FieldSpec)>,
}

impl Template {
    fn from_value(value: Value) -> std::result::Result<Self, String> {
        let object = match value {
            Value::Object(map) => map,
            Value::Array(mut items) if items.len() == 1 => match items.pop() {
                Some(Value::Object(map)) => map,
                _ => return Err("the query array must hold a single object".to_string()),
            },
            Value::Array(_) => {
                return Err("the query array must hold exactly one object".to_string())
            }
            _ => return Err("a query must be a JSON object".to_string()),
        };

        let mut fields = Vec::with_capacity(object.len());
        for (key, value) in object {
            let spec = match value {
                Value::String(s) => FieldSpec::Equals(s),
                Value::Null => FieldSpec::Fill,
                Value::Array(items) if items.is_empty() && key != "id" => FieldSpec::FillAll,
                other => return Err(format!("unsupported value for \"{}\": {}", key, other)),
            };
            fields.push((key, spec));
        }
        Ok(Template { fields })
    }

    fn id(&self) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(key, _)| key == "id")
            .map(|(_, spec)| spec)
    }

    fn constraints(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|(key, spec)| match spec {
            FieldSpec::Equals(value) if key != "id" => Some((key.as_str(), value.as_str())),
            _ => None,
        })
    }
}

fn parse(input: &str) -> std::result::Result<Template, ParseOutcome> {
    let value: Value = serde_json::from_str(input).map_err(|e| {
        if e.is_eof() {
            ParseOutcome::NeedsMore
        } else {
            ParseOutcome::Failed(e.to_string())
        }
    })?;
    Template::from_value(value).map_err(ParseOutcome::Failed)
}

/// MQL session over a quad store.
pub struct MqlSession {
    store: Arc<dyn QuadStore>,
    debug: bool,
}

impl MqlSession {
    pub fn new(store: Arc<dyn QuadStore>) -> Self {
        MqlSession {
            store,
            debug: false,
        }
    }

    fn candidates(&self, template: &Template) -> Result<Vec<String>> {
        if let Some(FieldSpec::Equals(id)) = template.id() {
            return Ok(vec![id.clone()]);
        }
        let quads = match template.constraints().next() {
            Some((predicate, object)) => {
                self.store
                    .quads_matching(None, Some(predicate), Some(object))?
            }
            None => self.store.quads_matching(None, None, None)?,
        };
        let mut seen = HashSet::new();
        Ok(quads
            .into_iter()
            .map(|q| q.subject)
            .filter(|s| seen.insert(s.clone()))
            .collect())
    }

    /// Fills the template for one subject, or returns `None` if the subject
    /// does not satisfy it.
    fn fill(&self, template: &Template, subject: &str) -> Result<Option<Map<String, Value>>> {
        let mut out = Map::new();
        for (key, spec) in &template.fields {
            if key == "id" {
                out.insert(key.clone(), Value::String(subject.to_string()));
                continue;
            }
            let objects: Vec<String> = self
                .store
                .quads_matching(Some(subject), Some(key.as_str()), None)?
                .into_iter()
                .map(|q| q.object)
                .collect();
            let value = match spec {
                FieldSpec::Equals(expected) => {
                    if !objects.contains(expected) {
                        return Ok(None);
                    }
                    Value::String(expected.clone())
                }
                FieldSpec::Fill => match objects.into_iter().next() {
                    Some(first) => Value::String(first),
                    None => return Ok(None),
                },
                FieldSpec::FillAll => Value::Array(objects.into_iter().map(Value::String).collect()),
            };
            out.insert(key.clone(), value);
        }
        Ok(Some(out))
    }
}

impl Session for MqlSession {
    fn parse_incremental(&mut self, input: &str) -> ParseOutcome {
        match parse(input) {
            Ok(_) => ParseOutcome::Parsed,
            Err(outcome) => outcome,
        }
    }

    fn toggle_debug(&mut self) -> bool {
        self.debug = !self.debug;
        self.debug
    }

    fn execute(&self, query: &str, mut sink: ResultSink, limit: usize) -> Result<()> {
        let template = parse(query).map_err(|outcome| match outcome {
            ParseOutcome::Failed(msg) => ShellError::Query(msg),
            _ => ShellError::Query("incomplete query".to_string()),
        })?;
        if self.debug {
            info!("mql template: {:?}", template);
        }

        let mut produced = 0;
        for subject in self.candidates(&template)? {
            if produced >= limit {
                break;
            }
            if let Some(object) = self.fill(&template, &subject)? {
                produced += 1;
                if !sink.push(Value::Object(object)) {
                    break;
                }
            }
        }
        Ok(())
    }

    fn render(&self, result: &Value) -> String {
        if self.debug {
            render_debug(result)
        } else {
            result.to_string()
        }
    }
}
