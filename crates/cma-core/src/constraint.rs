//! Constraint trees for role policies and webhook filters.
//!
//! A constraint is either a leaf comparing a document path against literals
//! (`equals`, `in`, `regexp`, `paths`) or a combinator (`and`, `or`, `not`)
//! over further constraints. On the wire every node is a single-key object:
//!
//! ```json
//! {"and": [
//!     {"equals": [{"doc": "sys.type"}, "Entry"]},
//!     {"not": {"in": [{"doc": "sys.id"}, ["a", "b"]]}}
//! ]}
//! ```
//!
//! Each place a constraint can be attached has its own legal subset
//! ([`ConstraintContext`]), checked at attachment and at hydration. Keys
//! registered on a [`ConstraintFactory`] write back under the same key.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};

use crate::Result;
use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    And,
    Or,
    Not,
    Equals,
    In,
    Regexp,
    Paths,
    Custom,
}

impl ConstraintKind {
    pub fn key(self) -> &'static str {
        match self {
            ConstraintKind::And => "and",
            ConstraintKind::Or => "or",
            ConstraintKind::Not => "not",
            ConstraintKind::Equals => "equals",
            ConstraintKind::In => "in",
            ConstraintKind::Regexp => "regexp",
            ConstraintKind::Paths => "paths",
            ConstraintKind::Custom => "custom",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where a constraint is being attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintContext {
    RolePolicy,
    WebhookFilter,
}

impl ConstraintContext {
    pub const ALL: [ConstraintContext; 2] =
        [ConstraintContext::RolePolicy, ConstraintContext::WebhookFilter];

    /// Custom nodes carry their own contexts and are never allowed here.
    pub fn allows(self, kind: ConstraintKind) -> bool {
        match self {
            ConstraintContext::RolePolicy => {
                !matches!(kind, ConstraintKind::Regexp | ConstraintKind::Custom)
            }
            ConstraintContext::WebhookFilter => matches!(
                kind,
                ConstraintKind::Not
                    | ConstraintKind::Equals
                    | ConstraintKind::In
                    | ConstraintKind::Regexp
            ),
        }
    }
}

impl fmt::Display for ConstraintContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintContext::RolePolicy => f.write_str("role policies"),
            ConstraintContext::WebhookFilter => f.write_str("webhook filters"),
        }
    }
}

/// A node of a constraint tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    And(Vec<Constraint>),
    Or(Vec<Constraint>),
    Not(Box<Constraint>),
    Equals { doc: String, value: Value },
    In { doc: String, values: Vec<Value> },
    Regexp { doc: String, pattern: String },
    Paths(Vec<String>),
    /// A node kept verbatim under a registered key, legal in `contexts`.
    Custom {
        key: String,
        payload: Value,
        contexts: Vec<ConstraintContext>,
    },
}

impl Constraint {
    pub fn and(children: impl IntoIterator<Item = Constraint>) -> Self {
        Constraint::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = Constraint>) -> Self {
        Constraint::Or(children.into_iter().collect())
    }

    pub fn not(child: Constraint) -> Self {
        Constraint::Not(Box::new(child))
    }

    pub fn equals(doc: impl Into<String>, value: impl Into<Value>) -> Self {
        Constraint::Equals {
            doc: doc.into(),
            value: value.into(),
        }
    }

    pub fn in_values(doc: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Constraint::In {
            doc: doc.into(),
            values: values.into_iter().collect(),
        }
    }

    pub fn regexp(doc: impl Into<String>, pattern: impl Into<String>) -> Self {
        Constraint::Regexp {
            doc: doc.into(),
            pattern: pattern.into(),
        }
    }

    pub fn paths<S: Into<String>>(paths: impl IntoIterator<Item = S>) -> Self {
        Constraint::Paths(paths.into_iter().map(Into::into).collect())
    }

    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::And(_) => ConstraintKind::And,
            Constraint::Or(_) => ConstraintKind::Or,
            Constraint::Not(_) => ConstraintKind::Not,
            Constraint::Equals { .. } => ConstraintKind::Equals,
            Constraint::In { .. } => ConstraintKind::In,
            Constraint::Regexp { .. } => ConstraintKind::Regexp,
            Constraint::Paths(_) => ConstraintKind::Paths,
            Constraint::Custom { .. } => ConstraintKind::Custom,
        }
    }

    /// The key this node serializes under.
    pub fn key(&self) -> &str {
        match self {
            Constraint::Custom { key, .. } => key,
            other => other.kind().key(),
        }
    }

    /// Check every node of the tree against a context's legal subset.
    pub fn check(&self, context: ConstraintContext) -> Result<()> {
        let allowed = match self {
            Constraint::Custom { contexts, .. } => contexts.contains(&context),
            other => context.allows(other.kind()),
        };
        if !allowed {
            return Err(Error::IllegalConstraint {
                constraint: self.key().to_string(),
                context: context.to_string(),
            });
        }
        match self {
            Constraint::And(children) | Constraint::Or(children) => {
                children.iter().try_for_each(|c| c.check(context))
            }
            Constraint::Not(child) => child.check(context),
            _ => Ok(()),
        }
    }

    pub fn to_value(&self) -> Value {
        let payload = match self {
            Constraint::And(children) | Constraint::Or(children) => {
                Value::Array(children.iter().map(Constraint::to_value).collect())
            }
            Constraint::Not(child) => child.to_value(),
            Constraint::Equals { doc, value } => json!([{"doc": doc}, value]),
            Constraint::In { doc, values } => json!([{"doc": doc}, values]),
            Constraint::Regexp { doc, pattern } => json!([{"doc": doc}, {"pattern": pattern}]),
            Constraint::Paths(paths) => {
                Value::Array(paths.iter().map(|p| json!({"doc": p})).collect())
            }
            Constraint::Custom { payload, .. } => payload.clone(),
        };
        let mut map = serde_json::Map::new();
        map.insert(self.key().to_string(), payload);
        Value::Object(map)
    }
}

impl Serialize for Constraint {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        ConstraintFactory::default()
            .build(&value)
            .map_err(serde::de::Error::custom)
    }
}

pub type ConstraintParser = fn(&Value, &ConstraintFactory) -> Result<Constraint>;

#[derive(Clone)]
enum Parser {
    Function(ConstraintParser),
    Custom(Vec<ConstraintContext>),
}

/// Table from constraint key to parser.
#[derive(Clone)]
pub struct ConstraintFactory {
    parsers: HashMap<String, Parser>,
}

impl ConstraintFactory {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register a parser for a key, replacing any existing one.
    ///
    /// A parsed node whose own key differs from `key` is kept as a
    /// [`Constraint::Custom`] holding the raw payload, legal wherever the
    /// parsed tree is.
    pub fn register(&mut self, key: impl Into<String>, parser: ConstraintParser) {
        self.parsers.insert(key.into(), Parser::Function(parser));
    }

    /// Register a key whose payload is kept as-is, legal in `contexts`.
    pub fn register_custom(
        &mut self,
        key: impl Into<String>,
        contexts: impl IntoIterator<Item = ConstraintContext>,
    ) {
        let contexts = contexts.into_iter().collect();
        self.parsers.insert(key.into(), Parser::Custom(contexts));
    }

    /// Build a constraint tree from its raw JSON form.
    pub fn build(&self, raw: &Value) -> Result<Constraint> {
        let obj = raw
            .as_object()
            .ok_or_else(|| Error::invalid_shape("constraint", "Constraint", "must be an object"))?;
        if obj.len() != 1 {
            return Err(Error::invalid_shape(
                "constraint",
                "Constraint",
                "must hold exactly one key",
            ));
        }
        let Some((key, payload)) = obj.iter().next() else {
            return Err(Error::invalid_shape("constraint", "Constraint", "is empty"));
        };
        let parser = self
            .parsers
            .get(key)
            .ok_or_else(|| Error::UnknownConstraint { key: key.clone() })?;
        let constraint = match parser {
            Parser::Function(parse) => parse(payload, self)?,
            Parser::Custom(contexts) => {
                return Ok(Constraint::Custom {
                    key: key.clone(),
                    payload: payload.clone(),
                    contexts: contexts.clone(),
                });
            }
        };
        if constraint.key() == key.as_str() {
            return Ok(constraint);
        }
        let contexts = ConstraintContext::ALL
            .into_iter()
            .filter(|context| constraint.check(*context).is_ok())
            .collect();
        Ok(Constraint::Custom {
            key: key.clone(),
            payload: payload.clone(),
            contexts,
        })
    }

    /// Build a constraint and check it against a context.
    pub fn build_in(&self, raw: &Value, context: ConstraintContext) -> Result<Constraint> {
        let constraint = self.build(raw)?;
        constraint.check(context)?;
        Ok(constraint)
    }
}

impl Default for ConstraintFactory {
    fn default() -> Self {
        let mut factory = Self::new();
        factory.register("and", |raw, f| children(raw, f, "and").map(Constraint::And));
        factory.register("or", |raw, f| children(raw, f, "or").map(Constraint::Or));
        factory.register("not", |raw, f| Ok(Constraint::not(f.build(raw)?)));
        factory.register("equals", parse_equals);
        factory.register("in", parse_in);
        factory.register("regexp", parse_regexp);
        factory.register("paths", parse_paths);
        factory
    }
}

impl fmt::Debug for ConstraintFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.parsers.keys().collect();
        keys.sort();
        f.debug_struct("ConstraintFactory")
            .field("keys", &keys)
            .finish()
    }
}

fn children(raw: &Value, factory: &ConstraintFactory, key: &str) -> Result<Vec<Constraint>> {
    raw.as_array()
        .ok_or_else(|| Error::invalid_shape("constraint", key, "must be an array"))?
        .iter()
        .map(|child| factory.build(child))
        .collect()
}

fn doc_path(raw: &Value, key: &str) -> Result<String> {
    raw.get("doc")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::invalid_shape("constraint", key, "expected {\"doc\": path}"))
}

fn pair<'a>(raw: &'a Value, key: &str) -> Result<(String, &'a Value)> {
    match raw.as_array().map(Vec::as_slice) {
        Some([doc, operand]) => Ok((doc_path(doc, key)?, operand)),
        _ => Err(Error::invalid_shape(
            "constraint",
            key,
            "must be a [doc, operand] pair",
        )),
    }
}

fn parse_equals(raw: &Value, _: &ConstraintFactory) -> Result<Constraint> {
    let (doc, value) = pair(raw, "equals")?;
    Ok(Constraint::Equals {
        doc,
        value: value.clone(),
    })
}

fn parse_in(raw: &Value, _: &ConstraintFactory) -> Result<Constraint> {
    let (doc, values) = pair(raw, "in")?;
    let values = values
        .as_array()
        .ok_or_else(|| Error::invalid_shape("constraint", "in", "operand must be an array"))?;
    Ok(Constraint::In {
        doc,
        values: values.clone(),
    })
}

fn parse_regexp(raw: &Value, _: &ConstraintFactory) -> Result<Constraint> {
    let (doc, operand) = pair(raw, "regexp")?;
    let pattern = operand
        .get("pattern")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::invalid_shape("constraint", "regexp", "missing pattern"))?;
    Ok(Constraint::Regexp {
        doc,
        pattern: pattern.to_string(),
    })
}

fn parse_paths(raw: &Value, _: &ConstraintFactory) -> Result<Constraint> {
    let paths = raw
        .as_array()
        .ok_or_else(|| Error::invalid_shape("constraint", "paths", "must be an array"))?
        .iter()
        .map(|p| doc_path(p, "paths"))
        .collect::<Result<Vec<_>>>()?;
    Ok(Constraint::Paths(paths))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_tree_roundtrip() {
        let raw = json!({"and": [
            {"equals": [{"doc": "sys.type"}, "Entry"]},
            {"or": [
                {"in": [{"doc": "sys.contentType.sys.id"}, ["post", "page"]]},
                {"not": {"paths": [{"doc": "fields.title.%"}]}}
            ]}
        ]});
        let constraint = ConstraintFactory::default().build(&raw).unwrap();
        assert_eq!(constraint.kind(), ConstraintKind::And);
        assert_eq!(constraint.to_value(), raw);
    }

    #[test]
    fn regexp_roundtrip() {
        let raw = json!({"regexp": [{"doc": "sys.id"}, {"pattern": "^draft-"}]});
        let constraint = ConstraintFactory::default().build(&raw).unwrap();
        assert_eq!(constraint, Constraint::regexp("sys.id", "^draft-"));
        assert_eq!(constraint.to_value(), raw);
    }

    #[test]
    fn unknown_key_is_named() {
        let err = ConstraintFactory::default()
            .build(&json!({"xor": []}))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownConstraint { ref key } if key == "xor"));
    }

    #[test]
    fn malformed_leaf_is_invalid_shape() {
        let err = ConstraintFactory::default()
            .build(&json!({"equals": ["sys.type", "Entry"]}))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidShape { .. }));

        let err = ConstraintFactory::default()
            .build(&json!({"equals": [{"doc": "a"}, 1], "in": []}))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidShape { .. }));
    }

    #[test]
    fn unknown_child_fails_whole_tree() {
        let err = ConstraintFactory::default()
            .build(&json!({"or": [{"equals": [{"doc": "a"}, 1]}, {"nand": []}]}))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownConstraint { .. }));
    }

    #[test]
    fn registered_key_is_written_back() {
        let mut factory = ConstraintFactory::default();
        factory.register("eq", |raw, f| f.build(&json!({"equals": raw})));

        let raw = json!({"not": {"eq": [{"doc": "sys.id"}, "x"]}});
        let constraint = factory.build(&raw).unwrap();
        assert_eq!(constraint.to_value(), raw);
        assert!(constraint.check(ConstraintContext::WebhookFilter).is_ok());
        assert!(constraint.check(ConstraintContext::RolePolicy).is_ok());
    }

    #[test]
    fn custom_key_follows_declared_contexts() {
        let mut factory = ConstraintFactory::default();
        factory.register_custom("glob", [ConstraintContext::WebhookFilter]);

        let raw = json!({"glob": [{"doc": "sys.id"}, "post-*"]});
        let constraint = factory
            .build_in(&raw, ConstraintContext::WebhookFilter)
            .unwrap();
        assert_eq!(constraint.kind(), ConstraintKind::Custom);
        assert_eq!(constraint.key(), "glob");
        assert_eq!(constraint.to_value(), raw);

        let err = factory
            .build_in(&json!({"and": [raw]}), ConstraintContext::RolePolicy)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::IllegalConstraint { ref constraint, .. } if constraint == "glob"
        ));
    }

    #[test]
    fn webhook_context_rejects_combinators() {
        let filter = Constraint::not(Constraint::and([Constraint::equals("sys.id", "x")]));
        let err = filter.check(ConstraintContext::WebhookFilter).unwrap_err();
        assert!(matches!(
            err,
            Error::IllegalConstraint { ref constraint, .. } if constraint == "and"
        ));
        assert!(filter.check(ConstraintContext::RolePolicy).is_ok());
    }

    #[test]
    fn role_context_rejects_regexp() {
        let constraint = Constraint::or([Constraint::regexp("sys.id", "x")]);
        assert!(constraint.check(ConstraintContext::RolePolicy).is_err());
        assert!(
            Constraint::regexp("sys.id", "x")
                .check(ConstraintContext::WebhookFilter)
                .is_ok()
        );
    }
}
