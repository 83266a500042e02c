//! Validation rules attached to content type fields.
//!
//! Each rule serializes to a single-key JSON object whose key names the rule,
//! e.g. `{"size": {"min": 1, "max": 10}}`. An optional custom error message
//! travels alongside the rule key as `"message"`.
//!
//! Raw validations are turned into [`Validation`] values by a
//! [`ValidationFactory`], a table from rule key to parser that is populated
//! once for every known kind and can be extended with [`ValidationFactory::register`].
//! A validation always writes back under the key it was built from, so rules
//! registered under new keys survive a round trip.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value, json};

use crate::Result;
use crate::error::Error;

/// The kinds of validation rule, named by their wire key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    Size,
    Range,
    DateRange,
    Regexp,
    ProhibitRegexp,
    In,
    Unique,
    LinkMimetypeGroup,
    LinkContentType,
    AssetImageDimensions,
    AssetFileSize,
    EnabledNodeTypes,
    EnabledMarks,
    Nodes,
    /// A rule registered with [`ValidationFactory::register_custom`].
    Custom,
}

impl ValidationKind {
    /// The built-in kinds.
    pub const ALL: [ValidationKind; 14] = [
        ValidationKind::Size,
        ValidationKind::Range,
        ValidationKind::DateRange,
        ValidationKind::Regexp,
        ValidationKind::ProhibitRegexp,
        ValidationKind::In,
        ValidationKind::Unique,
        ValidationKind::LinkMimetypeGroup,
        ValidationKind::LinkContentType,
        ValidationKind::AssetImageDimensions,
        ValidationKind::AssetFileSize,
        ValidationKind::EnabledNodeTypes,
        ValidationKind::EnabledMarks,
        ValidationKind::Nodes,
    ];

    /// Returns the JSON key this kind serializes under.
    ///
    /// Custom rules serialize under their registered key; see [`Validation::key`].
    pub fn key(self) -> &'static str {
        match self {
            ValidationKind::Size => "size",
            ValidationKind::Range => "range",
            ValidationKind::DateRange => "dateRange",
            ValidationKind::Regexp => "regexp",
            ValidationKind::ProhibitRegexp => "prohibitRegexp",
            ValidationKind::In => "in",
            ValidationKind::Unique => "unique",
            ValidationKind::LinkMimetypeGroup => "linkMimetypeGroup",
            ValidationKind::LinkContentType => "linkContentType",
            ValidationKind::AssetImageDimensions => "assetImageDimensions",
            ValidationKind::AssetFileSize => "assetFileSize",
            ValidationKind::EnabledNodeTypes => "enabledNodeTypes",
            ValidationKind::EnabledMarks => "enabledMarks",
            ValidationKind::Nodes => "nodes",
            ValidationKind::Custom => "custom",
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An optional lower and upper bound on a count (characters, items, bytes, pixels).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bounds {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl Bounds {
    pub fn new(min: Option<u64>, max: Option<u64>) -> Self {
        Self { min, max }
    }

    fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    fn to_value(self) -> Value {
        let mut map = Map::new();
        if let Some(min) = self.min {
            map.insert("min".to_string(), json!(min));
        }
        if let Some(max) = self.max {
            map.insert("max".to_string(), json!(max));
        }
        Value::Object(map)
    }
}

/// Validations a rich-text node may carry under a `nodes` rule.
const NODE_VALIDATIONS: &[ValidationKind] = &[
    ValidationKind::Size,
    ValidationKind::LinkContentType,
    ValidationKind::LinkMimetypeGroup,
    ValidationKind::AssetImageDimensions,
    ValidationKind::AssetFileSize,
];

/// A list of strings, which the API also accepts as one bare string.
///
/// The bare form is kept as [`StringList::One`] and written back as a bare
/// string rather than a one-element list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StringList {
    One(String),
    Many(Vec<String>),
}

impl StringList {
    pub fn as_slice(&self) -> &[String] {
        match self {
            StringList::One(item) => std::slice::from_ref(item),
            StringList::Many(items) => items,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            StringList::One(item) => json!(item),
            StringList::Many(items) => json!(items),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for StringList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        StringList::Many(iter.into_iter().map(Into::into).collect())
    }
}

/// The rule part of a validation.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationRule {
    /// Length of a string or number of items in an array.
    Size(Bounds),
    /// Numeric value range. Numbers keep their JSON representation.
    Range {
        min: Option<Number>,
        max: Option<Number>,
    },
    /// Date range, as ISO 8601 strings.
    DateRange {
        min: Option<String>,
        max: Option<String>,
    },
    Regexp {
        pattern: String,
        flags: Option<String>,
    },
    ProhibitRegexp {
        pattern: String,
        flags: Option<String>,
    },
    /// The value must be one of the given literals.
    In(Vec<Value>),
    Unique,
    /// Allowed MIME type groups for linked assets (e.g. `image`, `video`).
    LinkMimetypeGroup(StringList),
    /// Allowed content type ids for linked entries.
    LinkContentType(StringList),
    AssetImageDimensions {
        width: Bounds,
        height: Bounds,
    },
    AssetFileSize(Bounds),
    EnabledNodeTypes(StringList),
    EnabledMarks(StringList),
    /// Per rich-text node type validations.
    Nodes(BTreeMap<String, Vec<Validation>>),
    /// A rule with no model here. The payload is kept verbatim and the rule
    /// may only be attached to fields whose type is in `field_types`.
    Custom {
        key: String,
        payload: Value,
        field_types: Vec<String>,
    },
}

impl ValidationRule {
    pub fn kind(&self) -> ValidationKind {
        match self {
            ValidationRule::Size(_) => ValidationKind::Size,
            ValidationRule::Range { .. } => ValidationKind::Range,
            ValidationRule::DateRange { .. } => ValidationKind::DateRange,
            ValidationRule::Regexp { .. } => ValidationKind::Regexp,
            ValidationRule::ProhibitRegexp { .. } => ValidationKind::ProhibitRegexp,
            ValidationRule::In(_) => ValidationKind::In,
            ValidationRule::Unique => ValidationKind::Unique,
            ValidationRule::LinkMimetypeGroup(_) => ValidationKind::LinkMimetypeGroup,
            ValidationRule::LinkContentType(_) => ValidationKind::LinkContentType,
            ValidationRule::AssetImageDimensions { .. } => ValidationKind::AssetImageDimensions,
            ValidationRule::AssetFileSize(_) => ValidationKind::AssetFileSize,
            ValidationRule::EnabledNodeTypes(_) => ValidationKind::EnabledNodeTypes,
            ValidationRule::EnabledMarks(_) => ValidationKind::EnabledMarks,
            ValidationRule::Nodes(_) => ValidationKind::Nodes,
            ValidationRule::Custom { .. } => ValidationKind::Custom,
        }
    }

    /// Returns the JSON key this rule serializes under.
    pub fn key(&self) -> &str {
        match self {
            ValidationRule::Custom { key, .. } => key,
            other => other.kind().key(),
        }
    }

    fn payload(&self) -> Value {
        match self {
            ValidationRule::Size(bounds) | ValidationRule::AssetFileSize(bounds) => {
                bounds.to_value()
            }
            ValidationRule::Range { min, max } => {
                let mut map = Map::new();
                if let Some(min) = min {
                    map.insert("min".to_string(), Value::Number(min.clone()));
                }
                if let Some(max) = max {
                    map.insert("max".to_string(), Value::Number(max.clone()));
                }
                Value::Object(map)
            }
            ValidationRule::DateRange { min, max } => {
                let mut map = Map::new();
                if let Some(min) = min {
                    map.insert("min".to_string(), json!(min));
                }
                if let Some(max) = max {
                    map.insert("max".to_string(), json!(max));
                }
                Value::Object(map)
            }
            ValidationRule::Regexp { pattern, flags }
            | ValidationRule::ProhibitRegexp { pattern, flags } => {
                let mut map = Map::new();
                map.insert("pattern".to_string(), json!(pattern));
                if let Some(flags) = flags {
                    map.insert("flags".to_string(), json!(flags));
                }
                Value::Object(map)
            }
            ValidationRule::In(values) => Value::Array(values.clone()),
            ValidationRule::Unique => Value::Bool(true),
            ValidationRule::LinkMimetypeGroup(items)
            | ValidationRule::LinkContentType(items)
            | ValidationRule::EnabledNodeTypes(items)
            | ValidationRule::EnabledMarks(items) => items.to_value(),
            ValidationRule::AssetImageDimensions { width, height } => {
                let mut map = Map::new();
                if !width.is_empty() {
                    map.insert("width".to_string(), width.to_value());
                }
                if !height.is_empty() {
                    map.insert("height".to_string(), height.to_value());
                }
                Value::Object(map)
            }
            ValidationRule::Nodes(nodes) => {
                let map = nodes
                    .iter()
                    .map(|(node, validations)| {
                        let list = validations.iter().map(Validation::to_value).collect();
                        (node.clone(), Value::Array(list))
                    })
                    .collect();
                Value::Object(map)
            }
            ValidationRule::Custom { payload, .. } => payload.clone(),
        }
    }
}

/// A validation rule with an optional custom error message.
///
/// # Example
///
/// ```
/// use cma_core::schema::{Validation, ValidationKind};
/// use serde_json::json;
///
/// let validation = Validation::size(Some(1), Some(140)).with_message("too long");
/// assert_eq!(validation.kind(), ValidationKind::Size);
/// assert_eq!(
///     validation.to_value(),
///     json!({"size": {"min": 1, "max": 140}, "message": "too long"})
/// );
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Validation {
    rule: ValidationRule,
    message: Option<String>,
    // Registered key whose parser produced a rule of another key.
    alias: Option<String>,
}

impl Validation {
    pub fn new(rule: ValidationRule) -> Self {
        Self {
            rule,
            message: None,
            alias: None,
        }
    }

    pub fn size(min: Option<u64>, max: Option<u64>) -> Self {
        Self::new(ValidationRule::Size(Bounds::new(min, max)))
    }

    pub fn range(min: Option<Number>, max: Option<Number>) -> Self {
        Self::new(ValidationRule::Range { min, max })
    }

    pub fn date_range(min: Option<String>, max: Option<String>) -> Self {
        Self::new(ValidationRule::DateRange { min, max })
    }

    pub fn regexp(pattern: impl Into<String>, flags: Option<String>) -> Self {
        Self::new(ValidationRule::Regexp {
            pattern: pattern.into(),
            flags,
        })
    }

    pub fn prohibit_regexp(pattern: impl Into<String>, flags: Option<String>) -> Self {
        Self::new(ValidationRule::ProhibitRegexp {
            pattern: pattern.into(),
            flags,
        })
    }

    pub fn in_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(ValidationRule::In(values.into_iter().collect()))
    }

    pub fn unique() -> Self {
        Self::new(ValidationRule::Unique)
    }

    pub fn link_mimetype_group<S: Into<String>>(groups: impl IntoIterator<Item = S>) -> Self {
        Self::new(ValidationRule::LinkMimetypeGroup(groups.into_iter().collect()))
    }

    pub fn link_content_type<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        Self::new(ValidationRule::LinkContentType(ids.into_iter().collect()))
    }

    pub fn asset_image_dimensions(width: Bounds, height: Bounds) -> Self {
        Self::new(ValidationRule::AssetImageDimensions { width, height })
    }

    pub fn asset_file_size(min: Option<u64>, max: Option<u64>) -> Self {
        Self::new(ValidationRule::AssetFileSize(Bounds::new(min, max)))
    }

    pub fn enabled_node_types<S: Into<String>>(types: impl IntoIterator<Item = S>) -> Self {
        Self::new(ValidationRule::EnabledNodeTypes(types.into_iter().collect()))
    }

    pub fn enabled_marks<S: Into<String>>(marks: impl IntoIterator<Item = S>) -> Self {
        Self::new(ValidationRule::EnabledMarks(marks.into_iter().collect()))
    }

    pub fn nodes(nodes: BTreeMap<String, Vec<Validation>>) -> Self {
        Self::new(ValidationRule::Nodes(nodes))
    }

    /// A rule this crate has no model for, legal on the given field types
    /// (e.g. `"Symbol"`, `"Link"`, or a described type like `"Link:Asset"`).
    pub fn custom<S: Into<String>>(
        key: impl Into<String>,
        payload: Value,
        field_types: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(ValidationRule::Custom {
            key: key.into(),
            payload,
            field_types: field_types.into_iter().map(Into::into).collect(),
        })
    }

    /// Attach a custom error message shown by the editing UI.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn kind(&self) -> ValidationKind {
        self.rule.kind()
    }

    /// Returns the key this validation serializes under.
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.rule.key())
    }

    pub fn rule(&self) -> &ValidationRule {
        &self.rule
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the wire form: a single rule key, plus `message` when set.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.key().to_string(), self.rule.payload());
        if let Some(ref message) = self.message {
            map.insert("message".to_string(), json!(message));
        }
        Value::Object(map)
    }

    /// Check this validation against the legal subset of a field type.
    ///
    /// `type_tag` is the field's `type` and `field_type` its description in
    /// errors (e.g. `Link:Asset`); custom rules match either. Validations
    /// nested under `nodes` are checked against the rich-text node subset.
    pub fn check_legal(
        &self,
        legal: &[ValidationKind],
        type_tag: &str,
        field_type: &str,
    ) -> Result<()> {
        let allowed = match &self.rule {
            ValidationRule::Custom { field_types, .. } => field_types
                .iter()
                .any(|t| t == type_tag || t == field_type),
            _ => legal.contains(&self.kind()),
        };
        if !allowed {
            return Err(Error::IllegalValidation {
                validation: self.key().to_string(),
                field_type: field_type.to_string(),
            });
        }
        if let ValidationRule::Nodes(nodes) = &self.rule {
            for (node, validations) in nodes {
                check_node(node, validations)?;
            }
        }
        Ok(())
    }
}

fn check_node(node: &str, validations: &[Validation]) -> Result<()> {
    let node_type = format!("RichText node {node}");
    validations
        .iter()
        .try_for_each(|v| v.check_legal(NODE_VALIDATIONS, "RichText", &node_type))
}

impl Serialize for Validation {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Validation {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        ValidationFactory::default()
            .build(&value, "validation")
            .map_err(serde::de::Error::custom)
    }
}

/// Parses the payload found under a rule key.
///
/// Receives the payload, the factory (for recursive rules) and the subject
/// (usually a field id) to name in errors.
pub type ValidationParser = fn(&Value, &ValidationFactory, &str) -> Result<ValidationRule>;

#[derive(Clone)]
enum Parser {
    Function(ValidationParser),
    /// Payload kept verbatim, legal on the listed field types.
    Custom(Vec<String>),
}

/// Table from validation key to parser.
#[derive(Clone)]
pub struct ValidationFactory {
    parsers: HashMap<String, Parser>,
}

impl ValidationFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register a parser for a key, replacing any existing one.
    ///
    /// The parser may return any rule; the validation keeps the registered
    /// key and writes back under it, with the rule's legality.
    pub fn register(&mut self, key: impl Into<String>, parser: ValidationParser) {
        self.parsers.insert(key.into(), Parser::Function(parser));
    }

    /// Register a key whose payload is kept as-is, legal only on the given
    /// field types.
    pub fn register_custom<S: Into<String>>(
        &mut self,
        key: impl Into<String>,
        field_types: impl IntoIterator<Item = S>,
    ) {
        let field_types = field_types.into_iter().map(Into::into).collect();
        self.parsers.insert(key.into(), Parser::Custom(field_types));
    }

    /// Returns true if a parser is registered for the key.
    pub fn contains(&self, key: &str) -> bool {
        self.parsers.contains_key(key)
    }

    /// Build a validation from its raw JSON object.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidShape`] if the value is not an object or does not
    ///   hold exactly one rule key besides `message`
    /// - [`Error::UnknownValidation`] if the rule key has no parser
    pub fn build(&self, raw: &Value, subject: &str) -> Result<Validation> {
        let obj = raw
            .as_object()
            .ok_or_else(|| Error::invalid_shape(subject, "validation", "must be an object"))?;

        let mut keys = obj.keys().filter(|k| k.as_str() != "message");
        let key = match (keys.next(), keys.next()) {
            (Some(key), None) => key,
            (None, _) => {
                return Err(Error::invalid_shape(subject, "validation", "has no rule key"));
            }
            (Some(_), Some(_)) => {
                return Err(Error::invalid_shape(
                    subject,
                    "validation",
                    "must hold exactly one rule key",
                ));
            }
        };

        let parser = self
            .parsers
            .get(key)
            .ok_or_else(|| Error::UnknownValidation { key: key.clone() })?;
        let rule = match parser {
            Parser::Function(parse) => parse(&obj[key], self, subject)?,
            Parser::Custom(field_types) => ValidationRule::Custom {
                key: key.clone(),
                payload: obj[key].clone(),
                field_types: field_types.clone(),
            },
        };
        let alias = (rule.key() != key.as_str()).then(|| key.clone());

        let message = match obj.get("message") {
            None | Some(Value::Null) => None,
            Some(Value::String(message)) => Some(message.clone()),
            Some(_) => {
                return Err(Error::invalid_shape(subject, key, "message must be a string"));
            }
        };

        Ok(Validation {
            rule,
            message,
            alias,
        })
    }

    /// Build every validation in a raw JSON array, preserving order.
    pub fn build_all(&self, raw: &Value, subject: &str) -> Result<Vec<Validation>> {
        match raw {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items.iter().map(|v| self.build(v, subject)).collect(),
            _ => Err(Error::invalid_shape(
                subject,
                "validations",
                "must be an array",
            )),
        }
    }
}

impl Default for ValidationFactory {
    fn default() -> Self {
        let mut factory = Self::new();
        factory.register("size", parse_size);
        factory.register("range", parse_range);
        factory.register("dateRange", parse_date_range);
        factory.register("regexp", parse_regexp);
        factory.register("prohibitRegexp", parse_prohibit_regexp);
        factory.register("in", parse_in);
        factory.register("unique", parse_unique);
        factory.register("linkMimetypeGroup", parse_link_mimetype_group);
        factory.register("linkContentType", parse_link_content_type);
        factory.register("assetImageDimensions", parse_asset_image_dimensions);
        factory.register("assetFileSize", parse_asset_file_size);
        factory.register("enabledNodeTypes", parse_enabled_node_types);
        factory.register("enabledMarks", parse_enabled_marks);
        factory.register("nodes", parse_nodes);
        factory
    }
}

impl fmt::Debug for ValidationFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.parsers.keys().collect();
        keys.sort();
        f.debug_struct("ValidationFactory")
            .field("keys", &keys)
            .finish()
    }
}

fn object<'a>(raw: &'a Value, subject: &str, key: &str) -> Result<&'a Map<String, Value>> {
    raw.as_object()
        .ok_or_else(|| Error::invalid_shape(subject, key, "must be an object"))
}

fn optional_u64(obj: &Map<String, Value>, name: &str, subject: &str, key: &str) -> Result<Option<u64>> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_u64().map(Some).ok_or_else(|| {
            Error::invalid_shape(subject, key, format!("{} must be a non-negative integer", name))
        }),
    }
}

fn optional_string(
    obj: &Map<String, Value>,
    name: &str,
    subject: &str,
    key: &str,
) -> Result<Option<String>> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::invalid_shape(
            subject,
            key,
            format!("{} must be a string", name),
        )),
    }
}

fn bounds(raw: &Value, subject: &str, key: &str) -> Result<Bounds> {
    let obj = object(raw, subject, key)?;
    Ok(Bounds {
        min: optional_u64(obj, "min", subject, key)?,
        max: optional_u64(obj, "max", subject, key)?,
    })
}

fn string_list(raw: &Value, subject: &str, key: &str) -> Result<StringList> {
    match raw {
        Value::String(s) => Ok(StringList::One(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    Error::invalid_shape(subject, key, "entries must be strings")
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(StringList::Many),
        _ => Err(Error::invalid_shape(subject, key, "must be a list of strings")),
    }
}

fn pattern(raw: &Value, subject: &str, key: &str) -> Result<(String, Option<String>)> {
    let obj = object(raw, subject, key)?;
    let pattern = optional_string(obj, "pattern", subject, key)?
        .ok_or_else(|| Error::invalid_shape(subject, key, "missing pattern"))?;
    let flags = optional_string(obj, "flags", subject, key)?;
    Ok((pattern, flags))
}

fn parse_size(raw: &Value, _: &ValidationFactory, subject: &str) -> Result<ValidationRule> {
    Ok(ValidationRule::Size(bounds(raw, subject, "size")?))
}

fn parse_range(raw: &Value, _: &ValidationFactory, subject: &str) -> Result<ValidationRule> {
    let obj = object(raw, subject, "range")?;
    let number = |name: &str| match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.clone())),
        Some(_) => Err(Error::invalid_shape(
            subject,
            "range",
            format!("{} must be a number", name),
        )),
    };
    Ok(ValidationRule::Range {
        min: number("min")?,
        max: number("max")?,
    })
}

fn parse_date_range(raw: &Value, _: &ValidationFactory, subject: &str) -> Result<ValidationRule> {
    let obj = object(raw, subject, "dateRange")?;
    Ok(ValidationRule::DateRange {
        min: optional_string(obj, "min", subject, "dateRange")?,
        max: optional_string(obj, "max", subject, "dateRange")?,
    })
}

fn parse_regexp(raw: &Value, _: &ValidationFactory, subject: &str) -> Result<ValidationRule> {
    let (pattern, flags) = pattern(raw, subject, "regexp")?;
    Ok(ValidationRule::Regexp { pattern, flags })
}

fn parse_prohibit_regexp(
    raw: &Value,
    _: &ValidationFactory,
    subject: &str,
) -> Result<ValidationRule> {
    let (pattern, flags) = pattern(raw, subject, "prohibitRegexp")?;
    Ok(ValidationRule::ProhibitRegexp { pattern, flags })
}

fn parse_in(raw: &Value, _: &ValidationFactory, subject: &str) -> Result<ValidationRule> {
    raw.as_array()
        .map(|values| ValidationRule::In(values.clone()))
        .ok_or_else(|| Error::invalid_shape(subject, "in", "must be an array"))
}

fn parse_unique(raw: &Value, _: &ValidationFactory, subject: &str) -> Result<ValidationRule> {
    match raw {
        Value::Bool(true) => Ok(ValidationRule::Unique),
        _ => Err(Error::invalid_shape(subject, "unique", "must be true")),
    }
}

fn parse_link_mimetype_group(
    raw: &Value,
    _: &ValidationFactory,
    subject: &str,
) -> Result<ValidationRule> {
    string_list(raw, subject, "linkMimetypeGroup").map(ValidationRule::LinkMimetypeGroup)
}

fn parse_link_content_type(
    raw: &Value,
    _: &ValidationFactory,
    subject: &str,
) -> Result<ValidationRule> {
    string_list(raw, subject, "linkContentType").map(ValidationRule::LinkContentType)
}

fn parse_asset_image_dimensions(
    raw: &Value,
    _: &ValidationFactory,
    subject: &str,
) -> Result<ValidationRule> {
    let key = "assetImageDimensions";
    let obj = object(raw, subject, key)?;
    let axis = |name: &str| match obj.get(name) {
        None | Some(Value::Null) => Ok(Bounds::default()),
        Some(v) => bounds(v, subject, key),
    };
    Ok(ValidationRule::AssetImageDimensions {
        width: axis("width")?,
        height: axis("height")?,
    })
}

fn parse_asset_file_size(
    raw: &Value,
    _: &ValidationFactory,
    subject: &str,
) -> Result<ValidationRule> {
    Ok(ValidationRule::AssetFileSize(bounds(
        raw,
        subject,
        "assetFileSize",
    )?))
}

fn parse_enabled_node_types(
    raw: &Value,
    _: &ValidationFactory,
    subject: &str,
) -> Result<ValidationRule> {
    string_list(raw, subject, "enabledNodeTypes").map(ValidationRule::EnabledNodeTypes)
}

fn parse_enabled_marks(raw: &Value, _: &ValidationFactory, subject: &str) -> Result<ValidationRule> {
    string_list(raw, subject, "enabledMarks").map(ValidationRule::EnabledMarks)
}

fn parse_nodes(raw: &Value, factory: &ValidationFactory, subject: &str) -> Result<ValidationRule> {
    let obj = object(raw, subject, "nodes")?;
    let mut nodes = BTreeMap::new();
    for (node, validations) in obj {
        let validations = factory.build_all(validations, subject)?;
        check_node(node, &validations)?;
        nodes.insert(node.clone(), validations);
    }
    Ok(ValidationRule::Nodes(nodes))
}
