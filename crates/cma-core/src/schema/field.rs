//! Content type field definitions.
//!
//! A field's JSON form is keyed by its `type` tag. The [`FieldFactory`] holds
//! one parser per tag, each checking the sub-keys its shape requires (`linkType`
//! for links, `items` for arrays). Boolean flags default to `false`.
//!
//! Validations are checked against the field type's legal subset whenever they
//! are attached, including during hydration.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};

use super::validation::{Validation, ValidationFactory, ValidationKind};
use crate::Result;
use crate::error::Error;

const TEXT_VALIDATIONS: &[ValidationKind] = &[
    ValidationKind::In,
    ValidationKind::Size,
    ValidationKind::Regexp,
    ValidationKind::ProhibitRegexp,
];

const SYMBOL_VALIDATIONS: &[ValidationKind] = &[
    ValidationKind::In,
    ValidationKind::Size,
    ValidationKind::Regexp,
    ValidationKind::ProhibitRegexp,
    ValidationKind::Unique,
];

const NUMERIC_VALIDATIONS: &[ValidationKind] = &[
    ValidationKind::In,
    ValidationKind::Range,
    ValidationKind::Unique,
];

const DATE_VALIDATIONS: &[ValidationKind] = &[ValidationKind::DateRange];

const ENTRY_LINK_VALIDATIONS: &[ValidationKind] = &[ValidationKind::LinkContentType];

const ASSET_LINK_VALIDATIONS: &[ValidationKind] = &[
    ValidationKind::LinkMimetypeGroup,
    ValidationKind::AssetImageDimensions,
    ValidationKind::AssetFileSize,
];

const ARRAY_VALIDATIONS: &[ValidationKind] = &[ValidationKind::Size];

const RICH_TEXT_VALIDATIONS: &[ValidationKind] = &[
    ValidationKind::Size,
    ValidationKind::EnabledNodeTypes,
    ValidationKind::EnabledMarks,
    ValidationKind::Nodes,
];

/// What a Link field may point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkType {
    Entry,
    Asset,
}

impl LinkType {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkType::Entry => "Entry",
            LinkType::Asset => "Asset",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Entry" => Some(LinkType::Entry),
            "Asset" => Some(LinkType::Asset),
            _ => None,
        }
    }

    fn legal_validations(self) -> &'static [ValidationKind] {
        match self {
            LinkType::Entry => ENTRY_LINK_VALIDATIONS,
            LinkType::Asset => ASSET_LINK_VALIDATIONS,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The element type of an Array field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemType {
    Symbol,
    Link(LinkType),
}

impl ItemType {
    pub fn type_tag(self) -> &'static str {
        match self {
            ItemType::Symbol => "Symbol",
            ItemType::Link(_) => "Link",
        }
    }

    pub fn link_type(self) -> Option<LinkType> {
        match self {
            ItemType::Symbol => None,
            ItemType::Link(link_type) => Some(link_type),
        }
    }

    pub fn legal_validations(self) -> &'static [ValidationKind] {
        match self {
            ItemType::Symbol => SYMBOL_VALIDATIONS,
            ItemType::Link(link_type) => link_type.legal_validations(),
        }
    }

    fn describe(self) -> String {
        match self {
            ItemType::Symbol => "Array<Symbol> item".to_string(),
            ItemType::Link(link_type) => format!("Array<Link:{}> item", link_type),
        }
    }
}

/// The `items` descriptor of an Array field.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayItems {
    item_type: ItemType,
    validations: Vec<Validation>,
}

impl ArrayItems {
    pub fn new(item_type: ItemType) -> Self {
        Self {
            item_type,
            validations: Vec::new(),
        }
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn validations(&self) -> &[Validation] {
        &self.validations
    }

    /// Attach a validation to the array's items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalValidation`] if the item type does not allow
    /// the validation's kind; the list is left unchanged.
    pub fn add_validation(&mut self, validation: Validation) -> Result<()> {
        validation.check_legal(
            self.item_type.legal_validations(),
            self.item_type.type_tag(),
            &self.item_type.describe(),
        )?;
        self.validations.push(validation);
        Ok(())
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), json!(self.item_type.type_tag()));
        if let Some(link_type) = self.item_type.link_type() {
            map.insert("linkType".to_string(), json!(link_type.as_str()));
        }
        if !self.validations.is_empty() {
            map.insert("validations".to_string(), json!(self.validations));
        }
        Value::Object(map)
    }
}

/// The type of a field, with its shape-specific data.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Symbol,
    Text,
    Boolean,
    Date,
    Integer,
    Number,
    Location,
    Object,
    RichText,
    Link(LinkType),
    Array(ArrayItems),
}

impl FieldKind {
    /// Returns the `type` tag this kind serializes as.
    pub fn type_tag(&self) -> &'static str {
        match self {
            FieldKind::Symbol => "Symbol",
            FieldKind::Text => "Text",
            FieldKind::Boolean => "Boolean",
            FieldKind::Date => "Date",
            FieldKind::Integer => "Integer",
            FieldKind::Number => "Number",
            FieldKind::Location => "Location",
            FieldKind::Object => "Object",
            FieldKind::RichText => "RichText",
            FieldKind::Link(_) => "Link",
            FieldKind::Array(_) => "Array",
        }
    }

    /// Returns the validation kinds a field of this kind accepts.
    pub fn legal_validations(&self) -> &'static [ValidationKind] {
        match self {
            FieldKind::Symbol => SYMBOL_VALIDATIONS,
            FieldKind::Text => TEXT_VALIDATIONS,
            FieldKind::Integer | FieldKind::Number => NUMERIC_VALIDATIONS,
            FieldKind::Date => DATE_VALIDATIONS,
            FieldKind::Boolean | FieldKind::Location | FieldKind::Object => &[],
            FieldKind::RichText => RICH_TEXT_VALIDATIONS,
            FieldKind::Link(link_type) => link_type.legal_validations(),
            FieldKind::Array(_) => ARRAY_VALIDATIONS,
        }
    }

    pub fn allows(&self, kind: ValidationKind) -> bool {
        self.legal_validations().contains(&kind)
    }

    fn describe(&self) -> String {
        match self {
            FieldKind::Link(link_type) => format!("Link:{}", link_type),
            other => other.type_tag().to_string(),
        }
    }
}

/// One field of a content type's schema.
///
/// # Example
///
/// ```
/// use cma_core::schema::{FieldDefinition, FieldKind, Validation};
///
/// let mut title = FieldDefinition::new("title", "Title", FieldKind::Symbol);
/// title.set_required(true);
/// title.add_validation(Validation::size(Some(1), Some(80))).unwrap();
///
/// // Numeric ranges make no sense on a Symbol.
/// assert!(title.add_validation(Validation::range(None, None)).is_err());
/// assert_eq!(title.validations().len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDefinition {
    id: String,
    name: String,
    kind: FieldKind,
    // Registered type tag whose parser produced a kind of another tag.
    type_alias: Option<String>,
    required: bool,
    localized: bool,
    disabled: bool,
    omitted: bool,
    validations: Vec<Validation>,
    default_value: Option<Value>,
}

impl FieldDefinition {
    /// Create a field with all flags off and no validations.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            type_alias: None,
            required: false,
            localized: false,
            disabled: false,
            omitted: false,
            validations: Vec::new(),
            default_value: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Returns the `type` tag the field was built from.
    pub fn type_tag(&self) -> &str {
        self.type_alias
            .as_deref()
            .unwrap_or_else(|| self.kind.type_tag())
    }

    fn describe(&self) -> String {
        match self.type_alias {
            Some(ref tag) => tag.clone(),
            None => self.kind.describe(),
        }
    }

    /// Returns the link target for Link fields and Array-of-Link fields.
    pub fn link_type(&self) -> Option<LinkType> {
        match &self.kind {
            FieldKind::Link(link_type) => Some(*link_type),
            FieldKind::Array(items) => items.item_type.link_type(),
            _ => None,
        }
    }

    /// Returns the items descriptor for Array fields.
    pub fn items(&self) -> Option<&ArrayItems> {
        match &self.kind {
            FieldKind::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn items_mut(&mut self) -> Option<&mut ArrayItems> {
        match &mut self.kind {
            FieldKind::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    pub fn is_localized(&self) -> bool {
        self.localized
    }

    pub fn set_localized(&mut self, localized: bool) {
        self.localized = localized;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn is_omitted(&self) -> bool {
        self.omitted
    }

    pub fn set_omitted(&mut self, omitted: bool) {
        self.omitted = omitted;
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn set_default_value(&mut self, value: Option<Value>) {
        self.default_value = value;
    }

    pub fn validations(&self) -> &[Validation] {
        &self.validations
    }

    /// Attach a validation to the field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalValidation`] naming both kinds if the field type
    /// does not allow the validation; the list is left unchanged.
    pub fn add_validation(&mut self, validation: Validation) -> Result<()> {
        validation.check_legal(
            self.kind.legal_validations(),
            self.type_tag(),
            &self.describe(),
        )?;
        self.validations.push(validation);
        Ok(())
    }

    /// Replace all validations at once.
    ///
    /// Either every validation is legal and the list is replaced, or the first
    /// illegal one is reported and the existing list is kept.
    pub fn set_validations(&mut self, validations: Vec<Validation>) -> Result<()> {
        let field_type = self.describe();
        for validation in &validations {
            validation.check_legal(self.kind.legal_validations(), self.type_tag(), &field_type)?;
        }
        self.validations = validations;
        Ok(())
    }

    pub fn clear_validations(&mut self) {
        self.validations.clear();
    }

    /// Replace the item validations of an Array field, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] if the field is not an Array, and
    /// [`Error::IllegalValidation`] if the item type does not allow one of
    /// the validations.
    pub fn set_item_validations(&mut self, validations: Vec<Validation>) -> Result<()> {
        let id = self.id.clone();
        let items = self
            .items_mut()
            .ok_or_else(|| Error::invalid_shape(id, "Field", "only Array fields have items"))?;
        let item_type = items.item_type;
        let described = item_type.describe();
        for validation in &validations {
            validation.check_legal(item_type.legal_validations(), item_type.type_tag(), &described)?;
        }
        items.validations = validations;
        Ok(())
    }

    /// Returns the full JSON form of the field.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), json!(self.id));
        map.insert("name".to_string(), json!(self.name));
        map.insert("type".to_string(), json!(self.type_tag()));
        map.insert("required".to_string(), json!(self.required));
        map.insert("localized".to_string(), json!(self.localized));
        map.insert("disabled".to_string(), json!(self.disabled));
        map.insert("omitted".to_string(), json!(self.omitted));
        match &self.kind {
            FieldKind::Link(link_type) => {
                map.insert("linkType".to_string(), json!(link_type.as_str()));
            }
            FieldKind::Array(items) => {
                map.insert("items".to_string(), items.to_value());
            }
            _ => {}
        }
        if !self.validations.is_empty() {
            map.insert("validations".to_string(), json!(self.validations));
        }
        if let Some(ref default_value) = self.default_value {
            map.insert("defaultValue".to_string(), default_value.clone());
        }
        Value::Object(map)
    }
}

impl Serialize for FieldDefinition {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldDefinition {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        FieldFactory::default()
            .build(&value, &ValidationFactory::default())
            .map_err(serde::de::Error::custom)
    }
}

/// Builds the [`FieldKind`] for one type tag from the raw field object.
///
/// Receives the raw field, the validation factory (for item validations) and
/// the field id to name in errors.
pub type FieldParser = fn(&Map<String, Value>, &ValidationFactory, &str) -> Result<FieldKind>;

/// Table from field `type` tag to parser.
#[derive(Clone)]
pub struct FieldFactory {
    parsers: HashMap<String, FieldParser>,
}

impl FieldFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register a parser for a type tag, replacing any existing one.
    ///
    /// The parser may return any kind; the field keeps the registered tag
    /// and writes back under it, with the kind's shape and legal validations.
    pub fn register(&mut self, tag: impl Into<String>, parser: FieldParser) {
        self.parsers.insert(tag.into(), parser);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.parsers.contains_key(tag)
    }

    /// Build a field definition from its raw JSON object.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidShape`] for a missing `id`/`type`, mistyped flags, or
    ///   missing shape-specific keys
    /// - [`Error::UnknownFieldType`] for an unregistered `type`
    /// - [`Error::UnknownValidation`] / [`Error::IllegalValidation`] from the
    ///   field's validations
    pub fn build(&self, raw: &Value, validations: &ValidationFactory) -> Result<FieldDefinition> {
        let obj = raw
            .as_object()
            .ok_or_else(|| Error::invalid_shape("field", "Field", "must be an object"))?;

        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_shape("field", "Field", "missing id"))?;

        let tag = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_shape(id, "Field", "missing type"))?;

        let parser = self.parsers.get(tag).ok_or_else(|| Error::UnknownFieldType {
            field: id.to_string(),
            tag: tag.to_string(),
        })?;
        let kind = parser(obj, validations, id)?;

        let name = match obj.get("name") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(name)) => name.clone(),
            Some(_) => return Err(Error::invalid_shape(id, tag, "name must be a string")),
        };

        let mut field = FieldDefinition::new(id, name, kind);
        if field.kind.type_tag() != tag {
            field.type_alias = Some(tag.to_string());
        }
        field.required = flag(obj, "required", id, tag)?;
        field.localized = flag(obj, "localized", id, tag)?;
        field.disabled = flag(obj, "disabled", id, tag)?;
        field.omitted = flag(obj, "omitted", id, tag)?;
        field.default_value = obj.get("defaultValue").filter(|v| !v.is_null()).cloned();

        let raw_validations = obj.get("validations").unwrap_or(&Value::Null);
        for validation in validations.build_all(raw_validations, id)? {
            field.add_validation(validation)?;
        }

        Ok(field)
    }
}

impl Default for FieldFactory {
    fn default() -> Self {
        let mut factory = Self::new();
        factory.register("Symbol", |_, _, _| Ok(FieldKind::Symbol));
        factory.register("Text", |_, _, _| Ok(FieldKind::Text));
        factory.register("Boolean", |_, _, _| Ok(FieldKind::Boolean));
        factory.register("Date", |_, _, _| Ok(FieldKind::Date));
        factory.register("Integer", |_, _, _| Ok(FieldKind::Integer));
        factory.register("Number", |_, _, _| Ok(FieldKind::Number));
        factory.register("Location", |_, _, _| Ok(FieldKind::Location));
        factory.register("Object", |_, _, _| Ok(FieldKind::Object));
        factory.register("RichText", |_, _, _| Ok(FieldKind::RichText));
        factory.register("Link", parse_link);
        factory.register("Array", parse_array);
        factory
    }
}

impl fmt::Debug for FieldFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.parsers.keys().collect();
        tags.sort();
        f.debug_struct("FieldFactory").field("tags", &tags).finish()
    }
}

fn flag(obj: &Map<String, Value>, name: &str, id: &str, tag: &str) -> Result<bool> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(Error::invalid_shape(
            id,
            tag,
            format!("{} must be a boolean", name),
        )),
    }
}

fn link_type(obj: &Map<String, Value>, id: &str, tag: &str) -> Result<LinkType> {
    let raw = obj
        .get("linkType")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::invalid_shape(id, tag, "missing linkType"))?;
    LinkType::parse(raw).ok_or_else(|| {
        Error::invalid_shape(
            id,
            tag,
            format!("linkType must be Entry or Asset, found '{}'", raw),
        )
    })
}

fn parse_link(obj: &Map<String, Value>, _: &ValidationFactory, id: &str) -> Result<FieldKind> {
    Ok(FieldKind::Link(link_type(obj, id, "Link")?))
}

fn parse_array(
    obj: &Map<String, Value>,
    validations: &ValidationFactory,
    id: &str,
) -> Result<FieldKind> {
    let items = obj
        .get("items")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::invalid_shape(id, "Array", "missing items"))?;

    let item_type = match items.get("type").and_then(Value::as_str) {
        Some("Symbol") => ItemType::Symbol,
        Some("Link") => ItemType::Link(link_type(items, id, "Array")?),
        Some(other) => {
            return Err(Error::invalid_shape(
                id,
                "Array",
                format!("items.type must be Symbol or Link, found '{}'", other),
            ));
        }
        None => return Err(Error::invalid_shape(id, "Array", "missing items.type")),
    };

    let mut array_items = ArrayItems::new(item_type);
    let raw_validations = items.get("validations").unwrap_or(&Value::Null);
    for validation in validations.build_all(raw_validations, id)? {
        array_items.add_validation(validation)?;
    }

    Ok(FieldKind::Array(array_items))
}
