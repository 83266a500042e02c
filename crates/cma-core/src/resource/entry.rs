use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{ClientRef, Resource, ResourceAction};
use crate::Result;
use crate::builder::MapContext;
use crate::error::Error;
use crate::hydrate::{Hydrate, object, subject, system_properties};
use crate::types::{Link, SystemProperties};

/// Field values keyed by field id, then by locale code.
pub type LocalizedFields = BTreeMap<String, BTreeMap<String, Value>>;

/// A content entry. Its fields are shaped by its content type.
#[derive(Clone, Debug)]
pub struct Entry {
    sys: Option<SystemProperties>,
    content_type_id: String,
    fields: LocalizedFields,
    client: Option<ClientRef>,
}

impl Entry {
    /// A new, unsaved entry of the given content type.
    pub fn new(content_type_id: impl Into<String>) -> Self {
        Self {
            sys: None,
            content_type_id: content_type_id.into(),
            fields: LocalizedFields::new(),
            client: None,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type_id
    }

    pub fn fields(&self) -> &LocalizedFields {
        &self.fields
    }

    /// Ids of the fields that carry at least one locale value.
    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn field(&self, id: &str, locale: &str) -> Option<&Value> {
        self.fields.get(id)?.get(locale)
    }

    /// All locale values of one field.
    pub fn localized(&self, id: &str) -> Option<&BTreeMap<String, Value>> {
        self.fields.get(id)
    }

    pub fn set_field(&mut self, id: impl Into<String>, locale: impl Into<String>, value: Value) {
        self.fields
            .entry(id.into())
            .or_default()
            .insert(locale.into(), value);
    }

    /// Remove one locale value, dropping the field once it has none left.
    pub fn remove_field(&mut self, id: &str, locale: &str) -> Option<Value> {
        let values = self.fields.get_mut(id)?;
        let removed = values.remove(locale);
        if values.is_empty() {
            self.fields.remove(id);
        }
        removed
    }

    /// Read a field as a string.
    pub fn text(&self, id: &str, locale: &str) -> Option<&str> {
        self.field(id, locale)?.as_str()
    }

    /// Read a single-link field.
    pub fn link(&self, id: &str, locale: &str) -> Option<Link> {
        Link::from_value(self.field(id, locale)?)
    }

    /// Read an array-of-links field. Non-link items are skipped.
    pub fn links(&self, id: &str, locale: &str) -> Vec<Link> {
        self.field(id, locale)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Link::from_value).collect())
            .unwrap_or_default()
    }

    pub fn set_link(&mut self, id: impl Into<String>, locale: impl Into<String>, link: &Link) {
        self.set_field(id, locale, link.to_value());
    }
}

impl Resource for Entry {
    fn type_tag(&self) -> &'static str {
        "Entry"
    }

    fn system_properties(&self) -> Option<&SystemProperties> {
        self.sys.as_ref()
    }

    fn client(&self) -> Option<&ClientRef> {
        self.client.as_ref()
    }

    fn attach_client(&mut self, client: ClientRef) {
        self.client = Some(client);
    }

    fn to_json(&self) -> Result<Value> {
        let mut map = Map::new();
        if let Some(ref sys) = self.sys {
            map.insert("sys".into(), serde_json::to_value(sys)?);
        }
        map.insert("fields".into(), serde_json::to_value(&self.fields)?);
        Ok(Value::Object(map))
    }

    fn as_request_body(&self) -> Result<Value> {
        Ok(json!({ "fields": self.fields }))
    }

    fn content_type_id(&self) -> Option<&str> {
        Some(&self.content_type_id)
    }

    fn supports(&self, action: &ResourceAction) -> bool {
        !matches!(action, ResourceAction::Process { .. })
    }

    resource_plumbing!();
}

impl Hydrate for Entry {
    fn hydrate(raw: &Value, _cx: &MapContext<'_>) -> Result<Self> {
        let obj = object("Entry", raw)?;
        let sys = system_properties("Entry", raw)?;
        let content_type_id = sys
            .content_type()
            .map(|link| link.id().to_string())
            .ok_or_else(|| Error::invalid_shape(subject(raw), "Entry", "missing sys.contentType"))?;
        let fields = match obj.get("fields") {
            None | Some(Value::Null) => LocalizedFields::new(),
            Some(fields) => LocalizedFields::deserialize(fields).map_err(|e| {
                Error::invalid_shape(subject(raw), "Entry", format!("fields: {e}"))
            })?,
        };
        Ok(Self {
            sys: Some(sys),
            content_type_id,
            fields,
            client: None,
        })
    }
}

/// A typed view over entries of one content type.
///
/// Register models with [`ContentTypeRouter::route_model`](crate::ContentTypeRouter::route_model)
/// and entries of `CONTENT_TYPE_ID` will be built as `Self` instead of a
/// plain [`Entry`]. Every model is a [`Resource`] and supports the entry
/// actions through the wrapped entry.
///
/// # Example
///
/// ```
/// use cma_core::{Entry, EntryModel, Result};
///
/// #[derive(Debug)]
/// struct Cat(Entry);
///
/// impl EntryModel for Cat {
///     const CONTENT_TYPE_ID: &'static str = "cat";
///
///     fn from_entry(entry: Entry) -> Result<Self> {
///         Ok(Cat(entry))
///     }
///
///     fn entry(&self) -> &Entry {
///         &self.0
///     }
///
///     fn entry_mut(&mut self) -> &mut Entry {
///         &mut self.0
///     }
/// }
/// ```
pub trait EntryModel: fmt::Debug + Send + Sync + Sized + 'static {
    const CONTENT_TYPE_ID: &'static str;

    fn from_entry(entry: Entry) -> Result<Self>;

    fn entry(&self) -> &Entry;

    fn entry_mut(&mut self) -> &mut Entry;
}

impl<T: EntryModel> Resource for T {
    fn type_tag(&self) -> &'static str {
        "Entry"
    }

    fn system_properties(&self) -> Option<&SystemProperties> {
        self.entry().system_properties()
    }

    fn client(&self) -> Option<&ClientRef> {
        self.entry().client()
    }

    fn attach_client(&mut self, client: ClientRef) {
        self.entry_mut().attach_client(client);
    }

    fn to_json(&self) -> Result<Value> {
        self.entry().to_json()
    }

    fn as_request_body(&self) -> Result<Value> {
        self.entry().as_request_body()
    }

    fn content_type_id(&self) -> Option<&str> {
        Some(self.entry().content_type())
    }

    fn supports(&self, action: &ResourceAction) -> bool {
        self.entry().supports(action)
    }

    resource_plumbing!();
}

impl<T: EntryModel> Hydrate for T {
    fn hydrate(raw: &Value, cx: &MapContext<'_>) -> Result<Self> {
        T::from_entry(Entry::hydrate(raw, cx)?)
    }
}
