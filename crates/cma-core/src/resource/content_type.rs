use serde_json::{Map, Value};

use super::{ClientRef, Resource, ResourceAction};
use crate::Result;
use crate::builder::MapContext;
use crate::error::{Error, InvalidInputError};
use crate::hydrate::{Hydrate, object, subject, system_properties};
use crate::schema::FieldDefinition;
use crate::types::SystemProperties;

/// A content type: the schema entries of that type follow.
#[derive(Clone, Debug)]
pub struct ContentType {
    sys: Option<SystemProperties>,
    name: String,
    description: Option<String>,
    display_field: Option<String>,
    fields: Vec<FieldDefinition>,
    client: Option<ClientRef>,
}

impl ContentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            sys: None,
            name: name.into(),
            description: None,
            display_field: None,
            fields: Vec::new(),
            client: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Id of the field used as the entry title in the web app.
    pub fn display_field(&self) -> Option<&str> {
        self.display_field.as_deref()
    }

    /// Set the display field. The id must name an existing field.
    pub fn set_display_field(&mut self, id: Option<String>) -> Result<()> {
        if let Some(ref id) = id {
            if self.field(id).is_none() {
                return Err(InvalidInputError::Other {
                    message: format!("display field '{id}' is not a field of this content type"),
                }
                .into());
            }
        }
        self.display_field = id;
        Ok(())
    }

    /// Field definitions in schema order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id() == id)
    }

    pub fn field_mut(&mut self, id: &str) -> Option<&mut FieldDefinition> {
        self.fields.iter_mut().find(|f| f.id() == id)
    }

    /// Append a field. Field ids are unique within a content type.
    pub fn add_field(&mut self, field: FieldDefinition) -> Result<()> {
        if self.field(field.id()).is_some() {
            return Err(InvalidInputError::DuplicateField {
                id: field.id().to_string(),
            }
            .into());
        }
        self.fields.push(field);
        Ok(())
    }

    /// Remove a field from the schema.
    ///
    /// The API only accepts removal of fields that were first saved with
    /// `omitted` set; this call does not enforce that.
    pub fn remove_field(&mut self, id: &str) -> Option<FieldDefinition> {
        let index = self.fields.iter().position(|f| f.id() == id)?;
        if self.display_field.as_deref() == Some(id) {
            self.display_field = None;
        }
        Some(self.fields.remove(index))
    }
}

impl Resource for ContentType {
    fn type_tag(&self) -> &'static str {
        "ContentType"
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
        map.insert("name".into(), Value::String(self.name.clone()));
        if let Some(ref description) = self.description {
            map.insert("description".into(), Value::String(description.clone()));
        }
        if let Some(ref display_field) = self.display_field {
            map.insert("displayField".into(), Value::String(display_field.clone()));
        }
        map.insert(
            "fields".into(),
            Value::Array(self.fields.iter().map(FieldDefinition::to_value).collect()),
        );
        Ok(Value::Object(map))
    }

    fn supports(&self, action: &ResourceAction) -> bool {
        matches!(action, ResourceAction::Publish | ResourceAction::Unpublish)
    }

    resource_plumbing!();
}

impl Hydrate for ContentType {
    fn hydrate(raw: &Value, cx: &MapContext<'_>) -> Result<Self> {
        let obj = object("ContentType", raw)?;
        let sys = system_properties("ContentType", raw)?;
        let name = optional_string(obj, "name", raw)?.unwrap_or_default();
        let description = optional_string(obj, "description", raw)?;
        let display_field = optional_string(obj, "displayField", raw)?;
        let fields = match obj.get("fields") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| cx.fields().build(item, cx.validations()))
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(Error::invalid_shape(
                    subject(raw),
                    "ContentType",
                    "'fields' must be an array",
                ));
            }
        };
        Ok(Self {
            sys: Some(sys),
            name,
            description,
            display_field,
            fields,
            client: None,
        })
    }
}

fn optional_string(obj: &Map<String, Value>, key: &str, raw: &Value) -> Result<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::invalid_shape(
            subject(raw),
            "ContentType",
            format!("'{key}' must be a string"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceBuilder;
    use crate::schema::{FieldKind, LinkType, Validation};
    use serde_json::json;

    fn raw_cat() -> Value {
        json!({
            "sys": {"type": "ContentType", "id": "cat", "version": 4},
            "name": "Cat",
            "description": "Meow.",
            "displayField": "name",
            "fields": [
                {
                    "id": "name", "name": "Name", "type": "Text",
                    "localized": true, "required": true, "disabled": false, "omitted": false
                },
                {
                    "id": "bestFriend", "name": "Best Friend", "type": "Link", "linkType": "Entry",
                    "localized": false, "required": false, "disabled": false, "omitted": false
                }
            ]
        })
    }

    #[test]
    fn hydrates_fields_through_factory() {
        let ct = ResourceBuilder::default()
            .build_as::<ContentType>(&raw_cat(), None)
            .unwrap();
        assert_eq!(ct.name(), "Cat");
        assert_eq!(ct.display_field(), Some("name"));
        assert_eq!(ct.fields().len(), 2);
        assert_eq!(ct.field("bestFriend").unwrap().link_type(), Some(LinkType::Entry));
        assert_eq!(ct.to_json().unwrap(), raw_cat());
    }

    #[test]
    fn bad_field_fails_the_content_type() {
        let mut raw = raw_cat();
        raw["fields"][1]["type"] = json!("Hologram");
        let err = ResourceBuilder::default().build(&raw).unwrap_err();
        assert!(matches!(err, Error::UnknownFieldType { .. }));
    }

    #[test]
    fn field_ids_are_unique() {
        let mut ct = ContentType::new("Cat");
        ct.add_field(FieldDefinition::new("name", "Name", FieldKind::Symbol))
            .unwrap();
        let err = ct
            .add_field(FieldDefinition::new("name", "Other", FieldKind::Text))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput(InvalidInputError::DuplicateField { .. })
        ));
        assert_eq!(ct.fields().len(), 1);
    }

    #[test]
    fn edit_field_in_place() {
        let mut ct = ContentType::new("Cat");
        ct.add_field(FieldDefinition::new("name", "Name", FieldKind::Symbol))
            .unwrap();
        ct.set_display_field(Some("name".into())).unwrap();
        ct.field_mut("name")
            .unwrap()
            .add_validation(Validation::size(Some(1), Some(64)))
            .unwrap();
        assert_eq!(ct.field("name").unwrap().validations().len(), 1);
        assert!(ct.set_display_field(Some("missing".into())).is_err());

        let removed = ct.remove_field("name").unwrap();
        assert_eq!(removed.id(), "name");
        assert!(ct.display_field().is_none());
    }

    #[test]
    fn content_types_only_publish() {
        let ct = ContentType::new("Cat");
        assert!(ct.supports(&ResourceAction::Publish));
        assert!(!ct.supports(&ResourceAction::Archive));
    }
}
