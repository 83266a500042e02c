use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::entry::LocalizedFields;
use super::{ClientRef, Resource, ResourceAction};
use crate::Result;
use crate::builder::MapContext;
use crate::error::Error;
use crate::hydrate::{Hydrate, object, subject, system_properties};
use crate::types::{Link, SystemProperties};

/// The file attached to an asset in one locale.
///
/// Before processing a file carries `upload` (a public URL) or `upload_from`
/// (a link to an upload resource). After processing the server fills in
/// `url` and `details`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFile {
    pub file_name: String,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_from: Option<Link>,
    /// Size and image dimensions. Server-controlled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AssetFile {
    /// A file to be fetched from a public URL when the asset is processed.
    pub fn from_url(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        upload: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            upload: Some(upload.into()),
            ..Self::default()
        }
    }

    /// True once the server has processed the upload.
    pub fn is_processed(&self) -> bool {
        self.url.is_some()
    }
}

/// A media asset: per-locale title, description and file.
#[derive(Clone, Debug)]
pub struct Asset {
    sys: Option<SystemProperties>,
    fields: LocalizedFields,
    client: Option<ClientRef>,
}

impl Asset {
    pub fn new() -> Self {
        Self {
            sys: None,
            fields: LocalizedFields::new(),
            client: None,
        }
    }

    pub fn title(&self, locale: &str) -> Option<&str> {
        self.fields.get("title")?.get(locale)?.as_str()
    }

    pub fn set_title(&mut self, locale: impl Into<String>, title: impl Into<String>) {
        self.set("title", locale.into(), Value::String(title.into()));
    }

    pub fn description(&self, locale: &str) -> Option<&str> {
        self.fields.get("description")?.get(locale)?.as_str()
    }

    pub fn set_description(&mut self, locale: impl Into<String>, description: impl Into<String>) {
        self.set("description", locale.into(), Value::String(description.into()));
    }

    /// The file for one locale, if present and well formed.
    pub fn file(&self, locale: &str) -> Option<AssetFile> {
        let raw = self.fields.get("file")?.get(locale)?;
        AssetFile::deserialize(raw).ok()
    }

    pub fn set_file(&mut self, locale: impl Into<String>, file: &AssetFile) -> Result<()> {
        let value = serde_json::to_value(file)?;
        self.set("file", locale.into(), value);
        Ok(())
    }

    /// Locales that have a file attached.
    pub fn file_locales(&self) -> impl Iterator<Item = &str> {
        self.fields
            .get("file")
            .into_iter()
            .flat_map(|files| files.keys().map(String::as_str))
    }

    pub fn fields(&self) -> &LocalizedFields {
        &self.fields
    }

    fn set(&mut self, field: &str, locale: String, value: Value) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .insert(locale, value);
    }
}

impl Default for Asset {
    fn default() -> Self {
        Self::new()
    }
}

impl Resource for Asset {
    fn type_tag(&self) -> &'static str {
        "Asset"
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

    /// File details are computed by the server and rejected on write.
    fn as_request_body(&self) -> Result<Value> {
        let mut fields = self.fields.clone();
        if let Some(files) = fields.get_mut("file") {
            for file in files.values_mut() {
                if let Value::Object(map) = file {
                    map.remove("details");
                }
            }
        }
        Ok(json!({ "fields": fields }))
    }

    fn supports(&self, _action: &ResourceAction) -> bool {
        true
    }

    resource_plumbing!();
}

impl Hydrate for Asset {
    fn hydrate(raw: &Value, _cx: &MapContext<'_>) -> Result<Self> {
        let obj = object("Asset", raw)?;
        let sys = system_properties("Asset", raw)?;
        let fields = match obj.get("fields") {
            None | Some(Value::Null) => LocalizedFields::new(),
            Some(fields) => LocalizedFields::deserialize(fields).map_err(|e| {
                Error::invalid_shape(subject(raw), "Asset", format!("fields: {e}"))
            })?,
        };
        Ok(Self {
            sys: Some(sys),
            fields,
            client: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceBuilder;

    fn raw_asset() -> Value {
        json!({
            "sys": {"type": "Asset", "id": "nyancat", "version": 2},
            "fields": {
                "title": {"en-US": "Nyan Cat"},
                "file": {
                    "en-US": {
                        "fileName": "Nyan_cat_250px_frame.png",
                        "contentType": "image/png",
                        "url": "//images.ctfassets.net/cfexampleapi/nyancat.png",
                        "details": {"size": 12273, "image": {"width": 250, "height": 250}}
                    }
                }
            }
        })
    }

    #[test]
    fn reads_processed_file() {
        let asset = ResourceBuilder::default()
            .build_as::<Asset>(&raw_asset(), None)
            .unwrap();
        assert_eq!(asset.title("en-US"), Some("Nyan Cat"));
        let file = asset.file("en-US").unwrap();
        assert!(file.is_processed());
        assert_eq!(file.details.unwrap()["size"], 12273);
        assert_eq!(asset.file_locales().collect::<Vec<_>>(), ["en-US"]);
        assert_eq!(asset.to_json().unwrap(), raw_asset());
    }

    #[test]
    fn request_body_drops_file_details() {
        let asset = ResourceBuilder::default()
            .build_as::<Asset>(&raw_asset(), None)
            .unwrap();
        let body = asset.as_request_body().unwrap();
        assert!(body.pointer("/fields/file/en-US/details").is_none());
        assert_eq!(body["fields"]["file"]["en-US"]["contentType"], "image/png");
        assert!(body.get("sys").is_none());
    }

    #[test]
    fn new_asset_from_url() {
        let mut asset = Asset::new();
        asset.set_title("en-US", "Logo");
        asset
            .set_file(
                "en-US",
                &AssetFile::from_url("logo.png", "image/png", "https://example.com/logo.png"),
            )
            .unwrap();
        let file = asset.file("en-US").unwrap();
        assert!(!file.is_processed());
        assert!(asset.supports(&ResourceAction::Process {
            locale: "en-US".into()
        }));
    }
}
