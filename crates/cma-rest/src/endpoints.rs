//! API paths for each resource kind.

use cma_core::Result;
use cma_core::error::Error;
use cma_core::{Resource, ResourceAction};

/// Where a resource kind's collection lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    Root,
    Space,
    Environment,
}

fn collection_of(type_tag: &str) -> Result<(Scope, &'static str)> {
    let found = match type_tag {
        "Space" => (Scope::Root, "spaces"),
        "Environment" => (Scope::Space, "environments"),
        "Role" => (Scope::Space, "roles"),
        "WebhookDefinition" => (Scope::Space, "webhook_definitions"),
        "ContentType" => (Scope::Environment, "content_types"),
        "Entry" => (Scope::Environment, "entries"),
        "Asset" => (Scope::Environment, "assets"),
        "Locale" => (Scope::Environment, "locales"),
        other => {
            return Err(Error::UnknownType {
                type_tag: other.to_string(),
            });
        }
    };
    Ok(found)
}

/// Builds request paths for the configured space and environment.
///
/// Paths derived from a resource prefer the space and environment recorded
/// in its `sys` block, so resources fetched from another environment are
/// written back to where they came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    space_id: String,
    environment_id: String,
}

impl Endpoints {
    pub fn new(space_id: impl Into<String>, environment_id: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            environment_id: environment_id.into(),
        }
    }

    pub fn space_id(&self) -> &str {
        &self.space_id
    }

    pub fn environment_id(&self) -> &str {
        &self.environment_id
    }

    /// Collection path for a kind, e.g. `/spaces/s/environments/master/entries`.
    pub fn collection(&self, type_tag: &str) -> Result<String> {
        self.scoped_collection(type_tag, &self.space_id, &self.environment_id)
    }

    /// Item path for a kind and id.
    pub fn item(&self, type_tag: &str, id: &str) -> Result<String> {
        Ok(format!("{}/{}", self.collection(type_tag)?, id))
    }

    /// Collection path a new resource is posted to.
    pub fn collection_for(&self, resource: &dyn Resource) -> Result<String> {
        let (space, environment) = self.scope_of(resource);
        self.scoped_collection(resource.type_tag(), space, environment)
    }

    /// Item path of an existing resource.
    pub fn item_for(&self, resource: &dyn Resource) -> Result<String> {
        let id = resource.id().ok_or_else(|| Error::MissingSystemProperty {
            type_tag: resource.type_tag().to_string(),
            property: "id",
        })?;
        Ok(format!("{}/{}", self.collection_for(resource)?, id))
    }

    /// Path of a lifecycle action on an existing resource.
    ///
    /// Publishing and archiving share a path with their inverse; the HTTP
    /// method tells them apart.
    pub fn action_for(&self, resource: &dyn Resource, action: &ResourceAction) -> Result<String> {
        let item = self.item_for(resource)?;
        let path = match action {
            ResourceAction::Publish | ResourceAction::Unpublish => format!("{item}/published"),
            ResourceAction::Archive | ResourceAction::Unarchive => format!("{item}/archived"),
            ResourceAction::Process { locale } => format!("{item}/files/{locale}/process"),
        };
        Ok(path)
    }

    fn scope_of<'a>(&'a self, resource: &'a dyn Resource) -> (&'a str, &'a str) {
        let sys = resource.system_properties();
        let space = sys
            .and_then(|s| s.space())
            .map(|link| link.id())
            .unwrap_or(self.space_id.as_str());
        let environment = sys
            .and_then(|s| s.environment())
            .map(|link| link.id())
            .unwrap_or(self.environment_id.as_str());
        (space, environment)
    }

    fn scoped_collection(&self, type_tag: &str, space: &str, environment: &str) -> Result<String> {
        let (scope, segment) = collection_of(type_tag)?;
        let path = match scope {
            Scope::Root => format!("/{segment}"),
            Scope::Space => format!("/spaces/{space}/{segment}"),
            Scope::Environment => {
                format!("/spaces/{space}/environments/{environment}/{segment}")
            }
        };
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cma_core::{Entry, ResourceBuilder};
    use serde_json::json;

    fn endpoints() -> Endpoints {
        Endpoints::new("blog", "master")
    }

    #[test]
    fn collection_paths_by_scope() {
        let e = endpoints();
        assert_eq!(e.collection("Space").unwrap(), "/spaces");
        assert_eq!(e.collection("Role").unwrap(), "/spaces/blog/roles");
        assert_eq!(
            e.collection("WebhookDefinition").unwrap(),
            "/spaces/blog/webhook_definitions"
        );
        assert_eq!(
            e.collection("ContentType").unwrap(),
            "/spaces/blog/environments/master/content_types"
        );
        assert_eq!(e.item("Space", "blog").unwrap(), "/spaces/blog");
    }

    #[test]
    fn unknown_kind_is_an_error() {
        assert!(matches!(
            endpoints().collection("Snippet"),
            Err(Error::UnknownType { .. })
        ));
    }

    #[test]
    fn resource_paths_use_sys_scope() {
        let entry = ResourceBuilder::default()
            .build(&json!({
                "sys": {
                    "type": "Entry",
                    "id": "nyancat",
                    "space": {"sys": {"type": "Link", "linkType": "Space", "id": "other"}},
                    "environment": {"sys": {"type": "Link", "linkType": "Environment", "id": "staging"}},
                    "contentType": {"sys": {"type": "Link", "linkType": "ContentType", "id": "cat"}}
                },
                "fields": {}
            }))
            .unwrap();
        assert_eq!(
            endpoints().item_for(entry.as_ref()).unwrap(),
            "/spaces/other/environments/staging/entries/nyancat"
        );
        assert_eq!(
            endpoints()
                .action_for(entry.as_ref(), &ResourceAction::Unpublish)
                .unwrap(),
            "/spaces/other/environments/staging/entries/nyancat/published"
        );
    }

    #[test]
    fn new_resource_uses_configured_scope() {
        let entry = Entry::new("cat");
        assert_eq!(
            endpoints().collection_for(&entry).unwrap(),
            "/spaces/blog/environments/master/entries"
        );
        assert!(matches!(
            endpoints().item_for(&entry),
            Err(Error::MissingSystemProperty { property: "id", .. })
        ));
    }

    #[test]
    fn process_path_names_locale() {
        let asset = ResourceBuilder::default()
            .build(&json!({"sys": {"type": "Asset", "id": "logo"}, "fields": {}}))
            .unwrap();
        let action = ResourceAction::Process {
            locale: "en-US".to_string(),
        };
        assert_eq!(
            endpoints().action_for(asset.as_ref(), &action).unwrap(),
            "/spaces/blog/environments/master/assets/logo/files/en-US/process"
        );
    }
}
