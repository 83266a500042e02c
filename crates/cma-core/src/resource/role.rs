use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::{ClientRef, Resource};
use crate::Result;
use crate::builder::MapContext;
use crate::constraint::{Constraint, ConstraintContext};
use crate::error::Error;
use crate::hydrate::{Hydrate, from_attributes, subject};
use crate::types::SystemProperties;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

/// The actions a policy or permission covers: `"all"` or an explicit list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Actions {
    All,
    Only(Vec<String>),
}

impl Actions {
    pub fn only<S: Into<String>>(actions: impl IntoIterator<Item = S>) -> Self {
        Actions::Only(actions.into_iter().map(Into::into).collect())
    }

    pub fn covers(&self, action: &str) -> bool {
        match self {
            Actions::All => true,
            Actions::Only(actions) => actions.iter().any(|a| a == action),
        }
    }
}

impl Serialize for Actions {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Actions::All => serializer.serialize_str("all"),
            Actions::Only(actions) => actions.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Actions {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Keyword(String),
            List(Vec<String>),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Keyword(k) if k == "all" => Ok(Actions::All),
            Wire::Keyword(k) => Err(serde::de::Error::custom(format!(
                "expected \"all\" or a list of actions, got \"{k}\""
            ))),
            Wire::List(actions) => Ok(Actions::Only(actions)),
        }
    }
}

/// One rule of a role: an effect over some actions, optionally narrowed by a constraint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Policy {
    effect: Effect,
    actions: Actions,
    #[serde(skip_serializing_if = "Option::is_none")]
    constraint: Option<Constraint>,
}

impl Policy {
    pub fn new(effect: Effect, actions: Actions) -> Self {
        Self {
            effect,
            actions,
            constraint: None,
        }
    }

    /// Narrow the policy. The constraint tree must be legal in role policies.
    pub fn with_constraint(mut self, constraint: Constraint) -> Result<Self> {
        constraint.check(ConstraintContext::RolePolicy)?;
        self.constraint = Some(constraint);
        Ok(self)
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    pub fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }
}

#[derive(Deserialize)]
struct RawPolicy {
    effect: Effect,
    actions: Actions,
    #[serde(default)]
    constraint: Option<Value>,
}

/// A role: named policies and permissions granted to space members.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sys: Option<SystemProperties>,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_deserializing)]
    policies: Vec<Policy>,
    #[serde(default)]
    permissions: BTreeMap<String, Actions>,
    #[serde(skip)]
    client: Option<ClientRef>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            sys: None,
            name: name.into(),
            description: None,
            policies: Vec::new(),
            permissions: BTreeMap::new(),
            client: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn add_policy(&mut self, policy: Policy) {
        self.policies.push(policy);
    }

    pub fn clear_policies(&mut self) {
        self.policies.clear();
    }

    /// Permission grants keyed by area (`ContentModel`, `Settings`, ...).
    pub fn permissions(&self) -> &BTreeMap<String, Actions> {
        &self.permissions
    }

    pub fn set_permission(&mut self, area: impl Into<String>, actions: Actions) {
        self.permissions.insert(area.into(), actions);
    }
}

impl Resource for Role {
    fn type_tag(&self) -> &'static str {
        "Role"
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
        Ok(serde_json::to_value(self)?)
    }

    resource_plumbing!();
}

impl Hydrate for Role {
    fn hydrate(raw: &Value, cx: &MapContext<'_>) -> Result<Self> {
        let mut role: Role = from_attributes("Role", raw)?;
        let raw_policies = match raw.get("policies") {
            None | Some(Value::Null) => Vec::new(),
            Some(policies) => Vec::<RawPolicy>::deserialize(policies).map_err(|e| {
                Error::invalid_shape(subject(raw), "Role", format!("policies: {e}"))
            })?,
        };
        for raw_policy in raw_policies {
            let constraint = raw_policy
                .constraint
                .filter(|c| !c.is_null())
                .map(|c| cx.constraints().build_in(&c, ConstraintContext::RolePolicy))
                .transpose()?;
            role.policies.push(Policy {
                effect: raw_policy.effect,
                actions: raw_policy.actions,
                constraint,
            });
        }
        Ok(role)
    }
}
