//! Turning raw payloads into concrete resources.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::Result;
use crate::builder::{MapContext, ResourceBuilder};
use crate::error::Error;
use crate::resource::{Resource, downcast};
use crate::types::SystemProperties;

/// A resource that can be built from its raw JSON form.
///
/// Implementations only parse; attaching the client back-reference is done
/// by [`hydrate`] so that every resource kind gets it the same way.
pub trait Hydrate: Resource + Sized {
    fn hydrate(raw: &Value, cx: &MapContext<'_>) -> Result<Self>;
}

/// Build a `T` from `raw` and attach the context's client, if any.
pub fn hydrate<T: Hydrate>(raw: &Value, cx: &MapContext<'_>) -> Result<T> {
    let mut resource = T::hydrate(raw, cx)?;
    if let Some(client) = cx.client() {
        resource.attach_client(client.clone());
    }
    Ok(resource)
}

/// Deserialize a serde-modelled resource, reporting failures as shape errors.
///
/// The payload must carry a `sys` object; resources built locally never pass
/// through here.
pub(crate) fn from_attributes<T: DeserializeOwned>(type_tag: &str, raw: &Value) -> Result<T> {
    let obj = object(type_tag, raw)?;
    if !obj.get("sys").is_some_and(Value::is_object) {
        return Err(Error::invalid_shape(subject(raw), type_tag, "missing sys"));
    }
    T::deserialize(raw).map_err(|e| Error::invalid_shape(subject(raw), type_tag, e.to_string()))
}

/// Parse the `sys` object of a payload.
pub(crate) fn system_properties(type_tag: &str, raw: &Value) -> Result<SystemProperties> {
    let sys = raw
        .get("sys")
        .filter(|sys| sys.is_object())
        .ok_or_else(|| Error::invalid_shape(subject(raw), type_tag, "missing sys"))?;
    SystemProperties::deserialize(sys)
        .map_err(|e| Error::invalid_shape(subject(raw), type_tag, format!("sys: {e}")))
}

pub(crate) fn object<'a>(type_tag: &str, raw: &'a Value) -> Result<&'a Map<String, Value>> {
    raw.as_object()
        .ok_or_else(|| Error::invalid_shape("payload", type_tag, "must be a JSON object"))
}

/// The best name for a payload in error messages: its `sys.id` if present.
pub(crate) fn subject(raw: &Value) -> String {
    raw.pointer("/sys/id")
        .and_then(Value::as_str)
        .unwrap_or("payload")
        .to_string()
}

/// Swap `target`'s data for `fresh`.
///
/// `fresh` is usually the same concrete type. When it is another type of the
/// same kind, as when a client routes entries to models, `target` is rebuilt
/// as `T` from the fresh JSON. The target's client is carried over when
/// `fresh` has none.
pub(crate) fn replace<T: Hydrate>(target: &mut T, fresh: Box<dyn Resource>) -> Result<()> {
    let client = fresh.client().or(target.client()).cloned();
    let mut fresh = if fresh.is::<T>() {
        downcast::<T>(fresh)?
    } else if fresh.type_tag() == target.type_tag() {
        let raw = fresh.to_json()?;
        T::hydrate(&raw, &ResourceBuilder::default().context(None))?
    } else {
        return Err(Error::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            found: fresh.type_tag().to_string(),
        });
    };
    if fresh.client().is_none() {
        if let Some(client) = client {
            fresh.attach_client(client);
        }
    }
    *target = fresh;
    Ok(())
}
