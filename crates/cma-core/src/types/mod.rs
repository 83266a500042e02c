//! Core value types shared by every resource.

mod link;
mod system_properties;

pub use link::Link;
pub use system_properties::{ResourceIdentity, SystemProperties};
