//! Content type schema: field definitions and validation rules.

mod field;
mod validation;

pub use field::{
    ArrayItems, FieldDefinition, FieldFactory, FieldKind, FieldParser, ItemType, LinkType,
};
pub use validation::{
    Bounds, StringList, Validation, ValidationFactory, ValidationKind, ValidationParser,
    ValidationRule,
};
