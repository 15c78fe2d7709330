//! A small, explicit serializer that turns domain objects into ordered
//! key/value structures, with per-call control over which fields end up
//! in the output.
//!
//! The goal of this crate is to replace heavier convention-based
//! serialization layers with a minimal declaration model. Actually encoding
//! the output (to JSON text, to a socket, to a file) is outside the scope
//! of this crate: the output is a [`Serialized`] value made of ordered
//! `serde_json` maps, so any `serde` encoder can take it from there.
//!
//! Objects expose their attributes through the [`Serializable`] trait.
//! Each object shape gets a [`Definition`], built once with
//! [`Definition::builder`], listing its fields, its relations to other
//! shapes, named field sets and computed fields. Definitions are immutable
//! and can be shared freely between threads.
//!
//! Which fields are serialized is decided per call by a [`Selection`],
//! usually written with the [`selection!`] macro: `*` for every field
//! included by default, plain names for specific fields, `_name` for a
//! field set, and `relation => [...]` to choose the fields of related
//! objects.
//!
//! Serialization itself lives in the [`ser`] module and
//! really boils down to the [`serialize`] function. How times and decimals
//! are rendered can be configured via the [`cast_policy`] module and by
//! instead calling [`serialize_with_policy`]. Shapes that refer to
//! themselves (trees, threads) reference their definition by name through
//! a [`Registry`].
//!
//! ```
//! use base_serializer::context::Context;
//! use base_serializer::definition::Definition;
//! use base_serializer::object::Serializable;
//! use base_serializer::selection;
//! use base_serializer::ser::serialize;
//! use base_serializer::value::Attribute;
//! use serde_json::json;
//!
//! #[derive(Debug)]
//! struct Product {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl Serializable for Product {
//!     fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
//!         match name {
//!             "id" => Some(self.id.into()),
//!             "name" => Some(self.name.as_str().into()),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let definition = Definition::builder("Product").fields(["id", "name"]).build();
//! let product = Product { id: 1, name: "foo".to_owned() };
//!
//! let all = definition.serialize(&product)?;
//! assert_eq!(all.into_value(), json!({"id": 1, "name": "foo"}));
//!
//! let some = serialize(&definition, &product, &Context::new(), &selection![name])?;
//! assert_eq!(some.into_value(), json!({"name": "foo"}));
//! # Ok::<(), base_serializer::error::Error>(())
//! ```
//!
//! [`Serialized`]: crate::value::Serialized
//! [`Serializable`]: crate::object::Serializable
//! [`Definition`]: crate::definition::Definition
//! [`Definition::builder`]: crate::definition::Definition::builder
//! [`Selection`]: crate::selection::Selection
//! [`selection!`]: crate::selection!
//! [`ser`]: crate::ser
//! [`serialize`]: crate::ser::serialize()
//! [`cast_policy`]: crate::ser::cast_policy
//! [`serialize_with_policy`]: crate::ser::serialize_with_policy()
//! [`Registry`]: crate::registry::Registry

pub mod context;
pub mod definition;
pub mod error;
pub mod object;
pub mod registry;
pub mod selection;
pub mod ser;
pub mod value;
