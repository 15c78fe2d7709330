//! Serializer definitions: which fields a shape exposes and how its
//! relations recurse.
//!
//! A [`Definition`] is assembled once through a [`Builder`] and never
//! changes afterwards, so one definition can serve any number of
//! concurrent serialization calls.
//!
//! ```
//! use std::sync::Arc;
//! use base_serializer::definition::{Definition, Relation};
//! use base_serializer::selection;
//!
//! let comment = Arc::new(
//!     Definition::builder("Comment")
//!         .fields(["id", "author", "content"])
//!         .build(),
//! );
//!
//! let post = Definition::builder("Post")
//!     .fields(["id", "title", "body", "created_at", "updated_at"])
//!     .relation(
//!         Relation::new("comments", comment)
//!             .selection(selection![id, author])
//!             .include_by_default(true),
//!     )
//!     .field_set("summary", ["id", "title"])
//!     .build();
//!
//! assert!(post.declaration("comments").unwrap().is_relation());
//! assert!(!post.declaration("title").unwrap().is_relation());
//! ```

use crate::context::Context;
use crate::error::Result;
use crate::object::{Serializable, Target};
use crate::selection::Selection;
use crate::ser;
use crate::value::{Attribute, Serialized};

use indexmap::IndexMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Where a relation's objects get their definition from.
#[derive(Clone, Debug)]
pub enum Nested {
    Definition(Arc<Definition>),
    /// Looked up by name in a [`Registry`] at serialization time. This is
    /// how a shape refers to itself.
    ///
    /// [`Registry`]: crate::registry::Registry
    Shape(String),
}

impl From<Arc<Definition>> for Nested {
    fn from(definition: Arc<Definition>) -> Self {
        Nested::Definition(definition)
    }
}

impl From<Definition> for Nested {
    fn from(definition: Definition) -> Self {
        Nested::Definition(Arc::new(definition))
    }
}

#[derive(Clone, Debug)]
pub struct Declaration {
    name: String,
    nested: Option<Nested>,
    default_selection: Option<Selection>,
    include_by_default: bool,
}

impl Declaration {
    fn scalar(name: String, include_by_default: bool) -> Self {
        Self {
            name,
            nested: None,
            default_selection: None,
            include_by_default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nested(&self) -> Option<&Nested> {
        self.nested.as_ref()
    }

    pub fn default_selection(&self) -> Option<&Selection> {
        self.default_selection.as_ref()
    }

    pub fn include_by_default(&self) -> bool {
        self.include_by_default
    }

    pub fn is_relation(&self) -> bool {
        self.nested.is_some()
    }
}

/// A relation field, handed to [`Builder::relation`].
///
/// Relations are left out of the wildcard unless
/// [`include_by_default`](Relation::include_by_default) is set.
#[derive(Clone, Debug)]
pub struct Relation {
    name: String,
    nested: Nested,
    default_selection: Option<Selection>,
    include_by_default: bool,
}

impl Relation {
    pub fn new(name: impl Into<String>, nested: impl Into<Nested>) -> Self {
        Self {
            name: name.into(),
            nested: nested.into(),
            default_selection: None,
            include_by_default: false,
        }
    }

    /// A relation whose definition is looked up by shape name.
    pub fn to_shape(name: impl Into<String>, shape: impl Into<String>) -> Self {
        Self::new(name, Nested::Shape(shape.into()))
    }

    /// Selection used for related objects when the caller gives none.
    pub fn selection(mut self, selection: impl Into<Selection>) -> Self {
        self.default_selection = Some(selection.into());
        self
    }

    pub fn include_by_default(mut self, include: bool) -> Self {
        self.include_by_default = include;
        self
    }
}

impl From<Relation> for Declaration {
    fn from(relation: Relation) -> Self {
        Declaration {
            name: relation.name,
            nested: Some(relation.nested),
            default_selection: relation.default_selection,
            include_by_default: relation.include_by_default,
        }
    }
}

/// A computed field registered on a definition.
pub trait Method: Send + Sync {
    /// Returns `None` when the method does not apply to `object`.
    fn call<'a>(&self, object: &'a dyn Serializable, context: &Context) -> Option<Attribute<'a>>;
}

/// Method bound to a concrete object type; downcasts before calling.
struct TypedMethod<T, F> {
    method: F,
    _marker: PhantomData<fn(&T)>,
}

impl<T, F> Method for TypedMethod<T, F>
where
    T: Serializable + 'static,
    F: for<'a> Fn(&'a T, &Context) -> Attribute<'a> + Send + Sync,
{
    fn call<'a>(&self, object: &'a dyn Serializable, context: &Context) -> Option<Attribute<'a>> {
        object
            .downcast_ref::<T>()
            .map(|typed| (self.method)(typed, context))
    }
}

/// The immutable field declarations of one shape.
#[derive(Clone)]
pub struct Definition {
    name: String,
    declarations: IndexMap<String, Declaration>,
    field_sets: IndexMap<String, Vec<String>>,
    methods: IndexMap<String, Arc<dyn Method>>,
}

impl Definition {
    pub fn builder(name: impl Into<String>) -> Builder {
        Builder {
            name: name.into(),
            declarations: IndexMap::new(),
            field_sets: IndexMap::new(),
            methods: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.values()
    }

    /// Names matched by the wildcard, in declaration order.
    pub fn default_field_names(&self) -> impl Iterator<Item = &str> {
        self.declarations
            .values()
            .filter(|declaration| declaration.include_by_default)
            .map(Declaration::name)
    }

    pub fn field_set(&self, name: &str) -> Option<&[String]> {
        self.field_sets.get(name).map(Vec::as_slice)
    }

    pub fn method(&self, name: &str) -> Option<&dyn Method> {
        self.methods.get(name).map(|method| method.as_ref())
    }

    /// Serializes with an empty context and the wildcard selection.
    pub fn serialize<'a>(&self, target: impl Into<Target<'a>>) -> Result<Serialized> {
        ser::serialize(self, target, &Context::default(), &Selection::default())
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("declarations", &self.declarations)
            .field("field_sets", &self.field_sets)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builds a [`Definition`].
///
/// Declaring a name twice replaces the earlier declaration but keeps its
/// position.
pub struct Builder {
    name: String,
    declarations: IndexMap<String, Declaration>,
    field_sets: IndexMap<String, Vec<String>>,
    methods: IndexMap<String, Arc<dyn Method>>,
}

impl Builder {
    fn declare(mut self, declaration: Declaration) -> Self {
        self.declarations.insert(declaration.name.clone(), declaration);
        self
    }

    pub fn field(self, name: impl Into<String>) -> Self {
        self.declare(Declaration::scalar(name.into(), true))
    }

    pub fn fields<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .fold(self, |builder, name| builder.field(name))
    }

    /// A field that is only serialized when selected by name.
    pub fn hidden_field(self, name: impl Into<String>) -> Self {
        self.declare(Declaration::scalar(name.into(), false))
    }

    pub fn relation(self, relation: Relation) -> Self {
        self.declare(relation.into())
    }

    /// Registers a field set, selected with `_name` in [`selection!`].
    ///
    /// [`selection!`]: crate::selection!
    pub fn field_set<I, S>(mut self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_sets
            .insert(name.into(), fields.into_iter().map(Into::into).collect());
        self
    }

    /// Computes the field `name` for objects of type `T`, taking
    /// precedence over the object's own attribute of that name.
    ///
    /// The field itself still has to be declared.
    pub fn method<T, F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        T: Serializable + 'static,
        F: for<'a> Fn(&'a T, &Context) -> Attribute<'a> + Send + Sync + 'static,
    {
        self.methods.insert(
            name.into(),
            Arc::new(TypedMethod {
                method,
                _marker: PhantomData,
            }),
        );
        self
    }

    pub fn build(self) -> Definition {
        Definition {
            name: self.name,
            declarations: self.declarations,
            field_sets: self.field_sets,
            methods: self.methods,
        }
    }
}
