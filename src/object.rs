//! The accessor protocol every serializable object implements.

use crate::value::Attribute;

use std::any::Any;
use std::fmt::Debug;

/// Upcast to [`Any`], used to hand typed objects to definition methods.
///
/// Implemented for every `'static` type; there is no need to implement it
/// by hand.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Named attribute access for a domain object.
///
/// `attribute` returns `None` when the object has no attribute of that
/// name, which is different from returning a null attribute. `predicate`
/// covers boolean-style accessors (`published?`) and is consulted only
/// when `attribute` returns `None`.
///
/// The `Debug` representation shows up in [`Error::UnresolvedField`].
///
/// ```
/// use base_serializer::object::Serializable;
/// use base_serializer::value::Attribute;
///
/// #[derive(Debug)]
/// struct Comment {
///     id: u64,
///     author: String,
///     hidden: bool,
/// }
///
/// impl Serializable for Comment {
///     fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
///         match name {
///             "id" => Some(self.id.into()),
///             "author" => Some(self.author.as_str().into()),
///             _ => None,
///         }
///     }
///
///     fn predicate(&self, name: &str) -> Option<bool> {
///         match name {
///             "hidden" => Some(self.hidden),
///             _ => None,
///         }
///     }
/// }
/// ```
///
/// [`Error::UnresolvedField`]: crate::error::Error::UnresolvedField
pub trait Serializable: AsAny + Debug + Sync {
    fn attribute(&self, name: &str) -> Option<Attribute<'_>>;

    fn predicate(&self, _name: &str) -> Option<bool> {
        None
    }
}

impl<'a> dyn Serializable + 'a {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// What a serialization call works on: one object or a sequence of them.
///
/// Built with `From`, so `&post` and `posts.as_slice()` can be passed directly.
#[derive(Debug)]
pub enum Target<'a> {
    One(&'a dyn Serializable),
    Many(Vec<&'a dyn Serializable>),
}

impl<'a> Target<'a> {
    pub fn len(&self) -> usize {
        match self {
            Target::One(_) => 1,
            Target::Many(objects) => objects.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a, T: Serializable> From<&'a T> for Target<'a> {
    fn from(object: &'a T) -> Self {
        Target::One(object)
    }
}

impl<'a, T: Serializable> From<&'a [T]> for Target<'a> {
    fn from(objects: &'a [T]) -> Self {
        Target::Many(
            objects
                .iter()
                .map(|object| object as &dyn Serializable)
                .collect(),
        )
    }
}

impl<'a> From<&'a dyn Serializable> for Target<'a> {
    fn from(object: &'a dyn Serializable) -> Self {
        Target::One(object)
    }
}
