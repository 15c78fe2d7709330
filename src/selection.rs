//! Selections describe which fields of an object, and of its related
//! objects, end up in the output.
//!
//! A [`Selection`] is an ordered list of [`SelectionEntry`]s. [`expand`]
//! turns it into the concrete field names of one [`Definition`] plus the
//! sub-selections to hand to each relation. The [`selection!`] macro is the
//! short way to write one:
//!
//! ```
//! use base_serializer::selection;
//! use base_serializer::selection::{Selection, SelectionEntry};
//!
//! let sel = selection![*, title, _summary, comments => [id, author]];
//! assert_eq!(
//!     sel,
//!     Selection::from(vec![
//!         SelectionEntry::Wildcard,
//!         SelectionEntry::field("title"),
//!         SelectionEntry::field_set("summary"),
//!         SelectionEntry::nested("comments", selection![id, author]),
//!     ])
//! );
//! ```
//!
//! [`Definition`]: crate::definition::Definition
//! [`selection!`]: crate::selection!

use crate::definition::Definition;
use crate::error::{Error, Result};

use indexmap::{IndexMap, IndexSet};
use log::debug;

#[derive(Clone, Debug, PartialEq)]
pub enum SelectionEntry {
    /// Every field declared as included by default.
    Wildcard,
    /// A single field, included regardless of its default flag.
    Field(String),
    /// A named field set registered on the definition.
    FieldSet(String),
    /// A relation together with the selection to use for its objects.
    Nested(String, Selection),
}

impl SelectionEntry {
    pub fn field(name: impl Into<String>) -> Self {
        SelectionEntry::Field(name.into())
    }

    pub fn field_set(name: impl Into<String>) -> Self {
        SelectionEntry::FieldSet(name.into())
    }

    pub fn nested(name: impl Into<String>, selection: impl Into<Selection>) -> Self {
        SelectionEntry::Nested(name.into(), selection.into())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Selection(Vec<SelectionEntry>);

impl Selection {
    pub fn new(entries: Vec<SelectionEntry>) -> Self {
        Self(entries)
    }

    /// `[*]`
    pub fn wildcard() -> Self {
        Self(vec![SelectionEntry::Wildcard])
    }

    /// Selects exactly the given fields.
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(SelectionEntry::field).collect())
    }

    pub fn push(&mut self, entry: SelectionEntry) {
        self.0.push(entry);
    }

    pub fn with(mut self, entry: SelectionEntry) -> Self {
        self.push(entry);
        self
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::wildcard()
    }
}

impl From<Vec<SelectionEntry>> for Selection {
    fn from(entries: Vec<SelectionEntry>) -> Self {
        Self(entries)
    }
}

impl From<SelectionEntry> for Selection {
    fn from(entry: SelectionEntry) -> Self {
        Self(vec![entry])
    }
}

impl FromIterator<SelectionEntry> for Selection {
    fn from_iter<I: IntoIterator<Item = SelectionEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Builds a [`Selection`].
///
/// `*` is the wildcard, a bare identifier is a field, `_name` refers to a
/// field set and `relation => [...]` nests a selection for a relation.
#[macro_export]
macro_rules! selection {
    (@entries [$($out:expr),*]) => {
        $crate::selection::Selection::new(vec![$($out),*])
    };
    (@entries [$($out:expr),*] *) => {
        $crate::selection!(@entries [$($out,)* $crate::selection::SelectionEntry::Wildcard])
    };
    (@entries [$($out:expr),*] *, $($rest:tt)*) => {
        $crate::selection!(@entries [$($out,)* $crate::selection::SelectionEntry::Wildcard] $($rest)*)
    };
    (@entries [$($out:expr),*] $name:ident => [$($inner:tt)*]) => {
        $crate::selection!(@entries [$($out,)* $crate::selection::SelectionEntry::nested(
            stringify!($name),
            $crate::selection!($($inner)*),
        )])
    };
    (@entries [$($out:expr),*] $name:ident => [$($inner:tt)*], $($rest:tt)*) => {
        $crate::selection!(@entries [$($out,)* $crate::selection::SelectionEntry::nested(
            stringify!($name),
            $crate::selection!($($inner)*),
        )] $($rest)*)
    };
    (@entries [$($out:expr),*] $name:ident) => {
        $crate::selection!(@entries [$($out,)* $crate::selection::SelectionEntry::named(stringify!($name))])
    };
    (@entries [$($out:expr),*] $name:ident, $($rest:tt)*) => {
        $crate::selection!(@entries [$($out,)* $crate::selection::SelectionEntry::named(stringify!($name))] $($rest)*)
    };
    ($($tokens:tt)*) => {
        $crate::selection!(@entries [] $($tokens)*)
    };
}

impl SelectionEntry {
    /// Field or, for names starting with `_`, field set.
    #[doc(hidden)]
    pub fn named(name: &str) -> Self {
        match name.strip_prefix('_') {
            Some(set) => SelectionEntry::field_set(set),
            None => SelectionEntry::field(name),
        }
    }
}

/// A selection resolved against one definition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expansion {
    /// Declared field names in output order.
    pub fields: Vec<String>,
    /// Sub-selections for relations, by relation name.
    pub nested: IndexMap<String, Selection>,
}

impl Expansion {
    pub fn nested_for(&self, relation: &str) -> Option<&Selection> {
        self.nested.get(relation)
    }
}

/// Expands `selection` against `definition`.
///
/// Field names keep the order they are first selected in. Names the
/// definition does not declare are dropped. The only failure is a
/// reference to a field set the definition does not have.
pub fn expand(selection: &Selection, definition: &Definition) -> Result<Expansion> {
    let mut names: IndexSet<&str> = IndexSet::new();
    let mut nested = IndexMap::new();

    for entry in selection.entries() {
        match entry {
            SelectionEntry::Wildcard => {
                names.extend(definition.default_field_names());
            }
            SelectionEntry::Field(name) => {
                names.insert(name.as_str());
            }
            SelectionEntry::FieldSet(set) => {
                let fields =
                    definition
                        .field_set(set)
                        .ok_or_else(|| Error::UnknownFieldSet {
                            definition: definition.name().to_owned(),
                            name: set.clone(),
                        })?;
                names.extend(fields.iter().map(String::as_str));
            }
            SelectionEntry::Nested(name, sub_selection) => {
                names.insert(name.as_str());
                nested.insert(name.clone(), sub_selection.clone());
            }
        }
    }

    let fields = names
        .into_iter()
        .filter(|name| {
            let declared = definition.declaration(name).is_some();
            if !declared {
                debug!(
                    "dropping `{}`: not declared on `{}`",
                    name,
                    definition.name()
                );
            }
            declared
        })
        .map(str::to_owned)
        .collect();

    Ok(Expansion { fields, nested })
}
