use crate::context::Context;
use crate::definition::{Declaration, Definition, Nested};
use crate::error::{Error, Result};
use crate::object::{Serializable, Target};
use crate::registry::Registry;
use crate::selection::{expand, Expansion, Selection};
use crate::value::{Attribute, Record, Serialized};

use super::cast_policy::CastPolicy;

use log::trace;
use serde_json::Value;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// Everything one serialization call needs. A fresh pass is made for every
// call and for every descent into a relation; nothing here is shared
// mutably between objects or threads.
pub(super) struct Pass<'p, P: CastPolicy> {
    definition: &'p Definition,
    context: &'p Context,
    expansion: Expansion,
    policy: &'p P,
    registry: Option<&'p Registry>,
}

impl<'p, P: CastPolicy> Pass<'p, P> {
    pub(super) fn new(
        definition: &'p Definition,
        context: &'p Context,
        selection: &Selection,
        policy: &'p P,
        registry: Option<&'p Registry>,
    ) -> Result<Self> {
        let expansion = expand(selection, definition)?;
        trace!(
            "serializing `{}` with fields {:?}",
            definition.name(),
            expansion.fields
        );
        Ok(Self {
            definition,
            context,
            expansion,
            policy,
            registry,
        })
    }

    pub(super) fn run(&self, target: Target<'_>) -> Result<Serialized> {
        match target {
            Target::One(object) => Ok(Serialized::One(self.serialize_one(object)?)),
            Target::Many(objects) => Ok(Serialized::Many(self.serialize_many(&objects)?)),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn serialize_many(&self, objects: &[&dyn Serializable]) -> Result<Vec<Record>> {
        objects
            .iter()
            .map(|object| self.serialize_one(*object))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn serialize_many(&self, objects: &[&dyn Serializable]) -> Result<Vec<Record>> {
        objects
            .par_iter()
            .map(|object| self.serialize_one(*object))
            .collect()
    }

    fn serialize_one(&self, object: &dyn Serializable) -> Result<Record> {
        let mut record = Record::new();
        for name in &self.expansion.fields {
            let declaration = match self.definition.declaration(name) {
                Some(declaration) => declaration,
                None => continue, // expansion only keeps declared names
            };
            let attribute = self.resolve(object, name)?;
            let value = match declaration.nested() {
                Some(nested) => self.serialize_relation(declaration, nested, attribute)?,
                None => self.cast(name, attribute)?,
            };
            record.insert(name.clone(), value);
        }
        Ok(record)
    }

    fn resolve<'o>(&self, object: &'o dyn Serializable, name: &str) -> Result<Attribute<'o>> {
        if let Some(attribute) = self
            .definition
            .method(name)
            .and_then(|method| method.call(object, self.context))
        {
            trace!("`{}.{}` resolved by method", self.definition.name(), name);
            return Ok(attribute);
        }
        if let Some(attribute) = object.attribute(name) {
            return Ok(attribute);
        }
        if let Some(predicate) = object.predicate(name) {
            trace!("`{}.{}` resolved by predicate", self.definition.name(), name);
            return Ok(predicate.into());
        }
        Err(Error::UnresolvedField {
            field: name.to_owned(),
            object: format!("{:?}", object),
        })
    }

    fn cast(&self, name: &str, attribute: Attribute<'_>) -> Result<Value> {
        match attribute {
            Attribute::Scalar(scalar) => Ok(self.policy.cast(scalar)),
            Attribute::One(_) | Attribute::Many(_) => Err(Error::KindMismatch {
                field: name.to_owned(),
                expected: "a scalar",
            }),
        }
    }

    fn serialize_relation(
        &self,
        declaration: &Declaration,
        nested: &'p Nested,
        attribute: Attribute<'_>,
    ) -> Result<Value> {
        let target = match attribute {
            Attribute::Scalar(scalar) if scalar.is_null() => return Ok(Value::Null),
            Attribute::Scalar(_) => {
                return Err(Error::KindMismatch {
                    field: declaration.name().to_owned(),
                    expected: "related objects",
                })
            }
            Attribute::One(object) => Target::One(object),
            Attribute::Many(objects) => Target::Many(objects),
        };

        let definition = self.nested_definition(nested)?;
        let wildcard = Selection::wildcard();
        let selection = self
            .expansion
            .nested_for(declaration.name())
            .or_else(|| declaration.default_selection())
            .unwrap_or(&wildcard);
        trace!(
            "descending from `{}.{}` into `{}`",
            self.definition.name(),
            declaration.name(),
            definition.name()
        );

        let pass = Pass::new(
            definition,
            self.context,
            selection,
            self.policy,
            self.registry,
        )?;
        Ok(pass.run(target)?.into_value())
    }

    fn nested_definition(&self, nested: &'p Nested) -> Result<&'p Definition> {
        match nested {
            Nested::Definition(definition) => Ok(definition.as_ref()),
            Nested::Shape(shape) => self
                .registry
                .ok_or_else(|| Error::UnknownShape(shape.clone()))?
                .definition(shape),
        }
    }
}
