use crate::context::Context;
use crate::definition::Definition;
use crate::error::Result;
use crate::object::Target;
use crate::registry::Registry;
use crate::selection::Selection;
use crate::value::Serialized;

mod internal;
pub mod cast_policy;

use cast_policy::{CastPolicy, DefaultCastPolicy};
use internal::Pass;

/// This is the entry point to the serializer. `target` is either one
/// object (`&post`) or a sequence (`posts.as_slice()`); the output has the
/// same shape, one [`Record`] per object in input order.
///
/// `selection` picks the fields, see [`selection!`]. Scalars are cast with
/// the given policy: [`DefaultCastPolicy`] renders times as ISO-8601 with
/// milliseconds and decimals as floats, [`PreciseCastPolicy`] keeps
/// decimals as strings. A custom [`CastPolicy`] can make other choices.
///
/// Relations declared by shape name are looked up in the process-wide
/// registry; use [`Serializer::with_registry`] to supply one explicitly.
///
/// [`Record`]: crate::value::Record
/// [`selection!`]: crate::selection!
/// [`PreciseCastPolicy`]: cast_policy::PreciseCastPolicy
pub fn serialize_with_policy<'a>(
    definition: &Definition,
    target: impl Into<Target<'a>>,
    context: &Context,
    selection: &Selection,
    policy: impl CastPolicy,
) -> Result<Serialized> {
    Serializer::new()
        .with_policy(policy)
        .serialize(definition, target, context, selection)
}

/// This is a convenience function that simply calls [`serialize_with_policy`]
/// with the default policy.
///
/// [`serialize_with_policy`]: serialize_with_policy
pub fn serialize<'a>(
    definition: &Definition,
    target: impl Into<Target<'a>>,
    context: &Context,
    selection: &Selection,
) -> Result<Serialized> {
    serialize_with_policy(definition, target, context, selection, DefaultCastPolicy)
}

/// Reusable serializer configuration: a cast policy and, optionally, the
/// registry used to resolve relations declared by shape name.
#[derive(Clone, Debug, Default)]
pub struct Serializer<'r, P: CastPolicy = DefaultCastPolicy> {
    registry: Option<&'r Registry>,
    policy: P,
}

impl<'r> Serializer<'r, DefaultCastPolicy> {
    pub fn new() -> Self {
        Self {
            registry: None,
            policy: DefaultCastPolicy,
        }
    }
}

impl<'r, P: CastPolicy> Serializer<'r, P> {
    pub fn with_registry(self, registry: &'r Registry) -> Self {
        Self {
            registry: Some(registry),
            policy: self.policy,
        }
    }

    pub fn with_policy<Q: CastPolicy>(self, policy: Q) -> Serializer<'r, Q> {
        Serializer {
            registry: self.registry,
            policy,
        }
    }

    pub fn serialize<'a>(
        &self,
        definition: &Definition,
        target: impl Into<Target<'a>>,
        context: &Context,
        selection: &Selection,
    ) -> Result<Serialized> {
        let registry = self.registry.or_else(|| crate::registry::global());
        Pass::new(definition, context, selection, &self.policy, registry)?.run(target.into())
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::definition::{Definition, Relation};
    use crate::error::{Error, Result};
    use crate::object::Serializable;
    use crate::registry::Registry;
    use crate::selection;
    use crate::selection::Selection;
    use crate::ser::cast_policy::PreciseCastPolicy;
    use crate::ser::{serialize, serialize_with_policy, Serializer};
    use crate::value::{Attribute, Record, Serialized};
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use test_log::test;

    #[derive(Debug)]
    struct Product {
        id: u64,
        name: String,
        price: Decimal,
        created_at: DateTime<Utc>,
        discontinued: bool,
    }

    impl Serializable for Product {
        fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
            match name {
                "id" => Some(self.id.into()),
                "name" => Some(self.name.as_str().into()),
                "price" => Some(self.price.into()),
                "created_at" => Some(self.created_at.into()),
                _ => None,
            }
        }

        fn predicate(&self, name: &str) -> Option<bool> {
            match name {
                "discontinued" => Some(self.discontinued),
                _ => None,
            }
        }
    }

    #[derive(Debug)]
    struct Comment {
        id: u64,
        author: String,
        content: String,
    }

    impl Comment {
        fn new(id: u64, author: &str) -> Self {
            Self {
                id,
                author: author.to_owned(),
                content: format!("comment {}", id),
            }
        }
    }

    impl Serializable for Comment {
        fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
            match name {
                "id" => Some(self.id.into()),
                "author" => Some(self.author.as_str().into()),
                "content" => Some(self.content.as_str().into()),
                _ => None,
            }
        }
    }

    #[derive(Debug)]
    struct Post {
        id: u64,
        title: String,
        comments: Vec<Comment>,
        pinned: Option<Comment>,
    }

    impl Serializable for Post {
        fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
            match name {
                "id" => Some(self.id.into()),
                "title" => Some(self.title.as_str().into()),
                "comments" => Some(Attribute::many(&self.comments)),
                "pinned" => Some(Attribute::optional(self.pinned.as_ref())),
                _ => None,
            }
        }
    }

    #[derive(Debug)]
    struct Category {
        name: String,
        parent: Option<Box<Category>>,
    }

    impl Serializable for Category {
        fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
            match name {
                "name" => Some(self.name.as_str().into()),
                "parent" => Some(Attribute::optional(self.parent.as_deref())),
                _ => None,
            }
        }
    }

    fn created_at() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_600_000_000_123).unwrap()
    }

    fn product() -> Product {
        Product {
            id: 1,
            name: "foo".to_owned(),
            price: Decimal::new(1230, 2),
            created_at: created_at(),
            discontinued: false,
        }
    }

    fn product_definition() -> Definition {
        Definition::builder("Product")
            .fields(["id", "name", "price", "created_at"])
            .hidden_field("discontinued")
            .build()
    }

    fn post(id: u64, comment_count: u64) -> Post {
        Post {
            id,
            title: format!("post {}", id),
            comments: (0..comment_count)
                .map(|i| Comment::new(id * 100 + i, "ann"))
                .collect(),
            pinned: None,
        }
    }

    fn post_definition() -> Definition {
        let comment = Arc::new(
            Definition::builder("Comment")
                .fields(["id", "author", "content"])
                .build(),
        );
        Definition::builder("Post")
            .fields(["id", "title"])
            .relation(
                Relation::new("comments", comment.clone())
                    .selection(selection![id])
                    .include_by_default(true),
            )
            .relation(Relation::new("pinned", comment))
            .build()
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(record) => record,
            _ => panic!("not an object: {}", value),
        }
    }

    #[test]
    fn product_wildcard() -> Result<()> {
        let out = product_definition().serialize(&product())?;
        assert_eq!(
            out,
            Serialized::One(record(json!({
                "id": 1,
                "name": "foo",
                "price": 12.3,
                "created_at": "2020-09-13T12:26:40.123Z",
            })))
        );
        Ok(())
    }

    #[test]
    fn product_explicit_fields() -> Result<()> {
        let out = serialize(
            &product_definition(),
            &product(),
            &Context::new(),
            &selection![id, name],
        )?;
        assert_eq!(out.into_value(), json!({"id": 1, "name": "foo"}));
        Ok(())
    }

    #[test]
    fn keys_follow_selection_order() -> Result<()> {
        let out = serialize(
            &product_definition(),
            &product(),
            &Context::new(),
            &selection![name, created_at, id],
        )?;
        let keys: Vec<_> = out.as_one().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["name", "created_at", "id"]);
        assert_eq!(
            serde_json::to_string(&out)?,
            r#"{"name":"foo","created_at":"2020-09-13T12:26:40.123Z","id":1}"#
        );
        Ok(())
    }

    #[test]
    fn predicates_resolve_after_attributes() -> Result<()> {
        let out = serialize(
            &product_definition(),
            &product(),
            &Context::new(),
            &selection![*, discontinued],
        )?;
        let record = out.as_one().unwrap();
        assert_eq!(record.get("discontinued"), Some(&json!(false)));
        assert_eq!(record.len(), 5);
        Ok(())
    }

    #[test]
    fn methods_take_precedence() -> Result<()> {
        let definition = Definition::builder("Product")
            .fields(["id", "name", "label"])
            .method("name", |product: &Product, _: &Context| {
                product.name.to_uppercase().into()
            })
            .method("label", |product: &Product, context: &Context| {
                let currency = context
                    .get("currency")
                    .and_then(Value::as_str)
                    .unwrap_or("USD");
                format!("{} {} {}", product.name, product.price, currency).into()
            })
            .build();
        let out = serialize(
            &definition,
            &product(),
            &Context::new().with("currency", "EUR"),
            &Selection::default(),
        )?;
        assert_eq!(
            out.into_value(),
            json!({"id": 1, "name": "FOO", "label": "foo 12.30 EUR"})
        );
        Ok(())
    }

    #[test]
    fn unresolved_field_fails() {
        let definition = Definition::builder("Product")
            .fields(["id", "sku"])
            .build();
        let err = definition.serialize(&product()).unwrap_err();
        match err {
            Error::UnresolvedField { field, object } => {
                assert_eq!(field, "sku");
                assert!(object.starts_with("Product {"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn unresolved_field_in_sequence_fails_whole_call() {
        let definition = Definition::builder("Comment")
            .fields(["id", "score"])
            .build();
        let comments = vec![Comment::new(1, "a"), Comment::new(2, "b")];
        let err = definition.serialize(comments.as_slice()).unwrap_err();
        assert!(matches!(err, Error::UnresolvedField { ref field, .. } if field == "score"));
    }

    #[test]
    fn unknown_field_set_fails() {
        let err = serialize(
            &product_definition(),
            &product(),
            &Context::new(),
            &selection![id, _summary],
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownFieldSet { .. }));
    }

    #[test]
    fn relations_use_default_selection() -> Result<()> {
        let out = post_definition().serialize(&post(1, 2))?;
        assert_eq!(
            out.into_value(),
            json!({
                "id": 1,
                "title": "post 1",
                "comments": [{"id": 100}, {"id": 101}],
            })
        );
        Ok(())
    }

    #[test]
    fn nested_selection_overrides_default() -> Result<()> {
        let out = serialize(
            &post_definition(),
            &post(1, 1),
            &Context::new(),
            &selection![*, comments => [id, author]],
        )?;
        assert_eq!(
            out.into_value(),
            json!({
                "id": 1,
                "title": "post 1",
                "comments": [{"id": 100, "author": "ann"}],
            })
        );
        Ok(())
    }

    #[test]
    fn nested_selection_alone_includes_relation() -> Result<()> {
        let mut p = post(3, 0);
        p.pinned = Some(Comment::new(7, "bob"));
        let out = serialize(
            &post_definition(),
            &p,
            &Context::new(),
            &selection![id, pinned => [author]],
        )?;
        assert_eq!(
            out.into_value(),
            json!({"id": 3, "pinned": {"author": "bob"}})
        );
        Ok(())
    }

    #[test]
    fn relation_without_default_selection_uses_wildcard() -> Result<()> {
        let mut p = post(3, 0);
        p.pinned = Some(Comment::new(7, "bob"));
        let out = serialize(
            &post_definition(),
            &p,
            &Context::new(),
            &selection![pinned],
        )?;
        assert_eq!(
            out.into_value(),
            json!({"pinned": {"id": 7, "author": "bob", "content": "comment 7"}})
        );
        Ok(())
    }

    #[test]
    fn null_relation_short_circuits() -> Result<()> {
        let resolved = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&resolved);
        let comment = Definition::builder("Comment")
            .field("id")
            .method("id", move |comment: &Comment, _: &Context| {
                probe.fetch_add(1, Ordering::SeqCst);
                comment.id.into()
            })
            .build();
        let definition = Definition::builder("Post")
            .field("id")
            .relation(Relation::new("pinned", comment).include_by_default(true))
            .build();

        let mut p = post(4, 0);
        let out = definition.serialize(&p)?;
        assert_eq!(out.into_value(), json!({"id": 4, "pinned": null}));
        assert_eq!(resolved.load(Ordering::SeqCst), 0);

        p.pinned = Some(Comment::new(9, "cy"));
        let out = definition.serialize(&p)?;
        assert_eq!(out.into_value(), json!({"id": 4, "pinned": {"id": 9}}));
        assert_eq!(resolved.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn empty_relation_is_empty_list() -> Result<()> {
        let out = post_definition().serialize(&post(5, 0))?;
        assert_eq!(
            out.into_value(),
            json!({"id": 5, "title": "post 5", "comments": []})
        );
        Ok(())
    }

    #[test]
    fn sequences_map_elementwise() -> Result<()> {
        let definition = post_definition();
        let posts = vec![post(1, 1), post(2, 0), post(3, 2)];
        let context = Context::new();
        let selection = selection![*, comments => [id, content]];

        let many = serialize(&definition, posts.as_slice(), &context, &selection)?;
        let records = many.as_many().unwrap();
        assert_eq!(records.len(), 3);
        for (post, record) in posts.iter().zip(records) {
            let one = serialize(&definition, post, &context, &selection)?;
            assert_eq!(one.as_one(), Some(record));
        }
        Ok(())
    }

    #[test]
    fn empty_sequence() -> Result<()> {
        let posts: Vec<Post> = Vec::new();
        let out = post_definition().serialize(posts.as_slice())?;
        assert_eq!(out, Serialized::Many(Vec::new()));
        Ok(())
    }

    #[test]
    fn deterministic() -> Result<()> {
        let definition = post_definition();
        let posts = vec![post(1, 3), post(2, 3)];
        let first = serde_json::to_string(&definition.serialize(posts.as_slice())?)?;
        let second = serde_json::to_string(&definition.serialize(posts.as_slice())?)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn precise_policy_keeps_decimal_digits() -> Result<()> {
        let out = serialize_with_policy(
            &product_definition(),
            &product(),
            &Context::new(),
            &selection![price],
            PreciseCastPolicy,
        )?;
        assert_eq!(out.into_value(), json!({"price": "12.30"}));
        Ok(())
    }

    #[test]
    fn scalar_field_holding_objects_is_a_mismatch() {
        let definition = Definition::builder("Post")
            .fields(["id", "comments"])
            .build();
        let err = definition.serialize(&post(1, 1)).unwrap_err();
        assert!(matches!(err, Error::KindMismatch { ref field, .. } if field == "comments"));
    }

    #[test]
    fn relation_holding_scalar_is_a_mismatch() {
        let comment = Definition::builder("Comment").field("id").build();
        let definition = Definition::builder("Post")
            .relation(Relation::new("title", comment).include_by_default(true))
            .build();
        let err = definition.serialize(&post(1, 0)).unwrap_err();
        assert!(matches!(err, Error::KindMismatch { ref field, .. } if field == "title"));
    }

    fn category_registry() -> Result<Registry> {
        let category = Definition::builder("Category")
            .field("name")
            .relation(Relation::to_shape("parent", "Category").include_by_default(true))
            .build();
        Ok(Registry::builder().register(category)?.build())
    }

    #[test]
    fn self_referencing_shape_through_registry() -> Result<()> {
        let registry = category_registry()?;
        let leaf = Category {
            name: "rust".to_owned(),
            parent: Some(Box::new(Category {
                name: "languages".to_owned(),
                parent: Some(Box::new(Category {
                    name: "root".to_owned(),
                    parent: None,
                })),
            })),
        };
        let out = registry.serialize("Category", &leaf, &Context::new(), &Selection::default())?;
        assert_eq!(
            out.into_value(),
            json!({
                "name": "rust",
                "parent": {
                    "name": "languages",
                    "parent": {"name": "root", "parent": null},
                },
            })
        );

        let out = Serializer::new().with_registry(&registry).serialize(
            registry.definition("Category")?,
            &leaf,
            &Context::new(),
            &selection![name, parent => [name]],
        )?;
        assert_eq!(
            out.into_value(),
            json!({"name": "rust", "parent": {"name": "languages"}})
        );
        Ok(())
    }

    #[test]
    fn unknown_shape_fails() {
        let definition = Definition::builder("Category")
            .field("name")
            .relation(Relation::to_shape("parent", "Nowhere").include_by_default(true))
            .build();
        let leaf = Category {
            name: "rust".to_owned(),
            parent: Some(Box::new(Category {
                name: "root".to_owned(),
                parent: None,
            })),
        };
        let err = definition.serialize(&leaf).unwrap_err();
        assert_eq!(err, Error::UnknownShape("Nowhere".to_owned()));
    }

    #[test]
    fn serializer_is_shareable_across_threads() -> Result<()> {
        let definition = Arc::new(post_definition());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let definition = Arc::clone(&definition);
                std::thread::spawn(move || {
                    let p = post(i, i);
                    definition.serialize(&p).map(Serialized::into_value)
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let value = handle.join().expect("thread panicked")?;
            assert_eq!(value["id"], json!(i));
            assert_eq!(value["comments"].as_array().map(Vec::len), Some(i));
        }
        Ok(())
    }
}
