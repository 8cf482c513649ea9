//! Build-once-per-type cache discipline

use serde_json::json;
use shapecheck_engine::{
    Namespace, RecordType, ScalarKind, TypeExpr, ValidationOptions, ValidatorCache, validate_with,
};
use std::sync::{Arc, Barrier};

#[test]
fn repeated_validation_compiles_once() -> anyhow::Result<()> {
    let ns = Namespace::new("models");
    let user = RecordType::builder("User", &ns)
        .required("id", TypeExpr::Scalar(ScalarKind::String))
        .define()?;
    let ty = TypeExpr::Record(user);

    let cache = ValidatorCache::new();
    let options = ValidationOptions::default();
    assert_eq!(cache.stats().compilations, 0);

    for _ in 0..5 {
        validate_with(&cache, &ty, &json!({"id": "u1"}), &options)?;
    }

    let stats = cache.stats();
    assert_eq!(stats.compilations, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 4);
    assert_eq!(stats.cached_validators, 1);
    Ok(())
}

#[test]
fn concurrent_first_use_compiles_once() -> anyhow::Result<()> {
    let ns = Namespace::new("models");
    let user = RecordType::builder("User", &ns)
        .required("id", TypeExpr::Scalar(ScalarKind::String))
        .define()?;
    let ty = TypeExpr::Record(user);

    let cache = Arc::new(ValidatorCache::new());
    let thread_count = 8;
    let barrier = Arc::new(Barrier::new(thread_count));

    std::thread::scope(|scope| {
        for _ in 0..thread_count {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            let ty = ty.clone();
            scope.spawn(move || {
                barrier.wait();
                validate_with(
                    &cache,
                    &ty,
                    &json!({"id": "u1"}),
                    &ValidationOptions::default(),
                )
                .expect("conforming input validates");
            });
        }
    });

    assert_eq!(cache.stats().compilations, 1);
    assert_eq!(cache.stats().cached_validators, 1);
    Ok(())
}

#[test]
fn nested_records_share_the_cache() -> anyhow::Result<()> {
    let ns = Namespace::new("models");
    let author = RecordType::builder("Author", &ns)
        .required("id", TypeExpr::Scalar(ScalarKind::String))
        .define()?;
    let post = RecordType::builder("Post", &ns)
        .required("author", TypeExpr::Named("Author".to_string()))
        .define()?;

    let cache = ValidatorCache::new();
    let options = ValidationOptions::default();
    let post_ty = TypeExpr::Record(post);
    let author_ty = TypeExpr::Record(author);

    // validating Post builds the Author validator through the cache
    validate_with(&cache, &post_ty, &json!({"author": {"id": "a1"}}), &options)?;
    assert_eq!(cache.stats().compilations, 2);

    // a direct Author validation reuses it
    validate_with(&cache, &author_ty, &json!({"id": "a1"}), &options)?;
    assert_eq!(cache.stats().compilations, 2);
    Ok(())
}

#[test]
fn self_referential_types_validate_without_rebuilding() -> anyhow::Result<()> {
    let ns = Namespace::new("models");
    let node = RecordType::builder("Node", &ns)
        .required("label", TypeExpr::Scalar(ScalarKind::String))
        .optional("child", TypeExpr::Named("Node".to_string()))
        .define()?;
    let ty = TypeExpr::Record(node);

    let cache = ValidatorCache::new();
    let data = json!({"label": "root", "child": {"label": "leaf"}});
    let instance = validate_with(&cache, &ty, &data, &ValidationOptions::default())?;

    assert_eq!(instance.get("child"), Some(&json!({"label": "leaf"})));
    assert_eq!(cache.stats().compilations, 1);
    Ok(())
}
