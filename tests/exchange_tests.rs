use pretty_assertions::assert_eq;

use captable::{
    acquire, acquire_from, publish, publish_as, Arity, CachedTable, CapabilityDescriptor,
    CapabilitySignature, CapabilityTable, ExchangeError, Module, ModuleAttribute, ModuleMetadata,
    ModuleRegistry, TableExpectation, Value, ValueKind, CAPABILITY_TABLE_ATTR,
};

const SENTINEL: i64 = 7777;

/// Two-entry stub producer: index 0 returns a fixed sentinel, index 1 echoes
/// its argument.
fn stub_table(sentinel: i64) -> CapabilityTable {
    let mut table = CapabilityTable::new("graph", "0.1.0");
    table
        .register_fn(
            CapabilityDescriptor::new(
                "graph.from-native",
                "Wraps a native graph handle",
                Arity::Fixed(0),
                CapabilitySignature::new(vec![], ValueKind::Integer),
            ),
            move |_| Ok(Value::Integer(sentinel)),
        )
        .unwrap();
    table
        .register_fn(
            CapabilityDescriptor::new(
                "graph.to-native",
                "Unwraps a graph wrapper back to its native handle",
                Arity::Fixed(1),
                CapabilitySignature::new(vec![ValueKind::Integer], ValueKind::Integer),
            ),
            |args| Ok(args[0].clone()),
        )
        .unwrap();
    table
}

fn stub_expectation() -> TableExpectation {
    TableExpectation::new()
        .expect_with(
            "graph.from-native",
            Arity::Fixed(0),
            CapabilitySignature::new(vec![], ValueKind::Integer),
        )
        .expect_with(
            "graph.to-native",
            Arity::Fixed(1),
            CapabilitySignature::new(vec![ValueKind::Integer], ValueKind::Integer),
        )
}

#[test]
fn end_to_end_acquire_and_invoke_through_index() {
    let registry = ModuleRegistry::new();
    publish(&registry, ModuleMetadata::new("graph"), stub_table(SENTINEL)).unwrap();

    let acquired = acquire(&registry, "graph", &stub_expectation()).unwrap();
    assert_eq!(acquired.len(), 2);
    assert_eq!(
        acquired.invoke_index(0, vec![]).unwrap(),
        Value::Integer(SENTINEL)
    );
    assert_eq!(
        acquired.invoke_index(1, vec![Value::Integer(42)]).unwrap(),
        Value::Integer(42)
    );
}

#[test]
fn invoke_by_name_matches_direct_call() {
    let registry = ModuleRegistry::new();
    publish(&registry, ModuleMetadata::new("graph"), stub_table(SENTINEL)).unwrap();
    let acquired = acquire(&registry, "graph", &stub_expectation()).unwrap();

    // Behavioral pass-through: same result as calling the producer directly.
    let direct = stub_table(SENTINEL)
        .invoke("graph.to-native", vec![Value::Integer(42)])
        .unwrap();
    let through_table = acquired
        .invoke("graph.to-native", vec![Value::Integer(42)])
        .unwrap();
    assert_eq!(through_table, direct);
}

#[test]
fn acquire_fails_when_module_absent() {
    let registry = ModuleRegistry::new();
    let err = acquire(&registry, "graph", &stub_expectation()).unwrap_err();
    assert_eq!(
        err,
        ExchangeError::ModuleNotFound {
            module: "graph".to_string()
        }
    );
}

#[test]
fn acquire_fails_when_attribute_missing() {
    let registry = ModuleRegistry::new();
    registry
        .register_module(Module::new(ModuleMetadata::new("graph")))
        .unwrap();

    let err = acquire(&registry, "graph", &stub_expectation()).unwrap_err();
    assert_eq!(
        err,
        ExchangeError::AttributeMissing {
            module: "graph".to_string(),
            attribute: CAPABILITY_TABLE_ATTR.to_string(),
        }
    );
}

#[test]
fn acquire_fails_loudly_on_wrong_attribute_kind() {
    let registry = ModuleRegistry::new();
    let module = registry
        .register_module(Module::new(ModuleMetadata::new("graph")))
        .unwrap();
    module
        .set_attribute(
            CAPABILITY_TABLE_ATTR,
            ModuleAttribute::Value(Value::String("not a table".to_string())),
        )
        .unwrap();

    let err = acquire(&registry, "graph", &stub_expectation()).unwrap_err();
    assert_eq!(
        err,
        ExchangeError::TypeMismatch {
            module: "graph".to_string(),
            attribute: CAPABILITY_TABLE_ATTR.to_string(),
            expected: "capability-table",
            actual: "value",
        }
    );
}

#[test]
fn acquire_checks_entry_count() {
    let registry = ModuleRegistry::new();
    publish(&registry, ModuleMetadata::new("graph"), stub_table(SENTINEL)).unwrap();

    let short = TableExpectation::new().expect("graph.from-native");
    let err = acquire(&registry, "graph", &short).unwrap_err();
    assert_eq!(
        err,
        ExchangeError::TableShapeMismatch {
            module: "graph".to_string(),
            expected: 1,
            actual: 2,
        }
    );
}

#[test]
fn acquire_checks_capability_names() {
    let registry = ModuleRegistry::new();
    publish(&registry, ModuleMetadata::new("graph"), stub_table(SENTINEL)).unwrap();

    let misspelled = TableExpectation::new()
        .expect("graph.from-native")
        .expect("graph.to-natiev");
    let err = acquire(&registry, "graph", &misspelled).unwrap_err();
    assert_eq!(
        err,
        ExchangeError::CapabilityMissing {
            module: "graph".to_string(),
            capability: "graph.to-natiev".to_string(),
        }
    );
}

#[test]
fn acquire_checks_positions() {
    let registry = ModuleRegistry::new();
    publish(&registry, ModuleMetadata::new("graph"), stub_table(SENTINEL)).unwrap();

    let swapped = TableExpectation::new()
        .expect("graph.to-native")
        .expect("graph.from-native");
    let err = acquire(&registry, "graph", &swapped).unwrap_err();
    assert!(matches!(err, ExchangeError::SignatureMismatch { .. }));
}

#[test]
fn acquire_checks_arity_and_signature() {
    let registry = ModuleRegistry::new();
    publish(&registry, ModuleMetadata::new("graph"), stub_table(SENTINEL)).unwrap();

    let wrong_arity = TableExpectation::new()
        .expect_with(
            "graph.from-native",
            Arity::Fixed(2),
            CapabilitySignature::new(vec![ValueKind::Any, ValueKind::Any], ValueKind::Any),
        )
        .expect("graph.to-native");
    let err = acquire(&registry, "graph", &wrong_arity).unwrap_err();
    assert!(matches!(err, ExchangeError::SignatureMismatch { .. }));

    let wrong_signature = TableExpectation::new()
        .expect_with(
            "graph.from-native",
            Arity::Fixed(0),
            CapabilitySignature::new(vec![], ValueKind::String),
        )
        .expect("graph.to-native");
    let err = acquire(&registry, "graph", &wrong_signature).unwrap_err();
    assert!(matches!(err, ExchangeError::SignatureMismatch { .. }));
}

#[test]
fn acquire_from_uses_explicit_attribute_name() {
    let registry = ModuleRegistry::new();
    publish_as(
        &registry,
        ModuleMetadata::new("graph"),
        "_graph_api",
        stub_table(SENTINEL),
    )
    .unwrap();

    assert!(acquire(&registry, "graph", &stub_expectation()).is_err());
    let acquired = acquire_from(&registry, "graph", "_graph_api", &stub_expectation()).unwrap();
    assert_eq!(acquired.attribute(), "_graph_api");
    assert_eq!(
        acquired.invoke_index(0, vec![]).unwrap(),
        Value::Integer(SENTINEL)
    );
}

#[test]
fn cached_table_rejects_invoke_before_acquire() {
    let cache = CachedTable::new();
    assert!(!cache.is_acquired());
    let err = cache.invoke_index(0, vec![]).unwrap_err();
    assert_eq!(err, ExchangeError::NotAcquired);
}

#[test]
fn cached_table_keeps_prior_state_on_failed_acquire() {
    let registry = ModuleRegistry::new();
    let cache = CachedTable::new();

    // Failure before any success leaves the cache unset.
    assert!(cache.acquire(&registry, "graph", &stub_expectation()).is_err());
    assert!(!cache.is_acquired());

    publish(&registry, ModuleMetadata::new("graph"), stub_table(SENTINEL)).unwrap();
    cache
        .acquire(&registry, "graph", &stub_expectation())
        .unwrap();
    assert!(cache.is_acquired());

    // Failure after a success keeps the previously acquired table usable.
    assert!(cache.acquire(&registry, "absent", &stub_expectation()).is_err());
    assert_eq!(
        cache.invoke_index(0, vec![]).unwrap(),
        Value::Integer(SENTINEL)
    );
}

#[test]
fn reacquire_reflects_most_recent_publish() {
    let registry = ModuleRegistry::new();
    let cache = CachedTable::new();

    publish(&registry, ModuleMetadata::new("graph"), stub_table(SENTINEL)).unwrap();
    cache
        .acquire(&registry, "graph", &stub_expectation())
        .unwrap();
    assert_eq!(
        cache.invoke_index(0, vec![]).unwrap(),
        Value::Integer(SENTINEL)
    );

    // A handle snapshotted before the re-publish keeps the old table.
    let old_handle = cache.get().unwrap();

    publish(&registry, ModuleMetadata::new("graph"), stub_table(1234)).unwrap();
    cache
        .acquire(&registry, "graph", &stub_expectation())
        .unwrap();
    assert_eq!(cache.invoke_index(0, vec![]).unwrap(), Value::Integer(1234));
    assert_eq!(
        old_handle.invoke_index(0, vec![]).unwrap(),
        Value::Integer(SENTINEL)
    );
}

#[test]
fn invoke_index_is_bounds_checked_after_acquire() {
    let registry = ModuleRegistry::new();
    publish(&registry, ModuleMetadata::new("graph"), stub_table(SENTINEL)).unwrap();
    let acquired = acquire(&registry, "graph", &stub_expectation()).unwrap();

    let err = acquired.invoke_index(2, vec![]).unwrap_err();
    assert_eq!(err, ExchangeError::IndexOutOfBounds { index: 2, len: 2 });
}

#[test]
fn invoke_validates_arguments_at_the_boundary() {
    let registry = ModuleRegistry::new();
    publish(&registry, ModuleMetadata::new("graph"), stub_table(SENTINEL)).unwrap();
    let acquired = acquire(&registry, "graph", &stub_expectation()).unwrap();

    let err = acquired.invoke("graph.to-native", vec![]).unwrap_err();
    assert!(matches!(err, ExchangeError::ArityMismatch { .. }));

    let err = acquired
        .invoke("graph.to-native", vec![Value::String("42".to_string())])
        .unwrap_err();
    assert!(matches!(err, ExchangeError::TypeError { .. }));
}

#[test]
fn manifest_describes_the_acquired_contract() {
    let registry = ModuleRegistry::new();
    publish(&registry, ModuleMetadata::new("graph"), stub_table(SENTINEL)).unwrap();
    let acquired = acquire(&registry, "graph", &stub_expectation()).unwrap();

    let manifest = acquired.manifest();
    let names: Vec<&str> = manifest
        .capabilities
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(names, vec!["graph.from-native", "graph.to-native"]);

    let json = manifest.to_json().unwrap();
    assert!(json.contains("graph.from-native"));
}

#[test]
fn global_registry_is_shared_across_call_sites() {
    // Unique module name so this test does not collide with others using the
    // process-wide registry.
    let module = "exchange-tests.global-graph";
    publish(
        ModuleRegistry::global(),
        ModuleMetadata::new(module).with_version("0.1.0"),
        stub_table(SENTINEL),
    )
    .unwrap();

    let acquired = acquire(ModuleRegistry::global(), module, &stub_expectation()).unwrap();
    assert_eq!(
        acquired.invoke_index(1, vec![Value::Integer(9)]).unwrap(),
        Value::Integer(9)
    );
}
