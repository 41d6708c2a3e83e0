//! Scope configuration import/export, the decision log, and replay.

use rog::error::ConfigError;
use rog::{Config, Constraint, DecisionLog, PrimitiveProvider, ProviderConfig, Registry, ReplayProvider, Session, Target, TypeDef, TypeRef, Value};
use tempfile::tempdir;

fn sample_config() -> Config {
    Config::new()
        .with_pair(Target::at("Order"), Constraint::new().with_null_prob(0.3))
        .unwrap()
        .with_pair(Target::at("Order.Customer"), Constraint::new().with_null_prob(0.7))
        .unwrap()
        .with_pair(
            Target::at("Order.i32").with_method("Order::new"),
            Constraint::new().with_prob(0.9),
        )
        .unwrap()
        .with_pair(Target::at("List<String>.String"), Constraint::new().with_null_prob(0.0))
        .unwrap()
}

fn probes() -> Vec<Target> {
    vec![
        Target::at("Order"),
        Target::at("Order.Customer"),
        Target::at("Order.Customer.String"),
        Target::at("Order.i32"),
        Target::at("Order.i32").with_method("Order::new"),
        Target::at("List<String>.String"),
        Target::at("List<String>"),
        Target::at("Invoice"),
    ]
}

#[test]
fn test_json_round_trip_preserves_resolution() {
    let config = sample_config();
    let restored = Config::from_json(&config.to_json().unwrap()).unwrap();

    assert_eq!(restored, config);
    for probe in probes() {
        assert_eq!(
            restored.tree().resolve(&probe),
            config.tree().resolve(&probe),
            "resolution differs for {}",
            probe
        );
    }
}

#[test]
fn test_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scopes.json");

    let config = sample_config();
    config.save(&path).unwrap();
    let loaded = Config::load(&path).unwrap();

    assert_eq!(loaded.fingerprint(), config.fingerprint());
    assert_eq!(loaded.tree().bindings().len(), 4);
    for probe in probes() {
        assert_eq!(loaded.tree().resolve(&probe), config.tree().resolve(&probe));
    }
}

#[test]
fn test_method_scoped_binding_only_applies_to_that_method() {
    let config = sample_config();
    let inside = Target::at("Order.i32").with_method("Order::new");
    let outside = Target::at("Order.i32").with_method("Order::with_total");

    assert_eq!(config.tree().resolve(&inside), Some(&Constraint::new().with_prob(0.9)));
    assert_eq!(config.tree().resolve(&outside), Some(&Constraint::new().with_null_prob(0.3)));
}

#[test]
fn test_invalid_pairs_are_rejected() {
    let mut config = Config::new();
    assert!(matches!(
        config.add_pair(Target::at("A"), Constraint::new().with_null_prob(1.5)),
        Err(ConfigError::InvalidProbability { field: "nullProb", .. })
    ));
    assert!(matches!(
        config.add_pair(Target::at(""), Constraint::new()),
        Err(ConfigError::EmptyInstancePath)
    ));
    assert_eq!(config.tree().binding_count(), 0);
}

#[test]
fn test_loading_a_missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        Config::load(dir.path().join("absent.json")),
        Err(ConfigError::Io(_))
    ));
}

fn inventory() -> Registry {
    let mut registry = Registry::new();
    registry.register(TypeDef::record(
        "Stock",
        vec![
            ("sku", TypeRef::text()),
            ("count", TypeRef::int()),
            ("tags", TypeRef::list_of(TypeRef::text())),
        ],
    ));
    registry
}

#[test]
fn test_same_seed_same_log() {
    let config = sample_config();
    let run = |seed: u64| {
        let mut session = Session::builder(inventory())
            .config(config.clone())
            .seed(seed)
            .build();
        let value = session.generate(&TypeRef::list_of(TypeRef::named("Stock")));
        (value, session.into_decisions())
    };

    let (first_value, first_log) = run(21);
    let (second_value, second_log) = run(21);
    assert_eq!(first_value, second_value);
    assert_eq!(first_log, second_log);
    assert_eq!(first_log.config_fingerprint(), Some(config.fingerprint().as_str()));
}

#[test]
fn test_log_survives_json_and_replays_identically() {
    let mut session = Session::builder(inventory()).seed(99).build();
    let original = session.generate(&TypeRef::named("Stock"));
    let log = session.into_decisions();

    let restored = DecisionLog::from_json(&log.to_json().unwrap()).unwrap();
    let mut replay = Session::builder(inventory()).replay(restored).build();
    assert_eq!(replay.settings().seed, 99);
    assert_eq!(replay.generate(&TypeRef::named("Stock")), original);
    assert_eq!(replay.decisions().choices(), log.choices());
}

#[test]
fn test_edited_choice_appears_at_its_target() {
    let mut session = Session::builder(inventory()).seed(5).build();
    session.generate(&TypeRef::named("Stock")).unwrap();
    let mut log = session.into_decisions();

    let index = log
        .choices()
        .iter()
        .position(|c| c.target.instance_path == "Stock.i32")
        .unwrap();
    assert!(log.edit(index, Some(Value::Int(424_242))));

    let mut replay = Session::builder(inventory()).replay(log).build();
    let stock = replay.generate(&TypeRef::named("Stock"));
    let stock = stock.as_ref().and_then(Value::as_object).unwrap();
    assert_eq!(stock.get("count"), Some(&Value::Int(424_242)));
}

#[test]
fn test_choice_edited_to_null_is_replayed_as_null() {
    let mut session = Session::builder(inventory()).seed(5).build();
    let original = session.generate(&TypeRef::named("Stock"));
    let count = original
        .as_ref()
        .and_then(Value::as_object)
        .and_then(|stock| stock.get("count"))
        .cloned();
    let mut log = session.into_decisions();

    let index = log
        .choices()
        .iter()
        .position(|c| c.target.instance_path == "Stock.String")
        .unwrap();
    assert!(log.edit(index, None));

    let mut replay = Session::builder(inventory()).replay(log).build();
    let stock = replay.generate(&TypeRef::named("Stock"));
    let stock = stock.as_ref().and_then(Value::as_object).unwrap();
    assert!(stock.has_field("sku"));
    assert!(stock.get("sku").is_none());
    assert_eq!(stock.get("count").cloned(), count);
    assert_eq!(replay.decisions().null_count(), 1);
    assert!(replay.decisions().choices()[0].is_null());
}

#[test]
fn test_replay_provider_reports_misalignment() {
    let mut session = Session::builder(inventory()).seed(12).build();
    session.generate(&TypeRef::named("Stock")).unwrap();
    let log = session.into_decisions();

    let mut provider = ReplayProvider::seeded(&log, ProviderConfig::default());
    assert!(!provider.is_misaligned());

    // The first recorded choice is the `sku` text, not a long elsewhere.
    provider.get_long(&Target::at("Ledger.i64"), &Constraint::new());
    assert!(provider.is_misaligned());
    assert_eq!(provider.misalignment_position(), Some(0));
    assert_eq!(provider.misaligned_kind(), Some("text"));
    assert_eq!(provider.replayed(), 0);
}
