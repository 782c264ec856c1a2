//! Module registry tests
//!
//! Covers dotted-id lookup, tree-wide initialization with independent
//! failures, and coordinated shutdown.

mod common;

use std::sync::Arc;

use modcore::{Module, ModuleRegistry, ModuleStatus, NullBehavior};

use common::{call_log, entries, init_tracing, FailingBehavior, ProbeBehavior};

#[test]
fn test_lookup_returns_same_module_as_descendant_walk() {
    init_tracing();
    let root = Module::new("root", None, Box::new(NullBehavior));
    let child = Module::new("child", Some(&root), Box::new(NullBehavior));
    let grandchild = Module::new("grandchild", Some(&child), Box::new(NullBehavior));

    let mut registry = ModuleRegistry::new();
    registry.register_module(Arc::clone(&root));

    let via_registry = registry.get_module("root.child.grandchild").unwrap();
    let via_walk = root.get_descendant(&["child", "grandchild"]).unwrap();

    assert!(Arc::ptr_eq(&via_registry, &via_walk));
    assert!(Arc::ptr_eq(&via_registry, &grandchild));
}

#[test]
fn test_initialize_all_isolates_failing_root() {
    let log = call_log();

    let bad_root = Module::new("verifier", None, FailingBehavior::boxed("solver offline"));
    Module::new("backend", Some(&bad_root), ProbeBehavior::boxed("backend", &log));

    let good_root = Module::new("analysis", None, ProbeBehavior::boxed("analysis", &log));
    Module::new("parser", Some(&good_root), ProbeBehavior::boxed("parser", &log));

    let mut registry = ModuleRegistry::new();
    registry.register_module(Arc::clone(&bad_root));
    registry.register_module(Arc::clone(&good_root));
    registry.initialize_all();

    assert_eq!(bad_root.status(), ModuleStatus::Error);
    assert!(bad_root.error().unwrap().contains("solver offline"));
    assert_eq!(good_root.status(), ModuleStatus::Active);

    // Children of both roots were visited, failing parent included
    let seen = entries(&log);
    assert!(seen.contains(&"init:backend".to_string()));
    assert!(seen.contains(&"init:parser".to_string()));
    assert_eq!(
        bad_root.get_child("backend").unwrap().status(),
        ModuleStatus::Active
    );
}

#[test]
fn test_root_and_child_lifecycle_scenario() {
    let root = Module::new("root", None, Box::new(NullBehavior));
    let child = Module::new("child", Some(&root), FailingBehavior::boxed("boom"));

    let mut registry = ModuleRegistry::new();
    registry.register_module(Arc::clone(&root));
    registry.initialize_all();

    assert_eq!(root.status(), ModuleStatus::Active);
    assert_eq!(child.status(), ModuleStatus::Error);
    assert!(child.error().unwrap().contains("boom"));
    assert!(Arc::ptr_eq(&registry.get_module("root.child").unwrap(), &child));

    root.shutdown();
    assert_eq!(child.status(), ModuleStatus::Disabled);
    assert_eq!(root.status(), ModuleStatus::Disabled);
}

#[test]
fn test_shutdown_all_cascades_over_every_tree() {
    let log = call_log();
    let first = Module::new("first", None, ProbeBehavior::boxed("first", &log));
    Module::new("inner", Some(&first), ProbeBehavior::boxed("inner", &log));
    let second = Module::new("second", None, ProbeBehavior::boxed("second", &log));

    let mut registry = ModuleRegistry::new();
    registry.register_module(first);
    registry.register_module(second);

    registry.initialize_all();
    registry.shutdown_all();

    let seen = entries(&log);
    let shutdowns: Vec<&String> = seen.iter().filter(|s| s.starts_with("shutdown:")).collect();
    assert_eq!(shutdowns, ["shutdown:inner", "shutdown:first", "shutdown:second"]);
}

#[test]
fn test_describe_all_snapshots_roots_in_order() {
    let mut registry = ModuleRegistry::new();
    registry.register_module(Module::new("beta", None, Box::new(NullBehavior)));
    registry.register_module(Module::new("alpha", None, Box::new(NullBehavior)));

    let infos = registry.describe_all();
    let ids: Vec<&str> = infos.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["alpha", "beta"]);
    assert!(infos.iter().all(|i| i.status == ModuleStatus::Uninitialized));
}

#[test]
fn test_unregister_drops_subtree_from_lookup() {
    let root = Module::new("root", None, Box::new(NullBehavior));
    Module::new("child", Some(&root), Box::new(NullBehavior));

    let mut registry = ModuleRegistry::new();
    registry.register_module(root);
    assert!(registry.get_module("root.child").is_some());

    registry.unregister_module("root");
    assert!(registry.get_module("root").is_none());
    assert!(registry.get_module("root.child").is_none());
    assert!(registry.roots().is_empty());
}
