use sluice_core::{AddIn, ErrorKind, MapDef, OverwritePolicy, StageDef, Value, WrapTarget};
use sluice_test::{add_in, stages};

use super::{Entry, Registry};
use crate::bypass::BypassDef;

fn loaded() -> Registry {
    let mut registry = Registry::new().with_catalog([add_in()]);
    registry.load(&["fixtures"]).unwrap();
    registry
}

#[test]
fn test_new_has_standard_bypasses() {
    let registry = Registry::new();
    for name in ["carry_key", "re_key", "keyed", "carry_value", "re_value"] {
        assert!(registry.contains(name), "missing {name}");
    }
    assert!(matches!(
        registry.entry("carry_dict").unwrap(),
        Entry::BypassOpen(_)
    ));
    assert!(matches!(
        registry.entry("return_dict").unwrap(),
        Entry::BypassClose(_)
    ));
    assert_eq!(Registry::empty().names().count(), 0);
}

#[test]
fn test_add_method_protects_names() {
    let mut registry = Registry::empty();
    assert_eq!(registry.add_method(stages::max()).unwrap(), "max");
    let err = registry.add_method(stages::max()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Registration);
    assert_eq!(err.to_string(), "Pipe already has a stage named max");

    registry.add_method(stages::max().allow_overwrite()).unwrap();
    registry.add_method(stages::min().named("max").allow_overwrite()).unwrap();
}

#[test]
fn test_replace_policy_overrides_protection() {
    let mut registry = Registry::empty();
    registry.set_overwrite(OverwritePolicy::Replace);
    registry.add_method(stages::max()).unwrap();
    registry.add_method(stages::max()).unwrap();
    assert_eq!(registry.overwrite(), OverwritePolicy::Replace);
}

#[test]
fn test_add_method_rejects_both_spreads() {
    let mut registry = Registry::empty();
    let def = stages::map().double_star_wrap("key");
    let err = registry.add_method(def).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(!registry.contains("map"));
}

#[test]
fn test_add_map_method() {
    let mut registry = Registry::empty();
    let name = registry
        .add_map_method(MapDef::unary("double", |v| v.mul(&Value::Int(2))))
        .unwrap();
    assert_eq!(name, "double");
    let out = registry
        .pipe_with([1, 2])
        .then("double")
        .unwrap()
        .values()
        .unwrap();
    assert_eq!(out, vec![Value::Int(2), Value::Int(4)]);
}

#[test]
fn test_add_bypass_checks_both_names() {
    let mut registry = Registry::new();
    let clash = BypassDef::new("fresh", |v, _| Ok((v.clone(), v)), |_, r, _| Ok(r))
        .closed_by("re_key");
    let err = registry.add_bypass(clash).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Registration);
    assert!(!registry.contains("fresh"));
}

#[test]
fn test_alias_sets_own_spread() {
    let mut registry = loaded();
    registry
        .alias("map_kargs", "map", None, Some(WrapTarget::Index(0)))
        .unwrap();
    let def = registry.stage_def("map_kargs").unwrap();
    assert_eq!(def.star_wrap, None);
    assert_eq!(def.double_star_wrap, Some(WrapTarget::Index(0)));
    assert_eq!(def.iter_index, 1);
    // the aliased stage keeps its directives
    assert_eq!(
        registry.stage_def("map").unwrap().star_wrap,
        Some(WrapTarget::Index(0))
    );

    let err = registry.alias("x", "nope", None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_remove() {
    let mut registry = loaded();
    registry.remove("max").unwrap();
    assert!(!registry.contains("max"));
    assert_eq!(registry.remove("max").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_load_and_unload() {
    let mut registry = loaded();
    assert!(registry.contains("Expand"));
    assert!(registry.contains("pass_through"));
    assert_eq!(registry.loaded().collect::<Vec<_>>(), vec!["fixtures"]);

    registry.unload(&["fixtures"]).unwrap();
    assert!(!registry.contains("Expand"));
    assert!(!registry.contains("pass_through"));
    assert!(registry.contains("carry_key"));
    assert_eq!(registry.loaded().count(), 0);

    let err = registry.unload(&["fixtures"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "fixtures has not been loaded");
}

#[test]
fn test_unload_leaves_names_replaced_by_later_add_in() {
    let zero = AddIn::new("zero").stage(StageDef::terminal("max", |_| Ok(Value::Int(0))));
    let mut registry = loaded().with_catalog([zero]);
    registry.set_overwrite(OverwritePolicy::Replace);
    registry.load(&["zero"]).unwrap();

    registry.unload(&["fixtures"]).unwrap();
    assert!(!registry.contains("Expand"));
    let out = registry
        .pipe_with(sluice_test::ints(&[3, 9]))
        .then("max")
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(out, Value::Int(0));

    registry.unload(&["zero"]).unwrap();
    assert!(!registry.contains("max"));
}

#[test]
fn test_unload_leaves_directly_replaced_names() {
    let mut registry = loaded();
    registry.set_overwrite(OverwritePolicy::Replace);
    registry.add_method(StageDef::terminal("min", |_| Ok(Value::None))).unwrap();
    registry.unload(&["fixtures"]).unwrap();
    assert!(registry.contains("min"));
    assert!(!registry.contains("max"));
}

#[test]
fn test_load_collision_rolls_back() {
    let clash = AddIn::new("clash")
        .stage(StageDef::terminal("unique_name", |_| Ok(Value::None)))
        .stage(stages::max());
    let mut registry = loaded().with_catalog([clash]);
    let err = registry.load(&["clash"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Registration);
    assert!(!registry.contains("unique_name"));
    assert!(!registry.loaded().any(|n| n == "clash"));
}

#[test]
fn test_load_unknown_add_in() {
    let mut registry = Registry::new();
    let err = registry.load(&["missing"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_unload_checks_all_names_first() {
    let mut registry = loaded();
    let err = registry.unload(&["fixtures", "missing"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(registry.contains("max"));
}

#[test]
fn test_registries_are_independent() {
    let a = loaded();
    let b = Registry::new();
    assert!(a.contains("max"));
    assert!(!b.contains("max"));
}
