use sluice_core::{from_fn, CallArgs, ErrorKind, FlowRef, Func, IterFlow, Pull, Value};
use sluice_test::{ints, pairs};

use super::*;
use crate::testing::{apply_map, build_over, map_def, run_terminal, run_through, run_through_with};

fn first() -> Func {
    Func::unary("first", |v| v.index(&Value::Int(0)))
}

fn map_e(name: &str, element: Value) -> sluice_core::Result<Value> {
    apply_map(&map_def(&add_in(), name), element, CallArgs::new())
}

#[test]
fn test_catalog_names() {
    let add_in = add_in();
    let names: Vec<&str> = add_in.method_names().collect();
    for expected in ["dict", "max_kargs", "sorted_kargs", "filter_kargs", "zip", "tuple_e", "round"] {
        assert!(names.contains(&expected), "missing {expected}");
    }
    assert!(!names.contains(&"eval"));
}

#[test]
fn test_dict_from_pairs() {
    let out = run_terminal(collection("dict", convert::to_dict), CallArgs::new(), pairs()).unwrap();
    assert_eq!(out, Value::dict([(1, 2), (3, 4), (5, 6)]));
}

#[test]
fn test_dict_rejects_wrong_length() {
    let err = convert::to_dict(vec![Value::tuple([1, 2, 3])]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "dictionary update sequence element #0 has length 3; 2 is required"
    );
}

#[test]
fn test_all_and_any() {
    let truthy = ints(&[1, 2, 3]);
    let mixed = ints(&[0, 2]);
    assert_eq!(run_terminal(all(), CallArgs::new(), truthy.clone()).unwrap(), Value::Bool(true));
    assert_eq!(run_terminal(all(), CallArgs::new(), mixed.clone()).unwrap(), Value::Bool(false));
    assert_eq!(run_terminal(any(), CallArgs::new(), mixed).unwrap(), Value::Bool(true));
    assert_eq!(run_terminal(any(), CallArgs::new(), vec![]).unwrap(), Value::Bool(false));
    assert_eq!(run_terminal(all(), CallArgs::new(), vec![]).unwrap(), Value::Bool(true));
}

#[test]
fn test_max_keeps_first_of_equals() {
    let data = vec![
        Value::from((1, "a")),
        Value::from((2, "b")),
        Value::from((2, "c")),
    ];
    let call = CallArgs::new().kw_func("key", first());
    assert_eq!(run_terminal(max(), call, data.clone()).unwrap(), Value::from((2, "b")));
    let call = CallArgs::new().kw_func("key", first());
    assert_eq!(run_terminal(min(), call, data).unwrap(), Value::from((1, "a")));
}

#[test]
fn test_max_empty() {
    let err = run_terminal(max(), CallArgs::new(), vec![]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
    assert_eq!(max().empty_error, Some(ErrorKind::Value));

    let call = CallArgs::new().kw_value("default", 7);
    assert_eq!(run_terminal(min(), call, vec![]).unwrap(), Value::Int(7));
}

#[test]
fn test_sum() {
    assert_eq!(run_terminal(sum(), CallArgs::new(), ints(&[1, 2, 3])).unwrap(), Value::Int(6));
    let call = CallArgs::new().kw_value("start", 10);
    assert_eq!(run_terminal(sum(), call, ints(&[1, 2])).unwrap(), Value::Int(13));
    let call = CallArgs::new().kw_value("start", "");
    let err = run_terminal(sum(), call, vec![]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
}

#[test]
fn test_sorted_reverse_is_stable() {
    let data = vec![
        Value::from((1, "a")),
        Value::from((2, "b")),
        Value::from((1, "c")),
    ];
    let call = CallArgs::new()
        .kw_func("key", first())
        .kw_value("reverse", true);
    let out = run_terminal(sorted(), call, data).unwrap();
    assert_eq!(
        out,
        Value::list([
            Value::from((2, "b")),
            Value::from((1, "a")),
            Value::from((1, "c")),
        ])
    );
}

#[test]
fn test_enumerate_start() {
    let out = run_through_with(enumerate(), CallArgs::new().kw_value("start", 1), ints(&[7, 8]));
    assert_eq!(out, vec![Value::from((1, 7)), Value::from((2, 8))]);
}

#[test]
fn test_filter_without_predicate() {
    let out = run_through_with(filter(), CallArgs::new().value(Value::None), ints(&[0, 1, 0, 2]));
    assert_eq!(out, ints(&[1, 2]));
}

#[test]
fn test_filter_predicate() {
    let odd = Func::predicate("odd", |v| v.as_int().is_some_and(|i| i % 2 == 1));
    let out = run_through_with(filter(), CallArgs::new().func(odd), ints(&[1, 2, 3]));
    assert_eq!(out, ints(&[1, 3]));
}

#[test]
fn test_zip_stops_and_drains() {
    let upstream = FlowRef::new(IterFlow::values(ints(&[1, 2, 3])));
    let call = CallArgs::new().value(Value::tuple(["a", "b"]));
    let zipped = build_over(zip(), call, upstream.clone()).unwrap();
    assert_eq!(
        zipped.collect_items().unwrap(),
        vec![Value::from((1, "a")), Value::from((2, "b"))]
    );
    assert!(upstream.pull().unwrap().is_done());
}

#[test]
fn test_zip_without_others() {
    assert_eq!(
        run_through(zip(), ints(&[1])),
        vec![Value::tuple([1])]
    );
}

#[test]
fn test_collection_maps() {
    let element = Value::list([3, 1, 3]);
    assert_eq!(map_e("tuple_e", element.clone()).unwrap(), Value::tuple([3, 1, 3]));
    assert_eq!(map_e("set_e", element.clone()).unwrap(), Value::set([1, 3]));
    assert_eq!(map_e("sorted_e", element.clone()).unwrap(), Value::list([1, 3, 3]));
    assert_eq!(map_e("reversed_e", element.clone()).unwrap(), Value::list([3, 1, 3]));
    assert_eq!(map_e("max_e", element.clone()).unwrap(), Value::Int(3));
    assert_eq!(map_e("sum_e", element).unwrap(), Value::Int(7));
    assert_eq!(
        map_e("dict_e", Value::dict([("a", 1)])).unwrap(),
        Value::dict([("a", 1)])
    );
    assert_eq!(map_e("len", Value::str("abc")).unwrap(), Value::Int(3));
}

#[test]
fn test_min_e_empty() {
    let err = map_e("min_e", Value::list(Vec::<Value>::new())).unwrap_err();
    assert_eq!(err.to_string(), "min() arg is an empty sequence");
}

#[test]
fn test_number_formatting() {
    assert_eq!(map_e("bin", Value::Int(5)).unwrap(), Value::str("0b101"));
    assert_eq!(map_e("oct", Value::Int(-8)).unwrap(), Value::str("-0o10"));
    assert_eq!(map_e("hex", Value::Int(255)).unwrap(), Value::str("0xff"));
    assert_eq!(map_e("str", Value::Int(5)).unwrap(), Value::str("5"));
    assert_eq!(map_e("repr", Value::str("a")).unwrap(), Value::str("'a'"));
}

#[test]
fn test_chr_and_ord() {
    assert_eq!(map_e("chr", Value::Int(97)).unwrap(), Value::str("a"));
    assert_eq!(map_e("ord", Value::str("a")).unwrap(), Value::Int(97));
    assert_eq!(map_e("chr", Value::Int(-1)).unwrap_err().kind(), ErrorKind::Value);
    assert_eq!(map_e("ord", Value::str("ab")).unwrap_err().kind(), ErrorKind::Type);
}

#[test]
fn test_int_and_float() {
    assert_eq!(map_e("int", Value::Float(3.9)).unwrap(), Value::Int(3));
    assert_eq!(map_e("int", Value::Float(-3.9)).unwrap(), Value::Int(-3));
    assert_eq!(map_e("int", Value::str(" 42 ")).unwrap(), Value::Int(42));
    let int = map_def(&add_in(), "int");
    let base = |b: i64| CallArgs::new().value(b);
    assert_eq!(apply_map(&int, Value::str("12"), base(3)).unwrap(), Value::Int(5));
    assert_eq!(apply_map(&int, Value::str("0x1f"), base(0)).unwrap(), Value::Int(31));
    assert_eq!(apply_map(&int, Value::str("-ff"), base(16)).unwrap(), Value::Int(-255));
    let err = map_e("int", Value::str("abc")).unwrap_err();
    assert_eq!(err.to_string(), "invalid literal for int() with base 10: 'abc'");
    assert_eq!(map_e("float", Value::str("2.5")).unwrap(), Value::Float(2.5));
    assert_eq!(map_e("float", Value::Int(2)).unwrap(), Value::Float(2.0));
}

#[test]
fn test_int_parses_full_i64_range() {
    let min = map_e("int", Value::str("-9223372036854775808")).unwrap();
    assert_eq!(min, Value::Int(i64::MIN));
    let max = map_e("int", Value::str("9223372036854775807")).unwrap();
    assert_eq!(max, Value::Int(i64::MAX));
    let err = map_e("int", Value::str("9223372036854775808")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
    let int = map_def(&add_in(), "int");
    let call = CallArgs::new().value(0);
    let out = apply_map(&int, Value::str("-0x8000000000000000"), call).unwrap();
    assert_eq!(out, Value::Int(i64::MIN));
}

#[test]
fn test_range() {
    let range = map_def(&add_in(), "range");
    assert_eq!(map_e("range", Value::Int(3)).unwrap(), Value::list([0, 1, 2]));
    let call = CallArgs::new().value(10).value(3);
    assert_eq!(apply_map(&range, Value::Int(1), call).unwrap(), Value::list([1, 4, 7]));
    let call = CallArgs::new().value(0).value(-2);
    assert_eq!(apply_map(&range, Value::Int(4), call).unwrap(), Value::list([4, 2]));
    let call = CallArgs::new().value(5).value(0);
    assert!(apply_map(&range, Value::Int(0), call).is_err());
}

#[test]
fn test_round_half_to_even() {
    assert_eq!(map_e("round", Value::Float(2.5)).unwrap(), Value::Int(2));
    assert_eq!(map_e("round", Value::Float(3.5)).unwrap(), Value::Int(4));
    let round = map_def(&add_in(), "round");
    let digits = |n: i64| CallArgs::new().value(n);
    assert_eq!(apply_map(&round, Value::Float(1.25), digits(1)).unwrap(), Value::Float(1.2));
    assert_eq!(apply_map(&round, Value::Int(1250), digits(-2)).unwrap(), Value::Int(1200));
    assert_eq!(apply_map(&round, Value::Int(1350), digits(-2)).unwrap(), Value::Int(1400));
}

#[test]
fn test_zip_stop_returns_on_dry_upstream() {
    let mut sent = false;
    let upstream = from_fn(move || {
        if sent {
            Ok(Pull::Dry)
        } else {
            sent = true;
            Ok(Pull::Item(Value::Int(1)))
        }
    });
    let zipped = build_over(zip(), CallArgs::new().value(Value::tuple([9])), upstream).unwrap();
    assert_eq!(zipped.pull().unwrap().into_item(), Some(Value::from((1, 9))));
    assert!(zipped.pull().unwrap().is_done());
}
