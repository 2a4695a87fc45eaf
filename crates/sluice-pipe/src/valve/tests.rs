use std::cell::RefCell;
use std::rc::Rc;

use sluice_core::{Arg, CallArgs, ErrorKind, Flow, FlowRef, Pull, StageDef, StageKind, Value};
use sluice_test::{ints, stages};

use super::{Primed, Valve};
use crate::reservoir::Reservoir;

fn valve_over(def: StageDef) -> (Rc<RefCell<Reservoir>>, Valve) {
    let res = Rc::new(RefCell::new(Reservoir::new()));
    let primed = Rc::new(RefCell::new(Primed::new(FlowRef::from_shared(res.clone()))));
    let call = CallArgs::new().arg(Arg::Flow(FlowRef::from_shared(primed.clone())));
    let func = match def.kind {
        StageKind::Terminal(f) => f,
        StageKind::Through(_) => panic!("fixture is not terminal"),
    };
    (res, Valve::new(func, call, primed, def.empty_error))
}

#[test]
fn test_atomic_result_once_per_cycle() {
    let (res, mut valve) = valve_over(stages::max());
    res.borrow_mut().fill(ints(&[2, 1, 3])).unwrap();
    assert_eq!(valve.pull().unwrap(), Pull::Item(Value::Int(3)));
    assert_eq!(valve.pull().unwrap(), Pull::Done);

    res.borrow_mut().fill(ints(&[7, 4])).unwrap();
    assert_eq!(valve.pull().unwrap(), Pull::Item(Value::Int(7)));
    assert_eq!(valve.pull().unwrap(), Pull::Done);
}

#[test]
fn test_iterable_result_is_broken_down() {
    let (res, mut valve) = valve_over(stages::sorted());
    res.borrow_mut().fill(ints(&[3, 1, 2])).unwrap();
    let mut out = Vec::new();
    while let Pull::Item(v) = valve.pull().unwrap() {
        out.push(v);
    }
    assert_eq!(out, ints(&[1, 2, 3]));
    assert!(res.borrow_mut().is_empty());
}

#[test]
fn test_classified_empty_error_is_exhaustion() {
    let (_res, mut valve) = valve_over(stages::max());
    assert_eq!(valve.pull().unwrap(), Pull::Done);
}

#[test]
fn test_unclassified_error_propagates() {
    let (_res, mut valve) = valve_over(stages::max().empty_error(ErrorKind::Type));
    let err = valve.pull().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn test_whole_return_drains_residue() {
    let first = StageDef::terminal("first", |args: &CallArgs| {
        let flow = args.flow(0)?;
        Ok(flow.pull()?.into_item().unwrap_or_default())
    });
    let (res, mut valve) = valve_over(first);
    res.borrow_mut().fill(ints(&[5, 6, 7])).unwrap();
    assert_eq!(valve.whole_return().unwrap(), Value::Int(5));
    assert!(res.borrow_mut().is_empty());
    res.borrow_mut().fill(ints(&[8])).unwrap();
}

#[test]
fn test_whole_return_keeps_result_whole() {
    let (res, mut valve) = valve_over(stages::sorted());
    res.borrow_mut().fill(ints(&[2, 1])).unwrap();
    assert_eq!(valve.whole_return().unwrap(), Value::List(ints(&[1, 2])));
}
