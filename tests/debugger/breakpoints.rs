use crate::start_fib;
use lookout::context::{Backend, StackFrame};
use lookout::debugger::address::RelocatedAddress;
use lookout::debugger::{Error, StopReason};
use serial_test::serial;

const FIB_FN: &str = "fib::fibonacci";

#[test]
#[serial]
fn test_brkpt_at_symbol() {
    let mut debugger = start_fib();
    let number = debugger.set_breakpoint_at_symbol(FIB_FN).unwrap();
    assert_eq!(number, 1);

    let StopReason::Breakpoint { number, addr } = debugger.continue_execution().unwrap() else {
        panic!("breakpoint expected");
    };
    assert_eq!(number, 1);
    assert_eq!(debugger.lookup_symbol(addr).as_deref(), Some(FIB_FN));

    // recursive calls hit the same breakpoint
    let reason = debugger.continue_execution().unwrap();
    assert_eq!(reason, StopReason::Breakpoint { number, addr });
}

#[test]
#[serial]
fn test_brkpt_remove() {
    let mut debugger = start_fib();
    debugger.set_breakpoint_at_symbol(FIB_FN).unwrap();

    let StopReason::Breakpoint { addr, .. } = debugger.continue_execution().unwrap() else {
        panic!("breakpoint expected");
    };
    assert_eq!(debugger.remove_breakpoint(addr).unwrap(), 1);
    assert!(matches!(
        debugger.remove_breakpoint(addr),
        Err(Error::BreakpointNotFound(_))
    ));

    let err = debugger.continue_execution().unwrap_err();
    assert!(matches!(err, Error::ProcessExit(0)));
}

#[test]
#[serial]
fn test_brkpt_memory_is_clean() {
    let mut debugger = start_fib();
    let number = debugger.set_breakpoint_at_symbol(FIB_FN).unwrap();
    let StopReason::Breakpoint { addr, .. } = debugger.continue_execution().unwrap() else {
        panic!("breakpoint expected");
    };
    assert_eq!(number, 1);

    // int3 is never visible through the backend
    let code = debugger.read_memory(addr, 1).unwrap();
    assert_ne!(code[0], 0xCC);
}

#[test]
#[serial]
fn test_step_over_breakpoint() {
    let mut debugger = start_fib();
    debugger.set_breakpoint_at_symbol(FIB_FN).unwrap();
    let StopReason::Breakpoint { addr, .. } = debugger.continue_execution().unwrap() else {
        panic!("breakpoint expected");
    };

    assert_eq!(debugger.step_instruction().unwrap(), StopReason::Step);
    let pc = debugger.current_frame().unwrap().pc();
    assert_ne!(pc, addr);
    assert!(pc > addr);
}

#[test]
#[serial]
fn test_unknown_symbol() {
    let mut debugger = start_fib();
    assert!(matches!(
        debugger.set_breakpoint_at_symbol("fib::not_a_function"),
        Err(Error::SymbolNotFound(_))
    ));
    assert!(matches!(
        debugger.set_breakpoint(RelocatedAddress::from(0x10_usize)),
        Err(Error::UnknownAddress(_))
    ));
}
