#![cfg(feature = "int_test")]

mod breakpoints;
mod context;

use lookout::debugger::process::Child;
use lookout::debugger::Debugger;
use serial_test::serial;
use std::mem;

const FIB_APP: &str = env!("CARGO_BIN_EXE_fib");

#[macro_export]
macro_rules! assert_no_proc {
    ($pid:expr) => {
        use sysinfo::{Pid as SPid, System};
        let sys = System::new_all();
        assert!(sys
            .process(SPid::from_u32($pid.as_raw() as u32))
            .filter(|p| p.status() != sysinfo::ProcessStatus::Zombie)
            .is_none());
    };
}

pub fn start_fib() -> Debugger {
    let child = Child::spawn(FIB_APP, Vec::<String>::new()).unwrap();
    Debugger::new(child).unwrap()
}

#[test]
#[serial]
fn test_debugger_graceful_shutdown() {
    let debugger = start_fib();
    let pid = debugger.pid();
    mem::drop(debugger);

    assert_no_proc!(pid);
}

#[test]
#[serial]
fn test_run_until_exit() {
    let mut debugger = start_fib();
    let err = debugger.continue_execution().unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, lookout::debugger::Error::ProcessExit(0)));
}

#[test]
#[serial]
fn test_spawn_with_args() {
    let child = Child::spawn(FIB_APP, ["-n", "10"]).unwrap();
    assert_eq!(child.program(), FIB_APP);
    assert_eq!(child.args(), &["-n".to_string(), "10".to_string()]);
    assert!(!child.is_external());

    let debugger = Debugger::new(child).unwrap();
    let pid = debugger.pid();
    mem::drop(debugger);
    assert_no_proc!(pid);
}
