use crate::start_fib;
use lookout::config::{ContextConfig, Theme};
use lookout::context::chain::ChainResolver;
use lookout::context::stack::Telescope;
use lookout::context::{Backend, Dashboard, SectionSet};
use lookout::debugger::address::RelocatedAddress;
use lookout::debugger::register::Register;
use lookout::debugger::StopReason;
use serial_test::serial;

fn config() -> ContextConfig {
    ContextConfig {
        width: Some(80),
        ..ContextConfig::default()
    }
}

#[test]
#[serial]
fn test_render_after_start() {
    let debugger = start_fib();
    let config = config();
    let report = Dashboard::new(&debugger, &config, Theme::None)
        .render(SectionSet::all())
        .unwrap();
    let text = report.to_string();

    assert!(report.lines()[0].starts_with("LEGEND:"));
    for banner in ["[ REGISTERS ]", "[ CODE ]", "[ STACK ]", "[ BACKTRACE ]"] {
        assert!(text.contains(banner), "{banner} expected");
    }
    assert!(text.contains("RIP "));
    assert!(text.contains("RSP "));
    let current = report.lines().iter().filter(|l| l.starts_with(" =>"));
    assert_eq!(current.count(), 1);
    assert!(text.contains("00:0000│ "));
    assert!(text.contains("f 0 0x"));
}

#[test]
#[serial]
fn test_render_at_breakpoint() {
    let mut debugger = start_fib();
    debugger.set_breakpoint_at_symbol("fib::fibonacci").unwrap();
    let reason = debugger.continue_execution().unwrap();
    assert!(matches!(reason, StopReason::Breakpoint { .. }));

    let config = config();
    let report = Dashboard::new(&debugger, &config, Theme::None)
        .render(SectionSet::from_selectors(&["c", "b"]))
        .unwrap();
    let text = report.to_string();

    assert!(!text.contains("[ REGISTERS ]"));
    assert!(text.contains("<fib::fibonacci>"));
    assert!(text.contains("fib::main"));
    // breakpoint instruction is not shown in the code window
    assert!(!text.contains("int3"));
}

#[test]
#[serial]
fn test_telescope_stack() {
    let debugger = start_fib();
    let sp = debugger.read_register(Register::Rsp).unwrap();

    let lines = Telescope::new(&debugger, ChainResolver::new(5), Theme::None)
        .render(RelocatedAddress::from(sp as usize), 4);
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("00:0000│ "));
    assert!(lines[3].starts_with("03:0018│ "));
}

#[test]
#[serial]
fn test_render_after_exit() {
    let mut debugger = start_fib();
    debugger.continue_execution().unwrap_err();

    let config = config();
    assert!(Dashboard::new(&debugger, &config, Theme::None)
        .render(SectionSet::all())
        .is_err());
}
