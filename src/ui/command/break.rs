use crate::debugger::address::RelocatedAddress;
use crate::debugger::{Debugger, Error};

#[derive(Debug, Clone, PartialEq)]
pub enum BreakpointIdentity {
    Address(usize),
    Function(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(BreakpointIdentity),
    Remove(usize),
}

pub enum ExecutionResult {
    New(u32, BreakpointIdentity),
    Removed(u32),
}

pub struct Handler<'a> {
    dbg: &'a mut Debugger,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a mut Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self, cmd: &Command) -> Result<ExecutionResult, Error> {
        let result = match cmd {
            Command::Add(brkpt) => {
                let number = match brkpt {
                    BreakpointIdentity::Address(addr) => {
                        self.dbg.set_breakpoint(RelocatedAddress::from(*addr))?
                    }
                    BreakpointIdentity::Function(name) => self.dbg.set_breakpoint_at_symbol(name)?,
                };
                ExecutionResult::New(number, brkpt.clone())
            }
            Command::Remove(addr) => {
                ExecutionResult::Removed(self.dbg.remove_breakpoint(RelocatedAddress::from(*addr))?)
            }
        };
        Ok(result)
    }
}
