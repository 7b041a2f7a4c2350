pub mod address;
pub mod breakpoint;
mod code;
pub mod disasm;
pub mod error;
pub mod process;
pub mod register;
pub mod symbol;
pub mod uw;
pub mod vmmap;

pub use error::Error;

use crate::context::Backend;
use crate::debugger::address::RelocatedAddress;
use crate::debugger::breakpoint::Breakpoint;
use crate::debugger::disasm::{Disassembler, Instruction, MAX_INSTRUCTION_LEN};
use crate::debugger::error::Error::{Ptrace, Waitpid};
use crate::debugger::process::Child;
use crate::debugger::register::{Arch, Register, RegisterMap, X86_64};
use crate::debugger::symbol::SymbolRegistry;
use crate::debugger::uw::{Frame, FrameRecord};
use crate::debugger::vmmap::{MemoryMap, Region};
use crate::{muted_error, weak_error};
use log::{debug, info};
use nix::errno::Errno;
use nix::libc::{c_long, c_void};
use nix::sys;
use nix::sys::signal::Signal;
use nix::sys::uio::{process_vm_readv, RemoteIoVec};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;
use std::collections::HashMap;
use std::io::IoSliceMut;
use std::mem;

/// Reason of a process stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopReason {
    /// Process stopped right after start or attach.
    Start,
    /// Single instruction step finished.
    Step,
    Breakpoint { number: u32, addr: RelocatedAddress },
    /// Process received a signal, it will be delivered on the next resume.
    Signal(Signal),
}

/// Single threaded `ptrace` debugger.
pub struct Debugger {
    process: Child,
    arch: Arch,
    disassembler: Disassembler,
    vmmap: MemoryMap,
    symbols: SymbolRegistry,
    breakpoints: HashMap<RelocatedAddress, Breakpoint>,
    next_bp_number: u32,
    pending_signal: Option<Signal>,
    exited: bool,
}

impl Debugger {
    pub fn new(process: Child) -> Result<Self, Error> {
        let vmmap = MemoryMap::new(process.pid());
        weak_error!(vmmap.refresh(), "initial memory map:");

        Ok(Self {
            arch: X86_64,
            disassembler: Disassembler::new()?,
            vmmap,
            symbols: SymbolRegistry::new(),
            breakpoints: HashMap::new(),
            next_bp_number: 1,
            pending_signal: None,
            exited: false,
            process,
        })
    }

    pub fn pid(&self) -> Pid {
        self.process.pid()
    }

    pub fn process(&self) -> &Child {
        &self.process
    }

    /// Set a software breakpoint. Return the breakpoint number, an existing
    /// breakpoint at the same address keeps its number.
    pub fn set_breakpoint(&mut self, addr: RelocatedAddress) -> Result<u32, Error> {
        self.check_alive()?;
        if let Some(bp) = self.breakpoints.get(&addr) {
            return Ok(bp.number);
        }
        self.vmmap.find(addr).ok_or(Error::UnknownAddress(addr))?;

        let bp = Breakpoint::new(addr, self.pid(), self.next_bp_number);
        bp.enable().map_err(Ptrace)?;
        self.next_bp_number += 1;

        debug!(target: "debugger", "breakpoint #{} set at {addr}", bp.number);
        let number = bp.number;
        self.breakpoints.insert(addr, bp);
        Ok(number)
    }

    /// Set a breakpoint at the start of a function found in symbol tables.
    pub fn set_breakpoint_at_symbol(&mut self, name: &str) -> Result<u32, Error> {
        self.check_alive()?;
        self.vmmap.refresh()?;
        let addr = self
            .symbols
            .address_of(&self.vmmap, name)
            .ok_or_else(|| Error::SymbolNotFound(name.to_string()))?;
        self.set_breakpoint(addr)
    }

    /// Remove a breakpoint and restore the original code.
    pub fn remove_breakpoint(&mut self, addr: RelocatedAddress) -> Result<u32, Error> {
        let bp = self
            .breakpoints
            .remove(&addr)
            .ok_or(Error::BreakpointNotFound(addr))?;
        if bp.is_enabled() {
            bp.disable().map_err(Ptrace)?;
        }
        Ok(bp.number)
    }

    fn pc(&self) -> Result<RelocatedAddress, Error> {
        self.read_register(self.arch.pc).map(RelocatedAddress::from)
    }

    fn enabled_breakpoint_at(&self, addr: RelocatedAddress) -> bool {
        self.breakpoints
            .get(&addr)
            .map(|bp| bp.is_enabled())
            .unwrap_or_default()
    }

    /// Execute exactly one instruction. A breakpoint at the current instruction
    /// is stepped over.
    pub fn step_instruction(&mut self) -> Result<StopReason, Error> {
        self.check_alive()?;
        let pc = self.pc()?;
        let signal = self.pending_signal.take();

        let at_breakpoint = self.enabled_breakpoint_at(pc);
        if at_breakpoint {
            self.breakpoints[&pc].disable().map_err(Ptrace)?;
        }
        sys::ptrace::step(self.pid(), signal).map_err(Ptrace)?;
        let reason = self.wait_stop();
        if at_breakpoint && !self.exited {
            self.breakpoints[&pc].enable().map_err(Ptrace)?;
        }
        reason
    }

    /// Resume execution until the next breakpoint, signal or exit.
    pub fn continue_execution(&mut self) -> Result<StopReason, Error> {
        self.check_alive()?;
        let pc = self.pc()?;

        if self.enabled_breakpoint_at(pc) {
            match self.step_instruction()? {
                StopReason::Step => {}
                // signal or another breakpoint right after the current one
                reason => return Ok(reason),
            }
        }

        let signal = self.pending_signal.take();
        sys::ptrace::cont(self.pid(), signal).map_err(Ptrace)?;
        self.wait_stop()
    }

    fn wait_stop(&mut self) -> Result<StopReason, Error> {
        let pid = self.pid();
        loop {
            let status = waitpid(pid, None).map_err(Waitpid)?;
            self.vmmap.invalidate();

            match status {
                WaitStatus::Exited(_, code) => {
                    self.exited = true;
                    info!(target: "debugger", "process {pid} exited with code {code}");
                    return Err(Error::ProcessExit(code));
                }
                WaitStatus::Signaled(_, signal, _) => {
                    self.exited = true;
                    info!(target: "debugger", "process {pid} killed by {signal}");
                    return Err(Error::ProcessKilled(signal));
                }
                WaitStatus::Stopped(_, Signal::SIGTRAP) => {
                    let info = sys::ptrace::getsiginfo(pid).map_err(Ptrace)?;
                    return match info.si_code {
                        code::TRAP_TRACE => Ok(StopReason::Step),
                        code::TRAP_BRKPT | code::SI_KERNEL => self.on_breakpoint_trap(),
                        _ => Ok(StopReason::Signal(Signal::SIGTRAP)),
                    };
                }
                WaitStatus::Stopped(_, signal) => {
                    self.pending_signal = Some(signal);
                    return Ok(StopReason::Signal(signal));
                }
                WaitStatus::PtraceEvent(_, signal, nix::libc::PTRACE_EVENT_STOP) => {
                    return Ok(StopReason::Signal(signal));
                }
                status => {
                    debug!(target: "debugger", "skip wait status: {status:?}");
                    sys::ptrace::cont(pid, None).map_err(Ptrace)?;
                }
            }
        }
    }

    /// Rewind pc to the breakpoint address, int3 is already executed.
    fn on_breakpoint_trap(&self) -> Result<StopReason, Error> {
        let pc = self.pc()?;
        let addr = pc.offset(-1);
        let Some(bp) = self.breakpoints.get(&addr) else {
            return Ok(StopReason::Signal(Signal::SIGTRAP));
        };

        let mut regs = RegisterMap::current(self.pid()).map_err(Ptrace)?;
        regs.update(self.arch.pc, addr.as_u64());
        regs.persist(self.pid()).map_err(Ptrace)?;

        Ok(StopReason::Breakpoint {
            number: bp.number,
            addr,
        })
    }

    fn frames(&self) -> Vec<FrameRecord> {
        #[cfg(feature = "libunwind")]
        {
            let frames = weak_error!(uw::backtrace(self.pid()), "unwind:").unwrap_or_default();
            if !frames.is_empty() {
                return self.with_symbols(frames);
            }
        }

        let Some(regs) = muted_error!(RegisterMap::current(self.pid())) else {
            return vec![];
        };
        let fp = self.arch.frame.map(|r| regs.value(r)).unwrap_or_default();
        let pcs = uw::frame_pointer_walk(
            regs.value(self.arch.pc),
            fp,
            self.arch.ptr_size as u64,
            |addr| muted_error!(self.read_pointer(RelocatedAddress::from(addr))),
        );
        self.with_symbols(
            pcs.into_iter()
                .map(|pc| FrameRecord {
                    pc: RelocatedAddress::from(pc),
                    func_name: None,
                })
                .collect(),
        )
    }

    fn with_symbols(&self, mut frames: Vec<FrameRecord>) -> Vec<FrameRecord> {
        for frame in frames.iter_mut().filter(|f| f.func_name.is_none()) {
            frame.func_name = self.symbols.lookup(&self.vmmap, frame.pc);
        }
        frames
    }
}

impl Drop for Debugger {
    fn drop(&mut self) {
        if self.exited {
            return;
        }
        for bp in self.breakpoints.values().filter(|bp| bp.is_enabled()) {
            weak_error!(bp.disable(), "remove breakpoint:");
        }

        let pid = self.pid();
        if self.process.is_external() {
            weak_error!(sys::ptrace::detach(pid, None), "detach:");
        } else {
            weak_error!(sys::signal::kill(pid, Signal::SIGKILL), "kill:");
            muted_error!(waitpid(pid, None));
        }
    }
}

/// Read N bytes from process memory with `PTRACE_PEEKDATA`, one word at a time.
pub fn read_memory_by_pid(pid: Pid, addr: usize, read_n: usize) -> nix::Result<Vec<u8>> {
    let mut read_reminder = read_n as isize;
    let mut result = Vec::with_capacity(read_n);

    let single_read_size = mem::size_of::<c_long>();

    let mut addr = addr as *mut c_long;
    while read_reminder > 0 {
        let value = sys::ptrace::read(pid, addr as *mut c_void)?;
        result.extend(value.to_ne_bytes().into_iter().take(read_reminder as usize));

        read_reminder -= single_read_size as isize;
        addr = addr.wrapping_add(1);
    }

    debug_assert!(result.len() == read_n);

    Ok(result)
}

/// Read N bytes from process memory with a single `process_vm_readv` call.
fn read_memory_vectored(pid: Pid, addr: usize, read_n: usize) -> nix::Result<Vec<u8>> {
    let mut buff = vec![0; read_n];
    let remote_iov = RemoteIoVec {
        base: addr,
        len: read_n,
    };
    let read = process_vm_readv(pid, &mut [IoSliceMut::new(&mut buff)], &[remote_iov])?;
    if read != read_n {
        return Err(Errno::EFAULT);
    }
    Ok(buff)
}

impl Backend for Debugger {
    type Frame = Frame;

    fn arch(&self) -> &Arch {
        &self.arch
    }

    fn check_alive(&self) -> Result<(), Error> {
        if self.exited {
            return Err(Error::ProcessNotStarted);
        }
        sys::signal::kill(self.pid(), None).map_err(|_| Error::ProcessNotStarted)
    }

    fn read_register(&self, register: Register) -> Result<u64, Error> {
        let regs = RegisterMap::current(self.pid()).map_err(Ptrace)?;
        Ok(regs.value(register))
    }

    /// Read process memory, breakpoint instructions are replaced by original bytes.
    fn read_memory(&self, addr: RelocatedAddress, len: usize) -> Result<Vec<u8>, Error> {
        let mut data = match read_memory_vectored(self.pid(), addr.as_usize(), len) {
            Ok(data) => data,
            Err(e) => {
                debug!(target: "debugger", "process_vm_readv at {addr}: {e}, fallback to ptrace");
                read_memory_by_pid(self.pid(), addr.as_usize(), len)
                    .map_err(|_| Error::UnknownAddress(addr))?
            }
        };

        let end = addr.offset(len as isize);
        for bp in self
            .breakpoints
            .values()
            .filter(|bp| bp.is_enabled() && bp.addr >= addr && bp.addr < end)
        {
            data[bp.addr.distance_from(addr)] = bp.saved_data();
        }
        Ok(data)
    }

    fn disasm_window(
        &self,
        start: RelocatedAddress,
        max_count: usize,
    ) -> Result<Vec<Instruction>, Error> {
        let region = self
            .vmmap
            .find(start)
            .ok_or(Error::UnknownAddress(start))?;
        let len = (max_count * MAX_INSTRUCTION_LEN).min(region.end.distance_from(start));
        let code = self.read_memory(start, len)?;
        self.disassembler.disasm_window(&code, start, max_count)
    }

    fn lookup_symbol(&self, addr: RelocatedAddress) -> Option<String> {
        self.symbols.lookup(&self.vmmap, addr)
    }

    fn find_region(&self, addr: RelocatedAddress) -> Option<Region> {
        self.vmmap.find(addr)
    }

    fn current_frame(&self) -> Option<Frame> {
        Frame::innermost(self.frames())
    }
}
