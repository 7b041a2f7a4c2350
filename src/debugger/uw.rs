use crate::context::StackFrame;
use crate::debugger::address::RelocatedAddress;
use std::rc::Rc;

/// Maximum number of frames collected by a single unwind.
pub const MAX_UNWIND_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub pc: RelocatedAddress,
    pub func_name: Option<String>,
}

/// A frame of an unwound call stack, links to the next older frame by index.
#[derive(Debug, Clone)]
pub struct Frame {
    frames: Rc<[FrameRecord]>,
    idx: usize,
}

impl Frame {
    /// Return innermost frame of a call stack, [`None`] if stack is empty.
    pub fn innermost(frames: Vec<FrameRecord>) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        Some(Self {
            frames: frames.into(),
            idx: 0,
        })
    }
}

impl StackFrame for Frame {
    fn pc(&self) -> RelocatedAddress {
        self.frames[self.idx].pc
    }

    fn name(&self) -> Option<String> {
        self.frames[self.idx].func_name.clone()
    }

    fn older(&self) -> Option<Self> {
        let idx = self.idx + 1;
        (idx < self.frames.len()).then(|| Self {
            frames: self.frames.clone(),
            idx,
        })
    }
}

/// Walk a call stack by following saved frame pointers, starting at `pc` and frame
/// pointer `fp`. Each frame stores the previous frame pointer at `fp` and the return
/// address at `fp + ptr_size`.
///
/// Walk stops at a null or non-increasing frame pointer, so the result is always finite.
pub fn frame_pointer_walk(
    pc: u64,
    fp: u64,
    ptr_size: u64,
    read_ptr: impl Fn(u64) -> Option<u64>,
) -> Vec<u64> {
    let mut pcs = vec![pc];
    let mut fp = fp;

    while pcs.len() < MAX_UNWIND_DEPTH && fp != 0 {
        let Some(ret_addr) = read_ptr(fp.wrapping_add(ptr_size)) else {
            break;
        };
        let Some(next_fp) = read_ptr(fp) else {
            break;
        };
        if ret_addr == 0 {
            break;
        }
        pcs.push(ret_addr);
        if next_fp <= fp {
            break;
        }
        fp = next_fp;
    }

    pcs
}

#[cfg(feature = "libunwind")]
pub fn backtrace(pid: nix::unistd::Pid) -> unwind::Result<Vec<FrameRecord>> {
    use unwind::{Accessors, AddressSpace, Byteorder, Cursor, PTraceState, RegNum};

    let state = PTraceState::new(pid.as_raw() as u32)?;
    let address_space = AddressSpace::new(Accessors::ptrace(), Byteorder::DEFAULT)?;
    let mut cursor = Cursor::remote(&address_space, &state)?;
    let mut backtrace = vec![];

    loop {
        let ip = cursor.register(RegNum::IP)?;
        let func_name = cursor
            .procedure_name()
            .ok()
            .map(|name| format!("{:#}", rustc_demangle::demangle(name.name())));

        backtrace.push(FrameRecord {
            pc: RelocatedAddress::from(ip),
            func_name,
        });

        if backtrace.len() >= MAX_UNWIND_DEPTH || !cursor.step()? {
            break;
        }
    }

    Ok(backtrace)
}
