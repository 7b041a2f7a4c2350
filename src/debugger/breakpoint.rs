use crate::debugger::address::RelocatedAddress;
use nix::libc::c_void;
use nix::sys;
use nix::unistd::Pid;
use std::cell::Cell;

impl RelocatedAddress {
    fn as_ptr(self) -> *mut c_void {
        usize::from(self) as *mut c_void
    }
}

/// Software breakpoint (`int3` patched into the code).
pub struct Breakpoint {
    pub addr: RelocatedAddress,
    pub number: u32,
    pid: Pid,
    saved_data: Cell<u8>,
    enabled: Cell<bool>,
}

impl Breakpoint {
    pub fn new(addr: RelocatedAddress, pid: Pid, number: u32) -> Self {
        Self {
            addr,
            number,
            pid,
            enabled: Default::default(),
            saved_data: Default::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Original byte replaced by `int3`.
    pub fn saved_data(&self) -> u8 {
        self.saved_data.get()
    }

    pub fn enable(&self) -> nix::Result<()> {
        let data = sys::ptrace::read(self.pid, self.addr.as_ptr())?;
        self.saved_data.set((data & 0xff) as u8);
        let int3 = 0xCC_u64;
        let data_with_pb = (data & !0xff) as u64 | int3;
        unsafe {
            sys::ptrace::write(self.pid, self.addr.as_ptr(), data_with_pb as *mut c_void)?;
        }
        self.enabled.set(true);

        Ok(())
    }

    pub fn disable(&self) -> nix::Result<()> {
        let data = sys::ptrace::read(self.pid, self.addr.as_ptr())? as u64;
        let restored: u64 = (data & !0xff) | self.saved_data.get() as u64;
        unsafe {
            sys::ptrace::write(self.pid, self.addr.as_ptr(), restored as *mut c_void)?;
        }
        self.enabled.set(false);

        Ok(())
    }
}
