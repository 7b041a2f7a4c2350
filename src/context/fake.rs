//! In-memory backend for view tests.

use crate::config::ContextConfig;
use crate::context::{Backend, StackFrame};
use crate::debugger::address::RelocatedAddress;
use crate::debugger::disasm::Instruction;
use crate::debugger::register::{Arch, Register, X86_64};
use crate::debugger::vmmap::Region;
use crate::debugger::Error;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::rc::Rc;

pub const CODE_START: u64 = 0x401000;
pub const DATA_START: u64 = 0x601000;
pub const STACK_POINTER: u64 = 0x7ffee0;

#[derive(Clone, Debug)]
pub struct FakeFrame {
    frames: Rc<Vec<(u64, Option<String>)>>,
    idx: usize,
}

impl StackFrame for FakeFrame {
    fn pc(&self) -> RelocatedAddress {
        RelocatedAddress::from(self.frames[self.idx].0)
    }

    fn name(&self) -> Option<String> {
        self.frames[self.idx].1.clone()
    }

    fn older(&self) -> Option<Self> {
        (self.idx + 1 < self.frames.len()).then(|| Self {
            frames: self.frames.clone(),
            idx: self.idx + 1,
        })
    }
}

pub struct FakeBackend {
    pub arch: Arch,
    pub alive: bool,
    pub registers: HashMap<Register, u64>,
    pub regions: Vec<Region>,
    pub memory: BTreeMap<u64, u8>,
    pub instructions: Vec<Instruction>,
    pub symbols: HashMap<u64, String>,
    pub frames: Vec<(u64, Option<String>)>,
    pub region_lookups: RefCell<Vec<RelocatedAddress>>,
}

fn region(start: u64, end: u64, write: bool, exec: bool, name: &str) -> Region {
    Region {
        start: RelocatedAddress::from(start),
        end: RelocatedAddress::from(end),
        read: true,
        write,
        exec,
        name: Some(PathBuf::from(name)),
        offset: 0,
    }
}

fn instruction(address: u64, size: usize, mnemonic: &str, operands: &str) -> Instruction {
    Instruction {
        address: RelocatedAddress::from(address),
        size,
        mnemonic: Some(mnemonic.to_string()),
        operands: Some(operands.to_string()),
    }
}

impl FakeBackend {
    /// Empty process: no registers, no memory, no frames.
    pub fn empty() -> Self {
        Self {
            arch: X86_64,
            alive: true,
            registers: HashMap::new(),
            regions: vec![],
            memory: BTreeMap::new(),
            instructions: vec![],
            symbols: HashMap::new(),
            frames: vec![],
            region_lookups: RefCell::default(),
        }
    }

    /// Process stopped at `main` with a small stack:
    /// slots at 0x7ffee0 contain `[0x1, 0x400000, 0x7ffee8, 0x0, 0x5, 0x6, 0x7, 0x8]`,
    /// 0x400000 is unmapped.
    pub fn sample() -> Self {
        let mut backend = Self::empty();

        backend.regions = vec![
            region(CODE_START, CODE_START + 0x1000, false, true, "/bin/app"),
            region(DATA_START, DATA_START + 0x1000, true, false, "/bin/app"),
            region(0x7ff000, 0x800000, true, false, "[stack]"),
        ];

        for (i, reg) in X86_64.gpr.iter().enumerate() {
            backend.registers.insert(*reg, i as u64);
        }
        backend.registers.insert(Register::Rbx, STACK_POINTER + 0x10);
        backend.registers.insert(Register::Rcx, DATA_START);
        backend.registers.insert(Register::Rbp, STACK_POINTER + 0x40);
        backend.registers.insert(Register::Rsp, STACK_POINTER);
        backend.registers.insert(Register::Rip, CODE_START);

        let stack = [0x1, 0x400000, 0x7ffee8, 0x0, 0x5, 0x6, 0x7, 0x8];
        for (i, value) in stack.into_iter().enumerate() {
            backend.write_ptr(STACK_POINTER + i as u64 * 8, value);
        }
        // two pointers referencing each other
        backend.write_ptr(DATA_START, DATA_START + 8);
        backend.write_ptr(DATA_START + 8, DATA_START);

        backend.instructions = vec![
            instruction(CODE_START, 1, "push", "rbp"),
            instruction(CODE_START + 1, 3, "mov", "rbp, rsp"),
            instruction(CODE_START + 4, 4, "sub", "rsp, 0x10"),
            instruction(CODE_START + 8, 1, "nop", ""),
            instruction(CODE_START + 9, 1, "ret", ""),
        ];
        backend.symbols = HashMap::from([
            (CODE_START, "main".to_string()),
            (CODE_START + 4, "main+0x4".to_string()),
        ]);
        backend.frames = vec![
            (CODE_START, Some("main".to_string())),
            (CODE_START + 0x100, None),
            (CODE_START + 0x200, Some("_start".to_string())),
        ];

        backend
    }

    pub fn config() -> ContextConfig {
        ContextConfig {
            width: Some(40),
            ..ContextConfig::default()
        }
    }

    pub fn write_ptr(&mut self, addr: u64, value: u64) {
        for (i, b) in value.to_ne_bytes().into_iter().enumerate() {
            self.memory.insert(addr + i as u64, b);
        }
    }
}

impl Backend for FakeBackend {
    type Frame = FakeFrame;

    fn arch(&self) -> &Arch {
        &self.arch
    }

    fn check_alive(&self) -> Result<(), Error> {
        if self.alive {
            Ok(())
        } else {
            Err(Error::ProcessNotStarted)
        }
    }

    fn read_register(&self, register: Register) -> Result<u64, Error> {
        self.registers
            .get(&register)
            .copied()
            .ok_or(Error::RegisterNotFound(register))
    }

    fn read_memory(&self, addr: RelocatedAddress, len: usize) -> Result<Vec<u8>, Error> {
        (0..len as u64)
            .map(|i| {
                self.memory
                    .get(&(addr.as_u64() + i))
                    .copied()
                    .ok_or(Error::UnknownAddress(addr))
            })
            .collect()
    }

    fn disasm_window(
        &self,
        start: RelocatedAddress,
        max_count: usize,
    ) -> Result<Vec<Instruction>, Error> {
        Ok(self
            .instructions
            .iter()
            .filter(|i| i.address >= start)
            .take(max_count)
            .cloned()
            .collect())
    }

    fn lookup_symbol(&self, addr: RelocatedAddress) -> Option<String> {
        self.symbols.get(&addr.as_u64()).cloned()
    }

    fn find_region(&self, addr: RelocatedAddress) -> Option<Region> {
        self.region_lookups.borrow_mut().push(addr);
        self.regions.iter().find(|r| r.contains(addr)).cloned()
    }

    fn current_frame(&self) -> Option<Self::Frame> {
        if self.frames.is_empty() {
            return None;
        }
        Some(FakeFrame {
            frames: Rc::new(self.frames.clone()),
            idx: 0,
        })
    }
}
