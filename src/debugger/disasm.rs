use crate::debugger::address::RelocatedAddress;
use crate::debugger::Error;
use capstone::prelude::*;

/// Maximum length of a single x86-64 instruction.
pub const MAX_INSTRUCTION_LEN: usize = 15;

/// Single assembly instruction.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    /// Address in process memory.
    pub address: RelocatedAddress,
    /// Instruction length in bytes.
    pub size: usize,
    /// Instruction mnemonic.
    pub mnemonic: Option<String>,
    /// Operands string representation.
    pub operands: Option<String>,
}

/// Decode raw machine code into instructions.
pub struct Disassembler {
    cs: Capstone,
}

impl Disassembler {
    /// Create a new [`Disassembler`].
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            cs: Capstone::new()
                .x86()
                .mode(arch::x86::ArchMode::Mode64)
                .syntax(arch::x86::ArchSyntax::Intel)
                .build()
                .map_err(Error::DisAsmInit)?,
        })
    }

    /// Decode up to `count` instructions from `code` located at address `start`.
    /// Decoding stops early at the first byte sequence that is not a valid instruction.
    pub fn disasm_window(
        &self,
        code: &[u8],
        start: RelocatedAddress,
        count: usize,
    ) -> Result<Vec<Instruction>, Error> {
        let instructions = self
            .cs
            .disasm_count(code, start.as_u64(), count)
            .map_err(Error::DisAsm)?
            .iter()
            .map(|i| Instruction {
                address: i.address().into(),
                size: i.bytes().len(),
                mnemonic: i.mnemonic().map(ToString::to_string),
                operands: i.op_str().map(ToString::to_string),
            })
            .collect();
        Ok(instructions)
    }
}
