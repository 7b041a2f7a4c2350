use nix::libc::user_regs_struct;
use nix::sys;
use nix::unistd::Pid;
use strum_macros::Display;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Register {
    Rax,
    Rbx,
    Rcx,
    Rdx,
    Rdi,
    Rsi,
    Rbp,
    Rsp,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
    Rip,
}

/// Register layout of a target architecture.
///
/// Frame and stack pointer slots are optional, not every architecture defines them.
#[derive(Debug, Clone, PartialEq)]
pub struct Arch {
    /// Pointer size in bytes.
    pub ptr_size: usize,
    /// General purpose registers in display order.
    pub gpr: &'static [Register],
    pub frame: Option<Register>,
    pub stack: Option<Register>,
    pub pc: Register,
}

pub const X86_64: Arch = Arch {
    ptr_size: 8,
    gpr: &[
        Register::Rax,
        Register::Rbx,
        Register::Rcx,
        Register::Rdx,
        Register::Rdi,
        Register::Rsi,
        Register::R8,
        Register::R9,
        Register::R10,
        Register::R11,
        Register::R12,
        Register::R13,
        Register::R14,
        Register::R15,
    ],
    frame: Some(Register::Rbp),
    stack: Some(Register::Rsp),
    pc: Register::Rip,
};

impl Arch {
    /// Registers shown in a context: general purpose registers followed by
    /// frame pointer, stack pointer and program counter (absent slots skipped).
    pub fn context_registers(&self) -> impl Iterator<Item = Register> + '_ {
        self.gpr
            .iter()
            .copied()
            .chain(self.frame)
            .chain(self.stack)
            .chain(Some(self.pc))
    }
}

pub struct RegisterMap(user_regs_struct);

impl From<user_regs_struct> for RegisterMap {
    fn from(value: user_regs_struct) -> Self {
        Self(value)
    }
}

impl From<RegisterMap> for user_regs_struct {
    fn from(reg_map: RegisterMap) -> user_regs_struct {
        reg_map.0
    }
}

impl RegisterMap {
    pub fn current(pid: Pid) -> nix::Result<Self> {
        let regs = sys::ptrace::getregs(pid)?;
        Ok(regs.into())
    }

    fn slot(&mut self, register: Register) -> &mut u64 {
        let regs = &mut self.0;
        match register {
            Register::Rax => &mut regs.rax,
            Register::Rbx => &mut regs.rbx,
            Register::Rcx => &mut regs.rcx,
            Register::Rdx => &mut regs.rdx,
            Register::Rdi => &mut regs.rdi,
            Register::Rsi => &mut regs.rsi,
            Register::Rbp => &mut regs.rbp,
            Register::Rsp => &mut regs.rsp,
            Register::R8 => &mut regs.r8,
            Register::R9 => &mut regs.r9,
            Register::R10 => &mut regs.r10,
            Register::R11 => &mut regs.r11,
            Register::R12 => &mut regs.r12,
            Register::R13 => &mut regs.r13,
            Register::R14 => &mut regs.r14,
            Register::R15 => &mut regs.r15,
            Register::Rip => &mut regs.rip,
        }
    }

    pub fn value(&self, register: Register) -> u64 {
        *RegisterMap(self.0).slot(register)
    }

    pub fn update(&mut self, register: Register, value: u64) {
        *self.slot(register) = value;
    }

    pub fn persist(self, pid: Pid) -> nix::Result<()> {
        sys::ptrace::setregs(pid, self.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_context_registers_order() {
        let regs: Vec<_> = X86_64.context_registers().collect();
        assert_eq!(regs.len(), X86_64.gpr.len() + 3);
        assert_eq!(regs[0], Register::Rax);
        assert_eq!(
            &regs[regs.len() - 3..],
            &[Register::Rbp, Register::Rsp, Register::Rip]
        );
    }

    #[test]
    fn test_context_registers_skip_absent_slots() {
        let arch = Arch {
            frame: None,
            stack: None,
            ..X86_64
        };
        let regs: Vec<_> = arch.context_registers().collect();
        assert_eq!(regs.len(), X86_64.gpr.len() + 1);
        assert_eq!(regs.last(), Some(&Register::Rip));
    }

    #[test]
    fn test_register_names() {
        let names: Vec<_> = X86_64.context_registers().map(|r| r.to_string()).collect();
        assert_eq!(names[0], "rax");
        assert_eq!(names[6], "r8");
        assert_eq!(&names[names.len() - 3..], &["rbp", "rsp", "rip"]);
    }
}
