use crate::context::Backend;
use crate::debugger::address::RelocatedAddress;
use crate::debugger::register::{Arch, Register};
use crate::debugger::Error;
use crate::muted_error;

/// Register values of a stopped thread, captured once per render.
#[derive(Debug, Clone)]
pub struct Snapshot {
    arch: Arch,
    /// Context registers in display order, `None` if a register is unreadable.
    registers: Vec<(Register, Option<u64>)>,
}

impl Snapshot {
    pub fn capture<B: Backend>(backend: &B) -> Self {
        let arch = backend.arch().clone();
        let registers = arch
            .context_registers()
            .map(|reg| (reg, muted_error!(backend.read_register(reg))))
            .collect();
        Self { arch, registers }
    }

    pub fn registers(&self) -> &[(Register, Option<u64>)] {
        &self.registers
    }

    pub fn value(&self, register: Register) -> Option<u64> {
        self.registers
            .iter()
            .find(|(r, _)| *r == register)
            .and_then(|(_, v)| *v)
    }

    fn address(&self, register: Register) -> Result<RelocatedAddress, Error> {
        self.value(register)
            .map(RelocatedAddress::from)
            .ok_or(Error::RegisterNotFound(register))
    }

    pub fn pc(&self) -> Result<RelocatedAddress, Error> {
        self.address(self.arch.pc)
    }

    pub fn sp(&self) -> Result<RelocatedAddress, Error> {
        let stack = self.arch.stack.ok_or(Error::NoRegisterSlot("stack pointer"))?;
        self.address(stack)
    }

    /// Registers whose values equal the given address.
    pub fn registers_pointing_to(&self, addr: RelocatedAddress) -> Vec<Register> {
        self.registers
            .iter()
            .filter(|(_, v)| *v == Some(addr.as_u64()))
            .map(|(r, _)| *r)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::fake::FakeBackend;

    #[test]
    fn test_snapshot_capture() {
        let mut backend = FakeBackend::sample();
        backend.registers.remove(&Register::Rax);
        let snapshot = Snapshot::capture(&backend);

        assert_eq!(
            snapshot.registers().len(),
            backend.arch().context_registers().count()
        );
        assert_eq!(snapshot.registers()[0], (Register::Rax, None));
        assert_eq!(snapshot.pc().unwrap(), RelocatedAddress::from(0x401000_u64));
        assert_eq!(snapshot.sp().unwrap(), RelocatedAddress::from(0x7ffee0_u64));
        assert!(snapshot
            .registers_pointing_to(RelocatedAddress::from(0x7ffee0_u64))
            .contains(&Register::Rsp));
    }

    #[test]
    fn test_snapshot_without_stack_slot() {
        let mut backend = FakeBackend::sample();
        backend.arch.stack = None;
        let snapshot = Snapshot::capture(&backend);
        assert!(matches!(snapshot.sp(), Err(Error::NoRegisterSlot(_))));
        assert!(snapshot.value(Register::Rsp).is_none());
    }
}
