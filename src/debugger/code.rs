/// Process breakpoint
pub const TRAP_BRKPT: i32 = 0x1;
/// Process trace trap
pub const TRAP_TRACE: i32 = 0x2;
/// Sent by the kernel from somewhere
pub const SI_KERNEL: i32 = 0x80;
