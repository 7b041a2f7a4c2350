use crate::debugger::address::RelocatedAddress;
use crate::debugger::register::Register;
use nix::unistd::Pid;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- generic errors --------------------------------------------
    #[error(transparent)]
    IO(#[from] std::io::Error),

    // --------------------------------- debugger entity not found----------------------------------
    #[error("register {0} unavailable")]
    RegisterNotFound(Register),
    #[error("{0} register is not defined for this architecture")]
    NoRegisterSlot(&'static str),
    #[error("symbol `{0}` not found")]
    SymbolNotFound(String),
    #[error("no breakpoint at {0}")]
    BreakpointNotFound(RelocatedAddress),

    // --------------------------------- remote memory errors --------------------------------------
    #[error("address {0} is not mapped")]
    UnknownAddress(RelocatedAddress),
    #[error("invalid binary representation of type `{0}`: {1:?}")]
    TypeBinaryRepr(&'static str, Box<[u8]>),

    // --------------------------------- syscall errors --------------------------------------------
    #[error("waitpid syscall error: {0}")]
    Waitpid(nix::Error),
    #[error("ptrace syscall error: {0}")]
    Ptrace(nix::Error),
    #[error("{0} syscall error: {1}")]
    Syscall(&'static str, nix::Error),

    // --------------------------------- parsing errors --------------------------------------------
    #[error("object file parsing error: {0}")]
    ObjParsing(#[from] object::Error),

    // --------------------------------- unwind errors ---------------------------------------------
    #[cfg(feature = "libunwind")]
    #[error("libunwind error: {0}")]
    LibUnwind(#[from] unwind::Error),

    // --------------------------------- disasm ----------------------------------------------------
    #[error("install disassembler: {0}")]
    DisAsmInit(capstone::Error),
    #[error("instructions disassembly error: {0}")]
    DisAsm(capstone::Error),

    // --------------------------------- debugee process errors ------------------------------------
    #[error("debugee process exit with code {0}")]
    ProcessExit(i32),
    #[error("debugee process killed by signal {0}")]
    ProcessKilled(nix::sys::signal::Signal),
    #[error("the program is not being run")]
    ProcessNotStarted,

    // --------------------------------- attach debugee errors -------------------------------------
    #[error("process pid {0} not found")]
    AttachedProcessNotFound(Pid),
    #[error("attach a running process: {0}")]
    Attach(nix::Error),
}

impl Error {
    /// Return a hint to an interface - continue debugging after error or stop whole process.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::IO(_) => false,
            Error::RegisterNotFound(_) => false,
            Error::NoRegisterSlot(_) => false,
            Error::SymbolNotFound(_) => false,
            Error::BreakpointNotFound(_) => false,
            Error::UnknownAddress(_) => false,
            Error::TypeBinaryRepr(_, _) => false,
            Error::Waitpid(_) => false,
            Error::Ptrace(_) => false,
            Error::ObjParsing(_) => false,
            #[cfg(feature = "libunwind")]
            Error::LibUnwind(_) => false,
            Error::DisAsm(_) => false,

            // currently fatal errors
            Error::Syscall(_, _) => true,
            Error::DisAsmInit(_) => true,
            Error::ProcessExit(_) => true,
            Error::ProcessKilled(_) => true,
            Error::ProcessNotStarted => true,
            Error::AttachedProcessNotFound(_) => true,
            Error::Attach(_) => true,
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "debugger", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "debugger", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
