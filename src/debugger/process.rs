use crate::debugger::error::Error;
use crate::debugger::error::Error::{Ptrace, Waitpid};
use log::debug;
use nix::libc;
use nix::sys;
use nix::sys::personality::Persona;
use nix::sys::ptrace::Options;
use nix::sys::signal::SIGSTOP;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use std::os::unix::process::CommandExt;
use std::process::Command;
use sysinfo::{RefreshKind, System};

/// Process traced with `ptrace`, stopped after start or attach.
#[derive(Debug)]
pub struct Child {
    program: String,
    args: Vec<String>,
    pid: Pid,
    external: bool,
}

impl Child {
    /// Start a new process with ASLR disabled. Returns when the process
    /// is stopped right after `execve`, before the first program instruction.
    ///
    /// # Arguments
    ///
    /// * `program`: path to executable
    /// * `args`: program arguments
    pub fn spawn<ARGS: IntoIterator<Item = I>, I: Into<String>>(
        program: impl Into<String>,
        args: ARGS,
    ) -> Result<Self, Error> {
        let program = program.into();
        let args: Vec<String> = args.into_iter().map(Into::into).collect();

        let mut debugee_cmd = Command::new(&program);
        debugee_cmd.args(&args);
        unsafe {
            debugee_cmd.pre_exec(move || {
                sys::personality::set(Persona::ADDR_NO_RANDOMIZE)?;
                Ok(())
            });
        }

        match unsafe { fork() }.map_err(|e| Error::Syscall("fork", e))? {
            ForkResult::Parent { child: pid } => {
                waitpid(pid, Some(WaitPidFlag::WSTOPPED)).map_err(Waitpid)?;
                sys::ptrace::seize(pid, Options::PTRACE_O_TRACEEXEC | Options::PTRACE_O_EXITKILL)
                    .map_err(Ptrace)?;
                sys::ptrace::cont(pid, None).map_err(Ptrace)?;

                loop {
                    match waitpid(pid, None).map_err(Waitpid)? {
                        WaitStatus::PtraceEvent(_, _, libc::PTRACE_EVENT_EXEC) => break,
                        WaitStatus::Exited(_, code) => return Err(Error::ProcessExit(code)),
                        WaitStatus::Signaled(_, signal, _) => {
                            return Err(Error::ProcessKilled(signal))
                        }
                        status => {
                            debug!(target: "tracer", "skip status before exec: {status:?}");
                            sys::ptrace::cont(pid, None).map_err(Ptrace)?;
                        }
                    }
                }

                debug!(target: "tracer", "process {pid} started: {program}");
                Ok(Child {
                    program,
                    args,
                    pid,
                    external: false,
                })
            }
            ForkResult::Child => {
                _ = sys::signal::raise(SIGSTOP);
                let err = debugee_cmd.exec();
                eprintln!("run debugee fail with: {err}");
                // exit without running parent destructors
                unsafe { libc::_exit(127) }
            }
        }
    }

    /// Attach to a running process and stop it.
    ///
    /// # Arguments
    ///
    /// * `pid`: an external process pid
    pub fn attach(pid: Pid) -> Result<Self, Error> {
        let system =
            System::new_with_specifics(RefreshKind::everything().without_cpu().without_memory());
        let external_process = System::process(&system, sysinfo::Pid::from_u32(pid.as_raw() as u32))
            .ok_or(Error::AttachedProcessNotFound(pid))?;
        let program = external_process
            .exe()
            .ok_or(Error::AttachedProcessNotFound(pid))?
            .to_string_lossy()
            .to_string();
        let args = external_process.cmd().iter().skip(1).cloned().collect();

        sys::ptrace::seize(pid, Options::empty()).map_err(Error::Attach)?;
        sys::ptrace::interrupt(pid).map_err(Error::Attach)?;
        let status = waitpid(pid, None).map_err(Error::Attach)?;

        debug!(target: "tracer", "attached to process {pid} ({status:?}): {program}");
        Ok(Child {
            program,
            args,
            pid,
            external: true,
        })
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Return a program name.
    pub fn program(&self) -> &str {
        self.program.as_str()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// True when process was attached by its pid, false elsewhere.
    pub fn is_external(&self) -> bool {
        self.external
    }
}
