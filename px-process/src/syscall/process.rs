//! Process syscalls: getpid, fork, execve, wait4

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::sync::Arc;

use px_api::{Result, Syscall, Sysio};

use super::{SyscallDispatcher, SyscallHandler};
use crate::child::Child;

/// Register the process syscall handlers
pub fn register_handlers(dispatcher: &mut SyscallDispatcher) {
    dispatcher.register_handler(Box::new(GetpidHandler));
    dispatcher.register_handler(Box::new(ForkHandler));
    dispatcher.register_handler(Box::new(ExecveHandler));
    dispatcher.register_handler(Box::new(Wait4Handler));
}

struct GetpidHandler;

impl SyscallHandler for GetpidHandler {
    fn execute(&self, child: &Arc<Child>, sysio: &mut Sysio) -> Result<()> {
        sysio.pid = child.pid();
        Ok(())
    }

    fn name(&self) -> &str {
        "getpid"
    }

    fn id(&self) -> Syscall {
        Syscall::Getpid
    }
}

/// Fork at `ip`/`sp`; `pid` becomes the PID of the new process
struct ForkHandler;

impl SyscallHandler for ForkHandler {
    fn execute(&self, child: &Arc<Child>, sysio: &mut Sysio) -> Result<()> {
        sysio.pid = child.fork(sysio.ip, sysio.sp, sysio.parent_cap_addr)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "fork"
    }

    fn id(&self) -> Syscall {
        Syscall::Fork
    }
}

/// Replace the caller by the binary at `path`
struct ExecveHandler;

impl SyscallHandler for ExecveHandler {
    fn execute(&self, child: &Arc<Child>, sysio: &mut Sysio) -> Result<()> {
        let path = sysio.path()?.to_string();
        let args = sysio.args()?;
        let env = sysio.env()?;
        child.execve(&path, args.as_slice(), env.as_slice())
    }

    fn name(&self) -> &str {
        "execve"
    }

    fn id(&self) -> Syscall {
        Syscall::Execve
    }
}

/// Reap an exited child into `pid` and `status`
struct Wait4Handler;

impl SyscallHandler for Wait4Handler {
    fn execute(&self, child: &Arc<Child>, sysio: &mut Sysio) -> Result<()> {
        let (pid, status) = child.wait4(sysio.nohang)?;
        sysio.pid = pid;
        sysio.status = status;
        Ok(())
    }

    fn name(&self) -> &str {
        "wait4"
    }

    fn id(&self) -> Syscall {
        Syscall::Wait4
    }
}
