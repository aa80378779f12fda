//! Descriptor syscalls: write, read, close, dup2

use alloc::boxed::Box;
use alloc::sync::Arc;

use px_api::syscall::SYSIO_CHUNK_SIZE;
use px_api::{Error, Result, Syscall, Sysio, WakeUp};

use super::{SyscallDispatcher, SyscallHandler};
use crate::child::{Child, ChildWakeUp};

/// Register the descriptor syscall handlers
pub fn register_handlers(dispatcher: &mut SyscallDispatcher) {
    dispatcher.register_handler(Box::new(WriteHandler));
    dispatcher.register_handler(Box::new(ReadHandler));
    dispatcher.register_handler(Box::new(CloseHandler));
    dispatcher.register_handler(Box::new(Dup2Handler));
}

/// Write `chunk[..count]` to `fd`; `count` becomes the bytes written
struct WriteHandler;

impl SyscallHandler for WriteHandler {
    fn execute(&self, child: &Arc<Child>, sysio: &mut Sysio) -> Result<()> {
        let channel = child.lookup_channel(sysio.fd)?;
        sysio.count = channel.write(sysio.chunk())?;
        Ok(())
    }

    fn name(&self) -> &str {
        "write"
    }

    fn id(&self) -> Syscall {
        Syscall::Write
    }
}

/// Read up to `count` bytes from `fd` into `chunk`
///
/// Blocks the calling process until the channel has data.
struct ReadHandler;

impl SyscallHandler for ReadHandler {
    fn execute(&self, child: &Arc<Child>, sysio: &mut Sysio) -> Result<()> {
        let channel = child.lookup_channel(sysio.fd)?;
        let count = sysio.count.min(SYSIO_CHUNK_SIZE);

        let notifier: Arc<dyn WakeUp> = Arc::new(ChildWakeUp::new(child.blocker().clone()));
        channel.register_wake_up_notifier(notifier.clone());
        let result = loop {
            match channel.read(&mut sysio.chunk[..count]) {
                Err(Error::WouldBlock) => child.blocker().down(),
                other => break other,
            }
        };
        channel.unregister_wake_up_notifier(&notifier);

        sysio.count = result?;
        Ok(())
    }

    fn name(&self) -> &str {
        "read"
    }

    fn id(&self) -> Syscall {
        Syscall::Read
    }
}

/// Close `fd`
struct CloseHandler;

impl SyscallHandler for CloseHandler {
    fn execute(&self, child: &Arc<Child>, sysio: &mut Sysio) -> Result<()> {
        child.fds().remove_io_channel(sysio.fd)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "close"
    }

    fn id(&self) -> Syscall {
        Syscall::Close
    }
}

/// Make `to_fd` refer to the channel of `fd`
struct Dup2Handler;

impl SyscallHandler for Dup2Handler {
    fn execute(&self, child: &Arc<Child>, sysio: &mut Sysio) -> Result<()> {
        let channel = child.lookup_channel(sysio.fd)?;
        sysio.fd = child.add_io_channel(channel, Some(sysio.to_fd))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "dup2"
    }

    fn id(&self) -> Syscall {
        Syscall::Dup2
    }
}
