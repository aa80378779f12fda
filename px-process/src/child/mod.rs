//! Processes
//!
//! A [`Child`] composes everything one process consists of: its node in the
//! process tree, its resource sessions, the chain resolving its session
//! requests, its descriptor table and the syscall channel served by its own
//! entrypoint thread.
//!
//! Field order of [`Child`] is its teardown order. Registrations with the
//! process's own entrypoint are dissolved before the entrypoint itself goes
//! away, and the resource sessions are deregistered before their memory is
//! released.

pub mod env;
pub mod image;
pub mod session;

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use std::sync::MutexGuard;

use px_api::error::invalid_state;
use px_api::{
    Addr, CapKind, Capability, Entrypoint, Error, Fd, IoChannel, Managed, Pid, Result, SysError,
    Syscall, Sysio,
};
use px_services::{
    LocalService, RomFilePolicy, Service, ServicePolicy, ServiceResolver, service_name,
};
use spin::Mutex;

use crate::control::{CleanupDispatcher, ExitDispatcher};
use crate::entrypoint::RpcEntrypoint;
use crate::family::{FamilyMember, Member};
use crate::fd::FdRegistry;
use crate::resources::{DataspaceRegistry, Resources};
use crate::rm_service::LocalRmService;
use crate::signal::SignalContext;
use crate::sync::Semaphore;
use crate::syscall::get_dispatcher;

pub use env::ChildEnv;
pub use image::{BinaryImage, pack_entries};
pub use session::{ChildWakeUp, SessionComponent, SysioChannel};

/// Whether a process is still in charge of its PID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Running, or exited and not yet reaped
    Active,
    /// Replaced by execve, waiting for the control loop to destroy it
    PendingCleanup,
}

/// One process
pub struct Child {
    name: String,
    root: bool,
    forked: bool,
    args: Vec<String>,
    env_entries: Vec<String>,
    env: ChildEnv,
    family: FamilyMember,
    lifecycle: Mutex<Lifecycle>,
    blocker: Arc<Semaphore>,
    fds: FdRegistry,
    resolver: ServiceResolver,
    rm_service: Arc<LocalRmService>,
    session: Managed,
    sysio: SysioChannel,
    parent_cap: Capability,
    args_ds: Capability,
    env_ds: Capability,
    binary: Option<BinaryImage>,
    resources: Resources,
    cleanup: Arc<CleanupDispatcher>,
    exit_ctx: SignalContext,
    cleanup_ctx: SignalContext,
    entrypoint: Arc<RpcEntrypoint>,
}

impl Child {
    /// Create process `pid` below `parent`
    ///
    /// A process without parent is the root process. Unless `forked`, the
    /// binary named `name` is loaded from the file system; a forked process
    /// keeps using the image of the process it was forked from. The process
    /// does not run before [`Child::start`].
    pub fn new<S: AsRef<str>>(
        name: &str,
        parent: Option<Arc<dyn Member>>,
        pid: Pid,
        env: &ChildEnv,
        args: &[S],
        env_entries: &[S],
        forked: bool,
    ) -> Result<Arc<Self>> {
        let config = &env.config;
        let label = config.truncate_name(name).to_string();
        let root = parent.is_none();

        let entrypoint = Arc::new(RpcEntrypoint::new(&label, config.entrypoint_stack_size, env.caps.clone()));
        let ep: Arc<dyn Entrypoint> = entrypoint.clone();
        let resources = Resources::new(&label, forked, &env.resources_ep, &env.caps, config);

        let args_blob = pack_entries(args, config.args_ds_size)?;
        let args_ds = resources.ds_registry().create_with(config.args_ds_size, &args_blob)?.cap();
        let env_blob = pack_entries(env_entries, usize::MAX)?;
        let env_ds = resources
            .ds_registry()
            .create_with(config.page_round_up(env_blob.len()), &env_blob)?
            .cap();

        let binary = if forked {
            None
        } else {
            Some(BinaryImage::load(env.vfs.clone(), name)?)
        };

        let rm_service = Arc::new(LocalRmService::new(
            ep.clone(),
            resources.ds_registry().clone(),
            config.page_size,
        ));
        let cleanup = Arc::new(CleanupDispatcher::new());
        let exit_ctx = env.signals.manage(Arc::new(ExitDispatcher::new(root)));
        let cleanup_ctx = env.signals.manage(cleanup.clone());
        let parent_cap = env.caps.issue(CapKind::Parent);
        let sysio = SysioChannel::new(env.caps.clone());

        Ok(Arc::new_cyclic(|weak| {
            let session = Managed::new(&ep, Arc::new(SessionComponent::new(weak.clone())));

            let resolver = ServiceResolver::new(&label, env.parent_services.clone())
                .with_policy(RomFilePolicy::new("binary", binary.as_ref().map(BinaryImage::cap)))
                .with_policy(RomFilePolicy::new("args", Some(args_ds)))
                .with_policy(RomFilePolicy::new("env", Some(env_ds)))
                .with_policy(ServicePolicy::new(Arc::new(LocalService::new(
                    service_name::SESSION,
                    session.cap(),
                ))))
                .with_policy(ServicePolicy::new(rm_service.clone()));

            px_debug!("created {} (pid {}, forked: {})", label, pid, forked);

            Self {
                name: label,
                root,
                forked,
                args: args.iter().map(|a| a.as_ref().to_string()).collect(),
                env_entries: env_entries.iter().map(|e| e.as_ref().to_string()).collect(),
                env: env.clone(),
                family: FamilyMember::new(pid, parent.as_ref()),
                lifecycle: Mutex::new(Lifecycle::Active),
                blocker: Arc::new(Semaphore::new(0)),
                fds: FdRegistry::new(config.max_file_descriptors),
                resolver,
                rm_service,
                session,
                sysio,
                parent_cap,
                args_ds,
                env_ds,
                binary,
                resources,
                cleanup,
                exit_ctx,
                cleanup_ctx,
                entrypoint,
            }
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid(&self) -> Pid {
        self.family.pid()
    }

    /// Whether this is the root process, fixed at construction
    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn is_forked(&self) -> bool {
        self.forked
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.lock()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env_entries(&self) -> &[String] {
        &self.env_entries
    }

    pub fn entrypoint(&self) -> &Arc<RpcEntrypoint> {
        &self.entrypoint
    }

    /// Capability of the process-control session
    pub fn session_cap(&self) -> Capability {
        self.session.cap()
    }

    /// Capability of the RAM session
    pub fn ram(&self) -> Capability {
        self.resources.ram_cap()
    }

    /// Capability of the RM session
    pub fn rm(&self) -> Capability {
        self.resources.rm_cap()
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn ds_registry(&self) -> &Arc<DataspaceRegistry> {
        self.resources.ds_registry()
    }

    pub fn rm_service(&self) -> &Arc<LocalRmService> {
        &self.rm_service
    }

    /// Capability of the syscall channel
    pub fn sysio_dataspace(&self) -> Capability {
        self.sysio.cap()
    }

    /// Exclusive access to the syscall channel
    pub fn sysio(&self) -> MutexGuard<'_, alloc::boxed::Box<Sysio>> {
        self.sysio.lock()
    }

    /// Capability written into a forked process for its parent interface
    pub fn parent_cap(&self) -> Capability {
        self.parent_cap
    }

    pub fn args_dataspace(&self) -> Capability {
        self.args_ds
    }

    pub fn env_dataspace(&self) -> Capability {
        self.env_ds
    }

    /// Binary image, absent for forked processes
    pub fn binary(&self) -> Option<Capability> {
        self.binary.as_ref().map(BinaryImage::cap)
    }

    pub(crate) fn blocker(&self) -> &Arc<Semaphore> {
        &self.blocker
    }

    /// Provider serving a session request of this process
    pub fn resolve_session_request(&self, service_name: &str, args: &str) -> Option<Arc<dyn Service>> {
        self.resolver.resolve_session_request(service_name, args)
    }

    /// Make this process's name evident in the label of `args`
    pub fn filter_session_args(&self, service_name: &str, args: &mut String, capacity: usize) -> Result<()> {
        self.resolver.filter_session_args(service_name, args, capacity)
    }

    /// Label, resolve and open a session on behalf of this process
    pub fn session(&self, service_name: &str, args: &mut String, capacity: usize) -> Result<Capability> {
        self.resolver.session(service_name, args, capacity)
    }

    /// Direct child process with PID `pid`
    pub fn child(&self, pid: Pid) -> Option<Arc<Child>> {
        self.family.child(pid)?.into_any().downcast::<Child>().ok()
    }

    pub fn fds(&self) -> &FdRegistry {
        &self.fds
    }

    /// Open `channel` at `fd`, or at the lowest free descriptor
    pub fn add_io_channel(&self, channel: Arc<dyn IoChannel>, fd: Option<Fd>) -> Result<Fd> {
        self.fds.add_io_channel(channel, fd)
    }

    /// Channel behind `fd`, failing with [`Error::InvalidFd`] when not open
    pub fn lookup_channel(&self, fd: Fd) -> Result<Arc<dyn IoChannel>> {
        self.fds.io_channel_by_fd(fd)
    }

    /// Copy every open descriptor into `target`, keeping the numbers
    pub fn assign_io_channels_to(&self, target: &Child) {
        for (fd, channel) in self.fds.open_fds() {
            if let Err(err) = target.fds.add_io_channel(channel, Some(fd)) {
                px_warn!("{}: cannot pass fd {} to {}: {}", self.name, fd, target.name, err);
            }
        }
    }

    /// Activate the entrypoint so the process's syscalls get served
    pub fn start(&self) -> Result<()> {
        if self.lifecycle() == Lifecycle::PendingCleanup {
            return Err(invalid_state("process was replaced"));
        }
        self.entrypoint.activate()?;
        px_debug!("started {} (pid {})", self.name, self.pid());
        Ok(())
    }

    /// Publish the parent capability at `parent_cap_addr`, then run the main
    /// thread at `ip` with stack `sp`
    pub fn start_forked_main_thread(&self, ip: Addr, sp: Addr, parent_cap_addr: Addr) -> Result<()> {
        self.resources.rm().poke(parent_cap_addr, &self.parent_cap.to_bytes())?;
        self.resources.cpu().start_main_thread(ip, sp)
    }

    /// Terminate with `status`
    ///
    /// Wakes the parent. The root process additionally raises the exit
    /// notification that ends the control loop. The process object stays
    /// around until it is reaped.
    pub fn exit(&self, status: i32) {
        px_info!("{} (pid {}) exited with status {}", self.name, self.pid(), status);
        self.family.mark_exited(status);
        if self.root {
            self.env.signals.submit(self.exit_ctx.cap());
        }
    }

    /// Hand this process to the control loop for destruction
    pub fn schedule_cleanup(self: &Arc<Self>) {
        *self.lifecycle.lock() = Lifecycle::PendingCleanup;
        self.cleanup.schedule(self.clone());
        self.env.signals.submit(self.cleanup_ctx.cap());
    }

    /// Perform `syscall` with the parameters found in the syscall channel
    ///
    /// On failure the error class is stored in the channel and `false` is
    /// returned.
    pub fn syscall(self: &Arc<Self>, syscall: Syscall) -> bool {
        let mut sysio = self.sysio.lock();
        sysio.error = SysError::None;

        match get_dispatcher().dispatch(syscall, self, &mut sysio) {
            Ok(()) => true,
            Err(err) => {
                px_debug!("{} (pid {}): {} failed: {}", self.name, self.pid(), syscall.name(), err);
                sysio.error = SysError::from(&err);
                false
            }
        }
    }

    /// Like [`Child::syscall`] for a raw syscall number
    pub fn syscall_raw(self: &Arc<Self>, number: u32) -> bool {
        match Syscall::try_from(number) {
            Ok(syscall) => self.syscall(syscall),
            Err(err) => {
                px_error!("{}: unknown syscall {}", self.name, number);
                self.sysio.lock().error = SysError::from(&err);
                false
            }
        }
    }

    /// Create a forked copy of this process
    ///
    /// The copy shares the descriptors and a private copy of the address
    /// space, and starts at `ip`/`sp` with its parent capability stored at
    /// `parent_cap_addr`.
    pub fn fork(self: &Arc<Self>, ip: Addr, sp: Addr, parent_cap_addr: Addr) -> Result<Pid> {
        let pid = self.env.pids.alloc();
        let parent: Arc<dyn Member> = self.clone();
        let child = Child::new(&self.name, Some(parent), pid, &self.env, self.args.as_slice(), self.env_entries.as_slice(), true)?;

        self.family.insert(child.clone());
        if let Err(err) = self.launch_forked(&child, ip, sp, parent_cap_addr) {
            self.family.remove(pid);
            return Err(err);
        }
        Ok(pid)
    }

    fn launch_forked(&self, child: &Child, ip: Addr, sp: Addr, parent_cap_addr: Addr) -> Result<()> {
        self.assign_io_channels_to(child);
        self.resources.rm().replay(child.resources.rm())?;
        child.start_forked_main_thread(ip, sp, parent_cap_addr)?;
        child.start()
    }

    /// Replace this process by the binary at `path`
    ///
    /// The replacement keeps PID, parent and descriptors. This incarnation
    /// is destroyed later by the control loop, never on its own thread.
    pub fn execve<S: AsRef<str>>(self: &Arc<Self>, path: &str, args: &[S], env_entries: &[S]) -> Result<()> {
        if self.lifecycle() == Lifecycle::PendingCleanup {
            return Err(invalid_state("process was replaced"));
        }
        let parent = self.family.parent();
        if parent.is_none() && !self.root {
            return Err(invalid_state("parent is gone"));
        }

        let replacement = Child::new(path, parent.clone(), self.pid(), &self.env, args, env_entries, false)?;
        self.assign_io_channels_to(&replacement);
        replacement.start()?;

        match parent {
            Some(parent) => {
                parent.family().insert(replacement);
            }
            None => {
                self.env.init.set(replacement);
            }
        }

        px_info!("{} (pid {}) replaced by {}", self.name, self.pid(), path);
        self.schedule_cleanup();
        Ok(())
    }

    /// Reap an exited child, returning its PID and status
    ///
    /// With `nohang` and no exited child, returns PID 0.
    pub fn wait4(&self, nohang: bool) -> Result<(Pid, i32)> {
        if !self.family.has_children() {
            return Err(Error::NoChildren);
        }

        let reaped = if nohang {
            self.family.poll4()
        } else {
            Some(self.family.wait4())
        };
        let Some(child) = reaped else {
            return Ok((0, 0));
        };

        let pid = child.family().pid();
        let status = child.family().exit_status().unwrap_or(0);
        self.family.remove(pid);
        px_debug!("{} reaped pid {} (status {})", self.name, pid, status);
        Ok((pid, status))
    }
}

impl Member for Child {
    fn family(&self) -> &FamilyMember {
        &self.family
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl Drop for Child {
    fn drop(&mut self) {
        px_debug!("destroying {} (pid {})", self.name, self.pid());
        self.env.caps.revoke(self.parent_cap);
    }
}

impl core::fmt::Debug for Child {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Child")
            .field("name", &self.name)
            .field("pid", &self.pid())
            .field("root", &self.root)
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}
