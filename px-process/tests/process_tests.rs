//! Process tests

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use mockall::mock;
use proptest::prelude::*;
use px_api::{
    CapIssuer, CapKind, Capability, Entrypoint, Error, Fd, IoChannel, LocalCapIssuer, Pid,
    RpcObject, SessionCall, SessionReply, SysError, Syscall, Vfs, WakeUp,
};
use px_process::{
    Child, ChildEnv, ControlLoop, Lifecycle, Member, PidAllocator, ProcessConfig, Resources,
    RpcEntrypoint,
};
use px_services::{LocalService, Service, ServiceRegistry};

const STACK: usize = 256 * 1024;
const CAP_SLOT_PAGE: usize = 0x4000_0000;

mock! {
    pub Ep {}
    impl Entrypoint for Ep {
        fn manage(&self, object: Arc<dyn RpcObject>) -> Capability;
        fn dissolve(&self, cap: Capability);
    }
}

mock! {
    pub FileSystem {}
    impl Vfs for FileSystem {
        fn dataspace_from_file(&self, path: &str) -> px_api::Result<Capability>;
        fn release_dataspace(&self, cap: Capability);
    }
}

/// File system serving every path except those below `/missing`
#[derive(Default)]
struct TestVfs {
    caps: LocalCapIssuer,
    loaded: Mutex<Vec<String>>,
    released: AtomicUsize,
    /// Name of the thread each release ran on
    released_on: Mutex<Vec<String>>,
}

impl Vfs for TestVfs {
    fn dataspace_from_file(&self, path: &str) -> px_api::Result<Capability> {
        if path.starts_with("/missing") {
            return Err(Error::NotFound(path.to_string()));
        }
        self.loaded.lock().unwrap().push(path.to_string());
        Ok(self.caps.issue(CapKind::Dataspace))
    }

    fn release_dataspace(&self, _cap: Capability) {
        let thread = thread::current().name().unwrap_or("<unnamed>").to_string();
        self.released_on.lock().unwrap().push(thread);
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Byte queue waking its reader when data arrives
#[derive(Default)]
struct Pipe {
    data: Mutex<VecDeque<u8>>,
    notifiers: Mutex<Vec<Arc<dyn WakeUp>>>,
}

impl IoChannel for Pipe {
    fn name(&self) -> &str {
        "pipe"
    }

    fn write(&self, buf: &[u8]) -> px_api::Result<usize> {
        self.data.lock().unwrap().extend(buf);
        for notifier in self.notifiers.lock().unwrap().iter() {
            notifier.wake_up();
        }
        Ok(buf.len())
    }

    fn read(&self, buf: &mut [u8]) -> px_api::Result<usize> {
        let mut data = self.data.lock().unwrap();
        if data.is_empty() {
            return Err(Error::WouldBlock);
        }
        let n = buf.len().min(data.len());
        for (slot, byte) in buf.iter_mut().zip(data.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn register_wake_up_notifier(&self, notifier: Arc<dyn WakeUp>) {
        self.notifiers.lock().unwrap().push(notifier);
    }

    fn unregister_wake_up_notifier(&self, notifier: &Arc<dyn WakeUp>) {
        self.notifiers.lock().unwrap().retain(|n| !Arc::ptr_eq(n, notifier));
    }
}

struct System {
    env: ChildEnv,
    vfs: Arc<TestVfs>,
    parent_services: Arc<ServiceRegistry>,
}

fn system() -> System {
    let caps: Arc<dyn CapIssuer> = Arc::new(LocalCapIssuer::new());
    let vfs = Arc::new(TestVfs::default());
    let parent_services = Arc::new(ServiceRegistry::new());
    let resources_ep = Arc::new(RpcEntrypoint::new("resources", STACK, caps.clone()));
    let config = ProcessConfig {
        entrypoint_stack_size: STACK,
        ..ProcessConfig::default()
    };
    let env = ChildEnv::new(caps, vfs.clone(), parent_services.clone(), resources_ep, config);
    System {
        env,
        vfs,
        parent_services,
    }
}

fn spawn_init(sys: &System) -> Arc<Child> {
    let pid = sys.env.pids.alloc();
    let init = Child::new("/bin/init", None, pid, &sys.env, &["init"], &["HOME=/"], false).unwrap();
    sys.env.init.set(init.clone());
    init
}

fn spawn(sys: &System, parent: &Arc<Child>, name: &str) -> Arc<Child> {
    let pid = sys.env.pids.alloc();
    let parent_member: Arc<dyn Member> = parent.clone();
    let child = Child::new(name, Some(parent_member), pid, &sys.env, &[name], &[], false).unwrap();
    parent.family().insert(child.clone());
    child
}

/// Back the page holding the fork capability slot with memory
fn map_cap_slot(child: &Child) {
    let ds = child.resources().ram().alloc(4096).unwrap();
    child.resources().rm().attach(ds, Some(CAP_SLOT_PAGE)).unwrap();
}

fn fork_via_sysio(parent: &Arc<Child>, ip: usize, sp: usize, cap_addr: usize) -> Option<Pid> {
    {
        let mut sysio = parent.sysio();
        sysio.ip = ip;
        sysio.sp = sp;
        sysio.parent_cap_addr = cap_addr;
    }
    parent.syscall(Syscall::Fork).then(|| parent.sysio().pid)
}

#[test]
fn test_pid_uniqueness_across_threads() {
    let pids = Arc::new(PidAllocator::new());
    let workers: Vec<_> = (0..8)
        .map(|_| {
            let pids = pids.clone();
            thread::spawn(move || (0..200).map(|_| pids.alloc()).collect::<Vec<_>>())
        })
        .collect();

    let mut seen = HashSet::new();
    for worker in workers {
        for pid in worker.join().unwrap() {
            assert!(seen.insert(pid), "pid {} issued twice", pid);
        }
    }
    assert_eq!(seen.len(), 1600);
}

#[test]
fn test_spawn_root_process() {
    let sys = system();
    let init = spawn_init(&sys);

    assert!(init.is_root());
    assert_eq!(init.pid(), 0);
    assert_eq!(init.name(), "/bin/init");
    assert_eq!(init.lifecycle(), Lifecycle::Active);
    assert!(init.binary().is_some());
    assert_eq!(*sys.vfs.loaded.lock().unwrap(), ["/bin/init"]);

    let args = init.ds_registry().get(init.args_dataspace()).unwrap();
    assert_eq!(args.size(), 4096);
    assert_eq!(args.read(0, 6).unwrap(), b"init\0\0");
    let env = init.ds_registry().get(init.env_dataspace()).unwrap();
    assert_eq!(env.read(0, 7).unwrap(), b"HOME=/\0");
}

#[test]
fn test_resolution_order() {
    let sys = system();
    let caps = LocalCapIssuer::new();
    let parent_rom = caps.issue(CapKind::Dataspace);
    let parent_timer = caps.issue(CapKind::Session);
    sys.parent_services.register(Arc::new(LocalService::new("ROM", parent_rom))).unwrap();
    sys.parent_services.register(Arc::new(LocalService::new("Timer", parent_timer))).unwrap();

    let init = spawn_init(&sys);

    let args = init.resolve_session_request("ROM", "filename=\"args\"").unwrap();
    assert_eq!(args.session("").unwrap(), init.args_dataspace());

    let binary = init.resolve_session_request("ROM", "label=\"binary\"").unwrap();
    assert_eq!(Some(binary.session("").unwrap()), init.binary());

    let session = init.resolve_session_request("Px", "").unwrap();
    assert_eq!(session.session("").unwrap(), init.session_cap());

    let timer = init.resolve_session_request("Timer", "").unwrap();
    assert_eq!(timer.session("").unwrap(), parent_timer);

    let lib = init.resolve_session_request("ROM", "filename=\"libc.lib.so\"").unwrap();
    assert_eq!(lib.session("").unwrap(), parent_rom);

    assert!(init.resolve_session_request("Nic", "").is_none());
}

#[test]
fn test_local_rm_service() {
    let sys = system();
    let init = spawn_init(&sys);

    let mut args = String::from("ram_quota=4K");
    let cap = init.session("RM", &mut args, 128).unwrap();
    assert_eq!(cap.kind(), CapKind::Rm);
    assert!(args.contains("label=\"/bin/init\""));
    assert_eq!(init.rm_service().len(), 1);

    // sub-sessions attach dataspaces of the process
    let rm = init.rm_service().rm_session(cap).unwrap();
    let ds = init.resources().ram().alloc(4096).unwrap();
    assert_eq!(rm.attach(ds, Some(0x1000)).unwrap(), 0x1000);

    init.rm_service().close(cap);
    assert!(init.rm_service().is_empty());
}

#[test]
fn test_missing_service_is_not_found() {
    let sys = system();
    let init = spawn_init(&sys);
    let mut args = String::new();
    assert!(matches!(init.session("Nic", &mut args, 128), Err(Error::NotFound(_))));
}

#[test]
fn test_missing_binary() {
    let sys = system();
    let result = Child::new("/missing/sh", None, 0, &sys.env, &["sh"], &[], false);
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(sys.vfs.released.load(Ordering::SeqCst), 0);
}

#[test]
fn test_arguments_overflow() {
    let sys = system();
    let huge = "x".repeat(8192);
    let result = Child::new("/bin/sh", None, 0, &sys.env, &[huge.as_str()], &[], false);
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[test]
fn test_fd_inheritance() {
    let sys = system();
    let init = spawn_init(&sys);
    map_cap_slot(&init);

    let a: Arc<dyn IoChannel> = Arc::new(Pipe::default());
    let b: Arc<dyn IoChannel> = Arc::new(Pipe::default());
    init.add_io_channel(a.clone(), Some(3)).unwrap();
    init.add_io_channel(b.clone(), Some(5)).unwrap();

    let pid = init.fork(0x1000, 0x2000, CAP_SLOT_PAGE).unwrap();
    let forked = init.child(pid).unwrap();

    init.fds().remove_io_channel(3).unwrap();

    let open: Vec<Fd> = forked.fds().open_fds().into_iter().map(|(fd, _)| fd).collect();
    assert_eq!(open, [3, 5]);
    assert!(Arc::ptr_eq(&forked.lookup_channel(3).unwrap(), &a));
    assert!(Arc::ptr_eq(&forked.lookup_channel(5).unwrap(), &b));
    assert!(init.lookup_channel(3).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_fork_copies_descriptor_table(fds in proptest::collection::btree_set(0..64i32, 0..10)) {
        let sys = system();
        let init = spawn_init(&sys);
        map_cap_slot(&init);
        for fd in &fds {
            init.add_io_channel(Arc::new(Pipe::default()), Some(*fd)).unwrap();
        }

        let pid = init.fork(0, 0, CAP_SLOT_PAGE).unwrap();
        let forked = init.child(pid).unwrap();

        let open: Vec<Fd> = forked.fds().open_fds().into_iter().map(|(fd, _)| fd).collect();
        let expected: Vec<Fd> = fds.iter().copied().collect();
        prop_assert_eq!(open, expected);
        for fd in &fds {
            prop_assert!(Arc::ptr_eq(
                &forked.lookup_channel(*fd).unwrap(),
                &init.lookup_channel(*fd).unwrap()
            ));
        }
    }

    #[test]
    fn prop_pids_are_distinct(count in 1usize..300, first in 0u32..1000) {
        let pids = PidAllocator::starting_at(first);
        let issued: HashSet<Pid> = (0..count).map(|_| pids.alloc()).collect();
        prop_assert_eq!(issued.len(), count);
    }
}

#[test]
fn test_invalid_descriptor() {
    let sys = system();
    let init = spawn_init(&sys);

    for fd in [-1, 0, 1, 2, 63, 64, 1000] {
        assert!(matches!(init.lookup_channel(fd), Err(Error::InvalidFd(f)) if f == fd));
    }

    init.sysio().fd = 9;
    assert!(!init.syscall(Syscall::Write));
    assert_eq!(init.sysio().error, SysError::BadFd);

    // still a plain syscall failure after the process exited
    init.exit(0);
    assert!(!init.syscall(Syscall::Close));
    assert_eq!(init.sysio().error, SysError::BadFd);
    assert!(init.lookup_channel(9).is_err());
}

#[test]
fn test_wait_returns_exiting_child() {
    let sys = system();
    let init = spawn_init(&sys);
    let a = spawn(&sys, &init, "/bin/a");
    let b = spawn(&sys, &init, "/bin/b");
    let b_pid = b.pid();

    let exiter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        b.exit(7);
    });

    assert_eq!(init.wait4(false).unwrap(), (b_pid, 7));
    exiter.join().unwrap();

    assert!(init.child(b_pid).is_none());
    assert!(init.family().poll4().is_none());
    assert_eq!(init.family().children(), [a.pid()]);
}

#[test]
fn test_no_lost_wakeup() {
    let sys = system();
    let init = spawn_init(&sys);
    let child = spawn(&sys, &init, "/bin/true");

    child.exit(0);
    assert_eq!(init.wait4(false).unwrap(), (child.pid(), 0));
}

#[test]
fn test_wait4_nohang_and_no_children() {
    let sys = system();
    let init = spawn_init(&sys);

    init.sysio().nohang = true;
    assert!(!init.syscall(Syscall::Wait4));
    assert_eq!(init.sysio().error, SysError::Child);

    let child = spawn(&sys, &init, "/bin/sleep");
    assert!(init.syscall(Syscall::Wait4));
    assert_eq!(init.sysio().pid, 0);

    child.exit(3);
    assert!(init.syscall(Syscall::Wait4));
    assert_eq!(init.sysio().pid, child.pid());
    assert_eq!(init.sysio().status, 3);
    assert!(!init.family().has_children());
}

#[test]
fn test_reaping_destroys_child() {
    let sys = system();
    let init = spawn_init(&sys);
    let child = spawn(&sys, &init, "/bin/true");
    child.start().unwrap();
    let weak = Arc::downgrade(&child);
    child.exit(0);
    drop(child);

    init.wait4(false).unwrap();
    assert!(weak.upgrade().is_none());
    // init's binary is still held, the child's was released
    assert_eq!(sys.vfs.released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_root_exit_raises_shutdown() {
    let sys = system();
    let init = spawn_init(&sys);

    init.exit(1);
    assert_eq!(sys.env.signals.pending(), 1);
    assert_eq!(sys.env.signals.dispatch_pending(), 1);
    assert!(sys.env.signals.shutdown_requested());
}

#[test]
fn test_child_exit_wakes_parent_only() {
    let sys = system();
    let init = spawn_init(&sys);
    let child = spawn(&sys, &init, "/bin/false");
    assert!(!child.is_root());

    child.exit(1);
    assert_eq!(sys.env.signals.pending(), 0);
    assert!(!sys.env.signals.shutdown_requested());
    assert_eq!(init.family().poll4().unwrap().family().pid(), child.pid());
}

#[test]
fn test_control_loop_runs_until_init_exits() {
    let sys = system();
    let init = spawn_init(&sys);
    init.start().unwrap();

    let control = ControlLoop::new(sys.env.signals.clone(), sys.env.init.clone());
    let driver = thread::spawn(move || control.run());

    let weak = Arc::downgrade(&init);
    thread::sleep(Duration::from_millis(20));
    init.exit(5);
    drop(init);

    assert_eq!(driver.join().unwrap(), Some(5));
    assert!(sys.env.init.get().is_none());
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_fork_pokes_capability_then_starts() {
    let sys = system();
    let init = spawn_init(&sys);
    map_cap_slot(&init);
    init.resources().rm().poke(CAP_SLOT_PAGE, b"parent image").unwrap();

    let pid = fork_via_sysio(&init, 0x1000, 0x7000, CAP_SLOT_PAGE + 16).unwrap();
    let forked = init.child(pid).unwrap();

    assert!(forked.is_forked());
    assert!(forked.binary().is_none());
    assert_eq!(forked.args(), init.args());
    assert_eq!(forked.family().parent().unwrap().family().pid(), init.pid());

    let slot = forked.resources().rm().peek(CAP_SLOT_PAGE + 16, 8).unwrap();
    assert_eq!(slot, forked.parent_cap().to_bytes());
    assert_eq!(forked.resources().rm().peek(CAP_SLOT_PAGE, 12).unwrap(), b"parent image");

    let main = forked.resources().cpu().main_thread().unwrap();
    assert_eq!((main.ip, main.sp), (0x1000, 0x7000));
    assert!(forked.entrypoint().is_active());
    assert!(forked.resources().cpu().forked());
}

#[test]
fn test_fork_to_unmapped_slot_fails() {
    let sys = system();
    let init = spawn_init(&sys);

    assert_eq!(fork_via_sysio(&init, 0x1000, 0x7000, 0xdead_0000), None);
    assert_eq!(init.sysio().error, SysError::Fault);
    assert!(!init.family().has_children());
}

#[test]
fn test_execve_defers_cleanup() {
    let sys = system();
    let init = spawn_init(&sys);
    let sh = spawn(&sys, &init, "/bin/sh");
    sh.start().unwrap();
    let pipe: Arc<dyn IoChannel> = Arc::new(Pipe::default());
    sh.add_io_channel(pipe.clone(), Some(1)).unwrap();

    {
        let mut sysio = sh.sysio();
        sysio.set_path("/bin/ls").unwrap();
        sysio.set_args(&["ls", "-l"]).unwrap();
        sysio.set_env(&["PATH=/bin"]).unwrap();
    }
    assert!(sh.syscall(Syscall::Execve));

    let ls = init.child(sh.pid()).unwrap();
    assert!(!Arc::ptr_eq(&ls, &sh));
    assert_eq!(ls.name(), "/bin/ls");
    assert_eq!(ls.args(), ["ls", "-l"]);
    assert_eq!(ls.env_entries(), ["PATH=/bin"]);
    assert!(Arc::ptr_eq(&ls.lookup_channel(1).unwrap(), &pipe));
    assert!(ls.entrypoint().is_active());

    // the old incarnation lingers until the cleanup signal is handled
    assert_eq!(sh.lifecycle(), Lifecycle::PendingCleanup);
    assert!(sh.start().is_err());
    assert!(!sh.syscall(Syscall::Execve));
    assert_eq!(sys.env.signals.pending(), 1);

    let weak = Arc::downgrade(&sh);
    drop(sh);
    assert!(weak.upgrade().is_some());
    assert_eq!(sys.env.signals.dispatch_pending(), 1);
    assert!(weak.upgrade().is_none());
    assert_eq!(sys.vfs.released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_execve_cleanup_runs_off_the_replaced_thread() {
    for _ in 0..100 {
        let sys = system();
        let init = spawn_init(&sys);
        let sh = spawn(&sys, &init, "/bin/sh");
        sh.start().unwrap();
        sh.sysio().set_path("/bin/ls").unwrap();

        let driver = {
            let signals = sys.env.signals.clone();
            thread::Builder::new()
                .name("control".to_string())
                .spawn(move || signals.wait_and_dispatch())
                .unwrap()
        };

        let reply = sh.entrypoint().call(sh.session_cap(), SessionCall::Syscall(Syscall::Execve));
        assert_eq!(reply.unwrap(), SessionReply::Done(true));
        let weak = Arc::downgrade(&sh);
        drop(sh);
        driver.join().unwrap();

        // whichever finished first, the control thread releases the image
        assert!(weak.upgrade().is_none());
        assert_eq!(*sys.vfs.released_on.lock().unwrap(), ["control"]);
    }
}

#[test]
fn test_execve_of_root_replaces_init() {
    let sys = system();
    let init = spawn_init(&sys);

    init.execve("/bin/sh", &["sh"], &[]).unwrap();

    let sh = sys.env.init.get().unwrap();
    assert!(sh.is_root());
    assert_eq!(sh.pid(), init.pid());
    assert_eq!(sh.name(), "/bin/sh");
    assert_eq!(init.lifecycle(), Lifecycle::PendingCleanup);

    sh.exit(0);
    // cleanup of the old incarnation, then the exit notification
    assert_eq!(sys.env.signals.dispatch_pending(), 2);
    assert!(sys.env.signals.shutdown_requested());
}

#[test]
fn test_execve_of_missing_binary_keeps_process() {
    let sys = system();
    let init = spawn_init(&sys);
    let sh = spawn(&sys, &init, "/bin/sh");

    sh.sysio().set_path("/missing/ls").unwrap();
    assert!(!sh.syscall(Syscall::Execve));
    assert_eq!(sh.sysio().error, SysError::NoEnt);
    assert_eq!(sh.lifecycle(), Lifecycle::Active);
    assert!(Arc::ptr_eq(&init.child(sh.pid()).unwrap(), &sh));
}

#[test]
fn test_session_calls_through_entrypoint() {
    let sys = system();
    let init = spawn_init(&sys);

    // not served before start
    assert!(init.entrypoint().call(init.session_cap(), SessionCall::SysioDataspace).is_err());
    init.start().unwrap();
    assert!(init.start().is_err());

    assert_eq!(
        init.entrypoint().call(init.session_cap(), SessionCall::SysioDataspace).unwrap(),
        SessionReply::Cap(init.sysio_dataspace())
    );
    assert_eq!(
        init.entrypoint().call(init.session_cap(), SessionCall::Syscall(Syscall::Getpid)).unwrap(),
        SessionReply::Done(true)
    );
    assert_eq!(init.sysio().pid, init.pid());
}

#[test]
fn test_read_blocks_until_data_arrives() {
    let sys = system();
    let init = spawn_init(&sys);
    init.start().unwrap();

    let pipe = Arc::new(Pipe::default());
    let fd = init.add_io_channel(pipe.clone(), None).unwrap();
    {
        let mut sysio = init.sysio();
        sysio.fd = fd;
        sysio.count = 16;
    }

    let reader = {
        let init = init.clone();
        thread::spawn(move || init.entrypoint().call(init.session_cap(), SessionCall::Syscall(Syscall::Read)))
    };

    thread::sleep(Duration::from_millis(30));
    pipe.write(b"hello").unwrap();

    assert_eq!(reader.join().unwrap().unwrap(), SessionReply::Done(true));
    let sysio = init.sysio();
    assert_eq!(sysio.count, 5);
    assert_eq!(sysio.chunk(), b"hello");
    drop(sysio);
    assert!(pipe.notifiers.lock().unwrap().is_empty());
}

#[test]
fn test_write_dup2_close() {
    let sys = system();
    let init = spawn_init(&sys);
    let pipe = Arc::new(Pipe::default());
    init.add_io_channel(pipe.clone(), Some(1)).unwrap();

    {
        let mut sysio = init.sysio();
        sysio.fd = 1;
        sysio.set_chunk(b"out").unwrap();
    }
    assert!(init.syscall(Syscall::Write));
    assert_eq!(init.sysio().count, 3);
    assert_eq!(pipe.data.lock().unwrap().len(), 3);

    {
        let mut sysio = init.sysio();
        sysio.fd = 1;
        sysio.to_fd = 2;
    }
    assert!(init.syscall(Syscall::Dup2));
    assert_eq!(init.sysio().fd, 2);
    assert!(init.fds().fd_in_use(2));

    init.sysio().fd = 1;
    assert!(init.syscall(Syscall::Close));
    assert!(!init.syscall(Syscall::Close));
    assert_eq!(init.sysio().error, SysError::BadFd);
    assert!(init.fds().fd_in_use(2));
}

#[test]
fn test_unknown_syscall_number() {
    let sys = system();
    let init = spawn_init(&sys);
    assert!(!init.syscall_raw(99));
    assert_eq!(init.sysio().error, SysError::Inval);
    assert!(init.syscall_raw(Syscall::Getpid as u32));
    assert_eq!(init.sysio().error, SysError::None);
}

#[test]
fn test_resources_register_with_entrypoint() {
    let next = AtomicU64::new(100);
    let mut ep = MockEp::new();
    ep.expect_manage()
        .times(3)
        .returning(move |object| Capability::from_raw(next.fetch_add(1, Ordering::SeqCst), object.kind()));
    ep.expect_dissolve().times(3).return_const(());

    let ep: Arc<dyn Entrypoint> = Arc::new(ep);
    let caps: Arc<dyn CapIssuer> = Arc::new(LocalCapIssuer::new());
    let resources = Resources::new("sh", false, &ep, &caps, &ProcessConfig::default());

    assert_eq!(resources.ram_cap().kind(), CapKind::Ram);
    assert_eq!(resources.cpu_cap().kind(), CapKind::Cpu);
    assert_eq!(resources.rm_cap().kind(), CapKind::Rm);
    assert!(!resources.cpu().forked());
    drop(resources);
}

#[test]
fn test_binary_released_once_on_destroy() {
    let caps: Arc<dyn CapIssuer> = Arc::new(LocalCapIssuer::new());
    let image = Capability::from_raw(4242, CapKind::Dataspace);

    let mut vfs = MockFileSystem::new();
    vfs.expect_dataspace_from_file()
        .withf(|path: &str| path == "/bin/sh")
        .times(1)
        .returning(move |_| Ok(image));
    vfs.expect_release_dataspace()
        .withf(move |cap: &Capability| *cap == image)
        .times(1)
        .return_const(());

    let resources_ep = Arc::new(RpcEntrypoint::new("resources", STACK, caps.clone()));
    let env = ChildEnv::new(
        caps,
        Arc::new(vfs),
        Arc::new(ServiceRegistry::new()),
        resources_ep.clone(),
        ProcessConfig::default(),
    );

    let sh = Child::new("/bin/sh", None, 0, &env, &["sh"], &[], false).unwrap();
    assert_eq!(sh.binary(), Some(image));
    assert_eq!(resources_ep.len(), 3);

    // a fork shares the image instead of loading it again
    let forked = Child::new("/bin/sh", None, 1, &env, &["sh"], &[], true).unwrap();
    assert!(forked.binary().is_none());
    drop(forked);

    drop(sh);
    assert!(resources_ep.is_empty());
}

#[test]
fn test_long_names_are_truncated() {
    let sys = system();
    let name = format!("/bin/{}", "n".repeat(100));
    let child = Child::new(&name, None, 0, &sys.env, &["n"], &[], false).unwrap();
    assert_eq!(child.name().len(), 64);
    // the full path was loaded
    assert_eq!(sys.vfs.loaded.lock().unwrap().last().unwrap(), &name);
}
