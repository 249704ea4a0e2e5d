//! Supervisor and wipe worker (§4.5, §4.6): turns a [`Configuration`] and a set of
//! enumerated devices into one worker thread per device, joins them under a signal-driven
//! cancellation policy, and folds their outcomes into a [`SupervisorOutcome`].

use crate::algorithms::{build_method, MethodKind, PassSpec, VerifyMode};
use crate::crypto::{secure_random_bytes, PrngAlgorithm, WipePrng};
use crate::drives::operations::{probe_hpa_dco, reconcile, HpaReconciliation, HpaStatus};
use crate::error::{execute_with_recovery, CircuitBreaker, DriveError, DriveResult, ErrorContext};
use crate::io::platform_specific::{self};
use crate::io::{AlignedBuffer, IOError, IOMode};
use crate::logging::{LogSink, TracingLogSink};
use crate::{BusClass, Configuration, DeviceContext, ErasureResult, PassOutcome, PassStatus, SelectionState};

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_COMPLETED_WITH_ERRORS: i32 = 1;
pub const EXIT_REPORT_DIR_FAILURE: i32 = 2;
pub const EXIT_NON_PRIVILEGED: i32 = 99;

/// Lower bound on how long the supervisor waits for worker threads to notice cancellation
/// before giving up on them (§5).
const THREAD_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// One write/read buffer's worth per I/O call. Rounded to a sector multiple by
/// [`next_transfer_size`] when direct I/O is active.
const DEFAULT_BUFFER_BYTES: u64 = 1024 * 1024;

/// Seam for the five hardware-command methods (§4.2.1): `secure_erase*` and `sanitize_*`
/// are single ATA/NVMe commands, not pass sequences, and this engine carries no SED/sanitize
/// backend to issue them (see DESIGN.md). The only implementation provided reports every
/// such method unsupported, which the worker treats as a per-device fatal error rather than
/// a crash.
pub trait HardwareEraseCommand: Send + Sync {
    fn execute(&self, method: MethodKind, device_path: &str) -> DriveResult<()>;
}

#[derive(Default)]
pub struct UnimplementedHardwareErase;

impl HardwareEraseCommand for UnimplementedHardwareErase {
    fn execute(&self, method: MethodKind, device_path: &str) -> DriveResult<()> {
        Err(DriveError::Unsupported(format!(
            "{method:?} requires a hardware sanitize/SED backend on {device_path}, which this engine does not implement"
        )))
    }
}

/// Derived overall status for one device (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOutcomeStatus {
    Success,
    FailureWithErrors,
    Aborted,
    Disabled,
}

/// One device's final record, paired with its derived status.
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub result: ErasureResult,
    pub status: DeviceOutcomeStatus,
}

/// Result of a full supervisor run (§4.6 step 7).
#[derive(Debug, Clone)]
pub struct SupervisorOutcome {
    pub reports: Vec<DeviceReport>,
    pub exit_code: i32,
}

/// Pre-flight fatal checks (§7), run before any device is opened or worker spawned.
/// Returns the exit code to use on failure.
pub fn preflight_checks(report_dir: Option<&std::path::Path>) -> Result<(), i32> {
    #[cfg(unix)]
    {
        if unsafe { libc::geteuid() } != 0 {
            return Err(EXIT_NON_PRIVILEGED);
        }
    }
    if let Some(dir) = report_dir {
        let writable = std::fs::metadata(dir).map(|m| !m.permissions().readonly()).unwrap_or(false);
        if !writable {
            return Err(EXIT_REPORT_DIR_FAILURE);
        }
    }
    Ok(())
}

#[derive(Default)]
struct ProgressCounters {
    pass_number: AtomicU32,
    round_number: AtomicU32,
    bytes_erased: AtomicU64,
    pass_errors: AtomicU64,
    verify_errors: AtomicU64,
    fsync_errors: AtomicU64,
}

struct WorkerHandle {
    device_path: String,
    counters: Arc<ProgressCounters>,
    finished: Arc<AtomicBool>,
    handle: thread::JoinHandle<ErasureResult>,
}

/// Single-threaded control plane (§4.6).
pub struct Supervisor {
    configuration: Configuration,
    log: Arc<dyn LogSink>,
    hardware: Arc<dyn HardwareEraseCommand>,
}

impl Supervisor {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            log: Arc::new(TracingLogSink),
            hardware: Arc::new(UnimplementedHardwareErase),
        }
    }

    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    pub fn with_hardware_erase(mut self, hardware: Arc<dyn HardwareEraseCommand>) -> Self {
        self.hardware = hardware;
        self
    }

    /// Runs the full sequence from §4.6 against an already-enumerated device list: filter,
    /// probe, spawn, supervise, aggregate.
    pub fn run(&self, devices: Vec<DeviceContext>) -> SupervisorOutcome {
        let mut selected = self.select_devices(devices);

        if selected.is_empty() {
            self.log.error("no selectable devices after applying exclusion/bus filters");
            return SupervisorOutcome { reports: Vec::new(), exit_code: EXIT_COMPLETED_WITH_ERRORS };
        }

        for ctx in selected.iter_mut() {
            self.probe_and_size(ctx);
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let user_aborted = Arc::new(AtomicBool::new(false));
        let status_table: Arc<Mutex<Vec<(String, Arc<ProgressCounters>)>>> = Arc::new(Mutex::new(Vec::new()));

        if !self.configuration.nosignals {
            self.spawn_signal_handler(cancel.clone(), user_aborted.clone(), status_table.clone());
        }

        let mut handles = Vec::new();
        let mut disabled_reports = Vec::new();
        for ctx in selected {
            let device_path = ctx.device_path.clone();

            match self.open_device(&ctx) {
                Ok((file, direct_io_active)) => {
                    let counters = Arc::new(ProgressCounters::default());
                    let finished = Arc::new(AtomicBool::new(false));
                    status_table.lock().unwrap().push((device_path.clone(), counters.clone()));

                    let worker = Worker::new(ctx, file, direct_io_active, self.configuration.clone(), self.hardware.clone());
                    let log = self.log.clone();
                    let cancel_for_thread = cancel.clone();
                    let counters_for_thread = counters.clone();
                    let finished_for_thread = finished.clone();

                    let handle = thread::Builder::new()
                        .name(format!("wipe-worker-{device_path}"))
                        .spawn(move || {
                            let result = worker.run(&counters_for_thread, &cancel_for_thread, log.as_ref());
                            finished_for_thread.store(true, Ordering::Relaxed);
                            result
                        })
                        .expect("spawning a worker thread should not fail under normal resource limits");

                    handles.push(WorkerHandle { device_path, counters, finished, handle });
                }
                Err(e) => {
                    self.log.error(&format!("failed to open {device_path}: {e}"));
                    // Per-device fatal (§7): mark this device disabled and keep going with
                    // the others, rather than dropping it from aggregation.
                    disabled_reports.push(disabled_report(&device_path, &e));
                }
            }
        }

        if handles.is_empty() {
            self.log.error("every selected device failed to open; nothing to wipe");
            return SupervisorOutcome { reports: disabled_reports, exit_code: EXIT_COMPLETED_WITH_ERRORS };
        }

        self.join_with_timeout(&handles, &cancel);

        let mut reports = disabled_reports;
        for wh in handles {
            if wh.finished.load(Ordering::Relaxed) {
                match wh.handle.join() {
                    Ok(result) => reports.push(to_report(result, user_aborted.load(Ordering::Relaxed))),
                    Err(_) => self.log.error(&format!("worker thread for {} panicked", wh.device_path)),
                }
            } else {
                self.log.warning(&format!(
                    "worker for {} did not finish within the join timeout; abandoning it",
                    wh.device_path
                ));
                reports.push(abandoned_report(&wh));
            }
        }

        let exit_code = if reports.iter().all(|r| r.status == DeviceOutcomeStatus::Success) {
            EXIT_SUCCESS
        } else {
            EXIT_COMPLETED_WITH_ERRORS
        };

        self.log.notice(&format!("wipe run complete: {} device(s) processed", reports.len()));

        if self.configuration.autopoweroff && exit_code == EXIT_SUCCESS {
            self.log.notice("autopoweroff requested but no poweroff collaborator is wired up (stub)");
        }

        SupervisorOutcome { reports, exit_code }
    }

    fn select_devices(&self, devices: Vec<DeviceContext>) -> Vec<DeviceContext> {
        devices
            .into_iter()
            .filter(|ctx| !self.configuration.exclude.iter().any(|p| p == &ctx.device_path))
            .filter(|ctx| !(self.configuration.nousb && ctx.bus_class == BusClass::Usb))
            .map(|mut ctx| {
                ctx.selection = SelectionState::Selected;
                ctx
            })
            .collect()
    }

    fn probe_and_size(&self, ctx: &mut DeviceContext) {
        let breaker = CircuitBreaker::default_device();
        let error_ctx = ErrorContext::new("hpa_dco_probe", ctx.device_path.clone());
        let device_path = ctx.device_path.clone();
        let device_size = ctx.total_size_bytes;
        let sector_size = ctx.logical_sector_size;
        let bus_class = ctx.bus_class;

        let result: DriveResult<HpaReconciliation> = execute_with_recovery(&error_ctx, &breaker, || {
            if matches!(bus_class, BusClass::Nvme | BusClass::Virt) {
                return Ok(HpaReconciliation {
                    status: HpaStatus::NotApplicable,
                    calculated_real_max_size_bytes: device_size,
                    hidden_sectors: 0,
                });
            }
            let probe = probe_hpa_dco(&device_path, device_size, sector_size);
            Ok(reconcile(probe))
        });

        match result {
            Ok(r) => {
                ctx.hpa_status = r.status;
                ctx.calculated_real_max_size = r.calculated_real_max_size_bytes;
            }
            Err(e) => {
                self.log.warning(&format!("HPA/DCO probe failed for {}: {e}", ctx.device_path));
                ctx.hpa_status = HpaStatus::Unknown;
            }
        }
    }

    fn open_device(&self, ctx: &DeviceContext) -> DriveResult<(File, bool)> {
        let breaker = CircuitBreaker::default_device();
        let error_ctx = ErrorContext::new("open_device", ctx.device_path.clone());
        let device_path = ctx.device_path.clone();
        let io_mode = self.configuration.io_mode;

        execute_with_recovery(&error_ctx, &breaker, || {
            let direct_requested = matches!(io_mode, IOMode::Direct | IOMode::Auto);
            let platform_io = platform_specific::get_platform_io();
            let file = platform_io.open_optimized(&device_path, direct_requested).map_err(|e| match &e {
                IOError::IoError(io_err) if io_err.kind() == std::io::ErrorKind::PermissionDenied => {
                    DriveError::PermissionDenied(device_path.clone())
                }
                IOError::IoError(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                    DriveError::NotFound(device_path.clone())
                }
                _ if direct_requested && io_mode == IOMode::Direct && is_direct_io_rejection(&e) => {
                    DriveError::DirectIoRefused(device_path.clone())
                }
                _ => DriveError::Io(std::io::Error::other(e.to_string())),
            })?;

            confirm_block_device(&file, &device_path)?;

            let seek_size = discover_size_via_seek(&file)?;
            let ioctl_size = discover_size_via_ioctl(&file)?;
            if seek_size != ioctl_size {
                return Err(DriveError::SizeMismatch { seek_size, ioctl_size });
            }

            Ok((file, direct_requested))
        })
    }

    fn spawn_signal_handler(
        &self,
        cancel: Arc<AtomicBool>,
        user_aborted: Arc<AtomicBool>,
        status_table: Arc<Mutex<Vec<(String, Arc<ProgressCounters>)>>>,
    ) {
        use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM, SIGUSR1};
        use signal_hook::iterator::Signals;

        let log = self.log.clone();
        let mut signals = match Signals::new([SIGUSR1, SIGHUP, SIGINT, SIGQUIT, SIGTERM]) {
            Ok(s) => s,
            Err(e) => {
                log.error(&format!("failed to install signal handlers: {e}"));
                return;
            }
        };

        thread::spawn(move || {
            for sig in signals.forever() {
                match sig {
                    SIGUSR1 => {
                        let table = status_table.lock().unwrap();
                        for (path, counters) in table.iter() {
                            log.info(&format!(
                                "{path}: round {} pass {} bytes_erased={} pass_errors={} verify_errors={} fsync_errors={}",
                                counters.round_number.load(Ordering::Relaxed),
                                counters.pass_number.load(Ordering::Relaxed),
                                counters.bytes_erased.load(Ordering::Relaxed),
                                counters.pass_errors.load(Ordering::Relaxed),
                                counters.verify_errors.load(Ordering::Relaxed),
                                counters.fsync_errors.load(Ordering::Relaxed),
                            ));
                        }
                    }
                    SIGHUP | SIGINT | SIGQUIT | SIGTERM => {
                        log.notice(&format!("signal {sig} received, cancelling the run"));
                        cancel.store(true, Ordering::Relaxed);
                        user_aborted.store(true, Ordering::Relaxed);
                    }
                    _ => {}
                }
            }
        });
    }

    fn join_with_timeout(&self, handles: &[WorkerHandle], cancel: &Arc<AtomicBool>) {
        loop {
            if handles.iter().all(|h| h.finished.load(Ordering::Relaxed)) {
                return;
            }
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            thread::sleep(Duration::from_millis(200));
        }

        let deadline = Instant::now() + THREAD_JOIN_TIMEOUT;
        while Instant::now() < deadline {
            if handles.iter().all(|h| h.finished.load(Ordering::Relaxed)) {
                return;
            }
            thread::sleep(Duration::from_millis(100));
        }
    }
}

fn to_report(result: ErasureResult, user_aborted: bool) -> DeviceReport {
    let status = if user_aborted && !result.success {
        DeviceOutcomeStatus::Aborted
    } else if result.success {
        DeviceOutcomeStatus::Success
    } else {
        DeviceOutcomeStatus::FailureWithErrors
    };
    DeviceReport { result, status }
}

fn abandoned_report(wh: &WorkerHandle) -> DeviceReport {
    let bytes_erased = wh.counters.bytes_erased.load(Ordering::Relaxed);
    DeviceReport {
        result: ErasureResult {
            device_path: wh.device_path.clone(),
            success: false,
            exit_code: 1,
            method: String::new(),
            prng: String::new(),
            rounds: 0,
            verify_mode: VerifyMode::None,
            hpa_status_pre: HpaStatus::Unknown,
            hpa_status_post: HpaStatus::Unknown,
            duration: Duration::default(),
            bytes_erased,
            passes: Vec::new(),
        },
        status: DeviceOutcomeStatus::Aborted,
    }
}

/// Builds the aggregated record for a device that never got a worker because it failed
/// per-device-fatal pre-flight (open / stat / non-block-device / size-mismatch /
/// direct-IO-refused), per §7 ("Mark device disabled; continue with others").
fn disabled_report(device_path: &str, _err: &DriveError) -> DeviceReport {
    DeviceReport {
        result: ErasureResult {
            device_path: device_path.to_string(),
            success: false,
            exit_code: -1,
            method: String::new(),
            prng: String::new(),
            rounds: 0,
            verify_mode: VerifyMode::None,
            hpa_status_pre: HpaStatus::Unknown,
            hpa_status_post: HpaStatus::Unknown,
            duration: Duration::default(),
            bytes_erased: 0,
            passes: Vec::new(),
        },
        status: DeviceOutcomeStatus::Disabled,
    }
}

fn is_direct_io_rejection(err: &IOError) -> bool {
    if let IOError::IoError(e) = err {
        matches!(e.raw_os_error(), Some(libc::EINVAL) | Some(libc::EOPNOTSUPP))
    } else {
        false
    }
}

fn confirm_block_device(file: &File, device_path: &str) -> DriveResult<()> {
    let mut stat: libc::stat = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::fstat(file.as_raw_fd(), &mut stat) };
    if rc < 0 {
        return Err(DriveError::Io(std::io::Error::last_os_error()));
    }
    if (stat.st_mode & libc::S_IFMT) != libc::S_IFBLK {
        return Err(DriveError::NotBlockDevice(device_path.to_string()));
    }
    Ok(())
}

fn discover_size_via_seek(file: &File) -> DriveResult<u64> {
    let mut file = file.try_clone()?;
    let size = file.seek(SeekFrom::End(0))?;
    file.seek(SeekFrom::Start(0))?;
    Ok(size)
}

#[cfg(target_os = "linux")]
fn discover_size_via_ioctl(file: &File) -> DriveResult<u64> {
    const BLKGETSIZE64: libc::c_ulong = 0x80081272;
    let mut size: u64 = 0;
    let rc = unsafe { libc::ioctl(file.as_raw_fd(), BLKGETSIZE64, &mut size as *mut u64) };
    if rc < 0 {
        return Err(DriveError::Io(std::io::Error::last_os_error()));
    }
    Ok(size)
}

#[cfg(not(target_os = "linux"))]
fn discover_size_via_ioctl(file: &File) -> DriveResult<u64> {
    discover_size_via_seek(file)
}

/// How many bytes the next write/read should transfer: bounded by what's left and by the
/// buffer size, then rounded down to a sector multiple when direct I/O is active (the
/// "last-odd-block" tail that needs a smaller aligned buffer rather than a short write).
fn next_transfer_size(remaining: u64, buffer_size: u64, sector_size: u64, direct_io: bool) -> u64 {
    let candidate = remaining.min(buffer_size);
    if !direct_io || sector_size == 0 || candidate < sector_size {
        return candidate;
    }
    candidate - (candidate % sector_size)
}

fn fill_pattern(buf: &mut [u8], pattern: &[u8]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = pattern[i % pattern.len()];
    }
}

/// Per-device pass executor (§4.5). Owns the device file descriptor exclusively for the
/// lifetime of the run; the supervisor never touches it once the worker thread starts.
struct Worker {
    ctx: DeviceContext,
    file: File,
    direct_io_active: bool,
    auto_fallback_allowed: bool,
    first_write_done: bool,
    configuration: Configuration,
    hardware: Arc<dyn HardwareEraseCommand>,
    buffer_size: u64,
}

impl Worker {
    fn new(ctx: DeviceContext, file: File, direct_io_active: bool, configuration: Configuration, hardware: Arc<dyn HardwareEraseCommand>) -> Self {
        let auto_fallback_allowed = configuration.io_mode == IOMode::Auto;
        Worker {
            ctx,
            file,
            direct_io_active,
            auto_fallback_allowed,
            first_write_done: false,
            configuration,
            hardware,
            buffer_size: DEFAULT_BUFFER_BYTES,
        }
    }

    fn run(mut self, counters: &ProgressCounters, cancel: &AtomicBool, log: &dyn LogSink) -> ErasureResult {
        let start_instant = Instant::now();
        let hpa_status_pre = self.ctx.hpa_status;
        let method = self.configuration.method;

        let passes = if method.is_hardware_command() {
            self.run_hardware_command(method, counters, log)
        } else {
            self.run_software_passes(method, counters, cancel, log)
        };

        let hpa_status_post = self.reprobe_hpa();

        let has_errors = passes.iter().any(|p| p.status != PassStatus::Ok);
        let bytes_erased = counters.bytes_erased.load(Ordering::Relaxed);

        ErasureResult {
            device_path: self.ctx.device_path,
            success: !has_errors,
            exit_code: if has_errors { 1 } else { 0 },
            method: format!("{method:?}"),
            prng: format!("{:?}", self.configuration.prng),
            rounds: self.configuration.rounds,
            verify_mode: self.configuration.verify_mode,
            hpa_status_pre,
            hpa_status_post,
            duration: start_instant.elapsed(),
            bytes_erased,
            passes,
        }
    }

    fn reprobe_hpa(&self) -> HpaStatus {
        if matches!(self.ctx.bus_class, BusClass::Nvme | BusClass::Virt) {
            return HpaStatus::NotApplicable;
        }
        let probe = probe_hpa_dco(&self.ctx.device_path, self.ctx.total_size_bytes, self.ctx.logical_sector_size);
        reconcile(probe).status
    }

    fn run_hardware_command(&self, method: MethodKind, counters: &ProgressCounters, log: &dyn LogSink) -> Vec<PassOutcome> {
        match self.hardware.execute(method, &self.ctx.device_path) {
            Ok(()) => {
                counters.pass_number.store(1, Ordering::Relaxed);
                vec![PassOutcome {
                    pass_index: 0,
                    bytes_written: self.ctx.calculated_real_max_size,
                    bytes_verified: 0,
                    mismatch_count: 0,
                    write_errors: 0,
                    fsync_errors: 0,
                    status: PassStatus::Ok,
                }]
            }
            Err(e) => {
                log.error(&format!("{method:?} on {}: {e}", self.ctx.device_path));
                counters.pass_errors.fetch_add(1, Ordering::Relaxed);
                vec![PassOutcome {
                    pass_index: 0,
                    bytes_written: 0,
                    bytes_verified: 0,
                    mismatch_count: 0,
                    write_errors: 1,
                    fsync_errors: 0,
                    status: PassStatus::Failed,
                }]
            }
        }
    }

    fn run_software_passes(&mut self, method: MethodKind, counters: &ProgressCounters, cancel: &AtomicBool, log: &dyn LogSink) -> Vec<PassOutcome> {
        let spec = build_method(method, self.configuration.rounds, self.configuration.verify_mode, self.configuration.blank_after);

        let mut seed = [0u8; 32];
        if secure_random_bytes(&mut seed).is_err() {
            log.warning(&format!("falling back to a process-local seed for {}", self.ctx.device_path));
        }
        let mut prng: Box<dyn WipePrng> = match PrngAlgorithm::init(self.configuration.prng, &seed) {
            Ok(p) => p,
            Err(e) => {
                log.error(&format!("PRNG initialization failed for {}: {e}", self.ctx.device_path));
                return vec![PassOutcome {
                    pass_index: 0,
                    bytes_written: 0,
                    bytes_verified: 0,
                    mismatch_count: 0,
                    write_errors: 1,
                    fsync_errors: 0,
                    status: PassStatus::Failed,
                }];
            }
        };

        let mut outcomes = Vec::new();
        let mut unit_index = 0usize;
        let mut idx = 0usize;
        let passes = &spec.passes;

        while idx < passes.len() {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            counters.pass_number.store(unit_index as u32 + 1, Ordering::Relaxed);

            let verify_next = match passes.get(idx + 1) {
                Some(PassSpec::Verify(expected)) => Some(expected.clone()),
                _ => None,
            };

            let (write_outcome, snapshot) = match &passes[idx] {
                PassSpec::Pattern(bytes) => (self.write_pass(|buf| fill_pattern(buf, bytes), counters, cancel), None),
                PassSpec::Random => {
                    let snapshot = if verify_next.is_some() { Some(prng.snapshot()) } else { None };
                    (self.write_pass(|buf| prng.fill(buf), counters, cancel), snapshot)
                }
                PassSpec::Verify(_) => {
                    // A top-level Verify without a preceding write is not produced by
                    // the method builder; skip defensively rather than double-count it.
                    idx += 1;
                    continue;
                }
            };

            let mut outcome = write_outcome;
            outcome.pass_index = unit_index;

            if let Some(expected) = verify_next {
                let verify_outcome = self.verify_pass(&expected, snapshot, counters, cancel);
                outcome.bytes_verified = verify_outcome.bytes_verified;
                outcome.mismatch_count = verify_outcome.mismatch_count;
                if verify_outcome.mismatch_count > 0 && outcome.status == PassStatus::Ok {
                    outcome.status = PassStatus::Partial;
                }
                idx += 2;
            } else {
                idx += 1;
            }

            outcomes.push(outcome);
            unit_index += 1;
        }

        outcomes
    }

    fn write_pass(&mut self, mut fill: impl FnMut(&mut [u8]), counters: &ProgressCounters, cancel: &AtomicBool) -> PassOutcome {
        let total = self.ctx.calculated_real_max_size;
        let sector_size = self.ctx.logical_sector_size.max(1);
        let mut buffer = AlignedBuffer::new(self.buffer_size as usize, sector_size as usize)
            .or_else(|_| AlignedBuffer::new(self.buffer_size as usize, 512))
            .expect("buffer allocation at a standard sector size should not fail");

        let platform_io = platform_specific::get_platform_io();
        let mut written_total = 0u64;
        let mut writes_since_sync = 0u64;
        let mut write_errors = 0u64;
        let mut fsync_errors = 0u64;

        while written_total < total {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            let remaining = total - written_total;
            let chunk = next_transfer_size(remaining, self.buffer_size, sector_size, self.direct_io_active) as usize;
            if chunk == 0 {
                break;
            }
            let slice = &mut buffer.as_mut_slice()[..chunk];
            fill(slice);

            match platform_io.write_optimized(&self.file, slice, written_total) {
                Ok(n) => {
                    written_total += n as u64;
                    counters.bytes_erased.fetch_add(n as u64, Ordering::Relaxed);
                    writes_since_sync += 1;
                    self.first_write_done = true;
                }
                Err(e) => {
                    if !self.first_write_done && self.direct_io_active && self.auto_fallback_allowed && is_direct_io_rejection(&e) {
                        self.direct_io_active = false;
                        self.first_write_done = true;
                        continue;
                    }
                    write_errors += 1;
                    counters.pass_errors.fetch_add(1, Ordering::Relaxed);
                    written_total += chunk as u64;
                    self.first_write_done = true;
                }
            }

            let pass_complete = written_total >= total;
            if self.configuration.sync_policy.should_sync(writes_since_sync, pass_complete) {
                if platform_io.sync_data(&self.file).is_err() {
                    fsync_errors += 1;
                    counters.fsync_errors.fetch_add(1, Ordering::Relaxed);
                }
                writes_since_sync = 0;
            }
        }

        PassOutcome {
            pass_index: 0,
            bytes_written: written_total,
            bytes_verified: 0,
            mismatch_count: 0,
            write_errors,
            fsync_errors,
            status: if write_errors > 0 { PassStatus::Partial } else { PassStatus::Ok },
        }
    }

    fn verify_pass(&mut self, expected: &Option<Vec<u8>>, mut snapshot: Option<Box<dyn WipePrng>>, counters: &ProgressCounters, cancel: &AtomicBool) -> PassOutcome {
        let total = self.ctx.calculated_real_max_size;
        let sector_size = self.ctx.logical_sector_size.max(1);
        let mut read_buffer = AlignedBuffer::new(self.buffer_size as usize, sector_size as usize)
            .or_else(|_| AlignedBuffer::new(self.buffer_size as usize, 512))
            .expect("buffer allocation at a standard sector size should not fail");
        let mut expect_buffer = vec![0u8; self.buffer_size as usize];

        let platform_io = platform_specific::get_platform_io();
        let mut verified_total = 0u64;
        let mut mismatches = 0u64;

        while verified_total < total {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            let remaining = total - verified_total;
            let chunk = next_transfer_size(remaining, self.buffer_size, sector_size, self.direct_io_active) as usize;
            if chunk == 0 {
                break;
            }
            let slice = &mut read_buffer.as_mut_slice()[..chunk];

            let read_ok = platform_io.read_optimized(&self.file, slice, verified_total).is_ok();

            let expected_slice: &[u8] = match (expected, &mut snapshot) {
                (Some(pattern), _) => {
                    fill_pattern(&mut expect_buffer[..chunk], pattern);
                    &expect_buffer[..chunk]
                }
                (None, Some(prng)) => {
                    prng.fill(&mut expect_buffer[..chunk]);
                    &expect_buffer[..chunk]
                }
                (None, None) => {
                    // No pattern and no snapshot to compare against; nothing to verify.
                    verified_total += chunk as u64;
                    continue;
                }
            };

            if !read_ok || slice != expected_slice {
                mismatches += 1;
                counters.verify_errors.fetch_add(1, Ordering::Relaxed);
            }
            verified_total += chunk as u64;
        }

        PassOutcome {
            pass_index: 0,
            bytes_written: 0,
            bytes_verified: verified_total,
            mismatch_count: mismatches,
            write_errors: 0,
            fsync_errors: 0,
            status: if mismatches > 0 { PassStatus::Partial } else { PassStatus::Ok },
        }
    }
}
