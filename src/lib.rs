// Allow uppercase acronyms for industry-standard terms like HDD, SSD, HPA, DCO.
#![allow(clippy::upper_case_acronyms)]
// Allow complex types where needed for comprehensive error handling and configuration
#![allow(clippy::type_complexity)]

pub mod algorithms;
pub mod crypto;
pub mod drives;
pub mod error;
pub mod io;
pub mod logging;
pub mod wipe_orchestrator;

pub use error::{DriveError, DriveResult};
pub use logging::{LogLevel, LogSink, TracingLogSink};
pub use wipe_orchestrator::{Supervisor, SupervisorOutcome};

use algorithms::round_size::VerifyMode;
use crypto::prng::PrngAlgorithm;
use drives::operations::HpaStatus;
use io::{IOMode, SyncPolicy};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// The bus a device is attached through. Only matters for HPA/DCO applicability (ATA-family
/// buses honour ATA pass-through; NVMe and virtual buses don't) and for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusClass {
    Unknown,
    Ide,
    Scsi,
    Sas,
    Ata,
    Usb,
    Nvme,
    Ieee1394,
    Virt,
    Compaq,
}

/// Whether an enumerated device is part of this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionState {
    Unselected,
    Selected,
    Disabled,
}

/// Lifecycle state of a device's wipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WipeStatus {
    NotStarted,
    Running,
    Completed,
}

/// One enumerated device and its mutable wipe progress (§3).
///
/// Created at enumeration, destroyed after aggregation. Progress fields (`pass_number`
/// onward) are mutated exclusively by the worker that owns this device; selection and
/// lifecycle fields are mutated exclusively by the supervisor.
#[derive(Debug, Clone)]
pub struct DeviceContext {
    pub device_path: String,
    pub model: String,
    pub serial: String,
    pub logical_sector_size: u64,
    pub physical_sector_size: u64,
    pub total_size_bytes: u64,
    pub bus_class: BusClass,
    pub is_ssd: bool,

    pub hpa_status: HpaStatus,
    pub hpa_reported_set: u64,
    pub hpa_reported_real: u64,
    pub dco_real_max_sectors: u64,
    pub calculated_real_max_size: u64,

    pub selection: SelectionState,

    pub pass_number: u32,
    pub round_number: u32,
    pub bytes_erased: u64,
    pub pass_errors: u64,
    pub verify_errors: u64,
    pub fsync_errors: u64,
    pub wipe_status: WipeStatus,
    pub start_time: Option<SystemTime>,
    pub end_time: Option<SystemTime>,
    pub result: Option<DriveResult<()>>,
    pub signal: Option<i32>,
}

impl DeviceContext {
    /// True once the invariant `pass_errors + verify_errors + fsync_errors > 0 => result !=
    /// success` would be violated by declaring success.
    pub fn has_any_errors(&self) -> bool {
        self.pass_errors > 0 || self.verify_errors > 0 || self.fsync_errors > 0
    }
}

/// Immutable-once-started run configuration (§3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub method: algorithms::pattern_engine::MethodKind,
    pub prng: PrngAlgorithm,
    pub rounds: u32,
    pub blank_after: bool,
    pub verify_mode: VerifyMode,
    pub sync_policy: SyncPolicy,
    pub io_mode: IOMode,
    /// Up to 32 device paths excluded from an autonuke run.
    pub exclude: Vec<String>,
    /// Exclude USB-attached devices from enumeration (§4.6 step 1).
    pub nousb: bool,
    /// Anonymize serial numbers in logs and certificates.
    pub quiet: bool,
    /// Emit debug-level log events.
    pub verbose: bool,
    /// Skip the interactive confirmation/selection screen.
    pub autonuke: bool,
    /// Run the (stub) auto-poweroff collaborator after aggregation (§4.6 step 7).
    pub autopoweroff: bool,
    /// Skip the pre-wipe confirmation delay.
    pub nowait: bool,
    /// Ignore SIGHUP/SIGINT/SIGQUIT/SIGTERM instead of treating them as cancellation.
    pub nosignals: bool,
    /// Suppress the interactive progress UI.
    pub nogui: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            method: algorithms::pattern_engine::MethodKind::DodShort,
            prng: PrngAlgorithm::default(),
            rounds: 1,
            blank_after: false,
            verify_mode: VerifyMode::Last,
            sync_policy: SyncPolicy::AtEnd,
            io_mode: IOMode::Auto,
            exclude: Vec::new(),
            nousb: false,
            quiet: false,
            verbose: false,
            autonuke: false,
            autopoweroff: false,
            nowait: false,
            nosignals: false,
            nogui: false,
        }
    }
}

/// Outcome of a single pass (§3). `bytes_verified <= bytes_written`; `mismatch_count > 0`
/// implies `status` is not `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassOutcome {
    pub pass_index: usize,
    pub bytes_written: u64,
    pub bytes_verified: u64,
    pub mismatch_count: u64,
    pub write_errors: u64,
    pub fsync_errors: u64,
    pub status: PassStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassStatus {
    Ok,
    Partial,
    Failed,
}

/// Final per-device record produced at worker exit (§3, §4.7), consumed by the certificate
/// producer and the logger.
#[derive(Debug, Clone)]
pub struct ErasureResult {
    pub device_path: String,
    pub success: bool,
    /// 0 success, positive non-fatal error count, negative fatal.
    pub exit_code: i32,
    pub method: String,
    pub prng: String,
    pub rounds: u32,
    pub verify_mode: VerifyMode,
    pub hpa_status_pre: HpaStatus,
    pub hpa_status_post: HpaStatus,
    pub duration: Duration,
    pub bytes_erased: u64,
    pub passes: Vec<PassOutcome>,
}
