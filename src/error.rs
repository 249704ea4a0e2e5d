//! Error taxonomy and retry/backoff machinery for the engine's pre-flight and
//! per-device-fatal paths. Per-pass failures are *not* routed through retry —
//! they are counted in-place on the `DeviceContext` per the worker's own
//! failure model.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors surfaced by device-open, stat, and HPA/DCO probe operations.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("device is not a block device: {0}")]
    NotBlockDevice(String),

    #[error("size discovery disagreement: seek reported {seek_size}, ioctl reported {ioctl_size}")]
    SizeMismatch { seek_size: u64, ioctl_size: u64 },

    #[error("direct I/O refused by device: {0}")]
    DirectIoRefused(String),

    #[error("ATA pass-through failed: {0}")]
    AtaPassThroughFailed(String),

    #[error("insufficient permissions: {0}")]
    PermissionDenied(String),

    #[error("device not found: {0}")]
    NotFound(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("operation interrupted")]
    Interrupted,
}

impl Clone for DriveError {
    fn clone(&self) -> Self {
        match self {
            DriveError::Io(e) => DriveError::Io(std::io::Error::new(e.kind(), e.to_string())),
            DriveError::NotBlockDevice(s) => DriveError::NotBlockDevice(s.clone()),
            DriveError::SizeMismatch { seek_size, ioctl_size } => DriveError::SizeMismatch {
                seek_size: *seek_size,
                ioctl_size: *ioctl_size,
            },
            DriveError::DirectIoRefused(s) => DriveError::DirectIoRefused(s.clone()),
            DriveError::AtaPassThroughFailed(s) => DriveError::AtaPassThroughFailed(s.clone()),
            DriveError::PermissionDenied(s) => DriveError::PermissionDenied(s.clone()),
            DriveError::NotFound(s) => DriveError::NotFound(s.clone()),
            DriveError::Unsupported(s) => DriveError::Unsupported(s.clone()),
            DriveError::Interrupted => DriveError::Interrupted,
        }
    }
}

pub type DriveResult<T> = Result<T, DriveError>;

/// Error class per §7's taxonomy, used only to drive retry policy for
/// pre-flight / per-device-fatal operations (device open, HPA/DCO probe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Transient,
    Recoverable,
    Fatal,
    UserInterrupted,
}

impl ErrorClass {
    pub fn allows_retry(self) -> bool {
        matches!(self, ErrorClass::Transient | ErrorClass::Recoverable)
    }

    pub fn default_max_retries(self) -> u32 {
        match self {
            ErrorClass::Transient => 10,
            ErrorClass::Recoverable => 5,
            ErrorClass::Fatal => 0,
            ErrorClass::UserInterrupted => 0,
        }
    }
}

/// Context attached to a classified error: which operation, which device.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub operation: String,
    pub device_path: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>, device_path: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            device_path: device_path.into(),
        }
    }
}

pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn classify(error: &DriveError) -> ErrorClass {
        match error {
            DriveError::Interrupted => ErrorClass::UserInterrupted,
            DriveError::NotFound(_)
            | DriveError::PermissionDenied(_)
            | DriveError::Unsupported(_)
            | DriveError::NotBlockDevice(_)
            | DriveError::SizeMismatch { .. } => ErrorClass::Fatal,
            DriveError::DirectIoRefused(_) => ErrorClass::Fatal,
            DriveError::AtaPassThroughFailed(_) => ErrorClass::Recoverable,
            DriveError::Io(e) => Self::classify_io(e.kind()),
        }
    }

    fn classify_io(kind: std::io::ErrorKind) -> ErrorClass {
        use std::io::ErrorKind::*;
        match kind {
            Interrupted | WouldBlock | TimedOut | BrokenPipe | ConnectionReset => {
                ErrorClass::Transient
            }
            NotFound | PermissionDenied | Unsupported | InvalidInput => ErrorClass::Fatal,
            UnexpectedEof | WriteZero => ErrorClass::Recoverable,
            _ => ErrorClass::Transient,
        }
    }
}

/// Exponential backoff with jitter, per error class.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
    jitter_factor: f64,
}

impl ExponentialBackoff {
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts,
            jitter_factor: 0.3,
        }
    }

    pub fn transient() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(30), 10)
    }

    pub fn recoverable() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(60), 5)
    }

    pub fn next_delay(&self, attempt: u32) -> Duration {
        let exponential_ms = self.base_delay.as_millis() * (2_u128.pow(attempt.min(32)));
        let capped_ms = exponential_ms.min(self.max_delay.as_millis());
        let jitter_range = capped_ms as f64 * self.jitter_factor;
        let jitter = (rand::random::<f64>() - 0.5) * 2.0 * jitter_range;
        let final_ms = (capped_ms as f64 + jitter).max(0.0);
        Duration::from_millis(final_ms as u64)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// Prevents hammering a persistently failing device open / HPA-DCO probe.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    success_threshold: u32,
    timeout: Duration,
    state: Arc<Mutex<CircuitState>>,
}

#[derive(Debug, Clone)]
struct CircuitState {
    status: CircuitStatus,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CircuitStatus {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, success_threshold: u32, timeout: Duration) -> Self {
        Self {
            failure_threshold,
            success_threshold,
            timeout,
            state: Arc::new(Mutex::new(CircuitState {
                status: CircuitStatus::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
            })),
        }
    }

    pub fn default_device() -> Self {
        Self::new(5, 3, Duration::from_secs(30))
    }

    pub fn call<F, T>(&self, operation: F) -> DriveResult<T>
    where
        F: FnOnce() -> DriveResult<T>,
    {
        {
            let mut state = self.state.lock().unwrap();
            match state.status {
                CircuitStatus::Open => {
                    if let Some(opened_at) = state.opened_at {
                        if opened_at.elapsed() >= self.timeout {
                            state.status = CircuitStatus::HalfOpen;
                            state.success_count = 0;
                            tracing::info!("circuit breaker transitioning to half-open");
                        } else {
                            return Err(DriveError::Unsupported(format!(
                                "circuit breaker open (opened {:?} ago)",
                                opened_at.elapsed()
                            )));
                        }
                    }
                }
                CircuitStatus::Closed | CircuitStatus::HalfOpen => {}
            }
        }

        match operation() {
            Ok(v) => {
                self.record_success();
                Ok(v)
            }
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        }
    }

    fn record_success(&self) {
        let mut state = self.state.lock().unwrap();
        match state.status {
            CircuitStatus::Closed => state.failure_count = 0,
            CircuitStatus::HalfOpen => {
                state.success_count += 1;
                if state.success_count >= self.success_threshold {
                    state.status = CircuitStatus::Closed;
                    state.failure_count = 0;
                    state.success_count = 0;
                    state.opened_at = None;
                }
            }
            CircuitStatus::Open => {
                state.status = CircuitStatus::Closed;
                state.failure_count = 0;
                state.opened_at = None;
            }
        }
    }

    fn record_failure(&self) {
        let mut state = self.state.lock().unwrap();
        match state.status {
            CircuitStatus::Closed => {
                state.failure_count += 1;
                if state.failure_count >= self.failure_threshold {
                    state.status = CircuitStatus::Open;
                    state.opened_at = Some(Instant::now());
                    tracing::warn!(
                        "circuit breaker opened after {} failures",
                        self.failure_threshold
                    );
                }
            }
            CircuitStatus::HalfOpen => {
                state.status = CircuitStatus::Open;
                state.opened_at = Some(Instant::now());
                state.success_count = 0;
            }
            CircuitStatus::Open => {}
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state.lock().unwrap().status, CircuitStatus::Open)
    }
}

/// Runs `operation` with classification-driven retry. Fatal and
/// user-interrupted errors abort immediately; transient/recoverable errors
/// retry with backoff up to the class's default attempt budget.
pub fn execute_with_recovery<F, T>(
    context: &ErrorContext,
    breaker: &CircuitBreaker,
    mut operation: F,
) -> DriveResult<T>
where
    F: FnMut() -> DriveResult<T>,
{
    let backoffs: HashMap<ErrorClass, ExponentialBackoff> = HashMap::from([
        (ErrorClass::Transient, ExponentialBackoff::transient()),
        (ErrorClass::Recoverable, ExponentialBackoff::recoverable()),
    ]);

    let mut attempt = 0u32;
    loop {
        let result = breaker.call(|| operation());
        match result {
            Ok(v) => return Ok(v),
            Err(e) => {
                let class = ErrorClassifier::classify(&e);
                if !class.allows_retry() {
                    tracing::error!(
                        operation = %context.operation,
                        device = %context.device_path,
                        error = %e,
                        "fatal error, not retrying"
                    );
                    return Err(e);
                }
                let max = class.default_max_retries();
                if attempt >= max {
                    tracing::error!(
                        operation = %context.operation,
                        device = %context.device_path,
                        "exhausted {} retries",
                        max
                    );
                    return Err(e);
                }
                let backoff = backoffs.get(&class).expect("retry class has a backoff");
                let delay = backoff.next_delay(attempt);
                tracing::warn!(
                    operation = %context.operation,
                    device = %context.device_path,
                    attempt,
                    ?delay,
                    error = %e,
                    "retrying after transient error"
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}
