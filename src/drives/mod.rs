// Drive detection and HPA/DCO operations.

pub mod detection;
pub mod operations;

pub use detection::DriveDetector;
pub use operations::{format_size_iec, probe_hpa_dco, reconcile, HpaDcoProbe, HpaReconciliation, HpaStatus};
