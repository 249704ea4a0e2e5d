// Drive operations: HPA/DCO discovery and reconciliation.

pub mod hpa_dco; // ATA pass-through probing for Host Protected Area / Device Configuration Overlay
pub mod hpa_reconciliation; // Pure HPA/DCO status classification and size reconciliation

pub use hpa_dco::probe as probe_hpa_dco;
pub use hpa_reconciliation::{format_size_iec, reconcile, HpaDcoProbe, HpaReconciliation, HpaStatus};
