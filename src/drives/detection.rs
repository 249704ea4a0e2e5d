//! Block device enumeration (§2 ambient stack, §6 device list).
//!
//! Scans `/sys/block` for candidate devices and reports their geometry and bus class. Does
//! not probe HPA/DCO, SED, TRIM, SMART, or freeze state -- the supervisor calls
//! `operations::hpa_dco::probe` and `operations::hpa_reconciliation::reconcile` separately
//! for the one hidden-area check this engine still performs before wiping.

use crate::{BusClass, DeviceContext, SelectionState, WipeStatus};
use std::fs;
use std::path::Path;

pub struct DriveDetector;

impl DriveDetector {
    /// Enumerate physical block devices visible to this host.
    pub fn detect_all_drives() -> std::io::Result<Vec<DeviceContext>> {
        let mut drives = Vec::new();

        for entry in fs::read_dir("/sys/block")? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if Self::should_skip_device(&name) {
                continue;
            }

            let device_path = format!("/dev/{}", name);
            if !Path::new(&device_path).exists() {
                continue;
            }

            if let Ok(ctx) = Self::describe(&name, &device_path) {
                drives.push(ctx);
            }
        }

        Ok(drives)
    }

    /// Skip loop devices, ram disks, device-mapper targets, optical drives, and zram --
    /// none are wipeable physical media in the sense this engine cares about.
    pub(crate) fn should_skip_device(device_name: &str) -> bool {
        device_name.starts_with("loop")
            || device_name.starts_with("ram")
            || device_name.starts_with("dm-")
            || device_name.starts_with("sr")
            || device_name.starts_with("zram")
    }

    fn describe(sys_name: &str, device_path: &str) -> std::io::Result<DeviceContext> {
        let sys_dir = format!("/sys/block/{}", sys_name);

        let model = read_trimmed(&format!("{}/device/model", sys_dir)).unwrap_or_default();
        let serial = read_trimmed(&format!("{}/device/serial", sys_dir)).unwrap_or_default();

        let logical_sector_size = read_trimmed(&format!("{}/queue/logical_block_size", sys_dir))
            .and_then(|s| s.parse().ok())
            .unwrap_or(512);
        let physical_sector_size = read_trimmed(&format!("{}/queue/physical_block_size", sys_dir))
            .and_then(|s| s.parse().ok())
            .unwrap_or(logical_sector_size);

        let size_sectors = read_trimmed(&format!("{}/size", sys_dir))
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        let total_size_bytes = size_sectors * 512;

        let is_ssd = read_trimmed(&format!("{}/queue/rotational", sys_dir))
            .map(|v| v.trim() == "0")
            .unwrap_or(false);

        let bus_class = classify_bus(sys_name, &sys_dir);

        Ok(DeviceContext::new(
            device_path.to_string(),
            model,
            serial,
            logical_sector_size,
            physical_sector_size,
            total_size_bytes,
            bus_class,
            is_ssd,
        ))
    }
}

fn read_trimmed(path: &str) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

fn classify_bus(sys_name: &str, sys_dir: &str) -> BusClass {
    if sys_name.starts_with("nvme") {
        return BusClass::Nvme;
    }

    let real_path = fs::canonicalize(sys_dir).ok();
    let device_chain = real_path
        .as_deref()
        .map(|p| p.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if device_chain.contains("usb") {
        BusClass::Usb
    } else if device_chain.contains("virtio") || device_chain.contains("vd") {
        BusClass::Virt
    } else if device_chain.contains("ata") {
        BusClass::Ata
    } else if device_chain.contains("scsi") {
        BusClass::Scsi
    } else {
        BusClass::Unknown
    }
}

impl DeviceContext {
    /// Builds a freshly enumerated device, unselected and not yet wiped.
    pub fn new(
        device_path: String,
        model: String,
        serial: String,
        logical_sector_size: u64,
        physical_sector_size: u64,
        total_size_bytes: u64,
        bus_class: BusClass,
        is_ssd: bool,
    ) -> Self {
        Self {
            device_path,
            model,
            serial,
            logical_sector_size,
            physical_sector_size,
            total_size_bytes,
            bus_class,
            is_ssd,
            hpa_status: crate::drives::operations::HpaStatus::Unknown,
            hpa_reported_set: 0,
            hpa_reported_real: 0,
            dco_real_max_sectors: 0,
            calculated_real_max_size: total_size_bytes,
            selection: SelectionState::Unselected,
            pass_number: 0,
            round_number: 0,
            bytes_erased: 0,
            pass_errors: 0,
            verify_errors: 0,
            fsync_errors: 0,
            wipe_status: WipeStatus::NotStarted,
            start_time: None,
            end_time: None,
            result: None,
            signal: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_virtual_and_optical_devices() {
        assert!(DriveDetector::should_skip_device("loop0"));
        assert!(DriveDetector::should_skip_device("ram0"));
        assert!(DriveDetector::should_skip_device("dm-0"));
        assert!(DriveDetector::should_skip_device("sr0"));
        assert!(DriveDetector::should_skip_device("zram0"));
        assert!(!DriveDetector::should_skip_device("sda"));
        assert!(!DriveDetector::should_skip_device("nvme0n1"));
    }

    #[test]
    fn nvme_devices_are_classified_by_name_without_sysfs() {
        assert_eq!(classify_bus("nvme0n1", "/sys/block/nvme0n1"), BusClass::Nvme);
    }
}
