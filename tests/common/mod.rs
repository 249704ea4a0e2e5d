// Shared helper for integration tests that need a real block device. The engine's
// `confirm_block_device` check rejects anything that isn't `S_IFBLK`, so a plain
// tempfile can't stand in for a device the way it can in the unit-test buffer helpers --
// these tests bind a loopback device to a backing file with `losetup` and require root,
// matching the engine's own preflight requirement.

use std::process::Command;

pub struct LoopDevice {
    pub path: String,
    backing_file: tempfile::NamedTempFile,
}

impl LoopDevice {
    /// Creates a zeroed backing file of `size_bytes` and binds it to a free loop device.
    /// Returns `None` when not running as root or when `losetup` is unavailable, so callers
    /// can skip rather than fail in unprivileged/non-Linux environments.
    pub fn create(size_bytes: u64) -> Option<Self> {
        if !is_root() {
            return None;
        }

        let backing_file = tempfile::NamedTempFile::new().ok()?;
        backing_file.as_file().set_len(size_bytes).ok()?;

        let output = Command::new("losetup")
            .args(["--find", "--show", backing_file.path().to_str()?])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let path = String::from_utf8(output.stdout).ok()?.trim().to_string();
        if path.is_empty() {
            return None;
        }

        Some(LoopDevice { path, backing_file })
    }

    pub fn backing_path(&self) -> &std::path::Path {
        self.backing_file.path()
    }
}

impl Drop for LoopDevice {
    fn drop(&mut self) {
        let _ = Command::new("losetup").args(["--detach", &self.path]).status();
    }
}

fn is_root() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
