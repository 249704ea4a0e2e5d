//! ATA pass-through prober for Host Protected Area / Device Configuration Overlay (§4.4).
//!
//! Issues the native-max-address query (`READ NATIVE MAX ADDRESS EXT`, ATA command 0x27)
//! and the literal DCO-identify CDB below via `SG_IO`, then hands the raw sector counts to
//! [`super::hpa_reconciliation::reconcile`] for classification. Owns no interpretation of
//! what the numbers mean -- only how to get them off the wire.

use super::hpa_reconciliation::HpaDcoProbe;
use std::fs::OpenOptions;
use std::os::unix::io::AsRawFd;

/// `DEVICE CONFIGURATION IDENTIFY` via ATA PASS-THROUGH(16), exactly as issued on the wire.
const DCO_IDENTIFY_CDB: [u8; 16] = [
    0x85, 0x08, 0x0E, 0x00, 0xC2, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x40, 0xB1, 0x00,
];

const SG_IO: libc::c_ulong = 0x2285;
const SG_DXFER_FROM_DEV: i32 = -3;

#[repr(C)]
struct SgIoHdr {
    interface_id: i32,
    dxfer_direction: i32,
    cmd_len: u8,
    mx_sb_len: u8,
    iovec_count: u16,
    dxfer_len: u32,
    dxferp: *mut libc::c_void,
    cmdp: *mut u8,
    sbp: *mut u8,
    timeout: u32,
    flags: u32,
    pack_id: i32,
    usr_ptr: *mut libc::c_void,
    status: u8,
    masked_status: u8,
    msg_status: u8,
    sb_len_wr: u8,
    host_status: u16,
    driver_status: u16,
    resid: i32,
    duration: u32,
    info: u32,
}

/// Issues both probes against `device_path` and folds the device's reported geometry in,
/// producing the raw input to `hpa_reconciliation::reconcile`. Never fails: a device that
/// rejects ATA pass-through (open failure, ENOTTY/EINVAL, or a sense-buffer ILLEGAL REQUEST)
/// reports `ata_passthrough_unsupported = true` rather than propagating an error, since
/// "this isn't an ATA disk" is an expected, non-exceptional outcome of probing an arbitrary
/// block device (NVMe, most USB bridges, virtual disks).
pub fn probe(device_path: &str, device_size_bytes: u64, sector_size: u64) -> HpaDcoProbe {
    let file = match OpenOptions::new().read(true).write(false).open(device_path) {
        Ok(f) => f,
        Err(_) => return unsupported_probe(device_size_bytes, sector_size),
    };

    let dco_max = match issue_dco_identify(file.as_raw_fd()) {
        Some(sectors) => sectors,
        None => return unsupported_probe(device_size_bytes, sector_size),
    };

    let (hpa_set, hpa_real) =
        read_native_and_current_max(device_path, device_size_bytes, sector_size);

    HpaDcoProbe {
        hpa_set,
        hpa_real,
        dco_max,
        device_size_bytes,
        sector_size,
        ata_passthrough_unsupported: false,
    }
}

fn unsupported_probe(device_size_bytes: u64, sector_size: u64) -> HpaDcoProbe {
    HpaDcoProbe {
        hpa_set: 0,
        hpa_real: 0,
        dco_max: 0,
        device_size_bytes,
        sector_size,
        ata_passthrough_unsupported: true,
    }
}

fn new_sg_io_hdr(cdb: &mut [u8; 16], data: &mut [u8; 512], sense: &mut [u8; 32]) -> SgIoHdr {
    SgIoHdr {
        interface_id: b'S' as i32,
        dxfer_direction: SG_DXFER_FROM_DEV,
        cmd_len: cdb.len() as u8,
        mx_sb_len: sense.len() as u8,
        iovec_count: 0,
        dxfer_len: data.len() as u32,
        dxferp: data.as_mut_ptr() as *mut libc::c_void,
        cmdp: cdb.as_mut_ptr(),
        sbp: sense.as_mut_ptr(),
        timeout: 20_000,
        flags: 0,
        pack_id: 0,
        usr_ptr: std::ptr::null_mut(),
        status: 0,
        masked_status: 0,
        msg_status: 0,
        sb_len_wr: 0,
        host_status: 0,
        driver_status: 0,
        resid: 0,
        duration: 0,
        info: 0,
    }
}

/// Issues the literal DCO-identify CDB and extracts the reported max-sector field from the
/// returned ATA IDENTIFY-style payload. Returns `None` on an ioctl failure (ENOTTY/EINVAL) or
/// a sense-buffer ILLEGAL REQUEST, both of which signal "this device doesn't speak ATA
/// pass-through".
fn issue_dco_identify(fd: i32) -> Option<u64> {
    let mut cdb = DCO_IDENTIFY_CDB;
    let mut data = [0u8; 512];
    let mut sense = [0u8; 32];
    let mut hdr = new_sg_io_hdr(&mut cdb, &mut data, &mut sense);

    let rc = unsafe { libc::ioctl(fd, SG_IO, &mut hdr as *mut SgIoHdr) };
    if rc < 0 || sense_is_illegal_request(&sense) {
        return None;
    }

    // §4.4: the DCO-reported real max sector count sits in bytes 6-13 of the returned
    // 512-byte block as a little-endian u64, incremented by one when nonzero.
    let mut field = [0u8; 8];
    field.copy_from_slice(&data[6..14]);
    let raw = u64::from_le_bytes(field);
    Some(if raw != 0 { raw + 1 } else { 0 })
}

fn sense_is_illegal_request(sense: &[u8; 32]) -> bool {
    (sense[2] & 0x0F) == 0x05
}

/// `READ NATIVE MAX ADDRESS EXT` (reports the drive's true max LBA) paired with the
/// OS-reported current max (from the block device's own geometry) gives the
/// `hpa_set`/`hpa_real` pair that `hpa_reconciliation::classify` keys off of.
fn read_native_and_current_max(
    device_path: &str,
    device_size_bytes: u64,
    sector_size: u64,
) -> (u64, u64) {
    let current_max = if sector_size == 0 {
        0
    } else {
        device_size_bytes / sector_size
    };

    let native_max = native_max_address(device_path).unwrap_or(current_max);
    (current_max, native_max)
}

fn native_max_address(device_path: &str) -> Option<u64> {
    let file = OpenOptions::new().read(true).open(device_path).ok()?;

    // READ NATIVE MAX ADDRESS EXT (ATA command 0x27), issued via ATA PASS-THROUGH(16).
    let mut cdb: [u8; 16] = [
        0x85, 0x08, 0x0E, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x40, 0x27,
        0x00,
    ];
    let mut data = [0u8; 512];
    let mut sense = [0u8; 32];
    let mut hdr = new_sg_io_hdr(&mut cdb, &mut data, &mut sense);

    let rc = unsafe { libc::ioctl(file.as_raw_fd(), SG_IO, &mut hdr as *mut SgIoHdr) };
    if rc < 0 || sense_is_illegal_request(&sense) {
        return None;
    }

    Some(u64::from_le_bytes(data[8..16].try_into().unwrap()))
}
