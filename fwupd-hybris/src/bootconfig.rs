use std::path::Path;

use log::debug;

use crate::props::{PropSource, BOOTLOADER_PROP};
use crate::utils::PropLines;

const BOOTLOADER_MARKER: &str = "androidboot.bootloader";
const SERIALNO_MARKER: &str = "androidboot.serialno";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootInfo {
    pub bootloader: String,
    pub serial: String,
}

/// Scan the kernel boot config for the bootloader name and serial number.
///
/// When a marker appears on more than one line the last one wins. An
/// unreadable source falls back to the `ro.bootloader` property for the
/// name; there is no fallback for the serial.
pub fn read_boot_info(path: &Path, props: &PropSource) -> BootInfo {
    let lines = match PropLines::try_from(path) {
        Ok(v) => v,
        Err(e) => {
            debug!(
                "boot config {} unreadable ({}), falling back to {}",
                path.display(),
                e,
                BOOTLOADER_PROP
            );
            return BootInfo {
                bootloader: props.get(BOOTLOADER_PROP),
                serial: String::new(),
            };
        }
    };

    let mut info = BootInfo::default();
    for line in lines {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                debug!("failed reading {}: {}", path.display(), e);
                break;
            }
        };
        if line.contains(BOOTLOADER_MARKER) {
            if let Some(v) = marker_value(&line) {
                info.bootloader = v;
            }
        }
        if line.contains(SERIALNO_MARKER) {
            if let Some(v) = marker_value(&line) {
                info.serial = v;
            }
        }
    }
    info
}

/// The value side of a `key = "value"` line. Exactly one `=` is expected;
/// the value is stripped of whitespace and surrounding quotes.
fn marker_value(line: &str) -> Option<String> {
    let mut parts = line.split('=');
    parts.next()?;
    let value = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(value.trim().trim_matches('"').to_string())
}
