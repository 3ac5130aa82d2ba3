use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/fwupd-hybris/config.toml";

/// Candidate `build.prop` locations, in lookup order. Which one exists
/// depends on how the Android rootfs is mounted (LXC container, halium
/// mount, or bare partition).
const PROP_FILE_CANDIDATES: &[&str] = &[
    "/var/lib/lxc/android/rootfs/vendor/build.prop",
    "/android/vendor/build.prop",
    "/vendor/build.prop",
    "/var/lib/lxc/android/rootfs/odm/etc/build.prop",
    "/android/odm/etc/build.prop",
    "/odm/etc/build.prop",
    "/vendor/odm_dlkm/etc/build.prop",
];

const BOOTCONFIG_PATH: &str = "/proc/bootconfig";
const MACHINE_ID_PATH: &str = "/etc/machine-id";

/// Sensors HAL interface versions, probed lowest first.
const SENSOR_ABIS: &[&str] = &["1.0", "2.0", "2.1"];

const PROBE_TIMEOUT_SECS: u64 = 5;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// Ordered `build.prop` candidates; the first existing file wins.
    pub prop_files: Vec<PathBuf>,

    /// Kernel boot config source.
    pub bootconfig: PathBuf,

    pub machine_id: PathBuf,

    /// Explicit path to the `binder-call` executable. When unset the
    /// binary is looked up on `$PATH`.
    pub binder_call: Option<PathBuf>,

    /// Sensors HAL versions to try, in order.
    pub sensor_abis: Vec<String>,

    /// Upper bound for each external probe (subprocess or bus call).
    pub probe_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prop_files: PROP_FILE_CANDIDATES.iter().map(PathBuf::from).collect(),
            bootconfig: PathBuf::from(BOOTCONFIG_PATH),
            machine_id: PathBuf::from(MACHINE_ID_PATH),
            binder_call: None,
            sensor_abis: SENSOR_ABIS.iter().map(|s| s.to_string()).collect(),
            probe_timeout_secs: PROBE_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Parse the config at [path]. A missing file yields the defaults; a
    /// file that exists but doesn't parse is an error.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&raw)
            .map_err(|e| crate::Error::InvalidConfig(path.display().to_string(), e.to_string()))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}
