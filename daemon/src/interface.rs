use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use tokio::sync::Notify;
use zbus::interface;
use zbus::zvariant::{OwnedFd, OwnedValue, Value};

use fwupd_hybris::device::PLUGIN_NAME;
use fwupd_hybris::Snapshot;

pub const BUS_NAME: &str = "org.freedesktop.fwupd";
pub const OBJECT_PATH: &str = "/";

/// The fwupd release we impersonate.
const DAEMON_VERSION: &str = "1.9.12";
const HOST_SECURITY_ID: &str = "1";

/// FWUPD_STATUS_IDLE
const STATUS_IDLE: u32 = 1;
/// fwupd reports 101 for "battery level unknown".
const BATTERY_LEVEL_UNKNOWN: u32 = 101;

type VarDict = HashMap<String, Value<'static>>;

/// The `org.freedesktop.fwupd` facade. Real state is the startup
/// [Snapshot]; everything mutating is accepted and ignored so that generic
/// fwupd clients run against us without erroring out.
pub struct FwupdInterface {
    snapshot: Arc<Snapshot>,
    quit: Arc<Notify>,
}

impl FwupdInterface {
    pub fn new(snapshot: Arc<Snapshot>, quit: Arc<Notify>) -> Self {
        Self { snapshot, quit }
    }
}

#[interface(name = "org.freedesktop.fwupd")]
impl FwupdInterface {
    #[zbus(property)]
    fn daemon_version(&self) -> &str {
        DAEMON_VERSION
    }

    #[zbus(property)]
    fn host_bkc(&self) -> &str {
        ""
    }

    #[zbus(property)]
    fn host_vendor(&self) -> &str {
        &self.snapshot.host_vendor
    }

    #[zbus(property)]
    fn host_product(&self) -> &str {
        &self.snapshot.host_product
    }

    #[zbus(property)]
    fn host_machine_id(&self) -> &str {
        &self.snapshot.host_machine_id
    }

    #[zbus(property)]
    fn host_security_id(&self) -> &str {
        HOST_SECURITY_ID
    }

    #[zbus(property)]
    fn tainted(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn interactive(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn status(&self) -> u32 {
        STATUS_IDLE
    }

    #[zbus(property)]
    fn percentage(&self) -> u32 {
        0
    }

    #[zbus(property)]
    fn battery_level(&self) -> u32 {
        BATTERY_LEVEL_UNKNOWN
    }

    #[zbus(property)]
    fn only_trusted(&self) -> bool {
        true
    }

    fn get_devices(&self) -> Vec<VarDict> {
        debug!(
            "GetDevices serving {} cached descriptor(s)",
            self.snapshot.devices.len()
        );
        self.snapshot.devices.iter().map(|d| d.to_vardict()).collect()
    }

    fn get_plugins(&self) -> Vec<VarDict> {
        let mut plugin = VarDict::new();
        plugin.insert("Name".to_string(), Value::from(PLUGIN_NAME));
        vec![plugin]
    }

    /// Quit is the one stub that does something: it asks the main loop to
    /// shut the daemon down.
    fn quit(&self) {
        debug!("Quit requested over the bus");
        self.quit.notify_one();
    }

    // Everything below exists only so the method table matches the real
    // daemon's. Arguments are accepted and ignored; replies are empty.

    fn get_releases(&self, _device_id: String) -> Vec<VarDict> {
        Vec::new()
    }

    fn get_downgrades(&self, _device_id: String) -> Vec<VarDict> {
        Vec::new()
    }

    fn get_upgrades(&self, _device_id: String) -> Vec<VarDict> {
        Vec::new()
    }

    fn get_details(&self, _handle: OwnedFd) -> Vec<VarDict> {
        Vec::new()
    }

    fn get_history(&self) -> Vec<VarDict> {
        Vec::new()
    }

    fn get_host_security_attrs(&self) -> Vec<VarDict> {
        Vec::new()
    }

    fn get_host_security_events(&self, _limit: u32) -> Vec<VarDict> {
        Vec::new()
    }

    fn get_report_metadata(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn set_hints(&self, _hints: HashMap<String, String>) {}

    fn install(&self, _id: String, _handle: OwnedFd, _options: HashMap<String, OwnedValue>) {}

    fn verify(&self, _id: String) {}

    fn unlock(&self, _id: String) {}

    fn activate(&self, _id: String) {}

    fn get_results(&self, _id: String) -> VarDict {
        VarDict::new()
    }

    fn get_remotes(&self) -> Vec<VarDict> {
        Vec::new()
    }

    fn get_approved_firmware(&self) -> Vec<String> {
        Vec::new()
    }

    fn set_approved_firmware(&self, _checksums: Vec<String>) {}

    fn get_blocked_firmware(&self) -> Vec<String> {
        Vec::new()
    }

    fn set_blocked_firmware(&self, _checksums: Vec<String>) {}

    fn set_feature_flags(&self, _feature_flags: u64) {}

    fn clear_results(&self, _id: String) {}

    fn modify_device(&self, _device_id: String, _key: String, _value: String) {}

    fn modify_config(&self, _key: String, _value: String) {}

    fn update_metadata(&self, _remote_id: String, _data: OwnedFd, _signature: OwnedFd) {}

    fn modify_remote(&self, _remote_id: String, _key: String, _value: String) {}

    fn fix_host_security_attr(&self, _appstream_id: String) {}

    fn undo_host_security_attr(&self, _appstream_id: String) {}

    fn self_sign(&self, _data: String, _options: HashMap<String, OwnedValue>) -> String {
        String::new()
    }

    fn set_bios_settings(&self, _settings: HashMap<String, String>) {}

    fn get_bios_settings(&self) -> Vec<VarDict> {
        Vec::new()
    }

    fn inhibit(&self, _reason: String) -> String {
        String::new()
    }

    fn uninhibit(&self, _inhibit_id: String) {}

    fn emulation_load(&self, _data: Vec<u8>) {}

    fn emulation_save(&self) -> Vec<u8> {
        Vec::new()
    }
}
