use std::collections::HashMap;

use zbus::zvariant::Value;

/// Plugin/protocol marker stamped on every descriptor this daemon emits.
pub const PLUGIN_NAME: &str = "hybris";

/// fwupd's internal-device flag; the only flag any of our descriptors carry.
pub const FLAG_INTERNAL: u64 = 2;

pub const DEFAULT_DEVICE_ID: &str = "1";
pub const DEFAULT_VERSION: &str = "1";

/// A normalized hardware descriptor in fwupd's shape.
///
/// Every field is always present; unknown data is an empty string rather
/// than a missing key, since clients expect the full record shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub vendor: String,
    pub version: String,
    pub plugin: String,
    pub protocol: String,
    pub flags: u64,
    pub serial: String,
}

impl Device {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            id: DEFAULT_DEVICE_ID.into(),
            name: name.into(),
            vendor: String::new(),
            version: DEFAULT_VERSION.into(),
            plugin: PLUGIN_NAME.into(),
            protocol: PLUGIN_NAME.into(),
            flags: FLAG_INTERNAL,
            serial: String::new(),
        }
    }

    pub fn with_vendor<S: Into<String>>(mut self, vendor: S) -> Self {
        self.vendor = vendor.into();
        self
    }

    /// An empty version keeps the `"1"` default.
    pub fn with_version<S: Into<String>>(mut self, version: S) -> Self {
        let version = version.into();
        if !version.is_empty() {
            self.version = version;
        }
        self
    }

    pub fn with_serial<S: Into<String>>(mut self, serial: S) -> Self {
        self.serial = serial.into();
        self
    }

    /// The `a{sv}` record fwupd clients expect from `GetDevices`.
    pub fn to_vardict(&self) -> HashMap<String, Value<'static>> {
        let mut dict = HashMap::new();
        dict.insert("DeviceId".to_string(), Value::from(self.id.clone()));
        dict.insert("Name".to_string(), Value::from(self.name.clone()));
        dict.insert("Vendor".to_string(), Value::from(self.vendor.clone()));
        dict.insert("Version".to_string(), Value::from(self.version.clone()));
        dict.insert("Plugin".to_string(), Value::from(self.plugin.clone()));
        dict.insert("Protocol".to_string(), Value::from(self.protocol.clone()));
        dict.insert("Flags".to_string(), Value::from(self.flags));
        dict.insert("Serial".to_string(), Value::from(self.serial.clone()));
        dict
    }
}
