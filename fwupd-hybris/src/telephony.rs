use std::collections::HashMap;
use std::time::Duration;

use crossbeam::channel::bounded;
use log::debug;
use zbus::zvariant::{OwnedObjectPath, OwnedValue};

type ModemRecord = (OwnedObjectPath, HashMap<String, OwnedValue>);

/// Fields captured from a modem record. Anything the record doesn't carry
/// stays an empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModemInfo {
    pub revision: String,
    pub serial: String,
    pub software_version: String,
}

/// Outcome of the telephony lookup. Every failure mode (bus missing,
/// service not running, call error, timeout, malformed reply) collapses to
/// `Unavailable`; callers never see an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModemProbe {
    Available(ModemInfo),
    Unavailable,
}

pub trait ModemSource: Send + Sync {
    fn list_modems(&self) -> ModemProbe;
}

#[zbus::proxy(
    interface = "org.ofono.Manager",
    default_service = "org.ofono",
    default_path = "/",
    gen_async = false,
    blocking_name = "OfonoManagerProxy"
)]
trait OfonoManager {
    fn get_modems(&self) -> zbus::Result<Vec<ModemRecord>>;
}

/// A [ModemSource] backed by the oFono daemon on the system bus.
pub struct OfonoModemSource {
    timeout: Duration,
}

impl OfonoModemSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ModemSource for OfonoModemSource {
    fn list_modems(&self) -> ModemProbe {
        // The query runs on its own thread so an unresponsive bus or
        // service can't stall startup past the probe bound. A thread that
        // overruns the bound is abandoned, not joined.
        let (tx, rx) = bounded(1);
        std::thread::spawn(move || {
            let _ = tx.send(query_ofono());
        });
        match rx.recv_timeout(self.timeout) {
            Ok(probe) => probe,
            Err(_) => {
                debug!("telephony lookup did not answer within {:?}", self.timeout);
                ModemProbe::Unavailable
            }
        }
    }
}

fn query_ofono() -> ModemProbe {
    let conn = match zbus::blocking::Connection::system() {
        Ok(c) => c,
        Err(e) => {
            debug!("system bus unavailable for telephony lookup: {}", e);
            return ModemProbe::Unavailable;
        }
    };
    let proxy = match OfonoManagerProxy::new(&conn) {
        Ok(p) => p,
        Err(e) => {
            debug!("ofono proxy setup failed: {}", e);
            return ModemProbe::Unavailable;
        }
    };
    match proxy.get_modems() {
        Ok(modems) => fold_records(&modems),
        Err(e) => {
            debug!("GetModems failed: {}", e);
            ModemProbe::Unavailable
        }
    }
}

/// Collapse the returned modem records into a single [ModemInfo]. When more
/// than one modem is present the last record wins, field by field. An empty
/// record list means no modem was detected.
fn fold_records(modems: &[ModemRecord]) -> ModemProbe {
    if modems.is_empty() {
        return ModemProbe::Unavailable;
    }

    let mut info = ModemInfo::default();
    for (path, properties) in modems {
        debug!("modem record at {}", path.as_str());
        if let Some(v) = string_prop(properties, "Revision") {
            info.revision = v;
        }
        if let Some(v) = string_prop(properties, "Serial") {
            info.serial = v;
        }
        if let Some(v) = string_prop(properties, "SoftwareVersionNumber") {
            info.software_version = v;
        }
    }
    ModemProbe::Available(info)
}

fn string_prop(properties: &HashMap<String, OwnedValue>, key: &str) -> Option<String> {
    let value = properties.get(key)?;
    match value.downcast_ref::<&str>() {
        Ok(s) => Some(s.to_string()),
        Err(_) => None,
    }
}
