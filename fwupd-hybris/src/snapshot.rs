use std::fs;

use log::{debug, info};

use crate::bootconfig::{self, BootInfo};
use crate::config::Config;
use crate::device::Device;
use crate::props::{PropSource, PRODUCT_PROP, VENDOR_PROP};
use crate::sensors::{self, SensorRecord, SensorSource};
use crate::telephony::{ModemInfo, ModemProbe, ModemSource};
use crate::utils::capitalize;

/// Everything the bus interface serves, aggregated exactly once at startup
/// and immutable afterwards. Handlers only ever read this.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    /// Discovery order: bootloader, modem, then sensors in parser order.
    /// Never deduplicated; every source stamps the same device id.
    pub devices: Vec<Device>,
    pub host_vendor: String,
    pub host_product: String,
    pub host_machine_id: String,
}

impl Snapshot {
    /// Consult every source in its fixed order. A failing source
    /// contributes nothing and never stops the ones after it.
    pub fn build(cfg: &Config, modems: &dyn ModemSource, sensor_src: &dyn SensorSource) -> Self {
        let props = PropSource::new(cfg.prop_files.clone());

        let vendor = props.get(VENDOR_PROP);
        let product = props.get(PRODUCT_PROP);

        let machine_id = fs::read_to_string(&cfg.machine_id)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default();

        let mut devices = Vec::new();

        let boot = bootconfig::read_boot_info(&cfg.bootconfig, &props);
        if boot.bootloader.is_empty() {
            debug!("no bootloader name found, not reporting a bootloader device");
        } else {
            devices.push(bootloader_device(&boot, &vendor));
        }

        match modems.list_modems() {
            ModemProbe::Available(modem) => devices.push(modem_device(&modem, &vendor)),
            ModemProbe::Unavailable => debug!("no modem detected"),
        }

        for rec in sensors::probe_sensors(sensor_src, &cfg.sensor_abis) {
            devices.push(sensor_device(rec));
        }

        info!("aggregated {} device descriptor(s)", devices.len());

        Self {
            devices,
            host_vendor: vendor.to_uppercase(),
            host_product: product.to_uppercase(),
            host_machine_id: machine_id,
        }
    }
}

/// `"<Vendor> Bootloader"` / `"<Vendor> Modem"`, or empty when the vendor
/// itself is unknown.
fn vendor_label(vendor: &str, kind: &str) -> String {
    if vendor.is_empty() {
        String::new()
    } else {
        format!("{} {}", capitalize(vendor), kind)
    }
}

fn bootloader_device(boot: &BootInfo, vendor: &str) -> Device {
    Device::new(boot.bootloader.clone())
        .with_vendor(vendor_label(vendor, "Bootloader"))
        .with_serial(boot.serial.clone())
}

fn modem_device(modem: &ModemInfo, vendor: &str) -> Device {
    Device::new(modem.revision.clone())
        .with_vendor(vendor_label(vendor, "Modem"))
        .with_version(modem.software_version.clone())
        .with_serial(modem.serial.clone())
}

fn sensor_device(rec: SensorRecord) -> Device {
    Device::new(rec.name)
        .with_vendor(rec.vendor)
        .with_version(rec.version)
        .with_serial(rec.id)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::device::FLAG_INTERNAL;
    use crate::testing::{
        mock_modem_source, mock_sensor_source, tmp_dir, MockModemSource, MockSensorSource, TmpDir,
    };
    use rstest::rstest;

    /// A config whose every path points into the temp dir, so nothing from
    /// the host machine leaks into the test.
    fn test_config(tmp: &TmpDir) -> Config {
        Config {
            prop_files: vec![tmp.get_path().join("build.prop")],
            bootconfig: tmp.get_path().join("bootconfig"),
            machine_id: tmp.get_path().join("machine-id"),
            binder_call: None,
            sensor_abis: vec!["1.0".to_string(), "2.0".to_string(), "2.1".to_string()],
            probe_timeout_secs: 1,
        }
    }

    fn no_modems(mock: &mut MockModemSource) {
        mock.expect_list_modems()
            .returning(|| ModemProbe::Unavailable);
    }

    fn no_sensors(mock: &mut MockSensorSource) {
        mock.expect_query().returning(|_| Ok(String::new()));
    }

    #[rstest]
    fn test_bootloader_only_end_to_end(
        tmp_dir: TmpDir,
        mut mock_modem_source: MockModemSource,
        mut mock_sensor_source: MockSensorSource,
    ) {
        tmp_dir.create_file_name(
            "build.prop",
            Some("ro.product.vendor.manufacturer=acme\nro.product.vendor.name=widget\n"),
        );
        tmp_dir.create_file_name(
            "bootconfig",
            Some("androidboot.bootloader = \"abl\"\nandroidboot.serialno = \"123\"\n"),
        );
        no_modems(&mut mock_modem_source);
        no_sensors(&mut mock_sensor_source);

        let cfg = test_config(&tmp_dir);
        let snap = Snapshot::build(&cfg, &mock_modem_source, &mock_sensor_source);

        assert_eq!(snap.host_vendor, "ACME");
        assert_eq!(snap.host_product, "WIDGET");
        assert_eq!(snap.host_machine_id, "");

        assert_eq!(snap.devices.len(), 1);
        let dev = &snap.devices[0];
        assert_eq!(dev.id, "1");
        assert_eq!(dev.name, "abl");
        assert_eq!(dev.vendor, "Acme Bootloader");
        assert_eq!(dev.version, "1");
        assert_eq!(dev.serial, "123");
        assert_eq!(dev.flags, FLAG_INTERNAL);
    }

    #[rstest]
    fn test_serial_without_name_suppresses_bootloader(
        tmp_dir: TmpDir,
        mut mock_modem_source: MockModemSource,
        mut mock_sensor_source: MockSensorSource,
    ) {
        tmp_dir.create_file_name("bootconfig", Some("androidboot.serialno = \"123\"\n"));
        no_modems(&mut mock_modem_source);
        no_sensors(&mut mock_sensor_source);

        let snap = Snapshot::build(
            &test_config(&tmp_dir),
            &mock_modem_source,
            &mock_sensor_source,
        );
        assert!(snap.devices.is_empty());
    }

    #[rstest]
    fn test_modem_failure_leaves_other_sources_alone(
        tmp_dir: TmpDir,
        mut mock_modem_source: MockModemSource,
        mut mock_sensor_source: MockSensorSource,
    ) {
        tmp_dir.create_file_name("bootconfig", Some("androidboot.bootloader = \"abl\"\n"));
        no_modems(&mut mock_modem_source);
        mock_sensor_source
            .expect_query()
            .returning(|_| Ok(r#"{ 3 0 "Accel"H "Bosch"H 2 }"#.to_string()));

        let snap = Snapshot::build(
            &test_config(&tmp_dir),
            &mock_modem_source,
            &mock_sensor_source,
        );

        let names: Vec<&str> = snap.devices.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["abl", "Accel"]);
    }

    #[rstest]
    fn test_discovery_order_and_field_mapping(
        tmp_dir: TmpDir,
        mut mock_modem_source: MockModemSource,
        mut mock_sensor_source: MockSensorSource,
    ) {
        tmp_dir.create_file_name("build.prop", Some("ro.product.vendor.manufacturer=ACME\n"));
        tmp_dir.create_file_name("bootconfig", Some("androidboot.bootloader = \"abl\"\n"));
        mock_modem_source.expect_list_modems().returning(|| {
            ModemProbe::Available(ModemInfo {
                revision: "XM7550".to_string(),
                serial: "35791".to_string(),
                software_version: String::new(),
            })
        });
        mock_sensor_source.expect_query().returning(|abi| {
            if abi == "2.0" {
                Ok(r#"{ 3 0 "Accel"H "Bosch"H 2 } { 7 1 "Gyro"H "InvenSense"H 11 }"#.to_string())
            } else {
                Ok(String::new())
            }
        });

        let snap = Snapshot::build(
            &test_config(&tmp_dir),
            &mock_modem_source,
            &mock_sensor_source,
        );

        assert_eq!(snap.host_vendor, "ACME");
        assert_eq!(snap.devices.len(), 4);

        assert_eq!(snap.devices[0].name, "abl");
        assert_eq!(snap.devices[0].vendor, "Acme Bootloader");

        assert_eq!(snap.devices[1].name, "XM7550");
        assert_eq!(snap.devices[1].vendor, "Acme Modem");
        assert_eq!(snap.devices[1].serial, "35791");
        // empty software version falls back to the default
        assert_eq!(snap.devices[1].version, "1");

        assert_eq!(snap.devices[2].name, "Accel");
        assert_eq!(snap.devices[2].vendor, "Bosch");
        assert_eq!(snap.devices[2].version, "2");
        assert_eq!(snap.devices[2].serial, "3");

        assert_eq!(snap.devices[3].name, "Gyro");
    }

    #[rstest]
    fn test_machine_id_trimmed(
        tmp_dir: TmpDir,
        mut mock_modem_source: MockModemSource,
        mut mock_sensor_source: MockSensorSource,
    ) {
        tmp_dir.create_file_name("machine-id", Some("8f3a0bde4c1f4e6d9a2b5c7d8e9f0a1b\n"));
        no_modems(&mut mock_modem_source);
        no_sensors(&mut mock_sensor_source);

        let snap = Snapshot::build(
            &test_config(&tmp_dir),
            &mock_modem_source,
            &mock_sensor_source,
        );
        assert_eq!(snap.host_machine_id, "8f3a0bde4c1f4e6d9a2b5c7d8e9f0a1b");
    }
}
