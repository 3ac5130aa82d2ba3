use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::command::run_cmd_timeout;
use crate::config::Config;

pub const BINDER_CALL_BIN: &str = "binder-call";
pub const HWBINDER_DEV: &str = "/dev/hwbinder";

const LIST_SENSORS_CODE: &str = "1";
const REPLY_SHAPE: &str = "[ { i32 i32 hstr hstr i32 } ]";

/// One parsed sensor entry. The numeric sensor id ends up as the device
/// serial, not the device id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SensorRecord {
    pub id: String,
    pub name: String,
    pub vendor: String,
    pub version: String,
}

pub trait SensorSource: Send + Sync {
    /// Raw text output of the sensor list query for one HAL version.
    fn query(&self, abi: &str) -> crate::Result<String>;
}

/// A [SensorSource] that shells out to `binder-call` against the hwbinder
/// endpoint for the requested HAL version.
pub struct BinderCallSensorSource {
    bin: Option<PathBuf>,
    timeout: Duration,
}

impl BinderCallSensorSource {
    pub fn new(cfg: &Config) -> Self {
        let bin = cfg
            .binder_call
            .clone()
            .or_else(|| which::which(BINDER_CALL_BIN).ok());
        if bin.is_none() {
            debug!("`{}` not found, sensor probing disabled", BINDER_CALL_BIN);
        }
        Self {
            bin,
            timeout: cfg.probe_timeout(),
        }
    }
}

impl SensorSource for BinderCallSensorSource {
    fn query(&self, abi: &str) -> crate::Result<String> {
        let bin = match &self.bin {
            Some(b) => b,
            None => return Err(crate::Error::MissingBin(BINDER_CALL_BIN.to_string())),
        };
        let endpoint = format!("android.hardware.sensors@{}::ISensors/default", abi);
        let out = run_cmd_timeout(
            bin,
            &[
                "-d",
                HWBINDER_DEV,
                endpoint.as_str(),
                LIST_SENSORS_CODE,
                "reply",
                "i32",
                REPLY_SHAPE,
            ],
            self.timeout,
        )?;
        if !out.ok() {
            debug!(
                "binder-call for {} exited with {}: {}",
                endpoint,
                out.status,
                out.stderr_utf8_lossy().trim()
            );
        }
        Ok(out.stdout_utf8_lossy().into_owned())
    }
}

/// Try each HAL version in order and parse the first non-blank output.
///
/// Lower versions are tried first and the first one that answers wins;
/// later versions are never attempted, even when the answering output
/// contains no parseable records. A failed query counts as blank.
pub fn probe_sensors(source: &dyn SensorSource, abis: &[String]) -> Vec<SensorRecord> {
    for abi in abis {
        let out = match source.query(abi) {
            Ok(v) => v,
            Err(e) => {
                debug!("sensor query for HAL {} failed: {}", abi, e);
                continue;
            }
        };
        if out.trim().is_empty() {
            continue;
        }
        debug!("sensor list answered at HAL {}", abi);
        return parse_sensor_records(&out);
    }
    Vec::new()
}

/// Extract every well-formed record of the shape
///
/// ```text
/// { <digits> <digits> "<name>"H "<vendor>"H <digits> }
/// ```
///
/// from the query output. Records may be embedded in arbitrary surrounding
/// noise: scanning restarts after any opening brace that doesn't begin a
/// well-formed record, so a malformed span never hides a later record.
pub fn parse_sensor_records(text: &str) -> Vec<SensorRecord> {
    let mut records = Vec::new();
    let mut pos = 0;
    while let Some(off) = text[pos..].find('{') {
        let start = pos + off;
        let mut parser = RecordParser::new(&text[start..]);
        match parser.parse() {
            Some(rec) => {
                records.push(rec);
                pos = start + parser.consumed();
            }
            None => {
                pos = start + 1;
            }
        }
    }
    records
}

struct RecordParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> RecordParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Bytes consumed so far; only meaningful after a successful parse.
    fn consumed(&self) -> usize {
        self.pos
    }

    fn parse(&mut self) -> Option<SensorRecord> {
        self.expect('{')?;
        self.skip_ws();
        let id = self.digits()?;
        self.skip_ws();
        // the wakeup/reserved field between the id and the name
        self.digits()?;
        self.skip_ws();
        let name = self.hidl_string()?;
        self.skip_ws();
        let vendor = self.hidl_string()?;
        self.skip_ws();
        let version = self.maybe_digits();
        self.skip_ws();
        self.expect('}')?;

        Some(SensorRecord {
            id: id.to_string(),
            name: name.to_string(),
            vendor: vendor.to_string(),
            version: if version.is_empty() {
                crate::device::DEFAULT_VERSION.to_string()
            } else {
                version.to_string()
            },
        })
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn expect(&mut self, c: char) -> Option<()> {
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            Some(())
        } else {
            None
        }
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    /// One or more ASCII digits.
    fn digits(&mut self) -> Option<&'a str> {
        let d = self.maybe_digits();
        if d.is_empty() {
            None
        } else {
            Some(d)
        }
    }

    /// Zero or more ASCII digits.
    fn maybe_digits(&mut self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    /// A non-empty `"..."H` string literal, as `binder-call` renders HIDL
    /// strings. The content may not contain a quote.
    fn hidl_string(&mut self) -> Option<&'a str> {
        self.expect('"')?;
        let rest = self.rest();
        let end = rest.find('"')?;
        if end == 0 {
            return None;
        }
        let content = &rest[..end];
        self.pos += end;
        self.expect('"')?;
        self.expect('H')?;
        Some(content)
    }
}
