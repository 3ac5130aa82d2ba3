use std::path::{Path, PathBuf};

use log::debug;

use crate::utils::PropLines;

pub const VENDOR_PROP: &str = "ro.product.vendor.manufacturer";
pub const PRODUCT_PROP: &str = "ro.product.vendor.name";
pub const BOOTLOADER_PROP: &str = "ro.bootloader";

/// Android-style `key=value` property lookup over an ordered list of
/// candidate files. The first file that exists wins; the others are never
/// consulted, even if the key is missing from the chosen one.
pub struct PropSource {
    candidates: Vec<PathBuf>,
}

impl PropSource {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    fn pick_file(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(|p| p.as_path())
            .find(|p| p.exists())
    }

    /// Look up a property by exact line prefix, returning the trimmed text
    /// after the first `=`. Every failure path degrades to an empty string:
    /// no candidate file, unreadable file, absent key, or a matching line
    /// with no `=` at all.
    pub fn get(&self, key: &str) -> String {
        let path = match self.pick_file() {
            Some(p) => p,
            None => {
                debug!("no property file candidate exists");
                return String::new();
            }
        };

        let lines = match PropLines::try_from(path) {
            Ok(v) => v,
            Err(e) => {
                debug!("failed to open {}: {}", path.display(), e);
                return String::new();
            }
        };

        for line in lines {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    debug!("failed reading {}: {}", path.display(), e);
                    return String::new();
                }
            };
            if !line.starts_with(key) {
                continue;
            }
            return line
                .split_once('=')
                .map(|(_, value)| value.trim().to_string())
                .unwrap_or_default();
        }

        String::new()
    }
}
