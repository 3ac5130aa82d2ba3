use std::fs;
use std::{env, path::PathBuf};

use rand::Rng;
use rstest::fixture;

/// A throwaway directory for tests that need real files (property sources,
/// boot configs). Removed on drop.
pub struct TmpDir {
    temp_dir: PathBuf,
}

impl TmpDir {
    pub fn get_path(&self) -> &PathBuf {
        &self.temp_dir
    }

    pub fn create_file_name(&self, name: &str, content: Option<&str>) -> PathBuf {
        let path = self.temp_dir.join(name);
        let content = content.unwrap_or_default();
        fs::write(&path, content).expect("failed to make temp file");
        path
    }
}

impl Drop for TmpDir {
    fn drop(&mut self) {
        _ = fs::remove_dir_all(&self.temp_dir);
    }
}

#[fixture]
pub fn tmp_dir() -> TmpDir {
    let base = env::temp_dir();
    let mut rng = rand::thread_rng();
    let rand_name: u32 = rng.gen();
    let temp_dir = base.join(format!("fwupd-hybris-test-{}", rand_name));
    fs::create_dir_all(&temp_dir).expect("failed to make temp directory");
    TmpDir { temp_dir }
}
