#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Snapshot with one app per interesting shape
pub const SAMPLE_SNAPSHOT: &str = r#"[
    {
        "id": "com.example.browser",
        "label": "Browser",
        "requested": [
            { "id": "android.permission.INTERNET", "is_granted": true },
            { "id": "android.permission.WAKE_LOCK", "is_granted": true },
            { "id": "android.permission.VIBRATE", "is_granted": false }
        ],
        "declared": [{ "id": "com.example.browser.permission.SYNC" }]
    },
    {
        "id": "com.example.other",
        "label": "Camera App",
        "requested": [
            { "id": "android.permission.CAMERA", "is_granted": true },
            { "id": "android.permission.ACCESS_NETWORK_STATE", "is_granted": true }
        ]
    },
    {
        "id": "com.example.notes",
        "label": "Notes",
        "requested": [
            { "id": "android.permission.WRITE_EXTERNAL_STORAGE", "is_granted": true },
            { "id": "android.permission.READ_EXTERNAL_STORAGE", "is_granted": false }
        ]
    }
]"#;

/// Temporary directory holding snapshot and config files
pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn sample_snapshot(&self) -> PathBuf {
        self.write("snapshot.json", SAMPLE_SNAPSHOT)
    }
}
