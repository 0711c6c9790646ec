/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Textfile publisher for the node-exporter textfile collector
//!
//! The collector may read the target at any moment, so the report is written
//! to a sibling temp file first and renamed over the target.

use crate::domain::PublishError;
use crate::ports::ReportPublisher;
use async_trait::async_trait;
use log::info;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Publishes a rendered report to a file, atomically
#[derive(Debug, Clone)]
pub struct TextfilePublisher {
    path: PathBuf,
}

impl TextfilePublisher {
    /// Create a publisher writing to `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
    }
}

#[async_trait]
impl ReportPublisher for TextfilePublisher {
    async fn publish(&self, rendered: &str) -> Result<(), PublishError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                PublishError::WriteFailed(format!("Failed to create directory: {}", e))
            })?;
        }

        let temp = self.temp_path();
        let mut content = rendered.to_string();
        if !content.ends_with('\n') {
            content.push('\n');
        }

        if let Err(e) = fs::write(&temp, content).await {
            return Err(PublishError::WriteFailed(format!(
                "Failed to write {}: {}",
                temp.display(),
                e
            )));
        }

        if let Err(e) = fs::rename(&temp, &self.path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(PublishError::WriteFailed(format!(
                "Failed to move report into {}: {}",
                self.path.display(),
                e
            )));
        }

        info!("Report written to {}", self.path.display());
        Ok(())
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    #[tokio::test]
    async fn test_writes_report_and_leaves_no_temp_file() {
        let dir = assert_fs::TempDir::new().unwrap();
        let target = dir.child("megaraid.prom");
        let publisher = TextfilePublisher::new(target.path());

        publisher
            .publish("# HELP megaraid_drives_total MegaRAID metric drives_total\nmegaraid_drives_total 8")
            .await
            .unwrap();

        target.assert(predicate::str::contains("megaraid_drives_total 8"));
        target.assert(predicate::str::ends_with("\n"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert_eq!(publisher.destination(), target.path().display().to_string());
    }

    #[tokio::test]
    async fn test_replaces_previous_report() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("collector").create_dir_all().unwrap();
        let target = dir.child("collector/smartmon.prom");
        target.write_str("smartmon_device_active 1\n").unwrap();

        let publisher = TextfilePublisher::new(target.path());
        publisher.publish("smartmon_device_active 0\n").await.unwrap();

        target.assert(predicate::str::contains("smartmon_device_active 0"));
        target.assert(predicate::str::contains("device_active 1").not());
    }

    #[tokio::test]
    async fn test_unwritable_target() {
        let dir = assert_fs::TempDir::new().unwrap();
        let blocker = dir.child("not_a_dir");
        blocker.touch().unwrap();

        let publisher = TextfilePublisher::new(blocker.path().join("report.prom"));
        let err = publisher.publish("x").await.unwrap_err();
        assert!(matches!(err, PublishError::WriteFailed(_)));
    }
}
