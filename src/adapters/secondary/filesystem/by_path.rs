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

//! Filesystem adapter for `/dev/disk/by-path` lookups

use crate::ports::DevicePathProbe;
use async_trait::async_trait;
use log::debug;

/// Resolves by-path symlinks with `canonicalize`
#[derive(Debug, Clone, Copy, Default)]
pub struct ByPathProbe;

impl ByPathProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DevicePathProbe for ByPathProbe {
    async fn resolve(&self, path: &str) -> Option<String> {
        match tokio::fs::canonicalize(path).await {
            Ok(real) => Some(real.to_string_lossy().into_owned()),
            Err(e) => {
                debug!("{} not resolved: {}", path, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_resolves_symlink_farm() {
        let dev = TempDir::new().unwrap();
        let by_path = TempDir::new().unwrap();
        let disk = dev.path().join("sdb");
        File::create(&disk).unwrap();
        let link = by_path.path().join("pci-0000:03:00.0-scsi-0:2:1:0");
        symlink(&disk, &link).unwrap();

        let probe = ByPathProbe::new();
        let resolved = probe.resolve(link.to_str().unwrap()).await.unwrap();
        assert_eq!(resolved, disk.canonicalize().unwrap().to_string_lossy());

        let missing = by_path.path().join("pci-0000:03:00.0-scsi-0:3:1:0");
        assert!(probe.resolve(missing.to_str().unwrap()).await.is_none());
    }

    #[tokio::test]
    async fn test_dangling_link_is_unresolved() {
        let by_path = TempDir::new().unwrap();
        let link = by_path.path().join("pci-0000:03:00.0-scsi-0:0:4:0");
        symlink(by_path.path().join("gone"), &link).unwrap();

        assert!(ByPathProbe::new().resolve(link.to_str().unwrap()).await.is_none());
    }
}
