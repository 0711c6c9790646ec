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

use async_trait::async_trait;

/// Secondary port - read-only queries against the by-path symlink farm
#[async_trait]
pub trait DevicePathProbe: Send + Sync {
    /// Resolve `path` to its real, symlink-expanded path
    ///
    /// # Returns
    /// * `Some(String)` - the path exists and resolved
    /// * `None` - the path does not exist or could not be resolved
    async fn resolve(&self, path: &str) -> Option<String>;
}
