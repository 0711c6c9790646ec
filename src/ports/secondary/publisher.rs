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

use crate::domain::PublishError;
use async_trait::async_trait;

/// Secondary port - Report publishing abstraction
///
/// Receives an already rendered report (table, exposition text, JSON or
/// TOML) and delivers it, e.g. to stdout or to a textfile collector directory.
#[async_trait]
pub trait ReportPublisher: Send + Sync {
    /// Publish a rendered report
    ///
    /// # Arguments
    /// * `rendered` - The report text
    ///
    /// # Returns
    /// * `Ok(())` - Report successfully published
    /// * `Err(PublishError)` - Error occurred during publishing
    async fn publish(&self, rendered: &str) -> Result<(), PublishError>;

    /// Human-readable destination, for logs
    fn destination(&self) -> String;
}
