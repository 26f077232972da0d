// SPDX-FileCopyrightText: © 2026 TrustedGenAI <security@trustedgenai.ai>
//
// SPDX-License-Identifier: Apache-2.0

//! Accelerator confidentiality collector (GPU deployments only).
//!
//! Queries the NVIDIA management interface and checks whether the
//! device reports confidential-computing mode. The verdict is
//! independent of the CPU TEE verdict.

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use attest_types::{EvidenceFragment, EvidenceSource};
use serde_json::json;
use tokio::process::Command;
use tracing::debug;

use crate::Collect;

/// Marker in `nvidia-smi -q` output for an enabled GPU TEE.
const CC_MODE_MARKER: &str = "Confidential Computing";

/// Captured output is cut to this prefix to keep payloads bounded.
const MAX_OUTPUT_CHARS: usize = 500;

/// nvidia-smi enumerates all devices and can be slow on first use.
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct AcceleratorCollector;

impl AcceleratorCollector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AcceleratorCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collect for AcceleratorCollector {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::AcceleratorConfidentiality
    }

    fn timeout(&self) -> Duration {
        QUERY_TIMEOUT
    }

    async fn collect(&self) -> EvidenceFragment {
        let result = Command::new("nvidia-smi")
            .arg("-q")
            .kill_on_drop(true)
            .output()
            .await;
        match result {
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("nvidia-smi not found, reporting accelerator as unavailable");
                EvidenceFragment::unavailable(self.source(), "nvidia-smi not installed")
            }
            Err(err) => EvidenceFragment::failed(
                self.source(),
                format!("failed to run nvidia-smi: {err}"),
            ),
            Ok(output) if !output.status.success() => EvidenceFragment::failed(
                self.source(),
                format!(
                    "nvidia-smi exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ),
            Ok(output) => {
                let text = String::from_utf8_lossy(&output.stdout).into_owned();
                let confidential = text.contains(CC_MODE_MARKER);
                let payload = json!({
                    "output": truncate_output(&text),
                    "product_name": product_name(&text),
                    "cc_mode": if confidential { "on" } else { "off" },
                });
                EvidenceFragment::collected(self.source(), confidential, payload)
            }
        }
    }
}

fn truncate_output(text: &str) -> String {
    text.chars().take(MAX_OUTPUT_CHARS).collect()
}

/// Extract the device model from the `Product Name : ...` line.
fn product_name(text: &str) -> Option<String> {
    text.lines()
        .find(|line| line.contains("Product Name"))
        .and_then(|line| line.split_once(':'))
        .map(|(_, name)| name.trim().to_string())
        .filter(|name| !name.is_empty())
}
