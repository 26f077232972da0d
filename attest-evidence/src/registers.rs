// SPDX-FileCopyrightText: © 2026 TrustedGenAI <security@trustedgenai.ai>
//
// SPDX-License-Identifier: Apache-2.0

//! Integrity register collector.
//!
//! Reads the TPM platform configuration registers through the tpm2-tools
//! CLI under SHA-256. This source is best effort: a missing utility or
//! absent hardware module yields a sentinel payload, not an error, and
//! its absence never fails the report.

use std::io::ErrorKind;

use async_trait::async_trait;
use attest_types::{EvidenceFragment, EvidenceSource};
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::Collect;

/// Sentinel payload when tpm2-tools is not present on the host.
pub const PCR_UNAVAILABLE_SENTINEL: &str = "tpm2-tools not installed";

pub struct IntegrityRegisterCollector;

impl IntegrityRegisterCollector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IntegrityRegisterCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collect for IntegrityRegisterCollector {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::IntegrityRegisters
    }

    async fn collect(&self) -> EvidenceFragment {
        let result = Command::new("tpm2_pcrread")
            .arg("sha256")
            .kill_on_drop(true)
            .output()
            .await;
        match result {
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("tpm2_pcrread not found, reporting registers as unavailable");
                EvidenceFragment::unavailable(self.source(), PCR_UNAVAILABLE_SENTINEL)
            }
            Err(err) => EvidenceFragment::failed(
                self.source(),
                format!("failed to run tpm2_pcrread: {err}"),
            ),
            Ok(output) if !output.status.success() => EvidenceFragment::failed(
                self.source(),
                format!(
                    "tpm2_pcrread exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ),
            Ok(output) => {
                let dump = String::from_utf8_lossy(&output.stdout).into_owned();
                // Registers are advisory context; they never set the
                // TEE verdict.
                EvidenceFragment::collected(self.source(), false, Value::String(dump))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_fragment_carries_sentinel() {
        let fragment = EvidenceFragment::unavailable(
            EvidenceSource::IntegrityRegisters,
            PCR_UNAVAILABLE_SENTINEL,
        );
        assert_eq!(fragment.payload, Value::String(PCR_UNAVAILABLE_SENTINEL.into()));
        assert!(fragment.error.is_none());
        assert!(!fragment.indicates_tee);
    }
}
