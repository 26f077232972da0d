// SPDX-FileCopyrightText: © 2026 TrustedGenAI <security@trustedgenai.ai>
//
// SPDX-License-Identifier: Apache-2.0

//! Kernel log collector.
//!
//! Reads the boot/kernel diagnostic log and filters for lines matching
//! the deployment platform's TEE markers. This is the sole authoritative
//! signal for the report's `verified` flag: the kernel-reported security
//! feature is the only locally trustworthy evidence in this design.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use attest_types::{EvidenceFragment, EvidenceSource, TeePlatform};
use serde_json::json;
use tokio::process::Command;

use crate::Collect;

/// Upper bound on matching lines kept in the fragment, to bound the
/// response size.
const MAX_MATCHED_LINES: usize = 5;

pub struct KernelLogCollector {
    markers: &'static [&'static str],
}

impl KernelLogCollector {
    pub fn new(platform: TeePlatform) -> Self {
        Self {
            markers: platform.kernel_markers(),
        }
    }

    async fn read_log(&self) -> Result<String> {
        let output = Command::new("dmesg")
            .kill_on_drop(true)
            .output()
            .await
            .context("failed to run dmesg")?;
        if !output.status.success() {
            bail!("dmesg exited with {}", output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Collect for KernelLogCollector {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::KernelLog
    }

    async fn collect(&self) -> EvidenceFragment {
        match self.read_log().await {
            Ok(log) => {
                let lines = match_tee_lines(&log, self.markers);
                EvidenceFragment::collected(self.source(), !lines.is_empty(), json!(lines))
            }
            Err(err) => EvidenceFragment::failed(self.source(), format!("{err:#}")),
        }
    }
}

/// Filter `log` for lines containing any of `markers`, case
/// insensitively, preserving original order and keeping at most
/// [`MAX_MATCHED_LINES`] entries.
fn match_tee_lines(log: &str, markers: &[&str]) -> Vec<String> {
    log.lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            markers.iter().any(|marker| lower.contains(marker))
        })
        .take(MAX_MATCHED_LINES)
        .map(|line| line.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TDX_MARKERS: &[&str] = &["intel tdx", "tdx"];

    #[test]
    fn test_matching_line_detected() {
        let log = "Intel TDX: Guest initialized\nOther line";
        let lines = match_tee_lines(log, TDX_MARKERS);
        assert_eq!(lines, vec!["Intel TDX: Guest initialized"]);
    }

    #[test]
    fn test_unrelated_log_yields_no_matches() {
        let lines = match_tee_lines("unrelated boot message", TDX_MARKERS);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_empty_log_yields_no_matches() {
        assert!(match_tee_lines("", TDX_MARKERS).is_empty());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let lines = match_tee_lines("tdx guest detected\nTDX module loaded", TDX_MARKERS);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_matches_capped_at_five_in_original_order() {
        let log: String = (0..8)
            .map(|i| format!("[{i}] tdx: event {i}\n"))
            .collect();
        let lines = match_tee_lines(&log, TDX_MARKERS);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "[0] tdx: event 0");
        assert_eq!(lines[4], "[4] tdx: event 4");
    }

    #[test]
    fn test_sev_markers_match_memory_encryption_phrase() {
        let lines = match_tee_lines(
            "AMD Memory Encryption Features active: SME",
            &["sev-snp", "sev", "memory encryption"],
        );
        assert_eq!(lines.len(), 1);
    }
}
