// SPDX-FileCopyrightText: © 2026 TrustedGenAI <security@trustedgenai.ai>
//
// SPDX-License-Identifier: Apache-2.0

//! Data model for the TEE attestation aggregation service.
//!
//! This crate defines the evidence fragments produced by the individual
//! collectors, the aggregated attestation report, and the stable wire
//! document served over HTTP. It performs no I/O; collection lives in
//! the `attest-evidence` crate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

mod report;

pub use report::{render, AttestationReport, ReportDocument};

/// The external mechanism an evidence fragment was collected from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Kernel/boot diagnostic log (dmesg).
    KernelLog,
    /// Cloud-platform-signed attestation document from the instance
    /// metadata service.
    SignedPlatformDocument,
    /// TPM platform configuration registers.
    IntegrityRegisters,
    /// GPU confidential-computing mode readout.
    AcceleratorConfidentiality,
}

impl EvidenceSource {
    /// As string for log messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KernelLog => "kernel_log",
            Self::SignedPlatformDocument => "signed_platform_document",
            Self::IntegrityRegisters => "integrity_registers",
            Self::AcceleratorConfidentiality => "accelerator_confidentiality",
        }
    }
}

impl std::fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One collector's output.
///
/// Invariant: a fragment with `error` set always has `present == false`
/// and `indicates_tee == false`. The constructors below are the only
/// way fragments are built, which keeps the invariant by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceFragment {
    /// Which mechanism produced this fragment.
    pub source: EvidenceSource,
    /// Whether the underlying mechanism could be queried at all.
    pub present: bool,
    /// Whether the fragment's content confirms a TEE marker.
    pub indicates_tee: bool,
    /// Source-specific payload; schema depends on `source`.
    pub payload: Value,
    /// Error description if collection failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvidenceFragment {
    /// A fragment from a mechanism that was queried successfully.
    pub fn collected(source: EvidenceSource, indicates_tee: bool, payload: Value) -> Self {
        Self {
            source,
            present: true,
            indicates_tee,
            payload,
            error: None,
        }
    }

    /// A fragment for a mechanism that does not exist on this host.
    ///
    /// This is the expected outcome on non-TEE hardware and is not an
    /// error; the sentinel payload tells the caller why the reading is
    /// missing.
    pub fn unavailable(source: EvidenceSource, sentinel: &str) -> Self {
        Self {
            source,
            present: false,
            indicates_tee: false,
            payload: Value::String(sentinel.to_string()),
            error: None,
        }
    }

    /// A fragment for a collection attempt that failed.
    pub fn failed(source: EvidenceSource, error: impl Into<String>) -> Self {
        Self {
            source,
            present: false,
            indicates_tee: false,
            payload: Value::Null,
            error: Some(error.into()),
        }
    }
}

/// The CPU isolation technology a deployment expects to run under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TeePlatform {
    /// Intel Trust Domain Extensions.
    IntelTdx,
    /// AMD Secure Encrypted Virtualization with Secure Nested Paging.
    AmdSevSnp,
}

impl TeePlatform {
    /// The platform label reported in the attestation document.
    pub fn label(&self) -> &'static str {
        match self {
            Self::IntelTdx => "Intel-TDX",
            Self::AmdSevSnp => "AMD-SEV-SNP",
        }
    }

    /// Case-insensitive kernel log substrings that confirm this
    /// platform's TEE is active. All entries are lowercase; matching
    /// lowercases the log line first.
    pub fn kernel_markers(&self) -> &'static [&'static str] {
        match self {
            Self::IntelTdx => &["intel tdx", "tdx"],
            // "memory encryption" covers older SEV firmware that logs
            // no SEV-SNP line.
            Self::AmdSevSnp => &["sev-snp", "sev", "memory encryption"],
        }
    }
}

impl std::str::FromStr for TeePlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intel-tdx" => Ok(Self::IntelTdx),
            "amd-sev-snp" => Ok(Self::AmdSevSnp),
            other => Err(format!(
                "unknown TEE platform {other:?}, expected intel-tdx or amd-sev-snp"
            )),
        }
    }
}

/// Immutable per-deployment configuration, constructed once at startup
/// and threaded into the aggregator.
#[derive(Debug, Clone)]
pub struct AttestConfig {
    /// Expected TEE technology; fixed per deployment, never derived
    /// from evidence.
    pub platform: TeePlatform,
    /// Deployment unit identifier reported verbatim (e.g. the cloud VM
    /// size).
    pub vm_identifier: String,
    /// Whether this deployment carries a confidential-computing GPU and
    /// should run the accelerator probe.
    pub gpu: bool,
}
