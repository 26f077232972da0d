// SPDX-FileCopyrightText: © 2026 TrustedGenAI <security@trustedgenai.ai>
//
// SPDX-License-Identifier: Apache-2.0

//! Aggregated attestation report and its wire rendering.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{EvidenceFragment, EvidenceSource};

/// The aggregate of all evidence fragments for one request.
///
/// Constructed fresh by the aggregator for every request and discarded
/// after the response is sent; nothing is persisted across requests.
#[derive(Debug, Clone, Serialize)]
pub struct AttestationReport {
    /// Expected TEE technology label; deployment configuration, not
    /// derived from evidence.
    pub platform_label: String,
    /// Deployment unit identifier; deployment configuration.
    pub vm_identifier: String,
    /// True iff the kernel log fragment confirms a TEE marker. The
    /// signed document and integrity registers are advisory and never
    /// gate this flag.
    pub verified: bool,
    /// One fragment per configured collector.
    pub fragments: BTreeMap<EvidenceSource, EvidenceFragment>,
    /// GPU confidentiality verdict; present only on GPU deployments,
    /// independent of `verified`.
    pub accelerator_verified: Option<bool>,
    /// When the report was assembled.
    pub timestamp: DateTime<Utc>,
}

impl AttestationReport {
    fn fragment(&self, source: EvidenceSource) -> Option<&EvidenceFragment> {
        self.fragments.get(&source)
    }
}

/// The stable JSON document served over HTTP.
///
/// Core field names are identical across deployment variants so callers
/// can always probe `tee_verified`, `platform` and `vm_size`. The GPU
/// triple is absent, never null, on CPU-only deployments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub platform: String,
    pub vm_size: String,
    pub tee_verified: bool,
    /// The signed platform document payload, or `{"error": ...}` when
    /// the metadata endpoint could not be reached.
    pub azure_attestation: Value,
    /// Raw PCR dump text, or a sentinel/error string.
    pub tpm_pcr_sha256: String,
    /// Matching kernel log lines, at most 5, in original order.
    pub tee_dmesg: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_tee_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nvidia_cc_mode: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ReportDocument {
    /// Project an aggregated report onto the wire shape.
    pub fn from_report(report: &AttestationReport) -> Self {
        let tee_dmesg = report
            .fragment(EvidenceSource::KernelLog)
            .map(kernel_lines)
            .unwrap_or_default();

        let azure_attestation = report
            .fragment(EvidenceSource::SignedPlatformDocument)
            .map(document_value)
            .unwrap_or_else(|| json!({ "error": "collector not configured" }));

        let tpm_pcr_sha256 = report
            .fragment(EvidenceSource::IntegrityRegisters)
            .map(register_text)
            .unwrap_or_else(|| "collector not configured".to_string());

        let accelerator = report
            .fragment(EvidenceSource::AcceleratorConfidentiality);

        Self {
            platform: report.platform_label.clone(),
            vm_size: report.vm_identifier.clone(),
            tee_verified: report.verified,
            azure_attestation,
            tpm_pcr_sha256,
            tee_dmesg,
            gpu: report
                .accelerator_verified
                .map(|_| accelerator.and_then(product_name).unwrap_or_else(|| "unknown".to_string())),
            gpu_tee_verified: report.accelerator_verified,
            nvidia_cc_mode: report
                .accelerator_verified
                .map(|_| accelerator.and_then(cc_mode).unwrap_or_else(|| "unknown".to_string())),
            timestamp: report.timestamp,
        }
    }
}

/// Serialize a report to the response body.
///
/// Pure and side-effect free. The document is built from plain strings,
/// booleans and already-parsed JSON values, so encoding cannot fail.
pub fn render(report: &AttestationReport) -> Vec<u8> {
    let document = ReportDocument::from_report(report);
    serde_json::to_vec_pretty(&document).expect("report document serialization is infallible")
}

fn kernel_lines(fragment: &EvidenceFragment) -> Vec<String> {
    // Errored or unavailable fragments render as an empty line list;
    // the caller sees tee_verified == false either way.
    fragment
        .payload
        .as_array()
        .map(|lines| {
            lines
                .iter()
                .filter_map(|line| line.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn document_value(fragment: &EvidenceFragment) -> Value {
    match &fragment.error {
        Some(err) => json!({ "error": err }),
        None => fragment.payload.clone(),
    }
}

fn register_text(fragment: &EvidenceFragment) -> String {
    match &fragment.error {
        Some(err) => err.clone(),
        None => fragment
            .payload
            .as_str()
            .unwrap_or_default()
            .to_string(),
    }
}

fn product_name(fragment: &EvidenceFragment) -> Option<String> {
    fragment
        .payload
        .get("product_name")?
        .as_str()
        .map(str::to_string)
}

fn cc_mode(fragment: &EvidenceFragment) -> Option<String> {
    fragment.payload.get("cc_mode")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EvidenceFragment;

    fn cpu_report(verified: bool) -> AttestationReport {
        let mut fragments = BTreeMap::new();
        fragments.insert(
            EvidenceSource::KernelLog,
            EvidenceFragment::collected(
                EvidenceSource::KernelLog,
                verified,
                json!(["Intel TDX: Guest initialized"]),
            ),
        );
        fragments.insert(
            EvidenceSource::SignedPlatformDocument,
            EvidenceFragment::collected(
                EvidenceSource::SignedPlatformDocument,
                false,
                json!({ "encoding": "pkcs7", "signature": "MIIEE..." }),
            ),
        );
        fragments.insert(
            EvidenceSource::IntegrityRegisters,
            EvidenceFragment::unavailable(
                EvidenceSource::IntegrityRegisters,
                "tpm2-tools not installed",
            ),
        );
        AttestationReport {
            platform_label: "Intel-TDX".to_string(),
            vm_identifier: "Standard_DC4es_v5".to_string(),
            verified,
            fragments,
            accelerator_verified: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_cpu_document_has_no_gpu_fields() {
        let bytes = render(&cpu_report(true));
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["tee_verified"], json!(true));
        assert_eq!(value["platform"], json!("Intel-TDX"));
        assert_eq!(value["vm_size"], json!("Standard_DC4es_v5"));
        assert!(value.get("gpu").is_none());
        assert!(value.get("gpu_tee_verified").is_none());
        assert!(value.get("nvidia_cc_mode").is_none());
    }

    #[test]
    fn test_register_sentinel_rendered_verbatim() {
        let doc = ReportDocument::from_report(&cpu_report(false));
        assert_eq!(doc.tpm_pcr_sha256, "tpm2-tools not installed");
        assert!(!doc.tee_verified);
    }

    #[test]
    fn test_document_error_rendered_as_error_object() {
        let mut report = cpu_report(true);
        report.fragments.insert(
            EvidenceSource::SignedPlatformDocument,
            EvidenceFragment::failed(
                EvidenceSource::SignedPlatformDocument,
                "connection timed out",
            ),
        );
        let doc = ReportDocument::from_report(&report);
        assert_eq!(doc.azure_attestation, json!({ "error": "connection timed out" }));
        // A failed advisory fragment never flips the verdict.
        assert!(doc.tee_verified);
    }

    #[test]
    fn test_gpu_fields_present_on_gpu_variant() {
        let mut report = cpu_report(false);
        report.accelerator_verified = Some(true);
        report.fragments.insert(
            EvidenceSource::AcceleratorConfidentiality,
            EvidenceFragment::collected(
                EvidenceSource::AcceleratorConfidentiality,
                true,
                json!({
                    "output": "Product Name : NVIDIA H100\nConfidential Computing : Enabled",
                    "product_name": "NVIDIA H100",
                    "cc_mode": "on",
                }),
            ),
        );
        let doc = ReportDocument::from_report(&report);
        assert_eq!(doc.gpu.as_deref(), Some("NVIDIA H100"));
        assert_eq!(doc.gpu_tee_verified, Some(true));
        assert_eq!(doc.nvidia_cc_mode.as_deref(), Some("on"));
        // Accelerator verdict is independent of the CPU verdict.
        assert!(!doc.tee_verified);
    }

    #[test]
    fn test_gpu_probe_unavailable_still_renders_fields() {
        let mut report = cpu_report(false);
        report.accelerator_verified = Some(false);
        report.fragments.insert(
            EvidenceSource::AcceleratorConfidentiality,
            EvidenceFragment::unavailable(
                EvidenceSource::AcceleratorConfidentiality,
                "nvidia-smi not installed",
            ),
        );
        let doc = ReportDocument::from_report(&report);
        assert_eq!(doc.gpu.as_deref(), Some("unknown"));
        assert_eq!(doc.gpu_tee_verified, Some(false));
        assert_eq!(doc.nvidia_cc_mode.as_deref(), Some("unknown"));
    }

    #[test]
    fn test_errored_kernel_fragment_renders_empty_dmesg() {
        let mut report = cpu_report(false);
        report.fragments.insert(
            EvidenceSource::KernelLog,
            EvidenceFragment::failed(EvidenceSource::KernelLog, "dmesg: command not found"),
        );
        let doc = ReportDocument::from_report(&report);
        assert!(doc.tee_dmesg.is_empty());
    }
}
