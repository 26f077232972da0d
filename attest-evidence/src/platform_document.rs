// SPDX-FileCopyrightText: © 2026 TrustedGenAI <security@trustedgenai.ai>
//
// SPDX-License-Identifier: Apache-2.0

//! Signed platform document collector.
//!
//! Fetches the cloud-signed attestation document from the instance
//! metadata service. The document is forwarded opaquely as advisory
//! context for the caller's own downstream verification; it never
//! contributes to the report's `verified` flag and no signature
//! verification happens here.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use attest_types::{EvidenceFragment, EvidenceSource};
use serde_json::{json, Value};

use crate::Collect;

const IMDS_ATTESTED_DOCUMENT_URL: &str =
    "http://169.254.169.254/metadata/attested/document?api-version=2021-02-01";

/// Liveness probe, not a durability-critical read: short timeout, no
/// retry.
const DOCUMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Signature preview length kept in the fragment.
const SIGNATURE_PREVIEW_CHARS: usize = 200;

pub struct PlatformDocumentCollector {
    client: reqwest::Client,
    url: String,
}

impl PlatformDocumentCollector {
    pub fn new() -> Self {
        Self::with_url(IMDS_ATTESTED_DOCUMENT_URL.to_string())
    }

    /// Probe a non-default metadata address. Used by tests.
    pub fn with_url(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    async fn fetch_document(&self) -> Result<Value> {
        let response = self
            .client
            .get(&self.url)
            .timeout(DOCUMENT_TIMEOUT)
            .header("Metadata", "true")
            .send()
            .await
            .context("failed to reach instance metadata service")?;
        if !response.status().is_success() {
            bail!(
                "instance metadata service returned HTTP {}",
                response.status().as_u16()
            );
        }
        let document: Value = response
            .json()
            .await
            .context("failed to parse attested document")?;

        let encoding = document
            .get("encoding")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let signature = document
            .get("signature")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(json!({
            "encoding": encoding,
            "signature": truncate_signature(signature),
        }))
    }
}

impl Default for PlatformDocumentCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collect for PlatformDocumentCollector {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::SignedPlatformDocument
    }

    fn timeout(&self) -> Duration {
        DOCUMENT_TIMEOUT
    }

    async fn collect(&self) -> EvidenceFragment {
        match self.fetch_document().await {
            // The document is contextual evidence only, so it never
            // sets indicates_tee.
            Ok(payload) => EvidenceFragment::collected(self.source(), false, payload),
            Err(err) => EvidenceFragment::failed(self.source(), format!("{err:#}")),
        }
    }
}

/// Cap the signature preview so the fragment stays small; the full blob
/// is available to callers directly from the metadata service.
fn truncate_signature(signature: &str) -> String {
    if signature.chars().count() > SIGNATURE_PREVIEW_CHARS {
        let prefix: String = signature.chars().take(SIGNATURE_PREVIEW_CHARS).collect();
        format!("{prefix}...")
    } else {
        signature.to_string()
    }
}
