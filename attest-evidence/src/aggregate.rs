// SPDX-FileCopyrightText: © 2026 TrustedGenAI <security@trustedgenai.ai>
//
// SPDX-License-Identifier: Apache-2.0

//! Evidence aggregation.
//!
//! Fans out to every configured collector concurrently, applies each
//! collector's own timeout, and reduces the fragments into one
//! [`AttestationReport`]. There are no retries: this is a liveness
//! check, a single pass per request is sufficient.

use std::collections::BTreeMap;

use attest_types::{AttestConfig, AttestationReport, EvidenceFragment, EvidenceSource};
use chrono::Utc;
use futures::future::join_all;
use tracing::warn;

use crate::Collect;

/// Run all collectors and merge their fragments into one report.
///
/// `verified` is computed strictly from the kernel log fragment; the
/// signed document and integrity registers are advisory and a failure
/// there never turns a detected TEE into "not verified". The
/// accelerator verdict is present iff an accelerator collector was
/// configured, and is independent of `verified`.
pub async fn aggregate(
    config: &AttestConfig,
    collectors: &[Box<dyn Collect>],
) -> AttestationReport {
    let probes = collectors.iter().map(|collector| async move {
        let source = collector.source();
        let deadline = collector.timeout();
        match tokio::time::timeout(deadline, collector.collect()).await {
            Ok(fragment) => fragment,
            Err(_) => {
                warn!(%source, ?deadline, "evidence collector timed out");
                EvidenceFragment::failed(
                    source,
                    format!("collection timed out after {deadline:?}"),
                )
            }
        }
    });

    let mut fragments = BTreeMap::new();
    for fragment in join_all(probes).await {
        if let Some(err) = &fragment.error {
            warn!(source = %fragment.source, error = %err, "evidence collection failed");
        }
        fragments.insert(fragment.source, fragment);
    }

    let verified = fragments
        .get(&EvidenceSource::KernelLog)
        .map(|fragment| fragment.indicates_tee)
        .unwrap_or(false);
    let accelerator_verified = fragments
        .get(&EvidenceSource::AcceleratorConfidentiality)
        .map(|fragment| fragment.indicates_tee);

    AttestationReport {
        platform_label: config.platform.label().to_string(),
        vm_identifier: config.vm_identifier.clone(),
        verified,
        fragments,
        accelerator_verified,
        timestamp: Utc::now(),
    }
}
