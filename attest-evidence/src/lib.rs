// SPDX-FileCopyrightText: © 2026 TrustedGenAI <security@trustedgenai.ai>
//
// SPDX-License-Identifier: Apache-2.0

//! Evidence collectors for the TEE attestation aggregation service.
//!
//! Each collector probes exactly one external mechanism and produces one
//! [`EvidenceFragment`]. Collectors are independent, read-only and
//! best-effort: any failure degrades the collector's own fragment and is
//! never propagated to the aggregate request.

use std::time::Duration;

use async_trait::async_trait;
use attest_types::{AttestConfig, EvidenceFragment, EvidenceSource};

mod accelerator;
mod aggregate;
mod kernel_log;
mod platform_document;
mod registers;

pub use accelerator::AcceleratorCollector;
pub use aggregate::aggregate;
pub use kernel_log::KernelLogCollector;
pub use platform_document::PlatformDocumentCollector;
pub use registers::{IntegrityRegisterCollector, PCR_UNAVAILABLE_SENTINEL};

/// Default timeout for local command invocations.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// A probe of one external evidence mechanism.
///
/// The aggregator enforces [`Collect::timeout`] around each call, so an
/// implementation does not need its own deadline handling; it only has
/// to make sure resources are released on cancellation (subprocesses
/// are spawned with `kill_on_drop`).
#[async_trait]
pub trait Collect: Send + Sync {
    /// Which mechanism this collector probes.
    fn source(&self) -> EvidenceSource;

    /// Hard per-collector deadline applied by the aggregator.
    fn timeout(&self) -> Duration {
        COMMAND_TIMEOUT
    }

    /// Produce one evidence fragment. Must not panic; failures are
    /// reported through the fragment's error field.
    async fn collect(&self) -> EvidenceFragment;
}

/// Build the collector set for a deployment variant.
///
/// CPU-only deployments run the kernel log, signed document and
/// integrity register probes; GPU deployments add the accelerator
/// probe.
pub fn collectors_for(config: &AttestConfig) -> Vec<Box<dyn Collect>> {
    let mut collectors: Vec<Box<dyn Collect>> = vec![
        Box::new(KernelLogCollector::new(config.platform)),
        Box::new(PlatformDocumentCollector::new()),
        Box::new(IntegrityRegisterCollector::new()),
    ];
    if config.gpu {
        collectors.push(Box::new(AcceleratorCollector::new()));
    }
    collectors
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_types::TeePlatform;

    fn config(gpu: bool) -> AttestConfig {
        AttestConfig {
            platform: TeePlatform::IntelTdx,
            vm_identifier: "Standard_DC4es_v5".to_string(),
            gpu,
        }
    }

    #[test]
    fn test_cpu_variant_runs_three_collectors() {
        let sources: Vec<_> = collectors_for(&config(false))
            .iter()
            .map(|c| c.source())
            .collect();
        assert_eq!(
            sources,
            vec![
                EvidenceSource::KernelLog,
                EvidenceSource::SignedPlatformDocument,
                EvidenceSource::IntegrityRegisters,
            ]
        );
    }

    #[test]
    fn test_gpu_variant_adds_accelerator_collector() {
        let sources: Vec<_> = collectors_for(&config(true))
            .iter()
            .map(|c| c.source())
            .collect();
        assert!(sources.contains(&EvidenceSource::AcceleratorConfidentiality));
        assert_eq!(sources.len(), 4);
    }
}
