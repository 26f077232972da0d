// SPDX-FileCopyrightText: © 2026 TrustedGenAI <security@trustedgenai.ai>
//
// SPDX-License-Identifier: Apache-2.0

//! TEE attestation agent.
//!
//! Collects proofs of hardware-enforced confidentiality from the kernel
//! log, the cloud instance metadata service, the TPM and (on GPU
//! deployments) the accelerator, and serves them as one machine
//! verifiable report over HTTP.

use anyhow::{anyhow, bail, Result};
use attest_types::{AttestConfig, TeePlatform};
use clap::Parser;
use tracing::info;

mod http;

use http::AgentState;

/// TEE attestation agent
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    listen: String,

    /// Port to listen on
    #[arg(long, default_value_t = 4001)]
    port: u16,

    /// Expected TEE technology of this deployment (intel-tdx or
    /// amd-sev-snp)
    #[arg(long, default_value = "intel-tdx", value_parser = parse_platform)]
    platform: TeePlatform,

    /// Deployment identifier reported verbatim in the attestation
    /// document (e.g. the cloud VM size)
    #[arg(long, default_value = "Unknown")]
    vm_size: String,

    /// Enable the accelerator confidentiality probe
    #[arg(long)]
    gpu: bool,

    /// Path the attestation report is served under
    #[arg(long, default_value = "/attestation")]
    attestation_path: String,
}

fn parse_platform(value: &str) -> Result<TeePlatform, String> {
    value.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    {
        use tracing_subscriber::{fmt, EnvFilter};
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt().with_env_filter(filter).init();
    }

    let args = Args::parse();
    if !args.attestation_path.starts_with('/') {
        bail!("attestation path must start with '/'");
    }

    let config = AttestConfig {
        platform: args.platform,
        vm_identifier: args.vm_size,
        gpu: args.gpu,
    };
    let collectors = attest_evidence::collectors_for(&config);

    info!(
        "serving attestation reports on http://{}:{}{}",
        args.listen, args.port, args.attestation_path
    );
    info!(
        platform = config.platform.label(),
        gpu = config.gpu,
        "expected TEE technology"
    );

    let state = AgentState { config, collectors };
    http::build_rocket(&args.listen, args.port, &args.attestation_path, state)
        .launch()
        .await
        .map_err(|err| anyhow!("attestation server failed: {err}"))?;
    Ok(())
}
