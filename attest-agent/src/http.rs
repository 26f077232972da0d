// SPDX-FileCopyrightText: © 2026 TrustedGenAI <security@trustedgenai.ai>
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP surface of the attestation agent.
//!
//! Exactly one read endpoint: a GET on the configured attestation path
//! runs the aggregator and returns the rendered report with a 200, even
//! when every collector failed, because "all checks ran and found no
//! TEE" must stay distinguishable from a dead endpoint. Every other
//! path is a 404 with an empty body.

use attest_evidence::{aggregate, Collect};
use attest_types::{render, AttestConfig};
use rocket::fairing::AdHoc;
use rocket::http::{ContentType, Header};
use rocket::{catch, catchers, get, routes, Build, Rocket, State};

/// Shared, immutable per-process state. Collectors own only their own
/// I/O handles, so concurrent requests need no locking.
pub struct AgentState {
    pub config: AttestConfig,
    pub collectors: Vec<Box<dyn Collect>>,
}

#[get("/")]
async fn attestation(state: &State<AgentState>) -> (ContentType, Vec<u8>) {
    let report = aggregate(&state.config, &state.collectors).await;
    (ContentType::JSON, render(&report))
}

#[catch(404)]
fn not_found() {}

fn cors_allow_all() -> AdHoc {
    AdHoc::on_response("CORS allow-all", |_request, response| {
        Box::pin(async move {
            response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        })
    })
}

/// Assemble the rocket application.
///
/// Rocket's own launch and request logging is turned off; the agent
/// logs through tracing only.
pub fn build_rocket(
    address: &str,
    port: u16,
    attestation_path: &str,
    state: AgentState,
) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("address", address))
        .merge(("port", port))
        .merge(("log_level", "off"))
        .merge(("cli_colors", false));
    rocket::custom(figment)
        .manage(state)
        .mount(attestation_path, routes![attestation])
        .register("/", catchers![not_found])
        .attach(cors_allow_all())
}
