// Copyright 2025 safedns-webhook contributors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP surface exposing the solver to the challenge framework.
//!
//! Routes live under the configured group name:
//! `POST /{group}/present`, `POST /{group}/cleanup`, plus `GET /healthz`.
//! Solver errors are never handled here, only serialized into the
//! response body for the framework to act on.

use crate::LOG_CATEGORY;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use safedns_solver::{ChallengeRequest, DnsSolver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    solver: Arc<dyn DnsSolver>,
}

/// Outcome of a present/cleanup call.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChallengeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChallengeResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn fail(err: impl ToString) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
        }
    }
}

pub fn new_router(group_name: &str, solver: Arc<dyn DnsSolver>) -> Router {
    let state = AppState { solver };
    let api = Router::new()
        .route("/present", post(present))
        .route("/cleanup", post(clean_up));
    Router::new()
        .route("/healthz", get(healthz))
        .nest(&format!("/{group_name}"), api)
        .with_state(state)
}

async fn healthz() -> &'static str {
    "OK"
}

async fn present(
    State(state): State<AppState>,
    Json(challenge): Json<ChallengeRequest>,
) -> Json<ChallengeResponse> {
    info!(
        category = LOG_CATEGORY,
        solver = state.solver.name(),
        fqdn = challenge.resolved_fqdn,
        "present challenge"
    );
    match state.solver.present(&challenge).await {
        Ok(()) => Json(ChallengeResponse::ok()),
        Err(e) => {
            error!(
                category = LOG_CATEGORY,
                fqdn = challenge.resolved_fqdn,
                error = e.to_string(),
                "present challenge fail"
            );
            Json(ChallengeResponse::fail(e))
        },
    }
}

async fn clean_up(
    State(state): State<AppState>,
    Json(challenge): Json<ChallengeRequest>,
) -> Json<ChallengeResponse> {
    info!(
        category = LOG_CATEGORY,
        solver = state.solver.name(),
        fqdn = challenge.resolved_fqdn,
        "clean up challenge"
    );
    match state.solver.clean_up(&challenge).await {
        Ok(()) => Json(ChallengeResponse::ok()),
        Err(e) => {
            error!(
                category = LOG_CATEGORY,
                fqdn = challenge.resolved_fqdn,
                error = e.to_string(),
                "clean up challenge fail"
            );
            Json(ChallengeResponse::fail(e))
        },
    }
}
