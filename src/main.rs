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

use clap::Parser;
use safedns_secret::StoreConf;
use safedns_solver::{DnsSolver, SafeDnsSolver};
use std::sync::Arc;
use tracing::{error, info};

mod conf;
mod webhook;

use conf::StartupConf;

pub static LOG_CATEGORY: &str = "webhook_server";

/// ACME DNS-01 challenge solver webhook for the SafeDNS API.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// API group name the webhook registers under, falls back to the
    /// GROUP_NAME environment variable
    #[arg(long, env = "GROUP_NAME")]
    group_name: Option<String>,
    /// Listen address
    #[arg(long, default_value = "0.0.0.0:8443")]
    addr: String,
    /// SafeDNS API endpoint
    #[arg(long, default_value = "https://api.ukfast.io")]
    api_endpoint: String,
    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logger(level: tracing::Level) {
    tracing_subscriber::fmt().with_max_level(level).init();
}

async fn run(conf: StartupConf) -> Result<(), Box<dyn std::error::Error>> {
    let solver = Arc::new(SafeDnsSolver::new(&conf.api_endpoint));

    let store_conf = StoreConf::from_cluster_env()?;
    solver.initialize(&store_conf).await?;

    let app = webhook::new_router(&conf.group_name, solver);
    info!(
        category = LOG_CATEGORY,
        group_name = conf.group_name,
        addr = conf.addr.to_string(),
        "starting webhook server"
    );
    let listener = tokio::net::TcpListener::bind(conf.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let conf = match StartupConf::try_from(&args) {
        Ok(conf) => conf,
        Err(e) => {
            init_logger(tracing::Level::INFO);
            error!(
                category = LOG_CATEGORY,
                error = e.to_string(),
                "invalid startup configuration"
            );
            std::process::exit(1);
        },
    };
    init_logger(conf.log_level);

    if let Err(e) = run(conf).await {
        error!(
            category = LOG_CATEGORY,
            error = e.to_string(),
            "webhook server failed"
        );
        std::process::exit(1);
    }
}
