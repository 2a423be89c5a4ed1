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

use crate::Args;
use snafu::Snafu;
use std::net::SocketAddr;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display(
        "group name must be specified, set --group-name or the GROUP_NAME environment variable"
    ))]
    MissingGroupName,
    #[snafu(display("invalid listen address '{addr}': {message}"))]
    InvalidAddr { addr: String, message: String },
    #[snafu(display(
        "invalid log level '{level}', expected trace, debug, info, warn or error"
    ))]
    InvalidLogLevel { level: String },
}

type Result<T, E = Error> = std::result::Result<T, E>;

/// Startup configuration, validated once before anything is built.
#[derive(Debug, Clone)]
pub struct StartupConf {
    pub group_name: String,
    pub addr: SocketAddr,
    pub api_endpoint: String,
    pub log_level: tracing::Level,
}

impl TryFrom<&Args> for StartupConf {
    type Error = Error;

    fn try_from(args: &Args) -> Result<Self> {
        let group_name = args
            .group_name
            .clone()
            .unwrap_or_default()
            .trim()
            .to_string();
        if group_name.is_empty() {
            return Err(Error::MissingGroupName);
        }
        let addr =
            args.addr.parse().map_err(|e: std::net::AddrParseError| {
                Error::InvalidAddr {
                    addr: args.addr.clone(),
                    message: e.to_string(),
                }
            })?;
        let log_level =
            args.log_level.parse().map_err(|_| Error::InvalidLogLevel {
                level: args.log_level.clone(),
            })?;

        Ok(Self {
            group_name,
            addr,
            api_endpoint: args.api_endpoint.clone(),
            log_level,
        })
    }
}
