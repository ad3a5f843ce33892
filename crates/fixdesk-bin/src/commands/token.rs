// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `token` command.

use std::time::Duration;

use anyhow::Context;
use fixdesk_api::{ClaimSet, CredentialExtractor};
use fixdesk_config::{FixdeskConfig, load_config};

use crate::cli::{Cli, TokenArgs};
use crate::error::{BinError, BinResult};

/// Executes the `token` command: prints a signed bearer token.
pub fn token(cli: &Cli, args: TokenArgs) -> BinResult<()> {
    let config = load_config(&cli.config)?;
    let token = mint(&config, &args)?;
    println!("{}", token);
    Ok(())
}

/// Signs a token for `args` with the configured key.
pub fn mint(config: &FixdeskConfig, args: &TokenArgs) -> BinResult<String> {
    if args.role.trim().is_empty() {
        return Err(BinError::config("role cannot be empty"));
    }

    let credentials = CredentialExtractor::new(&config.auth)?;
    let ttl = args
        .ttl
        .map(Duration::from_secs)
        .unwrap_or_else(|| credentials.token_ttl());
    let ttl_secs = i64::try_from(ttl.as_secs())
        .context("token lifetime out of range")?;

    let mut claims = ClaimSet::new(args.user, args.role.as_str(), ttl_secs);
    if let Some(issuer) = &config.auth.issuer {
        claims = claims.with_issuer(issuer);
    }

    let token = credentials.sign(&claims)?;
    tracing::debug!(user = args.user, role = %args.role, ttl_secs, "Minted token");
    Ok(token)
}
