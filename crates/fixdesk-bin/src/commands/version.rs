// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::BinResult;

/// Executes the `version` command to display version information.
pub fn version(_cli: &Cli) -> BinResult<()> {
    println!("FixDesk - maintenance desk backend");
    println!();
    println!("Version Information:");
    println!("  fixdesk-bin:    {}", env!("CARGO_PKG_VERSION"));
    println!("  fixdesk-core:   {}", fixdesk_core::VERSION);
    println!("  fixdesk-api:    {}", fixdesk_api::VERSION);
    println!("  fixdesk-config: {}", fixdesk_config::VERSION);
    println!("  fixdesk-images: {}", fixdesk_images::VERSION);
    println!();
    println!("Build Information:");
    println!("  Rust Edition: 2024");
    println!("  Target:       {}", std::env::consts::ARCH);
    println!("  OS:           {}", std::env::consts::OS);
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
