// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! plansync - mirror school portal schedules into a `CalDAV` calendar

use std::process::ExitCode;

use plansync_cli::run;

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}
