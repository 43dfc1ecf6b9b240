// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Parse a configured level name, falling back to INFO.
pub fn resolve_level(log_level: Option<&str>) -> Level {
    log_level
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::INFO)
}

/// Install the global fmt subscriber. Thread names are included because
/// every session runs on its own named thread.
pub fn init_logging(log_level: Option<&str>) {
    FmtSubscriber::builder()
        .with_target(false)
        .with_thread_names(true)
        .with_max_level(resolve_level(log_level))
        .init();
}
