//! CLI subcommand modules.
//!
//! This module contains the implementations for all ronda CLI subcommands.

pub(crate) mod cache;
pub(crate) mod score;
pub(crate) mod screen;

use ronda::screen::Screener;
use tracing::info;

/// Cancel the screener's runs on Ctrl-C.
pub(crate) fn cancel_on_ctrl_c(screener: &Screener) {
    let cancel = screener.cancellation().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received interrupt, cancelling");
            cancel.cancel();
        }
    });
}
