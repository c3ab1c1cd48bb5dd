use crate::commands::{runtime, Context};
use anyhow::{Context as _, Result};
use clap::Args;
use setu_server::{router, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Overrides `server.bind` from the config file
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,
}

pub fn serve(ctx: Context<'_>, args: ServeArgs) -> Result<()> {
    let bind = args.bind.unwrap_or(ctx.config.server.bind);
    let state = AppState::from_config(ctx.config, ctx.store).with_context(|| "build transport")?;
    let app = router(state);

    runtime()?.block_on(async move {
        let listener = TcpListener::bind(bind)
            .await
            .with_context(|| format!("bind {bind}"))?;
        let local = listener.local_addr().with_context(|| "read bound address")?;
        info!(addr = %local, "listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .with_context(|| "http server")?;
        info!("shut down");
        Ok(())
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
