use anyhow::{Context as _, Result};
use serde::Serialize;
use setu_config::AppConfig;
use setu_store::Store;
use std::io::{self, Write};
use tokio::runtime::Runtime;

pub mod serve;
pub mod sos;
pub mod users;

pub struct Context<'a> {
    pub store: Store,
    pub json: bool,
    pub config: &'a AppConfig,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

pub fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .with_context(|| "start async runtime")
}
