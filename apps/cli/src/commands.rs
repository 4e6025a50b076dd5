//! Subcommand handlers.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use sealpost_auth::{NtpTimeSource, TokenManager};
use sealpost_http::{ReqwestTransport, Transport};
use sealpost_stream::{HttpInventory, Inventory, Streamer};

use crate::config::AppConfig;
use crate::progress;

/// Wired-up services for one process run.
pub struct App {
    inventory: Arc<HttpInventory>,
    streamer: Streamer,
}

impl App {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let transport: Arc<dyn Transport> =
            Arc::new(ReqwestTransport::new().context("failed to build HTTP client")?);
        let inventory = Arc::new(HttpInventory::new(
            Arc::clone(&transport),
            config.instance_url.clone(),
            config.credentials.clone(),
        ));
        let tokens = Arc::new(TokenManager::new(
            Arc::clone(&transport),
            config.instance_url.clone(),
            config.credentials.clone(),
            Arc::new(NtpTimeSource::new(config.ntp_servers.clone())),
        ));
        let streamer = Streamer::new(
            transport,
            Arc::clone(&inventory) as Arc<dyn Inventory>,
            config.credentials.clone(),
            tokens,
            config.stream_settings(),
        );
        streamer.progress().on_progress(Box::new(progress::print));

        Ok(Self {
            inventory,
            streamer,
        })
    }

    /// Uploads each path in turn, stopping at the first failure.
    pub async fn upload(&self, paths: &[PathBuf], resume: bool, direct: bool) -> anyhow::Result<()> {
        for path in paths {
            self.streamer.upload(path, resume, direct).await?;
        }
        Ok(())
    }

    pub async fn download(&self, names: &[String], direct: bool) -> anyhow::Result<()> {
        for name in names {
            let dest = self.streamer.download(name, direct).await?;
            tracing::info!(dest = %dest.display(), "saved");
        }
        Ok(())
    }

    pub async fn files(&self, outbox: bool, delete: Option<&str>) -> anyhow::Result<()> {
        if let Some(name) = delete {
            self.inventory.delete_file(name).await?;
            println!("Deleted {name} from the inbox.");
            return Ok(());
        }

        let files = self.inventory.list_files(!outbox).await?;
        let mut out = std::io::stdout().lock();
        for file in &files {
            writeln!(out, "{}\t{}\t{}", file.file_name, file.size, file.modified_date)?;
        }
        Ok(())
    }

    pub async fn resumables(&self, delete: Option<&str>) -> anyhow::Result<()> {
        if let Some(id) = delete {
            self.inventory.delete_resumable(id).await?;
            println!("Deleted resumable upload {id}.");
            return Ok(());
        }

        let records = self.inventory.list_resumables().await?;
        let mut out = std::io::stdout().lock();
        for record in &records {
            writeln!(
                out,
                "{}\t{}\t{}\t{}",
                record.id, record.name, record.size, record.chunk
            )?;
        }
        Ok(())
    }
}
