use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use hiermeasure_cli::{HostConfig, MeasureHost};
use tokio::sync::OnceCell;

use super::output::OutputFormat;

pub struct CliContext {
    config: Arc<HostConfig>,
    config_path: PathBuf,
    output: OutputFormat,
    host: OnceCell<Arc<MeasureHost>>,
}

impl CliContext {
    pub fn new(config: HostConfig, config_path: PathBuf, output: OutputFormat) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            output,
            host: OnceCell::new(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    pub async fn host(&self) -> Result<Arc<MeasureHost>> {
        self.host
            .get_or_try_init(|| async {
                MeasureHost::from_config(&self.config, None)
                    .map(Arc::new)
                    .map_err(|err| err.into())
            })
            .await
            .map(Arc::clone)
    }

    pub async fn shutdown(&self) {
        if let Some(host) = self.host.get() {
            host.shutdown().await;
        }
    }
}
