//! Shared construction helpers for command implementations

use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::download::{self, DownloadManager};
use crate::error::Result;
use crate::state::{self, StateStore};

/// Global CLI options shared by every command
#[derive(Debug, Clone)]
pub struct Globals {
    pub catalog: PathBuf,
    pub cache_dir: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
}

impl Globals {
    pub fn load_catalog(&self) -> Result<Catalog> {
        let catalog = Catalog::load(&self.catalog)?;
        tracing::debug!(
            path = %self.catalog.display(),
            applications = catalog.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn open_state(&self) -> Result<StateStore> {
        let path = match &self.state_file {
            Some(path) => path.clone(),
            None => state::default_state_file()?,
        };
        StateStore::open(path)
    }

    pub fn resolved_cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => download::default_cache_dir(),
        }
    }

    pub fn download_manager(&self, require_signatures: bool) -> Result<DownloadManager> {
        let manager = DownloadManager::new(self.resolved_cache_dir()?)?
            .with_require_signatures(require_signatures);

        #[cfg(windows)]
        let manager = manager.with_authenticode(Box::new(download::PowershellAuthenticode));

        Ok(manager)
    }
}
