use tracing::info;

use crate::catalog;
use crate::dispatch::{self, Reporter, RunSummary};
use crate::error::HarvestError;
use crate::fetch::Fetcher;
use crate::store::Store;

/// Orchestrates one batch run: load the catalog, then drive every target
/// through the fetch-and-extract pipeline. Only catalog-level failures
/// surface as errors; per-target failures end up in the summary.
#[derive(Clone)]
pub struct App<F: Fetcher> {
    store: Store,
    fetcher: F,
}

impl<F: Fetcher> App<F> {
    pub fn new(store: Store, fetcher: F) -> Self {
        Self { store, fetcher }
    }

    pub fn run(
        &self,
        index_url: &str,
        workers: usize,
        reporter: &dyn Reporter,
    ) -> Result<RunSummary, HarvestError> {
        // the local index copy lives for the whole run and is removed on drop
        let index_file = tempfile::Builder::new()
            .prefix("subharvest-index")
            .suffix(".json")
            .tempfile()
            .map_err(|err| HarvestError::Filesystem(err.to_string()))?;

        let targets = catalog::load(&self.fetcher, index_url, index_file.path())?;
        info!(targets = targets.len(), workers, "catalog loaded");

        Ok(dispatch::run(
            &self.store,
            &self.fetcher,
            targets,
            workers,
            reporter,
        ))
    }
}
