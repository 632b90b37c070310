use std::sync::Arc;

use crate::config::Config;
use crate::offer::session::SessionRegistry;
use crate::pdf::{PdfArchive, PdfRenderer};
use crate::store::HrStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Memory or Postgres, decided by `DATA_SOURCE` at startup.
    pub store: Arc<dyn HrStore>,
    pub sessions: SessionRegistry,
    pub renderer: Arc<dyn PdfRenderer>,
    /// Present only when S3 is configured.
    pub archive: Option<PdfArchive>,
    pub config: Config,
}
