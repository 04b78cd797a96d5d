//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` and only depend on the
//! domain router, so they stay testable without network I/O.

use std::sync::Arc;

use crate::domain::router::UserRouter;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub router: Arc<UserRouter>,
}

impl HttpState {
    pub fn new(router: Arc<UserRouter>) -> Self {
        Self { router }
    }
}
