use std::sync::Arc;

use tracing::info;

use kde_platform::transport::Transport;
use kde_platform::window::ParentWindow;

use crate::auth::KdeAuth;
use crate::config::KdeConfig;
use crate::error::AuthError;
use crate::http::ReqwestTransport;
use crate::vfs::Vfs;
use crate::window::KdeWindow;

/// Everything an embedded application needs, built from one [`KdeConfig`]
pub struct KdeSession {
    pub auth: KdeAuth,
    pub vfs: Vfs,
    pub window: Arc<KdeWindow>,
}

/// Build a session over the default reqwest transport
pub fn initialize_kde(
    config: &KdeConfig,
    parent: Box<dyn ParentWindow>,
) -> Result<KdeSession, AuthError> {
    initialize_kde_with_transport(config, parent, Arc::new(ReqwestTransport::new()))
}

/// The credential is checked first; nothing else is built when it is missing
pub fn initialize_kde_with_transport(
    config: &KdeConfig,
    parent: Box<dyn ParentWindow>,
    transport: Arc<dyn Transport>,
) -> Result<KdeSession, AuthError> {
    let auth = KdeAuth::new(&config.auth_query())?;
    let vfs = Vfs::with_transport(config.base_url.clone(), transport);
    let window = Arc::new(KdeWindow::new(config.allowed_origins.clone(), parent));

    info!(
        "kde session initialized (base_url={}, allowed_origins={})",
        vfs.base_url(),
        window.allowed_origins().len()
    );

    Ok(KdeSession { auth, vfs, window })
}
