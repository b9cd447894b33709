//! Client SDK for applications embedded in a KDE host page.
//!
//! The host hands the application a [`KdeConfig`]; [`initialize_kde`] turns it
//! into a [`KdeSession`] holding the credential ([`KdeAuth`]), the remote
//! filesystem client ([`Vfs`]) and the parent-window relay ([`KdeWindow`]).

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod protocol;
pub mod session;
pub mod vfs;
pub mod window;

pub use auth::{is_authenticated, KdeAuth};
pub use config::KdeConfig;
pub use error::{AuthError, ErrorCode, KdeError, VfsError};
pub use protocol::{FileInfo, KdeMessage, SearchOptions, SearchType};
pub use session::{initialize_kde, initialize_kde_with_transport, KdeSession};
pub use vfs::{Operation, Vfs};
pub use window::KdeWindow;
