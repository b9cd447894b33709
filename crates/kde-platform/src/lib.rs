// Host environment capabilities consumed by kde-core

pub mod transport;
pub mod window;
