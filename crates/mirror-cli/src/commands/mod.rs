//! Command implementations for mirror-cli

pub mod init;
pub mod publish;
pub mod sync;
pub mod watch;

pub use init::run_init;
pub use publish::run_publish;
pub use sync::run_sync;
pub use watch::run_watch;
