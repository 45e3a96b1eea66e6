mod config;
mod logging;
mod read_dir;
mod symlink;
mod watch;

pub use config::*;
pub use logging::*;
pub use read_dir::*;
pub use symlink::*;
pub use watch::*;
