pub mod node;
pub mod config;
pub mod service_handle;
pub mod cli;

pub use node::{DevNode, DevNodeConfig, NODE_NAME};
pub use config::FileConfig;
pub use service_handle::ServiceHandle;
pub use cli::run_cli;
pub use crate::runtime::{MAIN_ASSET, STABLE_ASSET};
