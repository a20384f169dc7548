pub mod config;
pub mod error;
pub mod model;
pub mod server;
pub mod signing;

pub use config::{KEY_FILE_ENV, KeyFileSource};
pub use error::SigningServiceError;
pub use server::{AppState, ServerOptions, router, run, sign_deployment};
pub use signing::{DeploymentSigner, RsaPssSigner};
