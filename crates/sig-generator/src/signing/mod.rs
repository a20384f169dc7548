mod signer;
mod rsa;

pub use signer::DeploymentSigner;
pub use self::rsa::{RsaPssSigner, decode_public_key, read_private_key, verify};
