use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sig_generator::signing::{decode_public_key, verify};
use sig_generator::{DeploymentSigner, RsaPssSigner};

/// Offline counterpart to the signing service: signs or checks a
/// deployment file exactly as the service would.
#[derive(Parser)]
#[command(name = "sig-generator-client")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign the raw bytes of a deployment descriptor
    Sign {
        #[clap(long, env = "HZN_KEY_FILE")]
        key_file: PathBuf,
        /// Descriptor file; stdin when omitted
        #[clap(long)]
        input: Option<PathBuf>,
    },
    /// Check a base64 signature against a deployment descriptor
    Verify {
        #[clap(long)]
        public_key: PathBuf,
        #[clap(long)]
        signature: String,
        /// Descriptor file; stdin when omitted
        #[clap(long)]
        input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sig_generator_client=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Sign { key_file, input } => {
            let data = read_input(input.as_deref())?;
            tracing::debug!(bytes = data.len(), key_file = %key_file.display(), "signing");
            let signature = RsaPssSigner::new().sign(&key_file, &data)?;
            println!("{signature}");
        }
        Command::Verify {
            public_key,
            signature,
            input,
        } => {
            let data = read_input(input.as_deref())?;
            let pem = fs::read_to_string(&public_key)
                .with_context(|| format!("reading public key file {}", public_key.display()))?;
            let public_key = decode_public_key(&pem)?;
            verify(&public_key, &data, &signature)?;
            println!("Signature valid");
        }
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut data = Vec::new();
            std::io::stdin()
                .read_to_end(&mut data)
                .context("reading stdin")?;
            Ok(data)
        }
    }
}
