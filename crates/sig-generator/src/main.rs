use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sig_generator::{AppState, DeploymentSigner, KeyFileSource, RsaPssSigner, ServerOptions, run};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sig-generator", about = "Signs deployment descriptors over HTTP")]
struct Args {
    /// Address to bind
    #[clap(long, env = "SIG_GENERATOR_HOST", default_value = "127.0.0.1")]
    host: String,
    /// Port to bind
    #[clap(long, env = "SIG_GENERATOR_PORT", default_value = "8080")]
    port: u16,
    /// Per-request deadline, covering body read and response write
    #[clap(long, env = "SIG_GENERATOR_REQUEST_TIMEOUT_SECS", default_value = "15")]
    request_timeout_secs: u64,
    /// Largest accepted deployment descriptor, in bytes
    #[clap(long, env = "SIG_GENERATOR_MAX_BODY_BYTES", default_value = "33554432")]
    max_body_bytes: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sig_generator=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // HZN_KEY_FILE is read per request; a missing variable is only a warning here.
    let key_file = KeyFileSource::default();
    if key_file.resolve().is_none() {
        tracing::warn!("HZN_KEY_FILE is not set; signing requests will fail until it is exported");
    }

    let signer: Arc<dyn DeploymentSigner> = Arc::new(RsaPssSigner::new());
    info!("Signing with {}", signer.algorithm());

    let state = AppState { signer, key_file };

    let options = ServerOptions {
        request_timeout: Duration::from_secs(args.request_timeout_secs),
        max_body_bytes: args.max_body_bytes,
    };

    run(args.host, args.port, options, state).await
}
