//! nem-crypt
//!
//! Reads a private key, a public key and a message (one per line) from
//! stdin and writes the encrypted payload, or with `decrypt` the plaintext,
//! to stdout.

use std::process::ExitCode;

use clap::Parser;

use nem_bridge::config::EndpointConfig;
use nem_bridge::crypt::{self, CryptOptions, Mode};
use nem_bridge::nem::{Network, NisClient};
use nem_bridge::observability::logging;

#[derive(Parser)]
#[command(name = "nem-crypt")]
#[command(version, about = "Encrypt or decrypt a NEM message", long_about = None)]
struct Cli {
    /// `decrypt` to decrypt; anything else encrypts
    mode: Option<String>,

    /// Write decrypted plaintext as hex
    #[arg(long)]
    hex: bool,

    /// Log level for diagnostics on stderr
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    let options = CryptOptions {
        mode: Mode::from_arg(cli.mode.as_deref()),
        hex_output: cli.hex,
    };

    // Message crypto is local; the endpoint is never contacted.
    let facade = match NisClient::new(&EndpointConfig::default(), Network::default()) {
        Ok(facade) => facade,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize facade");
            return ExitCode::FAILURE;
        }
    };

    match crypt::run(&facade, options, tokio::io::stdin(), tokio::io::stdout()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(mode = %options.mode, error = %e, "nem-crypt failed");
            ExitCode::FAILURE
        }
    }
}
