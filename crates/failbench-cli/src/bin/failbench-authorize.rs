//! One-time Google authorization for failbench.
//!
//! Runs the installed-app OAuth flow against a loopback redirect and stores
//! the token where `failbench` will look for it. Paths come from the same
//! environment as `failbench` (`FAILBENCH_CLIENT_SECRETS`,
//! `FAILBENCH_TOKEN_FILE`) unless overridden on the command line. Exits 0
//! when a token is already present or was just obtained, 1 otherwise.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use failbench_core::init_tracing;
use google_query::{authorize_interactive, ClientSecrets, CredentialStore, GoogleConfig};
use tracing::Level;

const RULE: &str = "======================================================================";
const THIN_RULE: &str = "----------------------------------------------------------------------";

#[derive(Parser, Debug)]
#[command(name = "failbench-authorize")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Authorize read-only Gmail and Calendar access for failbench", long_about = None)]
struct Args {
    /// OAuth client file downloaded from the Google Cloud Console
    /// [default: $FAILBENCH_CLIENT_SECRETS or oauth_credentials.json]
    #[arg(long, value_name = "PATH")]
    client_secrets: Option<PathBuf>,

    /// Where to store the obtained token
    /// [default: $FAILBENCH_TOKEN_FILE or token.json]
    #[arg(long, value_name = "PATH")]
    token: Option<PathBuf>,

    /// Print the authorization URL instead of opening a browser
    #[arg(long)]
    no_browser: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(false, if args.verbose { Level::DEBUG } else { Level::WARN });

    let config = apply_overrides(&args, GoogleConfig::from_env());
    if authorize(&config, !args.no_browser).await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Command-line paths win over the environment.
fn apply_overrides(args: &Args, mut config: GoogleConfig) -> GoogleConfig {
    if let Some(path) = &args.client_secrets {
        config = config.with_client_secrets(path);
    }
    if let Some(path) = &args.token {
        config = config.with_token_path(path);
    }
    config
}

async fn authorize(config: &GoogleConfig, open_browser: bool) -> bool {
    println!("\n{RULE}");
    println!("GOOGLE OAUTH 2.0 AUTHORIZATION");
    println!("{RULE}");

    let token = &config.token_path;
    let client_secrets = &config.client_secrets_path;

    let store = CredentialStore::new(token);
    if store.exists() {
        println!("\n✓ Token already exists: {}", token.display());
        println!("  You're already authorized!");
        println!("\n  To re-authorize, delete the token file and run this again:");
        println!("    rm {}", token.display());
        println!("    failbench-authorize");
        return true;
    }

    if !client_secrets.exists() {
        println!("\n✗ Missing {}", client_secrets.display());
        println!("\n  Make sure you downloaded OAuth credentials from Google Cloud Console");
        return false;
    }
    println!("\n✓ Found {}", client_secrets.display());

    let secrets = match ClientSecrets::from_file(client_secrets) {
        Ok(secrets) => secrets,
        Err(e) => {
            print_failure(&e, client_secrets);
            return false;
        }
    };

    println!("\n{THIN_RULE}");
    if !open_browser {
        println!("IMPORTANT: Open the URL below in a browser to authorize");
    } else {
        println!("IMPORTANT: A browser will open for authorization");
    }
    println!("{THIN_RULE}");
    println!("\nIn the browser:");
    println!("  1. Sign in with your Google account");
    println!("  2. Click 'Allow' for Gmail and Calendar access");
    println!("  3. You should see 'authentication completed'");
    println!("  4. The browser can then be closed");
    println!("\nStarting authorization flow...\n");

    match authorize_interactive(secrets, &store, open_browser).await {
        Ok(_) => {
            println!("\n{RULE}");
            println!("✓ AUTHORIZATION SUCCESSFUL");
            println!("{RULE}");
            println!("\n✓ Token saved to: {}", token.display());
            println!("\nYou can now run your benchmark:");
            println!("  failbench");
            println!(
                "\nYou won't need to authorize again unless you delete {}\n",
                token.display()
            );
            true
        }
        Err(e) => {
            print_failure(&e, client_secrets);
            false
        }
    }
}

fn print_failure(error: &dyn std::fmt::Display, client_secrets: &std::path::Path) {
    println!("\n✗ Authorization failed: {error}");
    println!("\nTroubleshooting:");
    println!(
        "  1. Make sure {} is the correct file",
        client_secrets.display()
    );
    println!("  2. Ensure Gmail and Calendar APIs are enabled in Google Cloud");
    println!("  3. Try again: failbench-authorize");
}
