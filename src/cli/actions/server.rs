use crate::api::{self, handlers::auth::AuthConfig};
use anyhow::Result;
use secrecy::SecretString;
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: SecretString,
    pub csrf_key: SecretString,
    pub frontend_base_url: String,
    pub cookie_insecure: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the store cannot be opened or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let auth_config =
        AuthConfig::new(args.frontend_base_url).with_session_cookie_secure(!args.cookie_insecure);

    api::new(
        args.port,
        args.dsn,
        auth_config,
        args.jwt_secret,
        args.csrf_key,
    )
    .await
}

fn log_startup_args(args: &Args) {
    info!(
        port = args.port,
        dsn = %redact_dsn(&args.dsn),
        frontend_base_url = %args.frontend_base_url,
        cookie_insecure = args.cookie_insecure,
        "Starting taskgate"
    );
    if args.cookie_insecure {
        warn!("--cookie-insecure is set; do not use it outside local development");
    }
}

/// Strip credentials from the DSN before it reaches the logs.
fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => "<unparsable dsn>".to_string(),
    }
}
