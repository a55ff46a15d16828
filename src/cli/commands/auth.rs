//! Session and CSRF settings.

use anyhow::{bail, Context, Result};
use clap::{builder::BoolishValueParser, Arg, ArgAction, Command};
use secrecy::{ExposeSecret, SecretString};

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_CSRF_KEY: &str = "csrf-key";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_COOKIE_INSECURE: &str = "cookie-insecure";

/// HMAC keys shorter than the SHA-256 output are refused.
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub csrf_key: SecretString,
    pub frontend_base_url: String,
    pub cookie_insecure: bool,
}

impl Options {
    /// # Errors
    /// Returns an error if a secret is missing or shorter than [`MIN_SECRET_BYTES`].
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let jwt_secret = required_secret(matches, ARG_JWT_SECRET)?;
        let csrf_key = required_secret(matches, ARG_CSRF_KEY)?;
        let frontend_base_url = matches
            .get_one::<String>(ARG_FRONTEND_BASE_URL)
            .cloned()
            .context("missing required argument: --frontend-base-url")?;
        let cookie_insecure = matches.get_flag(ARG_COOKIE_INSECURE);

        Ok(Self {
            jwt_secret,
            csrf_key,
            frontend_base_url,
            cookie_insecure,
        })
    }
}

fn required_secret(matches: &clap::ArgMatches, name: &str) -> Result<SecretString> {
    let secret = matches
        .get_one::<String>(name)
        .map(|value| SecretString::from(value.clone()))
        .with_context(|| format!("missing required argument: --{name}"))?;

    if secret.expose_secret().len() < MIN_SECRET_BYTES {
        bail!("--{name} must be at least {MIN_SECRET_BYTES} bytes");
    }

    Ok(secret)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("HS256 signing secret for session tokens")
                .env("TASKGATE_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_CSRF_KEY)
                .long(ARG_CSRF_KEY)
                .help("HMAC key used to derive CSRF tokens")
                .env("TASKGATE_CSRF_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend origin allowed by CORS with credentials")
                .env("TASKGATE_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_COOKIE_INSECURE)
                .long(ARG_COOKIE_INSECURE)
                .help("Send cookies without the Secure attribute (plain HTTP development only)")
                .env("TASKGATE_COOKIE_INSECURE")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
}
