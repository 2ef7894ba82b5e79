use std::env;
use std::net::SocketAddr;
use std::process;

use getopts::{Matches, Options};
use tokio::time::Duration;
use url::Url;

use crate::holiday::DEFAULT_ALLOWANCE;
use crate::oauth::Credentials;
use crate::server::CALLBACK_PATH;
use crate::tags::TagRule;

pub const CLIENT_ID_VAR: &str = "googlekey";
pub const CLIENT_SECRET_VAR: &str = "googlesecret";

/// Provider endpoints. Only tests point these anywhere but Google.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub authorize: Url,
    pub token: Url,
    pub calendar_api: Url,
}

impl Endpoints {
    pub fn google() -> Self {
        Self {
            authorize: parse_const_url("https://accounts.google.com/o/oauth2/auth"),
            token: parse_const_url("https://oauth2.googleapis.com/token"),
            calendar_api: parse_const_url("https://www.googleapis.com/calendar/v3"),
        }
    }
}

fn parse_const_url(url: &str) -> Url {
    Url::parse(url).expect("built-in endpoint URL is valid")
}

#[derive(Debug, Clone)]
pub struct Args {
    pub address: SocketAddr,
    pub redirect_uri: Url,
    pub session_ttl: Duration,
    pub session_capacity: usize,
    pub max_pages: usize,
    pub request_timeout: Duration,
    pub allowance: i64,
    pub tag_rule: TagRule,
    pub credentials: Credentials,
    pub endpoints: Endpoints,
}

pub enum Command {
    Help(String),
    Serve(Args),
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:3000]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "r",
        "redirect-uri",
        "OAuth2 redirect URI registered with the provider [Default: http://localhost:3000/oauthcallback]",
        "URI",
    );
    opts.optopt(
        "t",
        "session-ttl",
        "Time-to-live for pending login sessions [Default: 600]",
        "SECONDS",
    );
    opts.optopt(
        "c",
        "session-capacity",
        "Maximum number of pending login sessions [Default: 10000]",
        "COUNT",
    );
    opts.optopt(
        "p",
        "max-pages",
        "Maximum number of calendar result pages to fetch [Default: 50]",
        "COUNT",
    );
    opts.optopt(
        "T",
        "request-timeout",
        "Timeout for requests to the calendar provider [Default: 30]",
        "SECONDS",
    );
    opts.optopt(
        "A",
        "allowance",
        "Holiday days available per period [Default: 26]",
        "DAYS",
    );
    opts.optflag(
        "l",
        "legacy-tags",
        "Use the even/odd tag rule for titles starting with '#' [Default: false]",
    );
    opts
}

fn opt_or<T>(matches: &Matches, name: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    matches
        .opt_get_default(name, default)
        .map_err(|err| format!("Provided value for option '{name}' is invalid: {err}"))
}

fn positive<T: Default + PartialEq>(value: T, name: &str) -> Result<T, String> {
    if value == T::default() {
        return Err(format!("Provided value for option '{name}' must be at least 1"));
    }
    Ok(value)
}

/// Parses command line arguments, reading credentials through `var`.
pub fn try_parse<F>(args: Vec<String>, var: F) -> Result<Command, String>
where
    F: Fn(&str) -> Option<String>,
{
    let opts = opts();
    let matches = opts.parse(args).map_err(|fail| fail.to_string())?;

    if matches.opt_present("help") {
        return Ok(Command::Help(
            opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))),
        ));
    }

    let address = opt_or(&matches, "address", SocketAddr::from(([127, 0, 0, 1], 3000)))?;

    let redirect_uri = opt_or(
        &matches,
        "redirect-uri",
        format!("http://localhost:3000{CALLBACK_PATH}"),
    )?;
    let redirect_uri = Url::parse(&redirect_uri)
        .map_err(|err| format!("Provided value for option 'redirect-uri' is invalid: {err}"))?;

    let session_ttl = Duration::from_secs(positive(
        opt_or(&matches, "session-ttl", 600)?,
        "session-ttl",
    )?);
    let session_capacity = positive(
        opt_or(&matches, "session-capacity", 10_000)?,
        "session-capacity",
    )?;
    let max_pages = positive(opt_or(&matches, "max-pages", 50)?, "max-pages")?;
    let request_timeout = Duration::from_secs(positive(
        opt_or(&matches, "request-timeout", 30)?,
        "request-timeout",
    )?);
    let allowance = opt_or(&matches, "allowance", DEFAULT_ALLOWANCE)?;

    let tag_rule = if matches.opt_present("legacy-tags") {
        TagRule::LegacyParity
    } else {
        TagRule::Delimited
    };

    let required = |name: &str| {
        var(name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| format!("Environment variable `{name}` must be set"))
    };

    let credentials = Credentials {
        client_id: required(CLIENT_ID_VAR)?,
        client_secret: required(CLIENT_SECRET_VAR)?,
    };

    Ok(Command::Serve(Args {
        address,
        redirect_uri,
        session_ttl,
        session_capacity,
        max_pages,
        request_timeout,
        allowance,
        tag_rule,
        credentials,
        endpoints: Endpoints::google(),
    }))
}

pub fn parse(args: Vec<String>) -> Args {
    match try_parse(args, |name| env::var(name).ok()) {
        Ok(Command::Serve(args)) => args,
        Ok(Command::Help(usage)) => {
            println!("{usage}");
            process::exit(0);
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}
