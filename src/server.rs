use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::{net::TcpListener, signal};

use crate::calendar::{tagged_events, CalendarClient};
use crate::cli::Args;
use crate::date::DateRange;
use crate::error::Error;
use crate::holiday::remaining_holiday_days;
use crate::oauth::OAuthClient;
use crate::session::{self, MemorySessionStore, SessionStore};
use crate::tags::TagRule;

pub const CALLBACK_PATH: &str = "/oauthcallback";

#[derive(Clone)]
pub struct AppState {
    callback_path: String,
    sessions: Arc<dyn SessionStore>,
    oauth: OAuthClient,
    calendar: CalendarClient,
    allowance: i64,
    tag_rule: TagRule,
}

impl AppState {
    pub fn new(args: &Args, sessions: Arc<dyn SessionStore>) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(args.request_timeout)
            .build()?;

        let oauth = OAuthClient::new(
            http.clone(),
            args.credentials.clone(),
            args.redirect_uri.to_string(),
            args.endpoints.authorize.clone(),
            args.endpoints.token.clone(),
        );

        let calendar = CalendarClient::new(http, args.endpoints.calendar_api.clone(), args.max_pages);

        // The provider sends the user back to the redirect URI, so serve the
        // callback wherever that URI points.
        let callback_path = args.redirect_uri.path().to_owned();

        Ok(Self {
            callback_path,
            sessions,
            oauth,
            calendar,
            allowance: args.allowance,
            tag_rule: args.tag_rule,
        })
    }

    /// State backed by an in-memory session store sized from `args`.
    pub fn in_memory(args: &Args) -> Result<Self, Error> {
        let sessions = MemorySessionStore::new(session::Config {
            ttl: args.session_ttl,
            capacity: args.session_capacity,
        });
        Self::new(args, Arc::new(sessions))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(&state.callback_path, get(handle_callback))
        .route("/:start/:end", get(handle_login))
        .with_state(state)
}

async fn handle_login(
    State(state): State<AppState>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Redirect, Error> {
    let range = DateRange::from_path(&start, &end)?;
    let token = state.sessions.issue(range);

    log::info!("Starting login for {} to {}", range.start(), range.end());
    Ok(Redirect::temporary(state.oauth.authorize_url(&token).as_str()))
}

#[derive(Deserialize)]
struct CallbackQuery {
    state: Option<String>,
    code: Option<String>,
    error: Option<String>,
}

async fn handle_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<String, Error> {
    let range = query
        .state
        .as_deref()
        .and_then(|token| state.sessions.take(token))
        .ok_or(Error::SessionNotFound)?;

    if let Some(error) = query.error {
        return Err(Error::Authorization(error));
    }

    let code = query.code.ok_or(Error::MissingCode)?;
    let token = state.oauth.exchange_code(&code).await?;

    let events = state
        .calendar
        .list_events(&token.access_token, &range)
        .await?;
    let tagged = tagged_events(&events, state.tag_rule)?;
    let balance = remaining_holiday_days(&tagged, state.allowance);

    log::info!(
        "{} events, {} tagged, {balance} holiday days left",
        events.len(),
        tagged.len()
    );
    Ok(balance.to_string())
}

pub async fn serve(args: Args) -> anyhow::Result<()> {
    let state = AppState::in_memory(&args)?;
    let listener = TcpListener::bind(args.address).await?;

    log::info!("Listening at http://{}", args.address);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => log::info!("Shutting down"),
        Err(err) => {
            log::error!("Failed to listen for shutdown signal: {err}");
            std::future::pending::<()>().await;
        }
    }
}
