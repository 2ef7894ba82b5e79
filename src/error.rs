use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;

/// Everything that can end a request early. Each variant renders as a
/// plain-text response.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Couldn't parse date `{input}`: {source}")]
    InvalidDate {
        input: String,
        source: chrono::ParseError,
    },

    #[error("Start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("Missing OAuth2 authorization code")]
    MissingCode,

    #[error("Your OAuth2 state has not been found.")]
    SessionNotFound,

    #[error("OAuth2 authorization was denied: {0}")]
    Authorization(String),

    #[error("OAuth2 exchange failed: {0}")]
    TokenExchange(String),

    #[error("Couldn't fetch calendar events: {0}")]
    CalendarFetch(String),

    #[error("Calendar returned more than {0} pages of events")]
    TooManyPages(usize),

    #[error("Couldn't create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidDate { .. }
            | Error::InvertedRange { .. }
            | Error::MissingCode
            | Error::SessionNotFound => StatusCode::BAD_REQUEST,
            Error::Authorization(_)
            | Error::TokenExchange(_)
            | Error::CalendarFetch(_)
            | Error::TooManyPages(_) => StatusCode::BAD_GATEWAY,
            Error::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        log::warn!("Request failed: {self}");
        (self.status(), self.to_string()).into_response()
    }
}
