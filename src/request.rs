//! "Request a song" hand-off to a messaging deep link.

use thiserror::Error;
use url::Url;

const MESSAGING_BASE: &str = "https://wa.me/";

#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("song name is required")]
    MissingSongName,

    #[error("description is required")]
    MissingDescription,

    #[error("invalid messaging recipient '{0}'")]
    InvalidRecipient(String),
}

/// Prefilled message link for `phone`. The link is opened by the caller and
/// nothing comes back.
pub fn song_request_url(
    phone: &str,
    song_name: &str,
    description: &str,
) -> Result<Url, RequestError> {
    let song_name = song_name.trim();
    let description = description.trim();
    if song_name.is_empty() {
        return Err(RequestError::MissingSongName);
    }
    if description.is_empty() {
        return Err(RequestError::MissingDescription);
    }

    let phone = phone.trim().trim_start_matches('+');
    if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(RequestError::InvalidRecipient(phone.to_string()));
    }

    let message = format!("Song Request: {song_name}\n\nDescription: {description}");
    let mut url = Url::parse(MESSAGING_BASE)
        .and_then(|base| base.join(phone))
        .map_err(|_| RequestError::InvalidRecipient(phone.to_string()))?;
    url.query_pairs_mut().append_pair("text", &message);
    Ok(url)
}
