use rouille::Response;

use crate::{
    catalog::error::CatalogError, playback::error::PlaybackError, request::RequestError,
};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(e) => ApiError::BadRequest(e.to_string()),
            CatalogError::IdsExhausted => ApiError::Conflict(err.to_string()),
            CatalogError::Storage(_) | CatalogError::Import { .. } => {
                log::error!("catalog failure: {err}");
                ApiError::Internal("internal server error".into())
            }
        }
    }
}

impl From<PlaybackError> for ApiError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::UnknownWidget(id) => ApiError::NotFound(format!("track {id} not found")),
            PlaybackError::InvalidRate(_) => ApiError::BadRequest(err.to_string()),
            PlaybackError::Start { .. } => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::MissingSongName | RequestError::MissingDescription => {
                ApiError::BadRequest(err.to_string())
            }
            RequestError::InvalidRecipient(_) => {
                log::error!("song requests are misconfigured: {err}");
                ApiError::Internal("song requests are not available".into())
            }
        }
    }
}

impl ApiError {
    pub fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => Response::text(msg).with_status_code(404),

            ApiError::BadRequest(msg) => Response::text(msg).with_status_code(400),

            ApiError::Conflict(msg) => Response::text(msg).with_status_code(409),

            ApiError::Internal(msg) => Response::text(msg).with_status_code(500),
        }
    }
}
