//! Ask endpoint request/response types

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::{AnswerMode, FinalResponse, RequestContext};

use super::ApiError;

/// Body of `POST /ask`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AskRequest {
    /// The user's question; its absence is answered with an error body, not
    /// a failure status
    pub user_query: Option<String>,
    /// Optional trace steps carried over from the client
    #[serde(default)]
    pub steps: Vec<String>,
    /// 1 = structured card, 2 = free-text markdown (default)
    #[serde(rename = "type")]
    pub answer_type: Option<u8>,
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be within -90..90"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "longitude must be within -180..180"))]
    pub longitude: Option<f64>,
}

impl AskRequest {
    /// Resolve the request context; unknown `type` values are rejected
    pub fn context(&self) -> Result<RequestContext, ApiError> {
        let mode = match self.answer_type {
            None => AnswerMode::default(),
            Some(value) => AnswerMode::try_from(value).map_err(ApiError::bad_request)?,
        };

        let mut ctx = RequestContext::new(mode);

        if let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) {
            ctx = ctx.with_location(latitude, longitude);
        }

        Ok(ctx)
    }

    /// The query, if present and non-blank
    pub fn query(&self) -> Option<&str> {
        self.user_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// Successful body of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub result: FinalResponse,
}
