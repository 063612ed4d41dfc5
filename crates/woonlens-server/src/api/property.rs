use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use woonlens_core::{AddressKey, CompositeRecord, Scores};
use woonlens_engine::AggregateError;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct PropertyQuery {
    pub postcode: Option<String>,
    #[serde(rename = "houseNumber", alias = "house_number")]
    pub house_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScoresData {
    address: String,
    scores: Scores,
}

#[derive(Debug, Serialize)]
pub(super) struct RecommendationsData {
    address: String,
    recommendations: Vec<String>,
}

/// Full composite for one address. Also serves `/api/property/analysis` and
/// the legacy `/search` alias.
pub(super) async fn get_property(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PropertyQuery>,
) -> Result<Json<ApiResponse<CompositeRecord>>, ApiError> {
    let record = aggregate(&state, &req_id.0, &query).await?;
    Ok(Json(ApiResponse {
        data: record,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_analysis(
    state: State<AppState>,
    req_id: Extension<RequestId>,
    query: Query<PropertyQuery>,
) -> Result<Json<ApiResponse<CompositeRecord>>, ApiError> {
    get_property(state, req_id, query).await
}

pub(super) async fn get_scores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PropertyQuery>,
) -> Result<Json<ApiResponse<ScoresData>>, ApiError> {
    let record = aggregate(&state, &req_id.0, &query).await?;
    Ok(Json(ApiResponse {
        data: ScoresData {
            address: record.address.display_name,
            scores: record.scores.unwrap_or_default(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_recommendations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PropertyQuery>,
) -> Result<Json<ApiResponse<RecommendationsData>>, ApiError> {
    let record = aggregate(&state, &req_id.0, &query).await?;
    Ok(Json(ApiResponse {
        data: RecommendationsData {
            address: record.address.display_name,
            recommendations: record.scores.map(|s| s.recommendations).unwrap_or_default(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn aggregate(
    state: &AppState,
    request_id: &str,
    query: &PropertyQuery,
) -> Result<CompositeRecord, ApiError> {
    let key = validate(request_id, query)?;
    state.engine.aggregate(&key).await.map_err(|e| match e {
        AggregateError::AddressNotFound => {
            ApiError::new(request_id, "not_found", "no address found for this query")
        }
        AggregateError::Address(source) => {
            tracing::error!(error = %source, "address resolution failed");
            ApiError::new(request_id, "internal_error", "address resolution failed")
        }
    })
}

fn validate(request_id: &str, query: &PropertyQuery) -> Result<AddressKey, ApiError> {
    let postcode = query.postcode.as_deref().unwrap_or_default();
    let house_number = query.house_number.as_deref().unwrap_or_default();
    let key = AddressKey::new(postcode, house_number);

    if key.house_number.is_empty() {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "houseNumber is required",
        ));
    }
    if !is_valid_postcode(&key.postcode) {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "postcode must look like 1234AB",
        ));
    }
    Ok(key)
}

/// Dutch postcodes: four digits then two letters, after normalisation.
fn is_valid_postcode(normalised: &str) -> bool {
    let bytes = normalised.as_bytes();
    bytes.len() == 6
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4..].iter().all(u8::is_ascii_uppercase)
}
