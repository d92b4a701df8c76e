use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::auth::Access;
use crate::database::Document;
use crate::error::ApiError;
use crate::resources::ResourceModel;

use super::utils::parse_document_body;

/// GET /app/:resource - every document in the collection
pub async fn list(
    Extension(model): Extension<ResourceModel>,
    access: Access,
) -> Result<Json<Vec<Document>>, ApiError> {
    tracing::info!("query {}", model.spec().path);
    Ok(Json(model.retrieve_all(&access).await?))
}

/// GET /app/:resource/:id - the matching document, or null
pub async fn detail(
    Extension(model): Extension<ResourceModel>,
    access: Access,
    Path(id): Path<String>,
) -> Result<Json<Option<Document>>, ApiError> {
    tracing::info!("Query single {} with {}: {}", model.spec().path, model.spec().id_field, id);
    Ok(Json(model.retrieve_details(&access, &id).await?))
}

/// POST /app/:resource - store the body as a new document.
///
/// Answers `success` whether or not the document was stored; only a missing
/// session changes the response.
pub async fn create(
    Extension(model): Extension<ResourceModel>,
    access: Access,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload = match parse_document_body(&headers, &body) {
        Ok(payload) => payload,
        Err(reason) => {
            tracing::warn!("improper data for {}: {}", model.spec().path, reason);
            return "success".into_response();
        }
    };

    match model.create(&access, payload).await {
        Ok(created) => tracing::debug!("created {} {} document(s)", created, model.spec().path),
        Err(ApiError::SessionRequired) => return ApiError::SessionRequired.into_response(),
        Err(e) => tracing::warn!("improper data for {}: {}", model.spec().path, e),
    }

    "success".into_response()
}

/// DELETE /app/journalentries/delete/:id
pub async fn delete(
    Extension(model): Extension<ResourceModel>,
    access: Access,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    tracing::info!("delete {} with {} = {}", model.spec().path, model.spec().id_field, id);
    let deleted = model.delete_entry(&access, &id).await?;
    Ok(Json(json!({ "deletedCount": deleted })))
}

/// GET /app/quotes/count
pub async fn count(
    Extension(model): Extension<ResourceModel>,
    access: Access,
) -> Result<Json<u64>, ApiError> {
    let count = model.count(&access).await?;
    tracing::info!("{} count: {}", model.spec().path, count);
    Ok(Json(count))
}
