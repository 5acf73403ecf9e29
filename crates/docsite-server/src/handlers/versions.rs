//! Versions API endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::VersionInfo;
use crate::state::AppState;

/// Response for GET /api/versions.
#[derive(Serialize)]
pub(crate) struct VersionsResponse {
    versions: Vec<VersionInfo>,
    default: Option<String>,
}

/// Handle GET /api/versions.
pub(crate) async fn get_versions(State(state): State<Arc<AppState>>) -> Json<VersionsResponse> {
    Json(VersionsResponse {
        versions: state.versions.clone(),
        default: state.default_version.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_response_serialization() {
        let response = VersionsResponse {
            versions: vec![VersionInfo {
                id: "8.1".to_owned(),
                label: "8.1 (latest)".to_owned(),
            }],
            default: Some("8.1".to_owned()),
        };

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["versions"][0]["id"], "8.1");
        assert_eq!(json["versions"][0]["label"], "8.1 (latest)");
        assert_eq!(json["default"], "8.1");
    }
}
