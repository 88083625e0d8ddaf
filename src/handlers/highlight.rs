//! # Keyword Highlight Endpoint
//!
//! `POST /api/keywords/highlight` — stateless text substitution over a
//! finished transcript. Kept separate from the transcription pipeline: it
//! touches no files and calls no external service.

use crate::error::AppError;
use crate::handlers::models::{HighlightRequest, HighlightResponse};
use crate::keywords::highlight_keywords;
use actix_web::{web, HttpResponse};

pub async fn highlight_transcript(
    body: web::Json<HighlightRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    let highlighted = highlight_keywords(&request.transcript, &request.keywords)?;

    Ok(HttpResponse::Ok().json(HighlightResponse {
        success: true,
        highlighted,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_highlight_endpoint() {
        let app = test::init_service(
            App::new().route("/api/keywords/highlight", web::post().to(highlight_transcript)),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/api/keywords/highlight")
            .set_json(serde_json::json!({
                "transcript": "please see a cardiologist soon",
                "keywords": ["cardiologist"],
            }))
            .to_request();

        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["highlighted"], "please see a **cardiologist** soon");
    }
}
