//! Request handlers for the famispots API.

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Error;
use crate::place::NewPlace;

use super::AppState;

/// Query parameters for photo uploads.
#[derive(Debug, Deserialize)]
pub struct PhotoQuery {
    /// Suggested name for the stored file, usually the place name.
    #[serde(default)]
    name: String,
}

/// Response body for a successful photo upload.
#[derive(Debug, Serialize)]
struct PhotoResponse {
    photo_reference: String,
}

/// Health summary for the service.
#[derive(Debug, Serialize)]
struct HealthResponse {
    backend: &'static str,
    places: usize,
}

/// Return every stored place in storage order.
#[get("/places")]
pub async fn get_places(state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let places = state.store.list_all().await?;
    Ok(HttpResponse::Ok().json(places))
}

/// Accept a place submission.
#[post("/places")]
pub async fn post_place(
    state: web::Data<AppState>,
    submission: web::Json<NewPlace>,
) -> Result<HttpResponse, Error> {
    let place = state.store.append(submission.into_inner()).await?;
    info!("Accepted place '{}'", place.name);
    Ok(HttpResponse::Created().json(place))
}

/// Accept a raw photo upload and return its stored reference.
#[post("/photos")]
pub async fn post_photo(
    state: web::Data<AppState>,
    query: web::Query<PhotoQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, Error> {
    let photo_reference = state.store.save_photo(&body, &query.name).await?;
    info!("Stored photo at '{photo_reference}'");
    Ok(HttpResponse::Created().json(PhotoResponse { photo_reference }))
}

/// Report the active backend and stored row count.
#[get("/health")]
pub async fn get_health(state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let places = state.store.count().await?;
    Ok(HttpResponse::Ok().json(HealthResponse {
        backend: state.store.backend_name(),
        places,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};

    use crate::http::{configure, AppState};
    use crate::place::Place;
    use crate::store::CsvStore;

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-payload";

    // Builds an in-process service over a fresh CsvStore in `$dir`.
    macro_rules! test_app {
        ($dir:expr) => {{
            let store = CsvStore::open(
                $dir.path().join("places.csv"),
                $dir.path().join("images"),
            )
            .expect("failed to open test store");
            let state = web::Data::new(AppState {
                store: Box::new(store),
            });
            test::init_service(
                App::new()
                    .app_data(state)
                    .configure(configure(1024 * 1024)),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn test_get_places_empty() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(dir);

        let req = test::TestRequest::get().uri("/places").to_request();
        let places: Vec<Place> = test::call_and_read_body_json(&app, req).await;
        assert!(places.is_empty());
    }

    #[actix_web::test]
    async fn test_post_place_then_listed() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(dir);

        let req = test::TestRequest::post()
            .uri("/places")
            .set_json(serde_json::json!({
                "name": "Playground Rivera",
                "category": "playground",
                "location": "Lausanne"
            }))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/places").to_request();
        let places: Vec<Place> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name, "Playground Rivera");
        assert_eq!(places[0].location, "Lausanne");
    }

    #[actix_web::test]
    async fn test_post_place_empty_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(dir);

        let req = test::TestRequest::post()
            .uri("/places")
            .set_json(serde_json::json!({ "name": "" }))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // Listing is unchanged
        let req = test::TestRequest::get().uri("/places").to_request();
        let places: Vec<Place> = test::call_and_read_body_json(&app, req).await;
        assert!(places.is_empty());
    }

    #[actix_web::test]
    async fn test_post_photo_png() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(dir);

        let req = test::TestRequest::post()
            .uri("/photos?name=Plage%20de%20Vidy")
            .set_payload(PNG_BYTES)
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: serde_json::Value = test::read_body_json(response).await;
        let reference = body["photo_reference"].as_str().unwrap();
        assert!(reference.starts_with("images/plage-de-vidy-"));
    }

    #[actix_web::test]
    async fn test_post_photo_unsupported_type() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(dir);

        let req = test::TestRequest::post()
            .uri("/photos")
            .set_payload("definitely not an image")
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[actix_web::test]
    async fn test_health_reports_backend_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(dir);

        let req = test::TestRequest::post()
            .uri("/places")
            .set_json(serde_json::json!({ "name": "Zoo Zürich" }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["backend"], "local");
        assert_eq!(body["places"], 1);
    }
}
