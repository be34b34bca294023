use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use snapdiff::image_utils::png_dimensions;
use snapdiff::{compare_with_options, DiffError, DiffOptions, ImageSide};
use tower_http::limit::RequestBodyLimitLayer;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            message: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Deserialize)]
pub struct CompareRequest {
    /// Base64 PNG, optionally as a `data:image/png;base64,` URL.
    pub baseline: String,
    pub candidate: String,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub detect_anti_aliasing: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CompareData {
    pub pixel_count: u64,
    pub width: u32,
    pub height: u32,
    /// Base64 PNG of the diff image.
    pub diff: String,
}

type CompareResponse = (StatusCode, Json<ApiResponse<CompareData>>);

#[derive(Clone, Copy, Debug)]
pub struct Limits {
    pub body_bytes: usize,
    /// Largest common canvas (`max(w) * max(h)`) a request may allocate.
    pub canvas_pixels: u64,
}

pub fn app(limits: Limits) -> Router {
    Router::new()
        .route("/ping", get(|| async { "pong" }))
        .route("/health", get(|| async { "healthy" }))
        .route("/compare", post(compare))
        .with_state(limits)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(limits.body_bytes))
}

fn decode_base64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    // strip the "data:image/png;base64," prefix if present
    let data = match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    };
    STANDARD.decode(data.trim())
}

fn bad_request(message: String) -> CompareResponse {
    log::warn!("{}", message);
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)))
}

fn dimensions_of(side: ImageSide, bytes: &[u8]) -> Result<(u32, u32), CompareResponse> {
    png_dimensions(bytes).map_err(|source| bad_request(DiffError::Decode { side, source }.to_string()))
}

async fn compare(State(limits): State<Limits>, Json(payload): Json<CompareRequest>) -> CompareResponse {
    let baseline = match decode_base64(&payload.baseline) {
        Ok(bytes) => bytes,
        Err(err) => return bad_request(format!("Failed to decode baseline base64: {}", err)),
    };
    let candidate = match decode_base64(&payload.candidate) {
        Ok(bytes) => bytes,
        Err(err) => return bad_request(format!("Failed to decode candidate base64: {}", err)),
    };

    let (baseline_width, baseline_height) = match dimensions_of(ImageSide::Baseline, &baseline) {
        Ok(dims) => dims,
        Err(response) => return response,
    };
    let (candidate_width, candidate_height) = match dimensions_of(ImageSide::Candidate, &candidate) {
        Ok(dims) => dims,
        Err(response) => return response,
    };
    let canvas_pixels =
        u64::from(baseline_width.max(candidate_width)) * u64::from(baseline_height.max(candidate_height));
    if canvas_pixels > limits.canvas_pixels {
        return bad_request(format!(
            "Common canvas of {} pixels exceeds the limit of {}",
            canvas_pixels, limits.canvas_pixels
        ));
    }

    log::info!(
        "Comparing {} byte baseline with {} byte candidate",
        baseline.len(),
        candidate.len()
    );

    let options = DiffOptions {
        threshold: payload.threshold,
        detect_anti_aliasing: payload.detect_anti_aliasing,
        ..Default::default()
    };

    let result = tokio::task::spawn_blocking(move || compare_with_options(&baseline, &candidate, &options)).await;

    match result {
        Ok(Ok(result)) => (
            StatusCode::OK,
            Json(ApiResponse::ok(CompareData {
                pixel_count: result.pixel_count(),
                width: result.width(),
                height: result.height(),
                diff: STANDARD.encode(result.buffer()),
            })),
        ),
        Ok(Err(err @ (DiffError::Decode { .. } | DiffError::InvalidThreshold(_)))) => bad_request(err.to_string()),
        Ok(Err(err)) => {
            log::error!("Comparison failed: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(err.to_string())))
        }
        Err(err) => {
            log::error!("Comparison task failed: {:?}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Comparison task failed")),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use tower::ServiceExt;

    fn png_base64(image: &RgbaImage) -> String {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        STANDARD.encode(bytes)
    }

    const TEST_LIMITS: Limits = Limits {
        body_bytes: 1024 * 1024,
        canvas_pixels: 10_000,
    };

    async fn post_compare(body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        post_compare_with(TEST_LIMITS, body).await
    }

    async fn post_compare_with(limits: Limits, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/compare")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app(limits).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_compare_reports_pixel_count() {
        let baseline = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        let mut candidate = baseline.clone();
        candidate.put_pixel(3, 3, Rgba([255, 255, 255, 255]));

        let (status, body) = post_compare(serde_json::json!({
            "baseline": png_base64(&baseline),
            "candidate": format!("data:image/png;base64,{}", png_base64(&candidate)),
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        let data: CompareData = serde_json::from_value(body["data"].clone()).unwrap();
        assert_eq!(data.pixel_count, 1);
        assert_eq!((data.width, data.height), (8, 8));
        assert!(STANDARD.decode(&data.diff).is_ok());
    }

    #[tokio::test]
    async fn test_compare_rejects_malformed_image() {
        let baseline = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));

        let (status, body) = post_compare(serde_json::json!({
            "baseline": png_base64(&baseline),
            "candidate": STANDARD.encode(b"not a png"),
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("candidate"));
    }

    #[tokio::test]
    async fn test_compare_rejects_bad_base64() {
        let (status, _) = post_compare(serde_json::json!({
            "baseline": "***",
            "candidate": "***",
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_compare_rejects_oversized_canvas() {
        // each image is 20 pixels, but together they need a 20x20 canvas
        let wide = RgbaImage::from_pixel(20, 1, Rgba([0, 0, 0, 255]));
        let tall = RgbaImage::from_pixel(1, 20, Rgba([0, 0, 0, 255]));
        let limits = Limits {
            canvas_pixels: 100,
            ..TEST_LIMITS
        };

        let (status, body) = post_compare_with(
            limits,
            serde_json::json!({
                "baseline": png_base64(&wide),
                "candidate": png_base64(&tall),
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("400 pixels exceeds the limit of 100"));

        let (status, _) = post_compare_with(
            Limits {
                canvas_pixels: 400,
                ..TEST_LIMITS
            },
            serde_json::json!({
                "baseline": png_base64(&wide),
                "candidate": png_base64(&tall),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
