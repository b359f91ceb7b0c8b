//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use cmyk_export::models::AppConfig;
use cmyk_export::server::{build_router, create_app_state_with, AppState};
use cmyk_export::services::ProfileRegistry;

use super::fixtures;
use super::mock_tools::{MockNormalizer, MockPageRenderer, MockRasterizer};

const BOUNDARY: &str = "cmyk-export-test-boundary";

/// Test application with router and direct access to the mock converters
pub struct TestApp {
    router: axum::Router,
    pub state: AppState,
    pub rasterizer: Arc<MockRasterizer>,
    pub normalizer: Arc<MockNormalizer>,
    pub pages: Arc<MockPageRenderer>,
    /// Holds the profile directory alive for the test's duration
    pub profiles_dir: TempDir,
}

impl TestApp {
    /// Create a test application with all profiles present and succeeding
    /// converters
    pub fn new() -> Self {
        Self::build(
            AppConfig::default(),
            true,
            MockRasterizer::succeeding(),
            MockNormalizer::succeeding(),
            default_pages(),
        )
    }

    /// Create a test application with custom converters
    pub fn with_tools(rasterizer: MockRasterizer, normalizer: MockNormalizer) -> Self {
        Self::build(AppConfig::default(), true, rasterizer, normalizer, default_pages())
    }

    /// Create a test application with a custom PDF page renderer
    pub fn with_page_renderer(pages: MockPageRenderer) -> Self {
        Self::build(
            AppConfig::default(),
            true,
            MockRasterizer::succeeding(),
            MockNormalizer::succeeding(),
            pages,
        )
    }

    /// Create a test application whose profile directory is empty
    pub fn without_profiles() -> Self {
        Self::build(
            AppConfig::default(),
            false,
            MockRasterizer::succeeding(),
            MockNormalizer::succeeding(),
            default_pages(),
        )
    }

    /// Create a test application with a custom configuration
    pub fn with_config(config: AppConfig) -> Self {
        Self::build(
            config,
            true,
            MockRasterizer::succeeding(),
            MockNormalizer::succeeding(),
            default_pages(),
        )
    }

    /// Create a test application with a custom configuration and converters
    pub fn with_config_and_tools(
        config: AppConfig,
        rasterizer: MockRasterizer,
        normalizer: MockNormalizer,
    ) -> Self {
        Self::build(config, true, rasterizer, normalizer, default_pages())
    }

    fn build(
        mut config: AppConfig,
        with_profiles: bool,
        rasterizer: MockRasterizer,
        normalizer: MockNormalizer,
        pages: MockPageRenderer,
    ) -> Self {
        let profiles_dir = TempDir::new().expect("Failed to create profile dir");
        if with_profiles {
            fixtures::write_profiles(profiles_dir.path());
        }
        config.profiles_dir = profiles_dir.path().to_path_buf();

        let profiles = Arc::new(ProfileRegistry::load(profiles_dir.path()));
        let rasterizer = Arc::new(rasterizer);
        let normalizer = Arc::new(normalizer);
        let pages = Arc::new(pages);
        let state = create_app_state_with(
            config,
            profiles,
            rasterizer.clone(),
            normalizer.clone(),
            pages.clone(),
        );
        let router = build_router(state.clone());

        Self {
            router,
            state,
            rasterizer,
            normalizer,
            pages,
            profiles_dir,
        }
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// POST a multipart form to `/convert`
    pub async fn convert(&self, form: MultipartBody) -> TestResponse {
        let (content_type, body) = form.finish();
        let request = Request::post("/convert")
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .unwrap();
        self.request(request).await
    }

    /// Send a request to the router
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Every PDF page renders as a 6x4 opaque red image.
fn default_pages() -> MockPageRenderer {
    MockPageRenderer::returning(fixtures::solid_png(6, 4, [255, 0, 0, 255]))
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `multipart/form-data` request bodies
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the file part
    pub fn file(mut self, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Add a text field
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    /// Close the body; returns the `Content-Type` header value and the bytes
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        (
            format!("multipart/form-data; boundary={BOUNDARY}"),
            self.body,
        )
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// All `X-Export-Warning` values, in order
    pub fn warnings(&self) -> Vec<String> {
        self.headers
            .get_all("x-export-warning")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    pub fn is_pdf(&self) -> bool {
        self.body.starts_with(b"%PDF-")
    }

    pub fn is_tiff(&self) -> bool {
        self.body.starts_with(b"II*\0") || self.body.starts_with(b"MM\0*")
    }
}
