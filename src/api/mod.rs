pub mod convert;
pub mod health;

use utoipa::OpenApi;

pub use convert::{handle_convert, ConvertForm, WARNING_HEADER, __path_handle_convert};
pub use health::{handle_health, HealthResponse, __path_handle_health};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CMYK Export API",
        description = "Print-ready CMYK PDF and TIFF export for raster, SVG and PDF uploads",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(handle_convert, handle_health),
    components(schemas(ConvertForm, HealthResponse, crate::error::ErrorResponse)),
    tags(
        (name = "Export", description = "Document conversion"),
        (name = "Health", description = "Service status")
    )
)]
pub struct ApiDoc;
