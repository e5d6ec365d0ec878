//! REST API for the packing service.
//!
//! Provides HTTP endpoints for packing requests and catalog lookups.
//! Uses Axum as the web framework and supports CORS.

use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::catalog::{Catalog, CatalogProduct, ensure_unique_ids};
use crate::config::{ApiConfig, PackingSettings};
use crate::model::{PackedProduct, PackingAssignment, PackingBox, Product, ValidationError};
use crate::packer::{PackingResult, pack_with_config};
use crate::selection::{Selection, SelectionError, SelectionLine, enforce_unit_cap};

#[derive(Clone)]
struct ApiState {
    catalog: Arc<Catalog>,
    settings: PackingSettings,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>pack-it-now API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request structure for the packing endpoint.
///
/// `boxes` replaces the configured box catalog for this request only.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "products": [
            {
                "id": 5,
                "name": "Phone Charger",
                "length": 8.0,
                "width": 6.0,
                "height": 3.0,
                "weight": 0.2,
                "quantity": 3
            }
        ]
    })
)]
pub struct PackRequest {
    pub products: Vec<Product>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub boxes: Option<Vec<PackingBox>>,
}

/// Request structure for packing catalog products by id.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "items": [
            { "product_id": 5, "quantity": 4 },
            { "product_id": 37, "quantity": 1 }
        ]
    })
)]
pub struct SelectionPackRequest {
    pub items: Vec<SelectionLine>,
}

#[derive(Debug)]
struct ValidatedPackRequest {
    products: Vec<Product>,
    boxes: Option<Vec<PackingBox>>,
}

#[derive(Debug)]
enum PackRequestValidationError {
    InvalidProduct(ValidationError),
    InvalidBox(ValidationError),
    Selection(SelectionError),
}

impl PackRequest {
    fn into_validated(
        self,
        max_units: u32,
    ) -> Result<ValidatedPackRequest, PackRequestValidationError> {
        for product in &self.products {
            product
                .validate()
                .map_err(PackRequestValidationError::InvalidProduct)?;
        }
        ensure_unique_ids(self.products.iter().map(|p| p.id))
            .map_err(PackRequestValidationError::InvalidProduct)?;
        enforce_unit_cap(&self.products, max_units)
            .map_err(PackRequestValidationError::Selection)?;

        if let Some(boxes) = &self.boxes {
            for packing_box in boxes {
                packing_box
                    .validate()
                    .map_err(PackRequestValidationError::InvalidBox)?;
            }
            ensure_unique_ids(boxes.iter().map(|b| b.id))
                .map_err(PackRequestValidationError::InvalidBox)?;
        }

        Ok(ValidatedPackRequest {
            products: self.products,
            boxes: self.boxes,
        })
    }
}

impl SelectionPackRequest {
    fn into_products(
        self,
        catalog: &Catalog,
        max_units: u32,
    ) -> Result<Vec<Product>, PackRequestValidationError> {
        let mut selection = Selection::new(max_units);
        for item in self.items {
            selection
                .add(item.product_id, item.quantity)
                .map_err(PackRequestValidationError::Selection)?;
        }
        selection
            .resolve(catalog)
            .map_err(PackRequestValidationError::Selection)
    }
}

/// Response structure of a packing run.
///
/// Exactly one of `assignments` (non-empty for non-empty requests) and
/// `error` carries information.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct PackResponse {
    pub assignments: Vec<PackingAssignment>,
    #[schema(nullable = true)]
    pub error: Option<String>,
    #[schema(nullable = true)]
    pub error_code: Option<String>,
    pub box_count: usize,
    pub packed_units: u32,
}

impl PackResponse {
    /// Creates a PackResponse from a PackingResult.
    pub fn from_packing_result(result: PackingResult) -> Self {
        let box_count = result.box_count();
        let packed_units = result.packed_units();
        let error_code = result.error.as_ref().map(|err| err.code().to_string());
        let error = result.error_message();

        Self {
            assignments: result.assignments,
            error,
            error_code,
            box_count,
            packed_units,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.body_text(),
    )
}

fn validation_error(err: PackRequestValidationError) -> Response {
    let (error, details) = match err {
        PackRequestValidationError::InvalidProduct(err) => ("Invalid product data", err.to_string()),
        PackRequestValidationError::InvalidBox(err) => ("Invalid box configuration", err.to_string()),
        PackRequestValidationError::Selection(err) => ("Invalid product selection", err.to_string()),
    };
    warn!(%details, "{error}");
    error_response(StatusCode::UNPROCESSABLE_ENTITY, error, details)
}

fn run_pack(state: &ApiState, products: Vec<Product>, boxes: Option<Vec<PackingBox>>) -> Response {
    let boxes = boxes.unwrap_or_else(|| state.catalog.boxes().to_vec());
    let units: u32 = products.iter().map(|p| p.quantity).sum();
    info!(
        products = products.len(),
        units,
        box_types = boxes.len(),
        "new pack request"
    );

    let result = pack_with_config(&products, &boxes, state.settings.packing_config());
    match &result.error {
        Some(err) => info!(
            code = err.code(),
            products = ?err.product_names(),
            "packing rejected: {err}"
        ),
        None => info!(
            boxes = result.box_count(),
            volume = result.total_volume(),
            weight = result.total_weight(),
            "packing finished"
        ),
    }

    let response = PackResponse::from_packing_result(result);
    (StatusCode::OK, Json(response)).into_response()
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_pack_selection, list_products, list_boxes),
    components(
        schemas(
            PackRequest,
            SelectionPackRequest,
            SelectionLine,
            PackResponse,
            PackingAssignment,
            PackedProduct,
            Product,
            PackingBox,
            CatalogProduct,
            ErrorResponse
        )
    ),
    tags(
        (name = "packing", description = "Endpoints for box packing"),
        (name = "catalog", description = "Available products and boxes")
    )
)]
struct ApiDoc;

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        // API endpoints
        .route("/pack", post(handle_pack))
        .route("/pack/selection", post(handle_pack_selection))
        .route("/catalog/products", get(list_products))
        .route("/catalog/boxes", get(list_boxes))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the API server and blocks until it terminates.
pub async fn start_api_server(
    config: ApiConfig,
    settings: PackingSettings,
    catalog: Catalog,
) -> std::io::Result<()> {
    let state = ApiState {
        catalog: Arc::new(catalog),
        settings,
    };
    let app = router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        "server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("local access: http://localhost:{}", config.port());
    }
    info!("endpoints: POST /pack, POST /pack/selection, GET /catalog/products, GET /catalog/boxes");
    info!("documentation: GET /docs, GET /docs/openapi.json");

    axum::serve(listener, app).await
}

/// Handler for POST /pack endpoint.
///
/// Packs the given products into the request's boxes or the box catalog.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Packing result, possibly with an infeasibility error", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request, products or boxes",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    match payload.into_validated(state.settings.max_units()) {
        Ok(request) => run_pack(&state, request.products, request.boxes),
        Err(err) => validation_error(err),
    }
}

/// Handler for POST /pack/selection endpoint.
///
/// Resolves catalog product ids and packs them into the box catalog.
#[utoipa::path(
    post,
    path = "/pack/selection",
    request_body = SelectionPackRequest,
    responses(
        (status = 200, description = "Packing result, possibly with an infeasibility error", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Unknown product, zero quantity or too many units",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack_selection(
    State(state): State<ApiState>,
    payload: Result<Json<SelectionPackRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    match payload.into_products(&state.catalog, state.settings.max_units()) {
        Ok(products) => run_pack(&state, products, None),
        Err(err) => validation_error(err),
    }
}

/// Handler for GET /catalog/products.
#[utoipa::path(
    get,
    path = "/catalog/products",
    responses((status = 200, description = "Product catalog", body = [CatalogProduct])),
    tag = "catalog"
)]
async fn list_products(State(state): State<ApiState>) -> Json<Vec<CatalogProduct>> {
    Json(state.catalog.products().to_vec())
}

/// Handler for GET /catalog/boxes.
#[utoipa::path(
    get,
    path = "/catalog/boxes",
    responses((status = 200, description = "Box catalog", body = [PackingBox])),
    tag = "catalog"
)]
async fn list_boxes(State(state): State<ApiState>) -> Json<Vec<PackingBox>> {
    Json(state.catalog.boxes().to_vec())
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
