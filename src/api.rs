//! REST API for the load planner.
//!
//! Exposes the planner engine over HTTP. Uses Axum as the web framework and
//! supports CORS. The engine sits behind a mutex; every request runs a single
//! engine operation to completion while holding it.

use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

use crate::config::ApiConfig;
use crate::engine::{
    AddOutcome, EngineError, ItemEdit, ItemOutcome, ItemReport, PlannerEngine, Recovery, Rotation,
};
use crate::load_plan::LoadStep;
use crate::metrics::{PlanMetrics, WeightDistribution};
use crate::model::{
    CargoItem, Category, Color, ContainerKind, ContainerSpec, ItemId, NewItem,
};
use crate::placement::PlacementOutcome;
use crate::stacking::StackingLevel;
use crate::types::{Axis, Vec3};
use crate::validator::{PlacementFinding, PlacementReport};

/// Shared handle to the planner engine.
#[derive(Clone)]
pub struct ApiState {
    engine: Arc<Mutex<PlannerEngine>>,
}

impl ApiState {
    pub fn new(engine: PlannerEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, PlannerEngine>, Response> {
        self.engine.lock().map_err(|err| {
            error!("❌ Planner engine lock poisoned: {}", err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Planner unavailable",
                "The planner state is poisoned by an earlier failure",
                None,
            )
        })
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>stack-it-now API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
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

/// Body of `PUT /container`: either a catalog key or a full custom spec.
#[derive(Deserialize, Clone, Debug, ToSchema)]
#[schema(example = json!({ "kind": "20ft" }))]
pub struct ContainerRequest {
    #[serde(default)]
    pub kind: Option<ContainerKind>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub max_weight: Option<f64>,
}

impl ContainerRequest {
    fn into_spec(self) -> Result<ContainerSpec, String> {
        if let Some(kind) = self.kind {
            return Ok(kind.spec());
        }
        match (self.length, self.width, self.height, self.max_weight) {
            (Some(length), Some(width), Some(height), Some(max_weight)) => ContainerSpec::custom(
                self.label.unwrap_or_else(|| "Custom".to_string()),
                length,
                width,
                height,
                max_weight,
            )
            .map_err(|err| err.to_string()),
            _ => Err(
                "Either a catalog kind or length, width, height and max_weight are required"
                    .to_string(),
            ),
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, ToSchema)]
#[schema(example = json!({ "axis": "x", "delta": 6.0 }))]
pub struct MoveRequest {
    pub axis: Axis,
    pub delta: f64,
}

#[derive(Deserialize, Clone, Copy, Debug, ToSchema)]
pub struct RotateRequest {
    pub rotation: Rotation,
}

/// Horizontal drag target, minimum corner in inches.
#[derive(Deserialize, Clone, Copy, Debug, ToSchema)]
#[schema(example = json!({ "x": 24.0, "z": 12.0 }))]
pub struct DragRequest {
    pub x: f64,
    pub z: f64,
}

#[derive(Deserialize, Clone, Copy, Debug, ToSchema)]
pub struct VisibilityRequest {
    pub visible: bool,
}

/// Result of switching containers: the new spec and a re-validation of every item.
#[derive(Serialize, ToSchema)]
pub struct ContainerSwitchResponse {
    pub container: ContainerSpec,
    pub validation: Vec<ItemReport>,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<PlacementReport>,
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
    report: Option<PlacementReport>,
) -> Response {
    let body = ErrorResponse {
        error: error.into(),
        details: details.into(),
        report,
    };
    (status, Json(body)).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
        None,
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
        None,
    )
}

fn engine_error(err: EngineError) -> Response {
    match err {
        EngineError::UnknownItem(_) => {
            error_response(StatusCode::NOT_FOUND, "Unknown item", err.to_string(), None)
        }
        EngineError::InvalidInput(_) => validation_error(err.to_string()),
        EngineError::DimensionsExceedContainer { .. } => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Item does not fit",
            err.to_string(),
            None,
        ),
        EngineError::Rejected(ref report) => {
            let report = report.clone();
            error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Placement rejected",
                err.to_string(),
                Some(report),
            )
        }
    }
}

fn parse_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload
        .map(|Json(value)| value)
        .map_err(json_deserialize_error)
}

fn respond<T: Serialize>(result: Result<T, EngineError>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(err) => engine_error(err),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_containers,
        get_container,
        put_container,
        list_items,
        create_item,
        update_item,
        delete_item,
        move_item,
        rotate_item,
        drop_item,
        set_visibility,
        preview_stacking,
        validate_all,
        get_metrics,
        get_load_plan,
        stream_load_plan
    ),
    components(
        schemas(
            ContainerRequest,
            ContainerSwitchResponse,
            ContainerSpec,
            ContainerKind,
            MoveRequest,
            RotateRequest,
            DragRequest,
            VisibilityRequest,
            NewItem,
            ItemEdit,
            CargoItem,
            ItemId,
            Category,
            Color,
            Axis,
            Vec3,
            Rotation,
            Recovery,
            AddOutcome,
            ItemOutcome,
            ItemReport,
            PlacementOutcome,
            PlacementReport,
            PlacementFinding,
            StackingLevel,
            PlanMetrics,
            WeightDistribution,
            LoadStep,
            ErrorResponse
        )
    ),
    tags(
        (name = "container", description = "Container catalog and selection"),
        (name = "items", description = "Item creation, editing and placement"),
        (name = "planning", description = "Validation, metrics and load plans")
    )
)]
struct ApiDoc;

/// Builds the router with all endpoints.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/containers", get(list_containers))
        .route("/container", get(get_container).put(put_container))
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", patch(update_item).delete(delete_item))
        .route("/items/{id}/move", post(move_item))
        .route("/items/{id}/rotate", post(rotate_item))
        .route("/items/{id}/drop", post(drop_item))
        .route("/items/{id}/visibility", post(set_visibility))
        .route("/items/{id}/stacking", post(preview_stacking))
        .route("/validation", get(validate_all))
        .route("/metrics", get(get_metrics))
        .route("/load_plan", get(get_load_plan))
        .route("/load_plan_stream", get(stream_load_plan))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the API server and blocks until it terminates.
pub async fn start_api_server(config: ApiConfig, engine: PlannerEngine) {
    let app = router(ApiState::new(engine));

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("❌ Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    info!(
        "🚀 Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("💡 Local access: http://localhost:{}", config.port());
    }
    info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        error!("❌ API server terminated with an error: {err}");
    }
}

/// Lists the standard container catalog.
#[utoipa::path(
    get,
    path = "/containers",
    responses((status = 200, description = "Catalog containers", body = [ContainerSpec])),
    tag = "container"
)]
async fn list_containers() -> Response {
    let catalog: Vec<ContainerSpec> = ContainerKind::ALL.into_iter().map(ContainerKind::spec).collect();
    Json(catalog).into_response()
}

#[utoipa::path(
    get,
    path = "/container",
    responses(
        (status = 200, description = "Active container", body = ContainerSpec),
        (status = INTERNAL_SERVER_ERROR, description = "Planner unavailable", body = ErrorResponse)
    ),
    tag = "container"
)]
async fn get_container(State(state): State<ApiState>) -> Response {
    match state.lock() {
        Ok(engine) => Json(engine.container().clone()).into_response(),
        Err(response) => response,
    }
}

/// Switches the active container and re-validates all items against it.
#[utoipa::path(
    put,
    path = "/container",
    request_body = ContainerRequest,
    responses(
        (status = 200, description = "Container switched", body = ContainerSwitchResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid container", body = ErrorResponse)
    ),
    tag = "container"
)]
async fn put_container(
    State(state): State<ApiState>,
    payload: Result<Json<ContainerRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let spec = match request.into_spec() {
        Ok(spec) => spec,
        Err(details) => return validation_error(details),
    };

    let mut engine = match state.lock() {
        Ok(engine) => engine,
        Err(response) => return response,
    };
    engine.select_container(spec);
    let response = ContainerSwitchResponse {
        container: engine.container().clone(),
        validation: engine.validate_all(),
    };
    Json(response).into_response()
}

#[utoipa::path(
    get,
    path = "/items",
    responses((status = 200, description = "All items in insertion order", body = [CargoItem])),
    tag = "items"
)]
async fn list_items(State(state): State<ApiState>) -> Response {
    match state.lock() {
        Ok(engine) => Json(engine.items().to_vec()).into_response(),
        Err(response) => response,
    }
}

/// Creates an item and auto-places it.
///
/// The item is kept even when no clean position exists; the response then
/// carries `search.exhausted = true` and the findings of the fallback spot.
#[utoipa::path(
    post,
    path = "/items",
    request_body = NewItem,
    responses(
        (status = 201, description = "Item created", body = AddOutcome),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid or oversized item", body = ErrorResponse)
    ),
    tag = "items"
)]
async fn create_item(
    State(state): State<ApiState>,
    payload: Result<Json<NewItem>, JsonRejection>,
) -> Response {
    let spec = match parse_json(payload) {
        Ok(spec) => spec,
        Err(response) => return response,
    };
    let mut engine = match state.lock() {
        Ok(engine) => engine,
        Err(response) => return response,
    };
    match engine.add_item(spec) {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(err) => engine_error(err),
    }
}

/// Edits label, dimensions, weight, category or colour of an item.
#[utoipa::path(
    patch,
    path = "/items/{id}",
    params(("id" = u64, Path, description = "Item id")),
    request_body = ItemEdit,
    responses(
        (status = 200, description = "Edit accepted", body = ItemOutcome),
        (status = NOT_FOUND, description = "Unknown item", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Edit rejected and reverted", body = ErrorResponse)
    ),
    tag = "items"
)]
async fn update_item(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    payload: Result<Json<ItemEdit>, JsonRejection>,
) -> Response {
    let edit = match parse_json(payload) {
        Ok(edit) => edit,
        Err(response) => return response,
    };
    match state.lock() {
        Ok(mut engine) => respond(engine.edit_item(ItemId(id), edit)),
        Err(response) => response,
    }
}

#[utoipa::path(
    delete,
    path = "/items/{id}",
    params(("id" = u64, Path, description = "Item id")),
    responses(
        (status = 200, description = "Removed item", body = CargoItem),
        (status = NOT_FOUND, description = "Unknown item", body = ErrorResponse)
    ),
    tag = "items"
)]
async fn delete_item(State(state): State<ApiState>, Path(id): Path<u64>) -> Response {
    match state.lock() {
        Ok(mut engine) => respond(engine.remove_item(ItemId(id))),
        Err(response) => response,
    }
}

/// Moves an item along one axis; the new coordinate is snapped to the grid.
#[utoipa::path(
    post,
    path = "/items/{id}/move",
    params(("id" = u64, Path, description = "Item id")),
    request_body = MoveRequest,
    responses(
        (status = 200, description = "Move accepted", body = ItemOutcome),
        (status = NOT_FOUND, description = "Unknown item", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Move rejected and reverted", body = ErrorResponse)
    ),
    tag = "items"
)]
async fn move_item(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match state.lock() {
        Ok(mut engine) => respond(engine.move_item(ItemId(id), request.axis, request.delta)),
        Err(response) => response,
    }
}

#[utoipa::path(
    post,
    path = "/items/{id}/rotate",
    params(("id" = u64, Path, description = "Item id")),
    request_body = RotateRequest,
    responses(
        (status = 200, description = "Rotation accepted", body = ItemOutcome),
        (status = NOT_FOUND, description = "Unknown item", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "No valid spot for the new orientation", body = ErrorResponse)
    ),
    tag = "items"
)]
async fn rotate_item(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    payload: Result<Json<RotateRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match state.lock() {
        Ok(mut engine) => respond(engine.rotate_item(ItemId(id), request.rotation)),
        Err(response) => response,
    }
}

/// Ends a drag: places the item at X/Z on the highest surface beneath it.
#[utoipa::path(
    post,
    path = "/items/{id}/drop",
    params(("id" = u64, Path, description = "Item id")),
    request_body = DragRequest,
    responses(
        (status = 200, description = "Drop accepted", body = ItemOutcome),
        (status = NOT_FOUND, description = "Unknown item", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Drop rejected and reverted", body = ErrorResponse)
    ),
    tag = "items"
)]
async fn drop_item(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    payload: Result<Json<DragRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match state.lock() {
        Ok(mut engine) => respond(engine.drop_item(ItemId(id), request.x, request.z)),
        Err(response) => response,
    }
}

#[utoipa::path(
    post,
    path = "/items/{id}/visibility",
    params(("id" = u64, Path, description = "Item id")),
    request_body = VisibilityRequest,
    responses(
        (status = 200, description = "Updated item", body = CargoItem),
        (status = NOT_FOUND, description = "Unknown item", body = ErrorResponse)
    ),
    tag = "items"
)]
async fn set_visibility(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    payload: Result<Json<VisibilityRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let mut engine = match state.lock() {
        Ok(engine) => engine,
        Err(response) => return response,
    };
    let id = ItemId(id);
    let result = engine
        .set_visibility(id, request.visible)
        .and_then(|()| engine.item(id).cloned().ok_or(EngineError::UnknownItem(id)));
    respond(result)
}

/// Landing height for an item dragged to X/Z. Does not change any state.
#[utoipa::path(
    post,
    path = "/items/{id}/stacking",
    params(("id" = u64, Path, description = "Item id")),
    request_body = DragRequest,
    responses(
        (status = 200, description = "Landing level", body = StackingLevel),
        (status = NOT_FOUND, description = "Unknown item", body = ErrorResponse)
    ),
    tag = "items"
)]
async fn preview_stacking(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    payload: Result<Json<DragRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match state.lock() {
        Ok(engine) => respond(engine.preview_stacking(ItemId(id), request.x, request.z)),
        Err(response) => response,
    }
}

#[utoipa::path(
    get,
    path = "/validation",
    responses((status = 200, description = "Validation of every item", body = [ItemReport])),
    tag = "planning"
)]
async fn validate_all(State(state): State<ApiState>) -> Response {
    match state.lock() {
        Ok(engine) => Json(engine.validate_all()).into_response(),
        Err(response) => response,
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    responses((status = 200, description = "Utilization, weight and balance", body = PlanMetrics)),
    tag = "planning"
)]
async fn get_metrics(State(state): State<ApiState>) -> Response {
    match state.lock() {
        Ok(engine) => Json(engine.metrics()).into_response(),
        Err(response) => response,
    }
}

#[utoipa::path(
    get,
    path = "/load_plan",
    responses((status = 200, description = "Ordered loading instructions", body = [LoadStep])),
    tag = "planning"
)]
async fn get_load_plan(State(state): State<ApiState>) -> Response {
    match state.lock() {
        Ok(engine) => Json(engine.load_plan()).into_response(),
        Err(response) => response,
    }
}

/// Streams the load plan as Server-Sent Events: one `step` event per load
/// step, then a `done` event carrying the step count.
#[utoipa::path(
    get,
    path = "/load_plan_stream",
    responses(
        (
            status = 200,
            description = "Streams load steps",
            content_type = "text/event-stream",
            body = String
        )
    ),
    tag = "planning"
)]
async fn stream_load_plan(State(state): State<ApiState>) -> Response {
    let steps = match state.lock() {
        Ok(engine) => engine.load_plan(),
        Err(response) => return response,
    };

    let total = steps.len();
    let events = steps
        .into_iter()
        .map(|step| match Event::default().event("step").json_data(step) {
            Ok(event) => event,
            Err(err) => Event::default().event("error").data(err.to_string()),
        })
        .chain(std::iter::once(
            Event::default().event("done").data(total.to_string()),
        ))
        .map(Ok::<_, Infallible>);

    Sse::new(tokio_stream::iter(events))
        .keep_alive(KeepAlive::default())
        .into_response()
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
