use crate::config::AppConfig;
use crate::interaction::{self, ViewState, VisualUpdate};
use crate::locale::SV;
use crate::projection::Projection;
use crate::render;
use crate::table::{self, TableQuery};
use crate::types::{Dataset, Municipality};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect},
    routing::get,
    Router,
};
use geo::algorithm::contains::Contains;
use geo::{MultiPolygon, Point, Rect};
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

// Wrapper for RTree indexing of the projected regions.
struct RegionIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for RegionIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

pub struct AppState {
    pub dataset: Dataset,
    // Regions projected into screen space, aligned with the dataset.
    pub screen: Vec<MultiPolygon<f64>>,
    pub tree: RTree<RegionIndex>,
    pub view: Mutex<ViewState>,
    pub config: AppConfig,
}

#[derive(Deserialize)]
pub struct HoverParams {
    x: f64,
    y: f64,
}

#[derive(Serialize)]
pub struct TableResponse {
    pub rows: Vec<TableRow>,
    pub page: usize,
    pub page_count: usize,
    pub info: String,
}

#[derive(Serialize)]
pub struct TableRow {
    pub index: usize,
    pub name: String,
    pub score: Option<&'static str>,
    pub details: Vec<String>,
}

pub async fn start_server(config: AppConfig, dataset: Dataset) -> Result<()> {
    info!("Building screen-space index for {} regions...", dataset.municipalities.len());
    let projection = Projection::from_config(&config.map);
    let screen: Vec<MultiPolygon<f64>> = dataset
        .municipalities
        .iter()
        .map(|m| projection.project_multi_polygon(&m.geometry))
        .collect();

    let tree_items: Vec<RegionIndex> = screen
        .iter()
        .enumerate()
        .map(|(i, geometry)| {
            use geo::bounding_rect::BoundingRect;
            let rect = geometry.bounding_rect().unwrap_or(Rect::new(
                geo::Coord { x: 0.0, y: 0.0 },
                geo::Coord { x: 0.0, y: 0.0 },
            ));
            RegionIndex {
                index: i,
                aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
            }
        })
        .collect();
    let tree = RTree::bulk_load(tree_items);

    let port = config.server.port;
    let output_dir = config.output.dir.clone();
    let state = Arc::new(AppState {
        dataset,
        screen,
        tree,
        view: Mutex::new(ViewState::new()),
        config,
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);

    let app = Router::new()
        .route("/", get(page_handler))
        .route("/api/municipalities", get(table_handler))
        .route("/api/hover", get(hover_handler))
        .route("/kommun/{index}", get(click_handler))
        .fallback_service(ServeDir::new(&output_dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn page_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TableQuery>,
) -> Html<String> {
    let page = table::run_query(
        &state.dataset.municipalities,
        &query,
        state.config.table.page_length,
    );
    Html(render::render_page(&state.config, &state.dataset, &page, &query, &SV))
}

async fn table_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TableQuery>,
) -> Json<TableResponse> {
    let page = table::run_query(
        &state.dataset.municipalities,
        &query,
        state.config.table.page_length,
    );
    let rows = page
        .rows
        .iter()
        .map(|(index, m)| TableRow {
            index: *index,
            name: m.name.clone(),
            score: m.score.map(|s| s.label()),
            details: m.details.clone(),
        })
        .collect();
    let filtered_from = page.is_filtered().then_some(page.total);
    Json(TableResponse {
        rows,
        page: page.page,
        page_count: page.page_count,
        info: SV.info_line(page.start, page.end, page.filtered, filtered_from),
    })
}

/// Screen-space pointer lookup: R-tree candidates first, then an exact
/// point-in-polygon test, then the hover transition.
async fn hover_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HoverParams>,
) -> Json<Vec<VisualUpdate>> {
    let region = hit_test(&state.tree, &state.screen, params.x, params.y);

    let mut view = state.view.lock().expect("hover state poisoned");
    let updates = match region {
        Some(region) => view.pointer_enter(
            region,
            params.x,
            params.y,
            &state.dataset.municipalities,
            &state.config.map,
            &SV,
        ),
        None => view.pointer_leave(&state.dataset.municipalities, &state.config.map),
    };
    tracing::debug!(hovered = ?view.hovered(), updates = updates.len(), "hover lookup");
    Json(updates)
}

fn hit_test(
    tree: &RTree<RegionIndex>,
    screen: &[MultiPolygon<f64>],
    x: f64,
    y: f64,
) -> Option<usize> {
    let point = Point::new(x, y);
    let envelope = AABB::from_point([x, y]);
    tree.locate_in_envelope_intersecting(&envelope)
        .filter_map(|candidate| screen.get(candidate.index).map(|g| (candidate.index, g)))
        .find(|(_, geometry)| geometry.contains(&point))
        .map(|(index, _)| index)
}

/// Click navigation: redirect to the municipality's detail page, derived
/// from its site URL. A municipality without a usable URL gets an inline
/// notice instead of a broken redirect.
async fn click_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> impl IntoResponse {
    let Some(municipality) = state.dataset.municipalities.get(index) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match interaction::navigation_target(
        &state.config.navigation.base_url,
        &municipality.site_url,
    ) {
        Some(target) => Redirect::temporary(&target).into_response(),
        None => (StatusCode::UNPROCESSABLE_ENTITY, SV.bad_site_url).into_response(),
    }
}
