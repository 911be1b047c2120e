use axum::extract::State;
use axum::response::Html;

use crate::server::page::{self, PageView};
use crate::server::state::AppState;

pub async fn home_handler(State(state): State<AppState>) -> Html<String> {
    Html(page::render(&PageView {
        default_column: &state.settings.batch.default_column,
        ..Default::default()
    }))
}
