pub mod handlers;
mod page;
mod router;
mod state;

pub use router::create_router;
pub use state::AppState;
