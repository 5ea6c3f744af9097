pub mod extract;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;

pub use response::ApiResponse;
pub use routes::create_router;
pub use state::AppState;
