pub mod handlers;
pub mod routes;

pub use handlers::ErrorResponse;
pub use routes::create_api_router;
