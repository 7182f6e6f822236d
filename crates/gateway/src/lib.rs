pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod serialization;
pub mod state;

pub use config::{Config, ResponseFormat, ServerConfig, get_configuration};
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
