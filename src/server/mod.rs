mod handlers;
mod models;
mod process;
mod state;

pub use handlers::{router, run_server};
pub use state::ServerState;
