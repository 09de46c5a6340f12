//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod history;
mod ingest;
mod list;
mod serve;
mod user;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use history::run_history;
pub use ingest::run_ingest;
pub use list::run_list;
pub use serve::run_serve;
pub use user::run_user;
