mod app_error;
mod dataset_cache;
mod job_error;
pub mod job_manager;
mod job_registry;
pub mod pipeline;
pub mod route_app;

pub use app_error::AppError;
pub use dataset_cache::DatasetCache;
pub use job_error::JobError;
pub use job_manager::JobManager;
pub use job_registry::JobRegistry;
pub use route_app::RouteApp;
