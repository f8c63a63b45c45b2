//! HTTP API handlers for ctseg-ui

pub mod catalog;
pub mod compare;
pub mod health;
pub mod slice;
pub mod ui;

pub use catalog::{collection_tree, recent_comparison_history, runs_for_base_image};
pub use compare::run_comparison;
pub use health::health_routes;
pub use slice::get_slice;
pub use ui::{serve_app_js, serve_index};
