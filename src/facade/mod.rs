pub mod client;
pub mod dashboard;
pub mod view;

pub use client::{SyncClient, SyncOptions};
pub use dashboard::{DashboardStats, DashboardView};
pub use view::EntityView;
