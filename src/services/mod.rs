pub mod bootstrap;
pub mod dashboard;

pub use bootstrap::ensure_admin;
pub use dashboard::{dashboard, Dashboard, DashboardStats};
