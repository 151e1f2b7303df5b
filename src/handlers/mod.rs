// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (JWT auth) → Elevated (JWT auth + admin)
pub mod public; // /api/auth/login, /api/auth/refresh
pub mod protected; // /api/* for any active user
pub mod elevated; // /api/users for administrators
