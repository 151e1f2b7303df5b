// handlers/elevated/mod.rs - Administrator-only handlers
//
// Route Prefix: /api/users
// Middleware: jwt_auth_middleware + require_admin
pub mod users;
