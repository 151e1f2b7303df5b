// handlers/protected/mod.rs - Handlers for any authenticated, active user
//
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware (inserts AuthUser)

pub mod actuaciones;
pub mod alertas;
pub mod auth;
pub mod cases;
pub mod dashboard;
pub mod notas;

use crate::database::Store;
use crate::error::ApiError;

/// A record body naming a case that does not exist is a field error, not a 404
pub(crate) async fn ensure_case_field(store: &dyn Store, caso: i64) -> Result<(), ApiError> {
    match store.case_by_id(caso).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::field_error(
            "caso",
            format!("Invalid pk \"{}\" - object does not exist.", caso),
        )),
    }
}
