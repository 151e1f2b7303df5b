pub mod actuacion;
pub mod alerta;
pub mod auth;
pub mod cases;
pub mod dashboard;
pub mod nota;
pub mod users;
