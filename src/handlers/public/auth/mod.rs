pub mod login;
pub mod refresh;

pub use login::login;
pub use refresh::refresh;
