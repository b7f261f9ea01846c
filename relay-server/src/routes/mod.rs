pub mod callback;
pub mod health;
pub mod login;
pub mod status;
