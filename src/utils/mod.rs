pub mod auth;
pub mod ident;
pub mod validation;
