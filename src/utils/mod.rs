pub mod auth;
pub mod clock;
pub mod hash;
pub mod validation;
