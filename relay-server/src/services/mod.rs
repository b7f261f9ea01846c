pub mod issuer;
pub mod reporter;
pub mod verifier;
