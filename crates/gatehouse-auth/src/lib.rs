//! # gatehouse-auth
//!
//! Bearer-token verification for the Gatehouse gateway.
//!
//! Every authenticated message carries a signed token. Verification:
//! 1. Fetch the RSA key set from the issuer's well-known JWKS endpoint
//!    (bounded timeout, time-bounded cache)
//! 2. Match the token header's `kid` against the set
//! 3. Verify the RS256 signature and the audience claim
//! 4. Return decoded claims (the email claim is used only for logging)
//!
//! Any failure is an [`AuthError`]; the dispatcher treats all of them as a
//! terminal, connection-preserving rejection.

#![deny(unsafe_code)]

pub mod errors;
pub mod jwks;
pub mod verifier;

pub use errors::AuthError;
pub use jwks::{Jwk, JwksClient};
pub use verifier::{Claims, TokenVerifier, TokenVerify};
