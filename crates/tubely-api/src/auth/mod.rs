//! Bearer-token authentication
//!
//! Tokens are HS256 JWTs minted by the platform's login service with issuer
//! `tubely-access` and the user id as subject. This service only validates them.

pub mod extractors;
pub mod jwt;

pub use extractors::{AuthUser, VideoIdPath};
pub use jwt::{get_bearer_token, make_jwt, validate_jwt, JwtClaims, TOKEN_ISSUER};
