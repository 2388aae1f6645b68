// handlers/mod.rs - Handler tiers
//
// Public (no auth) -> Protected (JWT auth + rate limits)
pub mod protected; // JWT authentication required (/api/*)
pub mod public; // No authentication required (/health)

pub use public::health;
