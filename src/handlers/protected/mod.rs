// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every handler here runs behind the global rate limit and the JWT gate, and
// reads the caller from the `AuthUser` extension the gate inserts.
pub mod tasks;
