//! Request and Response models
//!
//! Intercepted requests and cached payloads, plus the DTOs serialized by the
//! informational HTTP endpoints.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{FetchQuery, FetchRequest, RequestKey};
pub use responses::{GenerationResponse, HealthResponse, ResponsePayload, StatsResponse};
