//! Admission Filter
//!
//! Decides whether a network response may be written to the cache.

use axum::http::{Method, StatusCode};

use crate::models::{FetchRequest, ResponsePayload};

// == Origin Pattern ==
/// A URL matcher for origins whose responses may be cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPattern {
    /// URL contains the string anywhere
    Substring(String),
    /// URL starts with the string
    Prefix(String),
}

impl OriginPattern {
    pub fn matches(&self, url: &str) -> bool {
        match self {
            OriginPattern::Substring(s) => url.contains(s.as_str()),
            OriginPattern::Prefix(s) => url.starts_with(s.as_str()),
        }
    }
}

// == Admission Trait ==
/// Predicate over a (request, response) pair deciding cache eligibility.
///
/// Implementations must be pure: no I/O and no side effects on the cache.
pub trait Admission: Send + Sync {
    fn is_cacheable(&self, request: &FetchRequest, response: &ResponsePayload) -> bool;
}

// == Admission Filter ==
/// Admits exact `200 OK` responses to `GET` requests whose URL matches at
/// least one configured pattern.
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    patterns: Vec<OriginPattern>,
}

impl AdmissionFilter {
    pub fn new(patterns: Vec<OriginPattern>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[OriginPattern] {
        &self.patterns
    }
}

impl Admission for AdmissionFilter {
    fn is_cacheable(&self, request: &FetchRequest, response: &ResponsePayload) -> bool {
        response.status == StatusCode::OK
            && request.method == Method::GET
            && self
                .patterns
                .iter()
                .any(|pattern| pattern.matches(request.url.as_str()))
    }
}
