//! Fetch Module
//!
//! Request interception: the network collaborator, the orchestrator that
//! decides between cache and network, and the tagged response it returns.

mod network;
mod orchestrator;
mod response;

pub use network::{HttpNetwork, Network};
pub use orchestrator::{Dispatch, FetchOrchestrator};
pub use response::{FetchResponse, X_CACHE};
