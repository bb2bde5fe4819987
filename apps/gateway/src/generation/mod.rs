// Course generation: request types and the rate-limited, retried service that
// turns backend payloads into normalized domain objects.
// All backend calls go through gateway::RequestGateway; no direct HTTP here.

pub mod requests;
pub mod service;

pub use service::CourseGateway;
