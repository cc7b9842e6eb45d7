/// Middleware and request extractors
///
/// - `security`: security headers on every response
/// - `session`: session cookie extractor and cookie builders

pub mod security;
pub mod session;
