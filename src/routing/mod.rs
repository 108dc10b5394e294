//! Request classification and the edge middleware.

pub mod classifier;
pub mod edge;
pub mod matcher;

pub use classifier::{classify, RouteClass};
pub use edge::{edge, Branch, EdgeRouter};
pub use matcher::RouteMatcher;
