pub mod dispatcher;
pub mod routes;

pub use dispatcher::{Dispatcher, ForwardContext, UpstreamError};
pub use routes::{RouteError, RouteMatch, RouteTable, UpstreamRoute};
