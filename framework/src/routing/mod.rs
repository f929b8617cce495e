mod router;

pub use router::{BoxedHandler, RouteBuilder, Router};
