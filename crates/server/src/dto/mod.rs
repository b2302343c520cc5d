mod feed;
mod route;
mod stop;

pub use feed::*;
pub use route::*;
pub use stop::*;
