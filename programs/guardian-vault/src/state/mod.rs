pub mod guardian;
pub mod registry;
pub mod vault;

pub use guardian::*;
pub use registry::*;
pub use vault::*;
