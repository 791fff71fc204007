pub mod directory;
pub mod report;
pub mod resource;
pub mod time;

pub use directory::*;
pub use report::*;
pub use resource::*;
pub use time::*;
