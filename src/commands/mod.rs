pub mod build;
pub mod lists;
pub mod pick;
pub mod search;

pub use build::*;
pub use lists::*;
pub use pick::*;
pub use search::*;
