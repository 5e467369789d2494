pub mod error;
pub mod macro_types;
pub mod traits;
pub mod types;

pub use error::*;
pub use macro_types::*;
pub use traits::*;
pub use types::*;
