pub mod controller;
pub mod draft;
pub mod error;
pub mod gallery;
pub mod incident;
pub mod map;
pub mod types;
pub mod upload;

pub use controller::*;
pub use draft::*;
pub use error::*;
pub use gallery::*;
pub use incident::*;
pub use map::*;
pub use types::*;
pub use upload::*;
