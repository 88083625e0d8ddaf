pub mod highlight;
pub mod models;
pub mod transcribe;

pub use highlight::*;
pub use models::*;
pub use transcribe::*;
