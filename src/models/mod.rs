pub mod audit;
pub mod calculation;
pub mod drug;
pub mod enums;
pub mod patient;
pub mod profile;

pub use audit::*;
pub use calculation::*;
pub use drug::*;
pub use enums::*;
pub use patient::*;
pub use profile::*;
