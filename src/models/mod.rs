pub mod appointment;
pub mod directory;
pub mod enums;
pub mod page;
pub mod patient;
pub mod staff;
pub mod template;

pub use appointment::*;
pub use directory::*;
pub use enums::*;
pub use page::*;
pub use patient::*;
pub use staff::*;
pub use template::*;
