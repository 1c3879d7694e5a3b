pub mod entity;
pub mod result;
pub mod sentiment;
pub mod soap;
pub mod summary;
pub mod utterance;

pub use entity::*;
pub use result::*;
pub use sentiment::*;
pub use soap::*;
pub use summary::*;
pub use utterance::*;
