pub mod system;
pub mod query;
pub mod entities;
pub mod papers;
