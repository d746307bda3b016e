pub mod error;
pub mod tape;
pub mod instruction;
pub mod handler;
pub mod sink;
pub mod machine;
pub mod search;
