pub mod analysis;
pub mod assembler;
pub mod dates;
pub mod executor;
pub mod prompts;
pub mod schema;
