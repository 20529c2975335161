pub mod expand;
pub mod tokenize;
pub mod types;

pub use expand::expand;
pub use tokenize::tokenize;
pub use types::Invocation;
