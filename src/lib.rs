pub mod aligner;
pub mod dam;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod quantity;
pub mod water;
