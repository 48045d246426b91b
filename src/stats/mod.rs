pub mod bulk;
pub mod guard;
pub mod league;
pub mod parser;
pub mod pipeline;
