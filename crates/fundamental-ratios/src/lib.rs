pub mod engine;
pub mod formatter;
pub mod screen;
pub mod valuation;


pub use engine::*;
pub use formatter::*;
pub use screen::*;
pub use valuation::*;
