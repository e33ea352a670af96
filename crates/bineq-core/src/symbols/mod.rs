pub mod classify;
pub mod demangle;
pub mod model;
