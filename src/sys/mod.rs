pub mod navigate;
pub mod runtime;
