pub mod selection;
pub mod flow;
pub mod circuit_breaker;
