pub mod audit;
pub mod claims;
pub mod decision;
pub mod extractor;
pub mod factory;
pub mod gate;
pub mod rejection;
pub mod signature;
pub mod validator;

pub use factory::build_gate;
pub use gate::AuthorizerGate;
