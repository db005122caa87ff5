pub mod bridge;
pub mod bytecode;
pub mod lex;
pub mod parse;
pub mod script;
pub mod shim;
pub mod value;
pub mod vm;

pub use bridge::{Session, SessionConfig};
pub use script::Greeting;
pub use value::Value;
