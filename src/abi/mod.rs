pub mod decoder;
pub mod interface;
pub mod registry;
pub mod render;

pub use decoder::{AbiDecoder, EventArgument, EventArguments};
pub use interface::{ContractInterface, EventDefinition, EventInput};
pub use registry::ContractRegistry;
