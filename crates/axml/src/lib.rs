pub mod arsc;
pub mod axml;
pub mod errors;
pub mod resource_id;
pub mod structs;
pub mod values;

pub use arsc::{ArscTable, Value};
pub use axml::AxmlDocument;
pub use errors::{ArscError, AxmlError};
pub use resource_id::ResourceId;
pub use structs::res_table_config::ResTableConfig;
pub use values::{Bool, Int32, Str};
