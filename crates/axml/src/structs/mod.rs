pub(crate) mod common;
pub(crate) mod res_string_pool;
pub mod res_table_config;
pub(crate) mod resource_table;
pub(crate) mod xml_elements;

pub(crate) use common::*;
pub(crate) use res_string_pool::*;
pub use res_table_config::*;
pub(crate) use resource_table::*;
pub(crate) use xml_elements::*;
