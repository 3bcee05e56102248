pub(crate) mod arsc;
pub(crate) mod axml;
pub(crate) mod extract;
pub(crate) mod path_helpers;
pub(crate) mod show;

pub(crate) use arsc::command_arsc;
pub(crate) use axml::command_axml;
pub(crate) use extract::command_extract;
pub(crate) use show::command_show;
