pub mod bindings;
pub mod picker;
