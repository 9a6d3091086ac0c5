pub mod fmt;
pub mod sub_tabs;
