//! Little-endian integer encoding helpers shared by the page-layout and
//! record code.

pub mod bin_error;
pub mod le;
