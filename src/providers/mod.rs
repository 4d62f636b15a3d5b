pub mod rentcast;
pub mod util;
