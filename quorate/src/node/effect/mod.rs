use super::*;

pub mod commit;
