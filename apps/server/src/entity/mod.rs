//! SeaORM entities.

pub mod test_case;
pub mod test_result;
pub mod test_run;
