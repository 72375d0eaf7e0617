/// Persistence of simulation result sets.
pub mod store;
