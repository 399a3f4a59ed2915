pub mod migrate;
pub mod wizard;
