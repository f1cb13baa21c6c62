pub mod analysis_store;
pub mod dashboard_store;
pub mod data_store;
pub mod operation;
pub mod predictions_store;
