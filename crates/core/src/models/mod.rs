pub mod analysis;
pub mod api_info;
pub mod chart;
pub mod dashboard;
pub mod data;
pub mod prediction;
pub mod settings;
