pub mod chart_service;
pub mod connectivity_service;
pub mod format_service;
pub mod text_service;
