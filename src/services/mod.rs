pub mod chart_service;
pub mod fragment_service;
pub mod plot_service;
