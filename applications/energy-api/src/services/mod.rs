mod chart;
mod device;
mod logs;
mod summary;

pub use chart::ChartService;
pub use device::DeviceService;
pub use logs::LogService;
pub use summary::SummaryService;
