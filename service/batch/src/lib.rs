mod lifecycle;
mod monitor;
mod provision;
mod report;
mod submit;
mod teardown;

pub use lifecycle::JobLifecycleServiceImpl;
pub use monitor::CompletionMonitorServiceImpl;
pub use provision::ResourceProvisionServiceImpl;
pub use report::ResultReportServiceImpl;
pub use submit::TaskSubmitServiceImpl;
pub use teardown::TeardownServiceImpl;
