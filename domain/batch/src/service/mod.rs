mod compute;
mod lifecycle;
mod monitor;
mod operator;
mod provision;
mod report;
mod secret;
mod submit;
mod teardown;

#[rustfmt::skip]
pub use self::{
    compute::ComputeService,
    lifecycle::JobLifecycleService,
    monitor::CompletionMonitorService,
    operator::OperatorService,
    provision::ResourceProvisionService,
    report::ResultReportService,
    secret::SecretService,
    submit::TaskSubmitService,
    teardown::TeardownService,
};
