pub mod completion;
pub mod lifecycle;
pub mod provision;
pub mod report;
pub mod settings;
pub mod task_template;
pub mod teardown;

#[rustfmt::skip]
pub use {
    completion::{CompletionEvent, WaitOutcome, WaitRequest},
    lifecycle::{LifecyclePlan, LifecycleSummary},
    provision::Provisioned,
    report::TaskReport,
    settings::{FailurePolicy, OrchestrationSettings, PollPolicy},
    task_template::TaskTemplate,
    teardown::{TeardownDecision, TeardownOutcome},
};
