/// Which resources to delete once the job has been reported.
///
/// Both default to delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeardownDecision {
    pub delete_job: bool,
    pub delete_pool: bool,
}

impl Default for TeardownDecision {
    fn default() -> Self {
        Self {
            delete_job: true,
            delete_pool: true,
        }
    }
}

impl TeardownDecision {
    /// Reads a `[yes] no` answer: only `n` or `no`, in any case, declines.
    pub fn confirmed(answer: &str) -> bool {
        let answer = answer.trim().to_lowercase();
        answer != "n" && answer != "no"
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TeardownOutcome {
    pub job_deleted: bool,
    pub pool_deleted: bool,
}
