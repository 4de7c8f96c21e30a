use std::fmt;

/// The captured output of one finished task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskReport {
    pub task_id: String,
    pub node_id: String,
    pub output: String,
}

impl fmt::Display for TaskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---------BEGIN---------")?;
        writeln!(f, "Task: {}", self.task_id)?;
        writeln!(f, "Node: {}", self.node_id)?;
        writeln!(f, "Standard out =>")?;
        writeln!(f, "{}", self.output)?;
        write!(f, "----------END----------")
    }
}
