use std::time::Instant;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Local;
use domain_batch::{
    model::vo::{TaskReport, TeardownDecision},
    service::OperatorService,
};
use tokio::{
    io::{
        self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
    },
    sync::Mutex,
};

/// Interactive operator on a terminal, or on any reader/writer pair.
pub struct ConsoleOperator<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
    /// Start of the run, for the timing printed after the task output.
    started: Instant,
}

impl ConsoleOperator<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> ConsoleOperator<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            started: Instant::now(),
        }
    }

    /// Writes `text` and flushes it.
    pub async fn say(&self, text: &str) -> anyhow::Result<()> {
        let mut output = self.output.lock().await;
        output.write_all(text.as_bytes()).await?;
        output.flush().await?;
        Ok(())
    }

    /// Prints `prompt` and reads one line. End of input reads as an empty answer.
    async fn ask(&self, prompt: &str) -> anyhow::Result<String> {
        self.say(prompt).await?;
        let mut answer = String::new();
        self.input
            .lock()
            .await
            .read_line(&mut answer)
            .await
            .context("Unable to read the answer from the console")?;
        Ok(answer)
    }

    pub async fn wait_for_exit(&self) -> anyhow::Result<()> {
        self.ask("\nSample complete, hit ENTER to exit...\n").await?;
        Ok(())
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output.into_inner()
    }
}

#[async_trait]
impl<R, W> OperatorService for ConsoleOperator<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn present_reports(&self, reports: &[TaskReport]) -> anyhow::Result<()> {
        let mut text = String::from("\nPrinting task output...\n");
        for report in reports {
            text.push_str(&format!("{report}\n"));
        }
        text.push_str(&format!("\nSample end: {}\n", Local::now()));
        text.push_str(&format!("Elapsed time: {:?}\n", self.started.elapsed()));
        self.say(&text).await
    }

    async fn decide_teardown(&self, _job_id: &str, _pool_id: &str) -> anyhow::Result<TeardownDecision> {
        self.say("\n").await?;
        let delete_job = TeardownDecision::confirmed(&self.ask("Delete job? [yes] no: ").await?);
        let delete_pool = TeardownDecision::confirmed(&self.ask("Delete pool? [yes] no: ").await?);
        Ok(TeardownDecision {
            delete_job,
            delete_pool,
        })
    }
}
