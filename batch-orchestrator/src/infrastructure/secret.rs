use anyhow::{bail, Context};
use async_trait::async_trait;
use domain_batch::service::SecretService;

/// Secrets handed to the process through its environment, e.g. by a vault agent or CI.
#[derive(Default)]
pub struct EnvSecretService;

#[async_trait]
impl SecretService for EnvSecretService {
    async fn get_secret(&self, name: &str) -> anyhow::Result<String> {
        let value =
            std::env::var(name).with_context(|| format!("Secret {name} is not available"))?;
        if value.trim().is_empty() {
            bail!("Secret {name} is empty");
        }
        Ok(value)
    }
}
