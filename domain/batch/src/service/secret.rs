use async_trait::async_trait;

#[async_trait]
pub trait SecretService: Send + Sync {
    /// Resolves a secret by name. Errors when it is unset or empty.
    async fn get_secret(&self, name: &str) -> anyhow::Result<String>;
}
