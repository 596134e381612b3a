use crate::clients::openai_client;
use serenity::async_trait;

#[async_trait]
pub trait OpenAIClient: Send + Sync {
    async fn generate_prompt(
        &self,
        prompt: &str,
        prompt_type: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

pub struct OpenAIService {
    api_key: String,
    timezone: String,
    http: reqwest::Client,
}

impl OpenAIService {
    pub fn new(api_key: String, timezone: String) -> Self {
        Self {
            api_key,
            timezone,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl OpenAIClient for OpenAIService {
    async fn generate_prompt(
        &self,
        prompt: &str,
        prompt_type: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        openai_client::generate_openai_prompt(
            &self.http,
            prompt,
            prompt_type,
            &self.timezone,
            &self.api_key,
        )
        .await
    }
}
