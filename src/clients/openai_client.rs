use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

pub async fn generate_openai_prompt(
    client: &reqwest::Client,
    prompt: &str,
    prompt_type: &str,
    timezone: &str,
    api_key: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let now: DateTime<Utc> = Utc::now();

    let full_prompt = match prompt_type {
        "event_time" => format!(
            "You are a date extraction engine for a calendar bot.\n\
             Current date and time (UTC): {now}\n\
             User timezone: {timezone}\n\
             Task: Read the date or time phrase below and resolve it to a single concrete datetime.\n\
             Rules:\n\
             - If the user gives an explicit date like \"December 6th\" without a time, use noon in the user's timezone.\n\
             - If the year is omitted, assume the next occurrence of that date on or after the current date.\n\
             - Relative phrases (\"in two weeks\", \"tomorrow at 3pm\") are computed from the current date and time.\n\
             - \"Saturday\" or \"this Saturday\" means the next occurrence on or after today; \"next Saturday\" means at least 7 days after today.\n\
             - If the phrase does not describe a date or time, return null for \"time\".\n\
             - Output ONLY raw JSON, no prose, markdown, or code fences.\n\
             - The JSON shape must be exactly:\n\
             {{\"time\":\"<RFC3339 datetime>\"|null}}\n\
             User phrase: \"{user_prompt}\"",
            now = now.to_rfc3339(),
            timezone = timezone,
            user_prompt = prompt
        ),
        _ => return Err(format!("unknown prompt type {prompt_type}").into()),
    };

    query_openai(client, full_prompt, api_key).await
}

async fn query_openai(
    client: &reqwest::Client,
    prompt: String,
    api_key: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let request = OpenAIRequest {
        model: "gpt-4o-mini".to_string(),
        messages: vec![
            OpenAIMessage {
                role: "system".to_string(),
                content: "You are a strict JSON date extraction engine. Reply ONLY with a single JSON object, with no markdown, no backticks, and no extra text.".to_string(),
            },
            OpenAIMessage {
                role: "user".to_string(),
                content: prompt,
            },
        ],
        max_tokens: 200,
        temperature: 0.0,
    };

    let response = client
        .post("https://api.openai.com/v1/chat/completions")
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        error!(%status, body = %text, "openai request failed");
        return Err(format!("Request failed with status {status}").into());
    }

    let parsed: OpenAIResponse = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse JSON: {e}\nRaw body: {text}"))?;

    match parsed.choices.first() {
        Some(choice) => {
            debug!(content = %choice.message.content, "openai response");
            Ok(choice.message.content.clone())
        }
        None => Err("No response from OpenAI".to_string().into()),
    }
}
