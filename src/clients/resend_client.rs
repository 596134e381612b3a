use serde::{Deserialize, Serialize};

const RESEND_EMAILS_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

/// Sends one email through Resend and returns the provider's message id.
pub async fn send_resend_email(
    client: &reqwest::Client,
    api_key: &str,
    from: &str,
    to: &str,
    subject: &str,
    html: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let request = ResendRequest {
        from,
        to: vec![to],
        subject,
        html,
    };

    let response = client
        .post(RESEND_EMAILS_URL)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(format!("Resend request failed with status {}: {}", status, text).into());
    }

    let parsed: ResendResponse = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse Resend response: {}\nRaw body: {}", e, text))?;
    Ok(parsed.id)
}
