use tera::{Context, Tera};

use crate::models::verification::CODE_TTL_MINUTES;

pub const LINK_EMAIL_SUBJECT: &str = "Your Picnic Bot One Time Password";

const LINK_EMAIL_TEMPLATE: &str = r#"<div style="font-family: 'Segoe UI', Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 30px; background-color: #f9f9f9; border-radius: 12px;">
  <div style="text-align: center; padding: 25px 0; background-color: #ffffff; border-radius: 8px;">
    <h2 style="color: #222222; margin: 0;">Link Your Discord Account</h2>
    <p style="color: #666666; margin: 10px 0 0 0; font-size: 14px;">Connect @{{ username }} to Picnic</p>
  </div>
  <div style="padding: 35px 25px; text-align: center; background-color: #ffffff; margin-top: 20px; border-radius: 8px;">
    <p style="font-size: 18px; color: #444444;">Your verification code:</p>
    <div style="font-size: 42px; font-weight: bold; color: #5865F2; letter-spacing: 8px; margin: 30px 0;">{{ code }}</div>
    <p style="color: #856404; font-size: 14px; font-weight: 600;">This code expires in {{ ttl_minutes }} minutes</p>
    <ol style="text-align: left; color: #666666; font-size: 14px;">
      <li>Return to Discord</li>
      <li>Use command: <code>/verify-link {{ code }}</code></li>
      <li>Your accounts will be linked!</li>
    </ol>
    <p style="font-size: 13px; color: #dc3545;">Keep this code private and don't share it with anyone</p>
  </div>
  <div style="text-align: center; padding: 20px; font-size: 13px; color: #888888;">
    <p>If you didn't request this linking, you can safely ignore this email.</p>
    <p>The code will expire automatically for your security.</p>
  </div>
</div>"#;

/// HTML body of the linking email. The `.html` template name turns on tera's
/// autoescaping for the Discord username.
pub fn render_link_email(discord_username: &str, code: &str) -> Result<String, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template("link_email.html", LINK_EMAIL_TEMPLATE)?;

    let mut context = Context::new();
    context.insert("username", discord_username);
    context.insert("code", code);
    context.insert("ttl_minutes", &CODE_TTL_MINUTES);
    tera.render("link_email.html", &context)
}
