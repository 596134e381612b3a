pub mod openai_client;
pub mod resend_client;
