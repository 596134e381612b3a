pub mod date_parse;
pub mod date_resolver;
pub mod email_service;
pub mod event_service;
pub mod identity_lookup;
pub mod link_email;
pub mod openai_service;
pub mod otp_code;
pub mod otp_issuer;
pub mod otp_verifier;
