//! Email delivery channel.
//!
//! Sends lead notifications via SMTP using the lettre crate, as a
//! multipart message with plain text and HTML alternatives.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{truncate_chars, DeliveryResult, LeadNotifier};
use crate::config::SmtpConfig;
use crate::models::LeadNotificationPayload;

const DESCRIPTION_PREVIEW_CHARS: usize = 200;

/// Email notification dispatcher
pub struct EmailNotifier {
    smtp: SmtpConfig,
    /// Dashboard base for the apply link
    app_base_url: String,
}

impl EmailNotifier {
    pub fn new(smtp: SmtpConfig, app_base_url: String) -> Self {
        Self { smtp, app_base_url }
    }

    fn apply_url(&self, lead: &LeadNotificationPayload) -> String {
        match &lead.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("{}/leads/{}", self.app_base_url, lead.id),
        }
    }

    fn subject(lead: &LeadNotificationPayload) -> String {
        let title = if lead.title.is_empty() {
            "New lead"
        } else {
            lead.title.as_str()
        };
        format!("New lead: {}", title)
    }

    /// Formats a lead as an HTML email body
    fn format_html(&self, lead: &LeadNotificationPayload) -> String {
        let description = truncate_chars(&lead.description, DESCRIPTION_PREVIEW_CHARS);
        let meta_line = [
            lead.company.as_deref().map(|c| format!("Company: {}", html_escape(c))),
            lead.budget.as_deref().map(|b| format!("Budget: {}", html_escape(b))),
            lead.skill.as_deref().map(|s| format!("Skill: {}", html_escape(s))),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" &middot; ");

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 20px; background-color: #f3f4f6;">
    <div style="max-width: 600px; margin: 0 auto; background-color: #ffffff; border-radius: 8px; overflow: hidden; box-shadow: 0 1px 3px rgba(0,0,0,0.1);">
        <div style="background-color: #2563eb; padding: 16px 24px;">
            <h1 style="color: #ffffff; margin: 0; font-size: 18px; font-weight: 600;">
                {title}
            </h1>
        </div>
        <div style="padding: 24px;">
            <p style="margin: 0 0 12px 0; font-size: 13px; color: #6b7280;">{meta_line}</p>
            <p style="margin: 0 0 24px 0; font-size: 14px; color: #374151; line-height: 1.5;">
                {description}
            </p>
            <div style="margin-top: 24px;">
                <a href="{apply_url}" style="display: inline-block; background-color: #2563eb; color: #ffffff; padding: 10px 20px; border-radius: 6px; text-decoration: none; font-size: 14px; font-weight: 500;">
                    Apply Now
                </a>
            </div>
        </div>
        <div style="padding: 16px 24px; background-color: #f9fafb; border-top: 1px solid #e5e7eb;">
            <p style="margin: 0; font-size: 12px; color: #6b7280;">
                You are receiving this because lead alerts are enabled on your Pro plan.
            </p>
        </div>
    </div>
</body>
</html>"#,
            title = html_escape(&lead.title),
            meta_line = meta_line,
            description = html_escape(&description),
            apply_url = self.apply_url(lead),
        )
    }

    /// Formats a lead as a plain text email body
    fn format_text(&self, lead: &LeadNotificationPayload) -> String {
        let description = truncate_chars(&lead.description, DESCRIPTION_PREVIEW_CHARS);
        let mut lines = vec![format!("New lead: {}", lead.title)];
        if let Some(company) = &lead.company {
            lines.push(format!("Company: {}", company));
        }
        if let Some(budget) = &lead.budget {
            lines.push(format!("Budget: {}", budget));
        }
        if let Some(skill) = &lead.skill {
            lines.push(format!("Skill: {}", skill));
        }
        lines.push(String::new());
        lines.push(description);
        lines.push(String::new());
        lines.push(format!("Apply: {}", self.apply_url(lead)));
        lines.join("\n")
    }
}

/// Simple HTML escaping for email content
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[async_trait]
impl LeadNotifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    async fn send(&self, recipient: &str, lead: &LeadNotificationPayload) -> DeliveryResult {
        let smtp_host = match &self.smtp.host {
            Some(h) => h,
            None => return DeliveryResult::failure("SMTP host not configured".to_string(), None),
        };

        let to = match recipient.parse() {
            Ok(addr) => addr,
            Err(_) => {
                return DeliveryResult::failure(
                    format!("Invalid email recipient: {}", recipient),
                    None,
                )
            }
        };

        let from = match self.smtp.from_address.parse() {
            Ok(addr) => addr,
            Err(_) => {
                return DeliveryResult::failure(
                    format!("Invalid from address: {}", self.smtp.from_address),
                    None,
                )
            }
        };

        let email = match Message::builder()
            .from(from)
            .to(to)
            .subject(Self::subject(lead))
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(self.format_text(lead)),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(self.format_html(lead)),
                    ),
            ) {
            Ok(email) => email,
            Err(e) => {
                return DeliveryResult::failure(format!("Failed to build email: {}", e), None)
            }
        };

        // Port 465 = implicit TLS (SMTPS), anything else = STARTTLS
        let mailer_builder = if self.smtp.port == 465 {
            let tls_params = match lettre::transport::smtp::client::TlsParameters::new(
                smtp_host.to_string(),
            ) {
                Ok(p) => p,
                Err(e) => {
                    return DeliveryResult::failure(
                        format!("Invalid TLS parameters for SMTP host: {}", e),
                        None,
                    )
                }
            };

            match AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host) {
                Ok(b) => b
                    .port(self.smtp.port)
                    .tls(lettre::transport::smtp::client::Tls::Wrapper(tls_params)),
                Err(e) => {
                    return DeliveryResult::failure(format!("Invalid SMTP host: {}", e), None)
                }
            }
        } else {
            match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host) {
                Ok(b) => b.port(self.smtp.port),
                Err(e) => {
                    return DeliveryResult::failure(format!("Invalid SMTP host: {}", e), None)
                }
            }
        };

        let mailer = if let (Some(username), Some(password)) =
            (self.smtp.username.as_ref(), self.smtp.password.as_ref())
        {
            mailer_builder
                .credentials(Credentials::new(username.clone(), password.clone()))
                .build()
        } else {
            mailer_builder.build()
        };

        match mailer.send(email).await {
            Ok(_) => {
                log::debug!("Lead email sent to {}", recipient);
                DeliveryResult::success(None)
            }
            Err(e) => {
                DeliveryResult::failure(format!("Failed to send email to {}: {}", recipient, e), None)
            }
        }
    }
}
