// SPDX-License-Identifier: MIT

//! Twilio SMS notifier.
//!
//! Delivery is best-effort: failures are logged with the destination and
//! error, never surfaced to the caller of the triggering transition.

use crate::config::Config;
use serde::Deserialize;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Fire-and-forget SMS sender.
#[derive(Clone)]
pub struct SmsNotifier {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    country_code: String,
}

#[derive(Deserialize)]
struct TwilioError {
    code: Option<i64>,
    message: Option<String>,
}

impl SmsNotifier {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_from_number.clone(),
            country_code: config.sms_country_code.clone(),
        }
    }

    /// True when Twilio credentials are configured. Without them every send
    /// is skipped (and logged), which keeps local development SMS-free.
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty()
    }

    /// Notify a victim that a volunteer accepted their incident.
    ///
    /// Never returns an error: any failure here must not affect the state
    /// transition that triggered it.
    pub async fn notify_accepted(
        &self,
        victim_phone: &str,
        volunteer_name: &str,
        volunteer_phone: Option<&str>,
    ) {
        let to = normalize_number(victim_phone, &self.country_code);
        let body = match volunteer_phone {
            Some(phone) => format!(
                "ResQ: {} is on the way to help you. You can reach them at {}.",
                volunteer_name, phone
            ),
            None => format!("ResQ: {} is on the way to help you.", volunteer_name),
        };

        if let Err(err) = self.send(&to, &body).await {
            tracing::warn!(to = %to, error = %err, "SMS delivery failed");
        }
    }

    async fn send(&self, to: &str, body: &str) -> Result<(), String> {
        if !self.is_configured() {
            return Err("Twilio credentials not configured".to_string());
        }

        let url = format!(
            "{}/Accounts/{}/Messages.json",
            TWILIO_API_BASE, self.account_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", body)])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if response.status().is_success() {
            tracing::info!(to = %to, "SMS queued for delivery");
            return Ok(());
        }

        let status = response.status();
        let detail = match response.json::<TwilioError>().await {
            Ok(e) => format!(
                "code {:?}: {}",
                e.code,
                e.message.unwrap_or_else(|| "unknown".to_string())
            ),
            Err(_) => "unreadable error body".to_string(),
        };
        Err(format!("Twilio returned {}: {}", status, detail))
    }
}

/// Best-effort cosmetic formatting of a contact number.
///
/// Numbers already carrying the country-code prefix pass through unchanged;
/// otherwise one leading trunk `0` is stripped and the country code is
/// prepended. Not validated against any numbering plan.
pub fn normalize_number(raw: &str, country_code: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with(country_code) {
        return trimmed.to_string();
    }
    let national = trimmed.strip_prefix('0').unwrap_or(trimmed);
    format!("{}{}", country_code, national)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_numbers_pass_through_unchanged() {
        assert_eq!(normalize_number("+94771234567", "+94"), "+94771234567");
        assert_eq!(normalize_number("  +94771234567 ", "+94"), "+94771234567");
    }

    #[test]
    fn trunk_zero_is_replaced_by_country_code() {
        assert_eq!(normalize_number("0771234567", "+94"), "+94771234567");
    }

    #[test]
    fn bare_national_number_gets_prefix() {
        assert_eq!(normalize_number("771234567", "+94"), "+94771234567");
    }

    #[test]
    fn only_one_trunk_zero_is_stripped() {
        assert_eq!(normalize_number("00123", "+94"), "+940123");
    }

    #[test]
    fn unconfigured_notifier_is_detected() {
        let mut config = crate::config::Config::test_default();
        config.twilio_account_sid = String::new();
        let notifier = SmsNotifier::new(&config);
        assert!(!notifier.is_configured());
    }
}
