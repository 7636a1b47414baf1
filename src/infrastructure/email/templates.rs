use crate::domain::alert::AlertNotification;

/// Subject and plain-text body of an outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

pub fn verification_email(name: &str, code: &str, ttl_minutes: i64) -> EmailContent {
    EmailContent {
        subject: "Verify your e-mail address".to_string(),
        body: format!(
            "Hello {name},\n\n\
             Your verification code is: {code}\n\n\
             The code expires in {ttl_minutes} minutes. If you did not create an account, \
             you can ignore this message.\n"
        ),
    }
}

pub fn alert_email(notification: &AlertNotification) -> EmailContent {
    EmailContent {
        subject: notification.subject(),
        body: notification.text_body(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_email() {
        let email = verification_email("Ada", "K3X9QZ", 10);

        assert_eq!(email.subject, "Verify your e-mail address");
        assert!(email.body.starts_with("Hello Ada,"));
        assert!(email.body.contains("K3X9QZ"));
        assert!(email.body.contains("10 minutes"));
    }
}
