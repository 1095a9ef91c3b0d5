//! Fixed HTML bodies for the four notification emails.

/// Minimal HTML escaping for user-provided values embedded in the bodies.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn donation_approved(name: &str, title: &str) -> (String, String) {
    let subject = "Your donation has been approved".to_string();
    let body = format!(
        "<html><body>\
         <h2>Good news, {name}!</h2>\
         <p>Your donation post <strong>{title}</strong> has been approved and \
         is now visible to the community.</p>\
         <p>Thank you for sharing food on Plateshare.</p>\
         </body></html>",
        name = escape(name),
        title = escape(title),
    );
    (subject, body)
}

pub fn donation_rejected(name: &str, title: &str, reason: &str) -> (String, String) {
    let subject = "Your donation was not approved".to_string();
    let body = format!(
        "<html><body>\
         <h2>Hello {name},</h2>\
         <p>Your donation post <strong>{title}</strong> was not approved.</p>\
         <p>Reason: <em>{reason}</em></p>\
         <p>You are welcome to fix the issue and submit the donation again.</p>\
         </body></html>",
        name = escape(name),
        title = escape(title),
        reason = escape(reason),
    );
    (subject, body)
}

pub fn account_approved(name: &str) -> (String, String) {
    let subject = "Welcome to Plateshare".to_string();
    let body = format!(
        "<html><body>\
         <h2>Welcome aboard, {name}!</h2>\
         <p>Your registration has been approved. You can now log in and start \
         sharing or picking up food.</p>\
         </body></html>",
        name = escape(name),
    );
    (subject, body)
}

pub fn account_rejected(name: &str, reason: &str) -> (String, String) {
    let subject = "Your Plateshare registration".to_string();
    let body = format!(
        "<html><body>\
         <h2>Hello {name},</h2>\
         <p>We could not approve your registration.</p>\
         <p>Reason: <em>{reason}</em></p>\
         <p>You may register again with corrected details.</p>\
         </body></html>",
        name = escape(name),
        reason = escape(reason),
    );
    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_bodies_embed_name_and_reason() {
        let (subject, body) = donation_rejected("Maya", "Day-old bagels", "expiry date missing");
        assert!(!subject.is_empty());
        assert!(body.contains("Maya"));
        assert!(body.contains("Day-old bagels"));
        assert!(body.contains("expiry date missing"));

        let (_, body) = account_rejected("Maya", "ID document unreadable");
        assert!(body.contains("ID document unreadable"));
    }

    #[test]
    fn user_values_are_escaped() {
        let (_, body) = donation_approved("<script>", "Bread & butter");
        assert!(body.contains("&lt;script&gt;"));
        assert!(body.contains("Bread &amp; butter"));
        assert!(!body.contains("<script>"));
    }
}
