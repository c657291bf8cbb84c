use super::OutgoingMail;

pub const VERIFICATION_SUBJECT: &str = "Email Verification request from Ecommerce site";

/// `{base_url}/auth/verify-email/{token}`
pub fn verification_link(base_url: &str, token: &str) -> String {
    format!("{}/auth/verify-email/{}", base_url.trim_end_matches('/'), token)
}

pub fn verification_email(to: &str, link: &str) -> OutgoingMail {
    let text = format!(
        "Thanks for creating an account.\n\n\
         Confirm your email address by opening the link below:\n\
         {link}\n\n\
         The link expires in 1 hour. If you did not register, ignore this message.\n"
    );

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <body style="margin:0;padding:24px;background:#0b0b0f;font-family:Arial,sans-serif;color:#e5e7eb;">
    <table role="presentation" width="100%" cellspacing="0" cellpadding="0">
      <tr>
        <td align="center">
          <table role="presentation" width="480" style="background:#111827;border-radius:16px;padding:32px;">
            <tr><td style="font-size:22px;font-weight:bold;padding-bottom:12px;">Verify your email</td></tr>
            <tr><td style="font-size:15px;line-height:1.6;padding-bottom:24px;">
              Thanks for creating an account. Confirm your email address to start shopping.
            </td></tr>
            <tr><td align="center" style="padding-bottom:24px;">
              <a href="{link}" style="display:inline-block;padding:12px 28px;border-radius:12px;background:#7e22ce;color:#ffffff;text-decoration:none;font-weight:bold;">Verify email</a>
            </td></tr>
            <tr><td style="font-size:12px;color:#9ca3af;">
              The link expires in 1 hour. If the button does not work, paste this URL into your browser:<br>
              <span style="word-break:break-all;">{link}</span>
            </td></tr>
          </table>
        </td>
      </tr>
    </table>
  </body>
</html>
"#
    );

    OutgoingMail {
        to: to.to_string(),
        subject: VERIFICATION_SUBJECT.to_string(),
        text,
        html,
    }
}
