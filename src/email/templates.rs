/// Subject line of the verification email.
pub const VERIFICATION_SUBJECT: &str = "Verify your email";

/// HTML body for the email verification message.
pub fn verification_email(name: &str, link: &str) -> String {
    let name = escape_html(name);
    let link = escape_html(link);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Verify your email</title>
</head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #333;">Hi {name},</h1>
    <p>Please confirm your email address by clicking the button below:</p>
    <p style="text-align: center; margin: 30px 0;">
        <a href="{link}" style="background-color: #4CAF50; color: white; padding: 14px 28px; text-decoration: none; border-radius: 4px; display: inline-block;">
            Verify Email
        </a>
    </p>
    <p>Or copy and paste this link into your browser:</p>
    <p style="word-break: break-all; color: #666;">{link}</p>
    <p style="color: #999; font-size: 12px; margin-top: 30px;">
        This link will expire in 30 minutes. If you didn't try to sign in, you can safely ignore this email.
    </p>
</body>
</html>"#
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
