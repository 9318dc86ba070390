//! Minimal XML field extraction for Query-API responses
//!
//! AWS Query APIs answer with flat XML documents; this layer only ever needs
//! the first text value of a handful of well-known tags, so a full XML
//! parser is not pulled in.

/// First text content of `<tag>...</tag>`, trimmed. Tags carrying
/// attributes are not matched; AWS puts attributes on the root element only.
pub fn first_tag_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(xml[start..end].trim())
}

/// Error message out of an AWS error document, falling back to the raw body
pub fn error_message(xml: &str) -> String {
    first_tag_text(xml, "Message")
        .map(str::to_string)
        .unwrap_or_else(|| xml.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALLER_IDENTITY: &str = r#"<GetCallerIdentityResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <GetCallerIdentityResult>
    <Arn>arn:aws:iam::123456789012:user/ops</Arn>
    <UserId>AIDACKCEVSQ6C2EXAMPLE</UserId>
    <Account>123456789012</Account>
  </GetCallerIdentityResult>
</GetCallerIdentityResponse>"#;

    #[test]
    fn test_extracts_identity_fields() {
        assert_eq!(first_tag_text(CALLER_IDENTITY, "Account"), Some("123456789012"));
        assert_eq!(
            first_tag_text(CALLER_IDENTITY, "Arn"),
            Some("arn:aws:iam::123456789012:user/ops")
        );
        assert_eq!(first_tag_text(CALLER_IDENTITY, "Missing"), None);
    }

    #[test]
    fn test_error_message_prefers_message_tag() {
        let body = "<ErrorResponse><Error><Code>AuthFailure</Code><Message>credentials invalid</Message></Error></ErrorResponse>";
        assert_eq!(error_message(body), "credentials invalid");
        assert_eq!(error_message("plain text"), "plain text");
    }
}
