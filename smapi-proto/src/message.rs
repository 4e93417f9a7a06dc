//! Request and response types for SMAPI exchanges.

use std::fmt;

use zeroize::Zeroizing;

/// One administrative command addressed to SMAPI.
///
/// The password is held in a [`Zeroizing`] buffer and never shows up in
/// [`Debug`] output.
#[derive(Clone)]
pub struct Request {
    /// SMAPI function name (e.g. `Image_Create_DM`).
    pub api_name: String,
    /// Authorized SMAPI user.
    pub auth_user: String,
    /// Password of [`Self::auth_user`].
    pub auth_pass: Zeroizing<String>,
    /// Target image (guest user ID) the command acts on.
    pub target: String,
    /// API-specific parameters, sent raw after the target.
    pub command_text: String,
}

impl Request {
    /// Creates a request with the given API name and credentials.
    pub fn new(
        api_name: impl Into<String>,
        auth_user: impl Into<String>,
        auth_pass: impl Into<String>,
        target: impl Into<String>,
        command_text: impl Into<String>,
    ) -> Self {
        Self {
            api_name: api_name.into(),
            auth_user: auth_user.into(),
            auth_pass: Zeroizing::new(auth_pass.into()),
            target: target.into(),
            command_text: command_text.into(),
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("api_name", &self.api_name)
            .field("auth_user", &self.auth_user)
            .field("auth_pass", &"<redacted>")
            .field("target", &self.target)
            .field("command_text", &self.command_text)
            .finish()
    }
}

/// A single line of response text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLine(pub String);

impl MessageLine {
    /// Returns the line text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MessageLine {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for MessageLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded SMAPI response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// Request number sent ahead of the body.
    pub echo: u32,
    /// Body length as declared by the server.
    pub total_length: u32,
    /// Request number carried in the body. This one is authoritative.
    pub request_number: u32,
    /// SMAPI return code (`0` means success).
    pub return_code: u32,
    /// SMAPI reason code.
    pub reason_code: u32,
    /// Number of lines the server declared.
    pub message_count: u32,
    /// Lines actually parsed. Shorter than `message_count` when a
    /// zero-length line ended the list early.
    pub lines: Vec<MessageLine>,
}

impl Response {
    /// Builds a response with `total_length` and `message_count` derived
    /// from `lines`, echoing `request_number` in both places.
    ///
    /// `total_length` counts everything after the length field itself.
    pub fn new(
        request_number: u32,
        return_code: u32,
        reason_code: u32,
        lines: Vec<MessageLine>,
    ) -> Self {
        let body: usize = 16 + lines.iter().map(|l| 4 + l.0.len()).sum::<usize>();
        Self {
            echo: request_number,
            total_length: u32::try_from(body).unwrap_or(u32::MAX),
            request_number,
            return_code,
            reason_code,
            message_count: u32::try_from(lines.len()).unwrap_or(u32::MAX),
            lines,
        }
    }

    /// Joins all message lines, each terminated by `\n`.
    ///
    /// Returns an empty string when there are no lines.
    pub fn message_text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(line.as_str());
            text.push('\n');
        }
        text
    }
}
