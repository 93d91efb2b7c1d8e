use super::{Event, Priority, WebTrafficEvent};

/// Builder for creating web traffic events
pub struct WebTrafficEventBuilder {
    time: i64,
    message: String,
    priority: Priority,
    client_identity: String,
    remote_user: String,
    source: String,
    request_line: Option<String>,
    status: String,
    size: String,
    section: String,
}

impl WebTrafficEventBuilder {
    /// Create a new builder with placeholder request fields
    pub fn new() -> Self {
        Self {
            time: 0,
            message: String::new(),
            priority: Priority::Medium,
            client_identity: "-".to_string(),
            remote_user: "-".to_string(),
            source: "10.0.0.1".to_string(),
            request_line: None,
            status: "200".to_string(),
            size: "0".to_string(),
            section: "/api".to_string(),
        }
    }

    /// Set the timestamp in epoch seconds
    pub fn time(mut self, time: i64) -> Self {
        self.time = time;
        self
    }

    /// Set the event message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the event priority
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the remote host
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the section
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Set the raw request line
    pub fn request_line(mut self, request_line: impl Into<String>) -> Self {
        self.request_line = Some(request_line.into());
        self
    }

    /// Set the client identity
    pub fn client_identity(mut self, client_identity: impl Into<String>) -> Self {
        self.client_identity = client_identity.into();
        self
    }

    /// Set the remote user
    pub fn remote_user(mut self, remote_user: impl Into<String>) -> Self {
        self.remote_user = remote_user.into();
        self
    }

    /// Set the status code
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Set the response size
    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    /// Build the WebTrafficEvent
    pub fn build(self) -> WebTrafficEvent {
        // Keep the request line consistent with the section unless set explicitly
        let request_line = self
            .request_line
            .unwrap_or_else(|| format!("GET {} HTTP/1.0", self.section));

        WebTrafficEvent {
            event: Event::new(self.time, self.message, self.priority),
            client_identity: self.client_identity,
            remote_user: self.remote_user,
            source: self.source,
            request_line,
            status: self.status,
            size: self.size,
            section: self.section,
        }
    }
}

impl Default for WebTrafficEventBuilder {
    fn default() -> Self {
        Self::new()
    }
}
