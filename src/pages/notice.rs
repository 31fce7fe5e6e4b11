//! Non-blocking notices (toasts) raised by page actions.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Pending notices; the client drains them after each action.
#[derive(Clone, Debug, Default)]
pub struct Notices(Vec<Notice>);

impl Notices {
    pub fn success(&mut self, message: impl Into<String>) { self.push(NoticeLevel::Success, message) }
    pub fn error(&mut self, message: impl Into<String>) { self.push(NoticeLevel::Error, message) }
    pub fn info(&mut self, message: impl Into<String>) { self.push(NoticeLevel::Info, message) }

    fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.0.push(Notice { level, message: message.into() });
    }

    pub fn pending(&self) -> &[Notice] { &self.0 }
    pub fn take(&mut self) -> Vec<Notice> { std::mem::take(&mut self.0) }
}
