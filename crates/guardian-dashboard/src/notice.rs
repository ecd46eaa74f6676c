//! User-visible notices.
//!
//! Every mutating action ends in exactly one notice — success or a specific
//! failure — never a silent no-op. The binary renders notices as log lines;
//! other frontends subscribe to the same channel.

use tokio::sync::broadcast;

/// Buffered notices per subscriber; a UI this far behind has bigger
/// problems than a missed toast.
const NOTICE_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
  Success,
  Warning,
  Error,
  /// A broadcast announcement, e.g. a newly reported accident.
  Alert,
}

/// One user-visible notification.
#[derive(Debug, Clone)]
pub struct Notice {
  pub kind:   NoticeKind,
  pub title:  String,
  pub body:   String,
  /// Rendered prominently (critical accident alerts).
  pub urgent: bool,
}

impl Notice {
  pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
    Self::new(NoticeKind::Success, title, body, false)
  }

  pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
    Self::new(NoticeKind::Warning, title, body, false)
  }

  pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
    Self::new(NoticeKind::Error, title, body, false)
  }

  pub fn alert(
    title: impl Into<String>,
    body: impl Into<String>,
    urgent: bool,
  ) -> Self {
    Self::new(NoticeKind::Alert, title, body, urgent)
  }

  fn new(
    kind: NoticeKind,
    title: impl Into<String>,
    body: impl Into<String>,
    urgent: bool,
  ) -> Self {
    Self { kind, title: title.into(), body: body.into(), urgent }
  }
}

/// The notice channel shared by the dashboard, the live feed and any
/// number of subscribers. Cheap to clone.
#[derive(Clone)]
pub struct Notices {
  tx: broadcast::Sender<Notice>,
}

impl Notices {
  pub fn new() -> Self {
    let (tx, _) = broadcast::channel(NOTICE_BUFFER);
    Self { tx }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
    self.tx.subscribe()
  }

  /// Publish a notice. Also emitted as a log line, so the binary shows
  /// every notice without holding a subscription of its own.
  pub fn push(&self, notice: Notice) {
    match notice.kind {
      NoticeKind::Success => {
        tracing::info!(title = %notice.title, "{}", notice.body);
      }
      NoticeKind::Warning => {
        tracing::warn!(title = %notice.title, "{}", notice.body);
      }
      NoticeKind::Error => {
        tracing::error!(title = %notice.title, "{}", notice.body);
      }
      NoticeKind::Alert => {
        if notice.urgent {
          tracing::warn!(title = %notice.title, "{}", notice.body);
        } else {
          tracing::info!(title = %notice.title, "{}", notice.body);
        }
      }
    }
    // No receivers just means no UI is attached.
    let _ = self.tx.send(notice);
  }
}

impl Default for Notices {
  fn default() -> Self {
    Self::new()
  }
}
