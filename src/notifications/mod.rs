// ============================================================================
// Notification Dispatcher
// ============================================================================
//
// Structure:
// - event       - tagged union of every transactional message
// - templates   - pure rendering of an event into subject + HTML
// - settings    - operator settings, reloaded through a provider per send
// - transport   - SMTP delivery (lettre) behind the MailTransport trait
// - dispatcher  - settings check, render, single bounded delivery attempt
//
// ============================================================================

pub mod event;
pub mod templates;
pub mod settings;
pub mod transport;
pub mod dispatcher;

pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use event::*;
pub use settings::{JsonFileSettings, NotificationSettings, SettingsProvider, StaticSettings};
pub use transport::{MailTransport, NotificationError, OutgoingEmail, SmtpMailer};
