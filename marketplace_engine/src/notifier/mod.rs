//! Best-effort side effects of the order lifecycle.
//!
//! [`NotificationDispatcher`] subscribes to engine events and writes notifications through a
//! [`NotificationManagement`](crate::traits::NotificationManagement) backend, and sends email through an
//! [`EmailSender`].
mod dispatcher;
mod email;

pub use dispatcher::NotificationDispatcher;
pub use email::{EmailError, EmailSender, LogMailer};
