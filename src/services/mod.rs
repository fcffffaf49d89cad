// SPDX-License-Identifier: MIT

//! Business logic services.

pub mod mailer;
pub mod matching;
pub mod password;
pub mod presence;
pub mod roster;
pub mod verification;

pub use mailer::MailerService;
pub use presence::{PresenceRegistry, WsEvent};
pub use roster::RosterService;
pub use verification::VerificationService;
