pub mod lead;
pub mod profile;

pub use lead::{Lead, LeadNotificationPayload, NotifyProRequest, NotifyRequest};
pub use profile::{CreateProfileRequest, LoginRequest, NotificationTarget, PlanTier, Profile};
