pub mod billing;
pub mod entitlement;
pub mod leads;
pub mod notification;
pub mod notify;
pub mod pitch;
pub mod profiles;
pub mod rate_limit;

pub use billing::BillingService;
pub use entitlement::{EntitlementService, GateDecision};
pub use leads::LeadService;
pub use notification::{EmailNotifier, LeadNotifier, TelegramNotifier};
pub use notify::{FanoutSummary, Notifiers};
pub use pitch::{PitchOptions, PitchService};
pub use profiles::ProfileService;
pub use rate_limit::{spawn_purge_task, RateDecision, RateLimiter};
