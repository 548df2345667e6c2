pub mod alert_service;
pub mod check_service;
pub mod dispatch_service;
pub mod install_service;
pub mod poll_service;
pub mod scheduler;
pub mod test_mode_service;
pub mod webhook_service;

pub use alert_service::AlertService;
pub use check_service::{CheckOptions, CheckService, CycleOutcome, CycleReport};
pub use dispatch_service::{DispatchReport, DispatchService};
pub use install_service::{InstallReport, InstallService};
pub use poll_service::PollService;
pub use scheduler::Scheduler;
pub use test_mode_service::{TestModeRequest, TestModeService, TEST_MODE_QUEUED_MESSAGE};
pub use webhook_service::{WebhookSender, WebhookService};
