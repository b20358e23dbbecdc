pub mod audit;
pub mod config;
pub mod coordinator;
pub mod document;
pub mod generator;
pub mod item;
pub mod metrics;
pub mod publish;
pub mod schedule;
pub mod testing;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditEventEnvelope, AuditFilter, AuditHandle,
    AuditRecord, AuditStore, AuditWriter, SqliteAuditStore,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    DocumentConfig, SanitizedConfig, ServerConfig,
};
pub use coordinator::{
    generate_batch, AutoConfirm, ContentGenerator, CoordinatorError, GateDecision, GenerateError,
    GenerateReport, GeneratedContent, ManualGate, PublishCoordinator, PublishGate, PublishLoop,
    PublishedItem, ReviewCoordinator, SweepReport,
};
pub use document::{export_items, read_items, sync_document, DocumentError, SyncReport};
pub use generator::{create_generator, GeneratorBackend, GeneratorConfig, WebhookGenerator};
pub use item::{
    ContentItem, ItemError, ItemFailure, ItemFilter, ItemSnapshot, ItemState, ItemStore,
    LifecycleError, NewItem, PublishResult, ScheduledSlot, SqliteItemStore, Transition,
};
pub use publish::{
    create_publisher, ConfirmationMode, DryRunPublisher, PublishError, PublishReceipt,
    PublishRequest, Publisher, PublisherBackend, PublisherConfig, WebhookConfig,
    WebhookPublisher,
};
pub use schedule::{
    ScheduleConfig, ScheduleEntry, ScheduleError, SchedulePolicy, ScheduleReport, ScheduleStore,
    Scheduler, SqliteScheduleStore, TimeSlot,
};
