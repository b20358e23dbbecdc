use std::sync::Arc;
use std::time::Duration;

use cadence_core::{
    AuditHandle, AuditStore, AutoConfirm, Config, ConfirmationMode, ContentGenerator, ItemStore,
    ManualGate, PublishCoordinator, PublishGate, PublishLoop, Publisher, ReviewCoordinator,
    SanitizedConfig, ScheduleStore, Scheduler,
};

/// Shared application state
pub struct AppState {
    config: Config,
    items: Arc<dyn ItemStore>,
    schedule: Arc<dyn ScheduleStore>,
    audit: AuditHandle,
    audit_store: Arc<dyn AuditStore>,
    review: ReviewCoordinator,
    scheduler: Scheduler,
    publish: Arc<PublishCoordinator>,
    publish_loop: PublishLoop,
    /// Present when `publisher.confirmation = "manual"`.
    manual_gate: Option<Arc<ManualGate>>,
    generator: Option<Arc<dyn ContentGenerator>>,
}

impl AppState {
    /// Wire the coordinators from configuration.
    ///
    /// The publish loop is created stopped; the caller decides whether to
    /// start it.
    pub fn new(
        config: Config,
        items: Arc<dyn ItemStore>,
        schedule: Arc<dyn ScheduleStore>,
        audit: AuditHandle,
        audit_store: Arc<dyn AuditStore>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        let review = ReviewCoordinator::new(Arc::clone(&items), Some(audit.clone()));

        let scheduler = Scheduler::new(
            Arc::clone(&items),
            Arc::clone(&schedule),
            config.schedule.policy(),
        )
        .with_start_date(config.schedule.start_date)
        .with_audit(Some(audit.clone()));

        let (gate, manual_gate): (Arc<dyn PublishGate>, Option<Arc<ManualGate>>) =
            match config.publisher.confirmation {
                ConfirmationMode::Auto => (Arc::new(AutoConfirm), None),
                ConfirmationMode::Manual => {
                    let gate = Arc::new(ManualGate::new());
                    (Arc::clone(&gate) as Arc<dyn PublishGate>, Some(gate))
                }
            };

        let publish = Arc::new(
            PublishCoordinator::new(Arc::clone(&items), Arc::clone(&schedule), publisher, gate)
                .with_timeout(Duration::from_secs(config.publisher.timeout_secs))
                .with_max_per_sweep(config.publisher.max_per_sweep)
                .with_audit(Some(audit.clone())),
        );

        let publish_loop = PublishLoop::new(
            Arc::clone(&publish),
            Duration::from_millis(config.publisher.poll_interval_ms),
        );

        Self {
            config,
            items,
            schedule,
            audit,
            audit_store,
            review,
            scheduler,
            publish,
            publish_loop,
            manual_gate,
            generator: None,
        }
    }

    /// Attach the content generator used by the generate endpoint.
    pub fn with_generator(mut self, generator: Option<Arc<dyn ContentGenerator>>) -> Self {
        self.generator = generator;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn items(&self) -> &dyn ItemStore {
        self.items.as_ref()
    }

    pub fn schedule(&self) -> &dyn ScheduleStore {
        self.schedule.as_ref()
    }

    pub fn audit(&self) -> &AuditHandle {
        &self.audit
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn review(&self) -> &ReviewCoordinator {
        &self.review
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn publish(&self) -> &PublishCoordinator {
        self.publish.as_ref()
    }

    pub fn publish_loop(&self) -> &PublishLoop {
        &self.publish_loop
    }

    pub fn manual_gate(&self) -> Option<&ManualGate> {
        self.manual_gate.as_deref()
    }

    pub fn generator(&self) -> Option<&dyn ContentGenerator> {
        self.generator.as_deref()
    }
}
