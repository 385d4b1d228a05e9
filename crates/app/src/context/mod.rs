//! Application context - dependency injection container

use std::sync::Arc;

use medalarm_core::{
    AlarmScheduler, AlarmService, Clock, DoseResolver, HistoryService, ReconciliationReport,
    ReconciliationRunner, SystemClock,
};
use medalarm_domain::{Config, Result};
use medalarm_infra::{
    DbManager, FireDispatcher, SqlCipherDoseRepository, SqlCipherMedicationRepository,
    SqlCipherScheduleRepository, TokioWakeTimer, TracingPresenter,
};
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Application context - holds all services and their collaborators.
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub timer: Arc<TokioWakeTimer>,
    pub presenter: Arc<TracingPresenter>,
    pub scheduler: Arc<AlarmScheduler>,
    pub resolver: Arc<DoseResolver>,
    pub alarms: AlarmService,
    pub history: HistoryService,
    /// Outcome of the startup reconciliation pass.
    pub startup_report: ReconciliationReport,
    dispatcher: FireDispatcher,
}

impl AppContext {
    /// Open the database, wire the services, start fire dispatch and restore
    /// every persisted wake-up.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn new_with_config(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;

        let medications = Arc::new(SqlCipherMedicationRepository::new(Arc::clone(&db)));
        let schedules = Arc::new(SqlCipherScheduleRepository::new(Arc::clone(&db)));
        let doses = Arc::new(SqlCipherDoseRepository::new(Arc::clone(&db)));

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let (timer, fired) = TokioWakeTimer::new(Handle::current(), Arc::clone(&clock));
        let timer = Arc::new(timer);
        let presenter = Arc::new(TracingPresenter::new());

        let scheduler = Arc::new(AlarmScheduler::new(timer.clone(), Arc::clone(&clock)));
        let resolver = Arc::new(DoseResolver::new(
            medications.clone(),
            schedules.clone(),
            doses.clone(),
            Arc::clone(&scheduler),
            presenter.clone(),
            Arc::clone(&clock),
            config.reminders,
        ));

        // Dispatch before reconciling so wake-ups that are already due are
        // not queued behind startup.
        let mut dispatcher = FireDispatcher::new(Arc::clone(&resolver), fired);
        dispatcher.start()?;

        let runner = ReconciliationRunner::new(
            medications.clone(),
            schedules.clone(),
            doses.clone(),
            Arc::clone(&scheduler),
            Arc::clone(&clock),
        );
        let startup_report = runner.run().await;
        info!(
            alarms_scheduled = startup_report.alarms_scheduled,
            alarms_skipped = startup_report.alarms_skipped,
            snoozes_restored = startup_report.snoozes_restored,
            snoozes_skipped = startup_report.snoozes_skipped,
            "startup reconciliation finished"
        );

        let alarms = AlarmService::new(medications, schedules, Arc::clone(&scheduler));
        let history = HistoryService::new(doses, clock);

        Ok(Self {
            config,
            db,
            timer,
            presenter,
            scheduler,
            resolver,
            alarms,
            history,
            startup_report,
            dispatcher,
        })
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatcher.is_running()
    }

    /// Stop dispatching and drop every outstanding wake-up.
    ///
    /// Persisted alarms and snoozes are restored by the next startup.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.dispatcher.is_running() {
            self.dispatcher.stop().await?;
        } else {
            warn!("fire dispatcher already stopped");
        }
        self.timer.cancel_all();
        info!(dispatched = self.dispatcher.dispatched(), "medalarm shut down");
        Ok(())
    }
}
