use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::store::{create_template_store, TemplateStore};
use crate::template::{AppContext, Instrumented, NotificationAssembler};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn TemplateStore>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let store = create_template_store(&settings.store);
        Self::with_store(settings, store)
    }

    pub fn with_store(settings: Settings, store: Arc<dyn TemplateStore>) -> Self {
        Self {
            settings: Arc::new(settings),
            store,
            start_time: Instant::now(),
        }
    }

    /// Build an instrumented generator scoped to one app
    pub fn generator(&self, app_id: &str) -> Instrumented<NotificationAssembler> {
        let context = AppContext::new(app_id, self.store.clone());
        let assembler = NotificationAssembler::new(context)
            .with_default_max_length(self.settings.render.max_length);

        Instrumented::new(
            assembler,
            Duration::from_millis(self.settings.render.slow_threshold_ms),
        )
    }
}
