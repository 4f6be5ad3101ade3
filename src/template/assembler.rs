//! Notification assembly: placement lookup, template selection and rendering.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{Map, Value};

use crate::metrics::StoreMetrics;
use crate::store::TemplateStore;

use super::condition::filter_by_conditions;
use super::filter::resolve_template_filters;
use super::selection::select_weighted;
use super::substitution::process_content;
use super::types::{
    GenerateError, GenerateRequest, GenerateResult, NotificationData, Placement, RenderedNotification, Template,
    Variables, ATTR_PLACEMENT_ID, ATTR_PLACEMENT_NAME, ATTR_TEMPLATE_ID, ATTR_TEMPLATE_NAME,
    DEFAULT_MAX_LENGTH, FALLBACK_TEMPLATE_ID, FALLBACK_TEMPLATE_NAME,
};

/// Title used by [`NotificationGenerator::generate_safe`] when the caller gives none
pub const SAFE_FALLBACK_TITLE: &str = "Notification";

/// App identity and store handle for one tenant.
///
/// Constructed explicitly and handed to the assembler, so several apps (or
/// tests) can render side by side against different stores.
#[derive(Clone)]
pub struct AppContext {
    pub app_id: String,
    pub store: Arc<dyn TemplateStore>,
}

impl AppContext {
    pub fn new(app_id: impl Into<String>, store: Arc<dyn TemplateStore>) -> Self {
        Self {
            app_id: app_id.into(),
            store,
        }
    }
}

/// Public boundary of notification generation.
#[async_trait]
pub trait NotificationGenerator: Send + Sync {
    /// Generate a notification, degrading to the fallback branch on lookup failures.
    ///
    /// Errors only for invalid input or a malformed placement document.
    async fn generate(&self, request: &GenerateRequest) -> GenerateResult<RenderedNotification>;

    /// Generate a notification without ever failing.
    ///
    /// Errors and panics are converted into the caller's fallback content with
    /// `error` describing what went wrong.
    async fn generate_safe(&self, request: &GenerateRequest) -> RenderedNotification {
        let mut request = request.clone();
        request
            .fallback_title
            .get_or_insert_with(|| SAFE_FALLBACK_TITLE.to_string());
        request.fallback_message.get_or_insert_with(String::new);

        let error = match AssertUnwindSafe(self.generate(&request)).catch_unwind().await {
            Ok(Ok(rendered)) => return rendered,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => GenerateError::Panicked(panic_message(&*panic)).to_string(),
        };

        tracing::error!(
            placement_id = %request.placement_id,
            error = %error,
            "Error generating notification"
        );

        RenderedNotification {
            title: request.fallback_title.unwrap_or_default(),
            message: request.fallback_message.unwrap_or_default(),
            data: request.data,
            template_used: false,
            template_name: None,
            error: Some(error),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Orchestrates placement lookup, filtering, selection and rendering.
pub struct NotificationAssembler {
    context: AppContext,
    default_max_length: usize,
}

impl NotificationAssembler {
    pub fn new(context: AppContext) -> Self {
        Self {
            context,
            default_max_length: DEFAULT_MAX_LENGTH,
        }
    }

    /// Override the message length limit used when a request has none
    pub fn with_default_max_length(mut self, max_length: usize) -> Self {
        self.default_max_length = max_length;
        self
    }

    pub fn app_id(&self) -> &str {
        &self.context.app_id
    }

    /// Shorthand for a request carrying only variables
    pub async fn notify(
        &self,
        placement_id: &str,
        variables: Variables,
    ) -> GenerateResult<RenderedNotification> {
        let request = GenerateRequest::new(placement_id).with_variables(variables);
        self.generate(&request).await
    }

    pub async fn generate(&self, request: &GenerateRequest) -> GenerateResult<RenderedNotification> {
        request.validate()?;

        let placement = self.load_placement(&request.placement_id).await?;

        let template = match &placement {
            Some(placement) => self.select_template(placement, &request.variables).await,
            None => None,
        };

        let rendered = match (&placement, template) {
            (Some(placement), Some(template)) => self.render_template(request, placement, &template),
            _ => self.render_fallback(request, placement.as_ref()),
        };

        Ok(rendered)
    }

    /// Fetch the placement; lookup failures degrade to "no placement".
    async fn load_placement(&self, placement_id: &str) -> GenerateResult<Option<Placement>> {
        match self
            .context
            .store
            .get_placement(&self.context.app_id, placement_id)
            .await
        {
            Ok(Some(placement)) => {
                tracing::debug!(
                    placement_id = %placement_id,
                    variables = placement.variables.len(),
                    "Loaded placement config"
                );
                Ok(Some(placement))
            }
            Ok(None) => {
                tracing::warn!(
                    app_id = %self.context.app_id,
                    placement_id = %placement_id,
                    "Placement not found"
                );
                Ok(None)
            }
            Err(e) if e.is_malformed() => {
                StoreMetrics::record_error("get_placement");
                Err(e.into())
            }
            Err(e) => {
                StoreMetrics::record_error("get_placement");
                tracing::error!(
                    error = %e,
                    placement_id = %placement_id,
                    "Error fetching placement"
                );
                Ok(None)
            }
        }
    }

    /// Run filter resolution, candidate fetch, condition filtering and selection.
    async fn select_template(&self, placement: &Placement, variables: &Variables) -> Option<Template> {
        let eligible_ids = resolve_template_filters(&placement.template_filters, variables);

        let mut candidates = self.fetch_candidates(placement).await;

        if let Some(ids) = &eligible_ids {
            candidates.retain(|t| ids.contains(&t.id));
            if candidates.is_empty() {
                tracing::debug!(
                    placement_id = %placement.id,
                    eligible = ids.len(),
                    "No active template within filter-eligible set"
                );
                return None;
            }
        }

        let eligible = filter_by_conditions(candidates, variables);
        let selected = select_weighted(&eligible).cloned();

        if let Some(template) = &selected {
            tracing::debug!(
                placement_id = %placement.id,
                template_id = %template.id,
                candidates = eligible.len(),
                "Selected template"
            );
        }

        selected
    }

    /// Prefer the placement's explicit active-ID list, else scan all templates.
    async fn fetch_candidates(&self, placement: &Placement) -> Vec<Template> {
        let store = &self.context.store;
        let app_id = &self.context.app_id;

        if !placement.active_template_ids.is_empty() {
            match store
                .get_active_templates(app_id, &placement.id, Some(placement.active_template_ids.as_slice()))
                .await
            {
                Ok(templates) if !templates.is_empty() => return templates,
                Ok(_) => {
                    tracing::debug!(
                        placement_id = %placement.id,
                        "Active template list yielded nothing, scanning all templates"
                    );
                }
                Err(e) => {
                    StoreMetrics::record_error("get_active_templates");
                    tracing::error!(
                        error = %e,
                        placement_id = %placement.id,
                        "Error fetching templates"
                    );
                    return Vec::new();
                }
            }
        }

        match store.get_active_templates(app_id, &placement.id, None).await {
            Ok(templates) => templates,
            Err(e) => {
                StoreMetrics::record_error("get_active_templates");
                tracing::error!(
                    error = %e,
                    placement_id = %placement.id,
                    "Error fetching templates"
                );
                Vec::new()
            }
        }
    }

    fn max_length(&self, request: &GenerateRequest) -> usize {
        request.max_length.unwrap_or(self.default_max_length)
    }

    fn render_template(
        &self,
        request: &GenerateRequest,
        placement: &Placement,
        template: &Template,
    ) -> RenderedNotification {
        // Template data wins over placement defaults only when it has entries
        let base = template
            .data
            .as_ref()
            .filter(|data| !data.is_empty())
            .unwrap_or(&placement.default_data);

        let mut merged = base.clone();
        merged.extend(request.data.iter().map(|(k, v)| (k.clone(), v.clone())));

        let processed = process_content(
            &template.title_template,
            &template.body_template,
            &merged,
            &request.variables,
            &placement.defaults,
            Some(self.max_length(request)),
        );

        // Attribution goes in after substitution so payload data cannot override it
        let mut data = processed.data;
        attach_attribution(
            &mut data,
            &request.placement_id,
            placement.display_name(),
            &template.id,
            template.display_name(),
        );

        RenderedNotification {
            title: processed.title,
            message: processed.message,
            data,
            template_used: true,
            template_name: Some(template.display_name().to_string()),
            error: None,
        }
    }

    fn render_fallback(
        &self,
        request: &GenerateRequest,
        placement: Option<&Placement>,
    ) -> RenderedNotification {
        tracing::warn!(
            placement_id = %request.placement_id,
            "No active template for placement, using fallbacks"
        );

        let no_defaults = Map::new();
        let defaults = placement.map(|p| &p.defaults).unwrap_or(&no_defaults);

        let processed = process_content(
            request.fallback_title.as_deref().unwrap_or_default(),
            request.fallback_message.as_deref().unwrap_or_default(),
            &request.data,
            &request.variables,
            defaults,
            Some(self.max_length(request)),
        );

        let placement_name = placement
            .map(Placement::display_name)
            .unwrap_or(&request.placement_id);

        let mut data = processed.data;
        attach_attribution(
            &mut data,
            &request.placement_id,
            placement_name,
            FALLBACK_TEMPLATE_ID,
            FALLBACK_TEMPLATE_NAME,
        );

        RenderedNotification {
            title: processed.title,
            message: processed.message,
            data,
            template_used: false,
            template_name: None,
            error: None,
        }
    }
}

#[async_trait]
impl NotificationGenerator for NotificationAssembler {
    async fn generate(&self, request: &GenerateRequest) -> GenerateResult<RenderedNotification> {
        NotificationAssembler::generate(self, request).await
    }
}

fn attach_attribution(
    data: &mut NotificationData,
    placement_id: &str,
    placement_name: &str,
    template_id: &str,
    template_name: &str,
) {
    data.insert(ATTR_PLACEMENT_ID.to_string(), Value::from(placement_id));
    data.insert(ATTR_PLACEMENT_NAME.to_string(), Value::from(placement_name));
    data.insert(ATTR_TEMPLATE_ID.to_string(), Value::from(template_id));
    data.insert(ATTR_TEMPLATE_NAME.to_string(), Value::from(template_name));
}
