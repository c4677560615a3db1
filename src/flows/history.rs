/// Config history flow: list stored job configurations and open one.
use crate::api::ApiClient;
use crate::api::types::{ConfigDetail, ConfigId, ConfigSummary};
use crate::session::SessionStore;

use super::{FlowError, console_error, require_token};

/// View state for the configuration history.
///
/// Details are fetched per selection and never cached: selecting the same
/// entry twice issues two requests.
#[derive(Debug)]
pub struct ConfigHistory {
    api: ApiClient,
    session: SessionStore,
    configs: Vec<ConfigSummary>,
    selected: Option<ConfigDetail>,
}

impl ConfigHistory {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self {
            api,
            session,
            configs: Vec::new(),
            selected: None,
        }
    }

    /// Fetch the summary list. On failure the previous list is kept.
    pub fn activate(&mut self) -> Result<&[ConfigSummary], FlowError> {
        require_token(&self.session)?;

        match self.api.config_history() {
            Ok(configs) => {
                self.configs = configs;
                Ok(&self.configs)
            }
            Err(err) => {
                console_error("Error fetching config history", &err);
                Err(FlowError::backend(
                    format!("Failed to load config history: {}", err.detail_or_message()),
                    err,
                ))
            }
        }
    }

    /// Fetch the full document for `id`, replacing the displayed detail.
    /// On failure the previous detail stays on screen.
    pub fn view_detail(&mut self, id: &ConfigId) -> Result<&ConfigDetail, FlowError> {
        require_token(&self.session)?;

        match self.api.config_detail(id) {
            Ok(detail) => Ok(&*self.selected.insert(detail)),
            Err(err) => {
                console_error("Error fetching full config", &err);
                Err(FlowError::backend(
                    format!("Failed to load config {id}: {}", err.detail_or_message()),
                    err,
                ))
            }
        }
    }

    pub fn configs(&self) -> &[ConfigSummary] {
        &self.configs
    }

    pub fn selected(&self) -> Option<&ConfigDetail> {
        self.selected.as_ref()
    }
}
