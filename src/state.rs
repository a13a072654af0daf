use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::Config;
use crate::quests::QuestPool;
use crate::store::pg::PgStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PgStore>,
    pub quests: QuestPool,
    pub config: Arc<Config>,
    pub metrics: PrometheusHandle,
}
