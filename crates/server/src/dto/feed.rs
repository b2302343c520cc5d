use serde::Serialize;
use transito::{
    import::ImportStarted,
    repository::{FeedStats, StoreState},
};

#[derive(Debug, Serialize)]
pub struct StatsDto {
    pub store: StoreState,
    pub counts: FeedStats,
}

#[derive(Debug, Serialize)]
pub struct ImportStartedDto {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded: Option<u64>,
}

impl From<ImportStarted> for ImportStartedDto {
    fn from(value: ImportStarted) -> Self {
        Self {
            id: value.id,
            superseded: value.superseded,
        }
    }
}
