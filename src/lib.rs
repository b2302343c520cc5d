pub mod gtfs;
pub mod import;
pub mod repository;
pub mod shared;
pub mod store;

pub mod prelude {
    pub use crate::gtfs::{
        BatchSink, Config as GtfsConfig, FeedTables, GtfsParser, ProgressListener,
        models::{Agency, Calendar, Route, Stop, StopTime, Trip},
    };
    pub use crate::import::{ImportManager, ImportProgress, ImportReport, ImportStarted, ImportStatus, Importer};
    pub use crate::repository::{
        DepartureInfo, FeedStats, LiveQuery, Repository, StoreState,
    };
    pub use crate::shared::{BoundingBox, Coordinate, Distance, ServiceDate, Time};
    pub use crate::store::{Store, StoreConfig, Table};
}
