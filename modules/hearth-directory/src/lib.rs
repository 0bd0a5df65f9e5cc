pub mod cross_index;
pub mod filter_state;
pub mod pagination;
pub mod query;
pub mod reader;
pub mod snapshot;
pub mod storage;
pub mod taxonomy;

pub use filter_state::{load_persisted, restore_spec, FilterStateStore, FILTER_STATE_KEY};
pub use pagination::{PaginationController, PaginationState, DEFAULT_PAGE_SIZE};
pub use query::{filter_spec_schema, FilterSpec, QueryResult};
pub use reader::{CommunityDetail, CommunityOption, DirectoryReader, EventDetail, LocationDetail};
pub use snapshot::DirectorySnapshot;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use taxonomy::{CategoryCount, SubcategoryCount, Taxonomy};
