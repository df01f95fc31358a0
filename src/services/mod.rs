// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod ai_client;
pub mod coordinator;
pub mod entitlements;
pub mod local_state;
pub mod mapper;
pub mod offline_cache;
pub mod pairing;
pub mod photo_diff;
pub mod session;
pub mod spot_service;
pub mod storage_client;
pub mod usage;
pub mod visibility;

pub use ai_client::{AiCompletion, AiExtractor, HttpAiExtractor};
pub use coordinator::{CoordinatorSettings, SpotCoordinator, StoreEvent};
pub use entitlements::{EntitlementProvider, LocalEntitlements};
pub use local_state::{FileStateStore, KeyValueStore, MemoryStateStore};
pub use offline_cache::{CacheStorage, HttpFetcher, OfflineCacheWorker};
pub use pairing::{PairingService, PairingState, PairingStatus};
pub use session::{AuthSession, SessionUser};
pub use spot_service::{SpotService, UploadFile, UploadReport};
pub use storage_client::{HttpObjectStorage, ObjectStorage};
pub use usage::UsageLimiter;
pub use visibility::Viewer;
