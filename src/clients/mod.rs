pub mod backend;
pub mod llm_client;
pub mod search_client;

pub use backend::{BackendRequest, BackendResponse, GenerativeBackend, GroundingSource, OutputShape};
pub use llm_client::OpenAiBackend;
pub use search_client::{build_provider, SearchHit, SearchProvider, MAX_RESULTS};
