pub mod dto;
pub mod error;
pub mod observability;


pub use dto::*;
pub use error::{Error, ErrorResponse, Result};
pub use observability::{
    ActionKind, ErrorCategory, MetricsSnapshot, ObservableMetrics, RecentError, RequestId,
    UpstreamCall,
};
