//! Query planning and result decoding
//!
//! Maps the logical operations onto backend requests and decodes what comes
//! back.

pub mod builder;
pub mod request;
pub mod result;
pub mod time;

pub use builder::QueryWindow;
pub use request::QueryRequest;
pub use result::{LabelSet, QueryResult, RangeSeries, SamplePair, VectorSample};
