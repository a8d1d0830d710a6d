/*!
# SOFA DevKit - Stubs and utilities for testing the agent

- Stub SOFA feed server with ETag / 304 semantics
- Feed fixture builders
- Test harness owning a temporary cache directory
*/

pub mod feed_stub;
pub mod fixtures;
pub mod test_utils;

pub use feed_stub::FeedStub;
pub use fixtures::FeedBuilder;
pub use test_utils::TestHarness;
