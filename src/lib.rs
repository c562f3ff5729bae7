//! dirsearch - cursor and evaluator engine for directory filter searches
//!
//! A filter tree (`ExpressionNode`) becomes two parallel trees:
//! - evaluators, which decide whether one candidate entry matches a node
//! - cursors, which enumerate the candidates matching a node, in both
//!   directions, without duplicates
//!
//! Records and indexes are read through the `EntryStore` and `Index`
//! traits; attribute metadata through `SchemaInfo`.

pub mod builder;
pub mod cli;
pub mod config;
pub mod context;
pub mod cursor;
pub mod errors;
pub mod evaluator;
pub mod filter;
pub mod observability;
pub mod schema;
pub mod store;

pub use builder::{build_cursor, build_evaluator, build_operand, search_ids};
pub use config::SearchConfig;
pub use context::SearchContext;
pub use cursor::{BoxCursor, Cursor, Direction, Operand, Position};
pub use errors::{SearchError, SearchErrorCode, SearchResult};
pub use evaluator::Evaluator;
pub use filter::{ExpressionNode, SubstringAssertion};
pub use store::{Entry, EntryId, EntryStore, Index, IndexEntry, MemoryStore, Value};
