//! Store initialization and table schemas

pub mod init;
pub mod schema;
pub mod table_schemas;

pub use init::*;
pub use schema::{ColumnDefinition, SchemaIntrospector, TableSchema};
pub use table_schemas::*;
