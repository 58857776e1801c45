mod schema_def;

pub use schema_def::{Column, Schema, SqlType, Table};
