use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const ID: &str = "id";
pub const DESCRIPTION: &str = "description";
pub const FILE_PATH: &str = "file_path";
pub const FILE_NAME: &str = "file_name";
pub const FILE_SIZE: &str = "file_size";
pub const VECTOR: &str = "vector";
/// Populated by LanceDB on vector search results.
pub const DISTANCE: &str = "_distance";

pub fn build_images_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(ID, DataType::Utf8, false),
		Field::new(DESCRIPTION, DataType::Utf8, false),
		Field::new(FILE_PATH, DataType::Utf8, false),
		Field::new(FILE_NAME, DataType::Utf8, false),
		Field::new(FILE_SIZE, DataType::UInt64, false),
		Field::new(VECTOR, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
