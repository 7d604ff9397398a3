/// Arrow schema definitions for the citation corpus.
pub mod corpus {
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    /// Name of the LanceDB table holding chunk embeddings.
    pub const CHUNK_VECTORS_TABLE: &str = "chunk_vectors";

    /// Schema for the chunk vector table: one row per corpus chunk.
    pub fn chunk_vectors_schema(dim: i32) -> Schema {
        Schema::new(vec![
            Field::new("doc_id", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, true),
            Field::new("jurisdiction", DataType::Utf8, true),
            Field::new(
                "embedding",
                DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
                false,
            ),
        ])
    }

    /// Columns a vector table must carry for search results to be mapped
    /// back onto corpus chunks.
    pub const REQUIRED_COLUMNS: &[&str] = &["doc_id", "embedding"];
}
