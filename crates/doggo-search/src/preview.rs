use doggo_core::types::SearchResult;
use serde_json::Value;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

pub fn format_file_size(bytes: u64) -> String {
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

/// Multi-line card for one hit. Missing name/path show as `Unknown`, a
/// missing size as `0 B`.
pub fn format_preview(result: &SearchResult) -> String {
    let meta = &result.metadata;
    let file_name = meta.get("file_name").map_or_else(|| "Unknown".to_string(), text);
    let file_path = meta.get("file_path").map_or_else(|| "Unknown".to_string(), text);
    let file_size = meta.get("file_size").map_or(0, bytes);
    let preview = format!(
        "\n📁 File: {}\n📍 Path: {}\n📏 Size: {}\n🎯 Similarity: {:.1}%\n📝 Description: {}\n",
        file_name,
        file_path,
        format_file_size(file_size),
        f64::from(result.similarity_score) * 100.0,
        result.description,
    );
    preview.trim().to_string()
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "Unknown".to_string(),
        other => other.to_string(),
    }
}

fn bytes(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)).unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doggo_core::types::Metadata;
    use serde_json::json;

    fn result_with(meta: Value, score: f32) -> SearchResult {
        let metadata: Metadata = match meta {
            Value::Object(m) => m,
            _ => Metadata::new(),
        };
        SearchResult { id: "img-1".into(), description: "a golden retriever in snow".into(), metadata, similarity_score: score }
    }

    #[test]
    fn file_size_units() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(500), "500 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(1_572_864), "1.5 MB");
        assert_eq!(format_file_size(5_242_880), "5.0 MB");
    }

    #[test]
    fn preview_renders_all_fields() {
        let r = result_with(json!({"file_path": "/pics/dog.jpg", "file_name": "dog.jpg", "file_size": 2048}), 0.8);
        let expected = "📁 File: dog.jpg\n📍 Path: /pics/dog.jpg\n📏 Size: 2.0 KB\n🎯 Similarity: 80.0%\n📝 Description: a golden retriever in snow";
        assert_eq!(format_preview(&r), expected);
    }

    #[test]
    fn preview_defaults_missing_metadata() {
        let r = result_with(json!({}), 0.123);
        let preview = format_preview(&r);
        assert!(preview.starts_with("📁 File: Unknown\n📍 Path: Unknown\n📏 Size: 0 B"));
        assert!(preview.contains("🎯 Similarity: 12.3%"));
    }

    #[test]
    fn preview_treats_null_metadata_as_missing() {
        let r = result_with(json!({"file_name": null, "file_path": null, "file_size": null}), 0.5);
        assert!(format_preview(&r).starts_with("📁 File: Unknown\n📍 Path: Unknown\n📏 Size: 0 B"));
    }

    #[test]
    fn preview_accepts_string_and_float_sizes() {
        let r = result_with(json!({"file_size": "5242880"}), 0.5);
        assert!(format_preview(&r).contains("📏 Size: 5.0 MB"));
        let r = result_with(json!({"file_size": 500.0}), 0.5);
        assert!(format_preview(&r).contains("📏 Size: 500 B"));
    }
}
