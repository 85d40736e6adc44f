use crate::core::TaskResult;
use crate::errors::Error;
use crate::utils::file_extension;
use std::io::{Cursor, Write};
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const DEFAULT_EXTENSION: &str = "png";

/// Storage name for an upload: a fresh UUID keeping the original extension
///
/// Extensions that are not plain ASCII alphanumerics fall back to `png`.
pub(super) fn upload_file_name(original: &str) -> String {
    let extension = file_extension(original)
        .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    format!("{}.{}", Uuid::new_v4().simple(), extension)
}

/// Whether `name` can be served from the upload folder as-is
pub(super) fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with('.')
}

pub(super) fn content_type_for(name: &str) -> &'static str {
    match file_extension(name).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Builds the download archive of a successful result
///
/// Contains `summary.txt`, `table_data.json`, `data_points.json` and one
/// file per generated source.
pub(super) fn build_bundle(result: &TaskResult) -> Result<Vec<u8>, Error> {
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    archive.start_file("summary.txt", options)?;
    archive.write_all(result.summary.as_bytes())?;

    archive.start_file("table_data.json", options)?;
    archive.write_all(serde_json::to_string_pretty(&result.table_data)?.as_bytes())?;

    archive.start_file("data_points.json", options)?;
    archive.write_all(serde_json::to_string_pretty(&result.data_points)?.as_bytes())?;

    for (language, source) in &result.generated_code {
        archive.start_file(language.file_name(), options)?;
        archive.write_all(source.as_bytes())?;
    }

    Ok(archive.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_names_keep_safe_extensions() {
        assert!(upload_file_name("Chart.JPG").ends_with(".jpg"));
        assert!(upload_file_name("chart").ends_with(".png"));
        assert!(upload_file_name("chart.p%g").ends_with(".png"));
        assert_ne!(upload_file_name("a.png"), upload_file_name("a.png"));
    }

    #[test]
    fn rejects_traversal() {
        assert!(is_plain_file_name("0f3a.png"));
        assert!(!is_plain_file_name("../secret"));
        assert!(!is_plain_file_name("a/b.png"));
        assert!(!is_plain_file_name(".env"));
    }
}
