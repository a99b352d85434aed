use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

use crate::models::Material;

/// 根据扩展名推断 MIME 类型
pub fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "txt" | "text" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "yaml" | "yml" => "application/x-yaml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// 从磁盘加载单个资料文件
pub async fn load_material(path: &Path, index: usize) -> Result<Material> {
    let data = fs::read(path)
        .await
        .with_context(|| format!("无法读取资料文件: {}", path.display()))?;

    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let id = format!(
        "{}-{}",
        chrono::Utc::now().timestamp_millis(),
        index
    );

    Ok(Material::new(id, name, mime_from_extension(path), data))
}

/// 依次加载多个资料文件，任一失败即返回错误
pub async fn load_materials<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Material>> {
    let mut materials = Vec::with_capacity(paths.len());

    for (index, path) in paths.iter().enumerate() {
        let material = load_material(path.as_ref(), index).await?;
        tracing::info!(
            "正在加载: {} ({}, {} 字节)",
            material.name,
            material.mime_type,
            material.size
        );
        materials.push(material);
    }

    Ok(materials)
}
