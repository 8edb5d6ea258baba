use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::pages::{Page, PageApi};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub total_pages: usize,
    pub published_pages: usize,
    pub unpublished_pages: usize,
}

impl ExportSummary {
    pub fn of(pages: &[Page]) -> Self {
        let published = pages.iter().filter(|p| p.is_published).count();
        Self {
            total_pages: pages.len(),
            published_pages: published,
            unpublished_pages: pages.len() - published,
        }
    }
}

/// JSON document written by a page export
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageExport {
    pub pages: Vec<Page>,
    pub exported_at: DateTime<Utc>,
    pub instance_id: Option<String>,
    pub summary: ExportSummary,
}

impl PageExport {
    pub fn new(pages: Vec<Page>, instance_id: Option<String>) -> Self {
        Self {
            summary: ExportSummary::of(&pages),
            pages,
            exported_at: Utc::now(),
            instance_id,
        }
    }
}

/// Fetch every page and write them to `path` as pretty JSON, creating parent directories
pub async fn export_pages<F>(
    api: &dyn PageApi,
    path: &Path,
    instance_id: Option<String>,
    mut on_progress: F,
) -> Result<ExportSummary>
where
    F: FnMut(&str),
{
    on_progress("Loading pages...");
    log::info!("Exporting pages to {:?}", path);
    let pages = api.list_pages().await.context("Failed to load pages")?;

    on_progress(&format!("Writing {} pages to file...", pages.len()));
    let export = PageExport::new(pages, instance_id);
    write_export(&export, path).await?;

    log::info!("Exported {} pages to {:?}", export.summary.total_pages, path);
    Ok(export.summary)
}

pub async fn write_export(export: &PageExport, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory: {:?}", dir))?;
    }
    let json = serde_json::to_string_pretty(export).context("Failed to serialize export")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write export file: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::pages::ResponseResult;
    use async_trait::async_trait;

    struct StaticApi(Vec<Page>);

    #[async_trait]
    impl PageApi for StaticApi {
        async fn list_pages(&self) -> Result<Vec<Page>> {
            Ok(self.0.clone())
        }

        async fn delete_page(&self, _id: u64) -> Result<ResponseResult> {
            Ok(ResponseResult::ok())
        }
    }

    fn page(id: u64, published: bool) -> Page {
        Page {
            id,
            path: format!("docs/{}", id),
            title: format!("Doc {}", id),
            locale: "en".into(),
            is_published: published,
        }
    }

    #[tokio::test]
    async fn test_export_writes_json_with_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/pages.json");
        let api = StaticApi(vec![page(1, true), page(2, false), page(3, true)]);
        let mut progress = Vec::new();

        let summary = export_pages(&api, &path, Some("docs".into()), |msg| progress.push(msg.to_string()))
            .await
            .unwrap();

        assert_eq!(summary.published_pages, 2);
        assert_eq!(progress, vec!["Loading pages...", "Writing 3 pages to file..."]);

        let written: PageExport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.pages.len(), 3);
        assert_eq!(written.summary.unpublished_pages, 1);
        assert_eq!(written.instance_id.as_deref(), Some("docs"));
    }

    #[test]
    fn test_export_uses_camel_case_keys() {
        let json = serde_json::to_value(PageExport::new(vec![page(1, true)], None)).unwrap();
        assert!(json.get("exportedAt").is_some());
        assert_eq!(json["summary"]["totalPages"], 1);
        assert_eq!(json["pages"][0]["isPublished"], true);
    }
}
