use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::client::WikiClient;

const LIST_PAGES: &str = r#"query {
    pages {
      list(limit: 500, orderBy: PATH) {
        id
        path
        title
        isPublished
        locale
      }
    }
  }"#;

const DELETE_PAGE: &str = r#"mutation ($id: Int!) {
    pages {
      delete(id: $id) {
        responseResult {
          succeeded
          errorCode
          message
        }
      }
    }
  }"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: u64,
    pub path: String,
    pub title: String,
    pub locale: String,
    pub is_published: bool,
}

impl Page {
    /// `path - title`, as shown in lists and confirmation dialogs
    pub fn label(&self) -> String {
        format!("{} - {}", self.path, self.title)
    }
}

/// Outcome reported by Wiki.js mutations
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseResult {
    pub succeeded: bool,
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub message: Option<String>,
}

impl ResponseResult {
    pub fn ok() -> Self {
        Self {
            succeeded: true,
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            error_code: 1,
            message: Some(message.into()),
        }
    }

    pub fn describe(&self) -> String {
        match &self.message {
            Some(message) if !message.is_empty() => message.clone(),
            _ => format!("error code {}", self.error_code),
        }
    }
}

/// Page operations the CLI and TUI depend on
#[async_trait]
pub trait PageApi: Send + Sync {
    async fn list_pages(&self) -> Result<Vec<Page>>;
    async fn delete_page(&self, id: u64) -> Result<ResponseResult>;
}

#[derive(Deserialize)]
struct ListData {
    pages: PageList,
}

#[derive(Deserialize)]
struct PageList {
    list: Vec<Page>,
}

#[derive(Deserialize)]
struct DeleteData {
    pages: DeleteField,
}

#[derive(Deserialize)]
struct DeleteField {
    delete: DeletePayload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeletePayload {
    response_result: ResponseResult,
}

#[async_trait]
impl PageApi for WikiClient {
    async fn list_pages(&self) -> Result<Vec<Page>> {
        let data: ListData = self.graphql(LIST_PAGES, json!({})).await?;
        log::debug!("Fetched {} pages", data.pages.list.len());
        Ok(data.pages.list)
    }

    async fn delete_page(&self, id: u64) -> Result<ResponseResult> {
        let data: DeleteData = self.graphql(DELETE_PAGE, json!({ "id": id })).await?;
        Ok(data.pages.delete.response_result)
    }
}
