//! 大学目录：外部检索服务 + 学费 / 录取率估计
//!
//! 检索失败不报错，返回空列表并记录日志。

pub mod enrich;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

pub use enrich::{country_estimates, enrich, format_inr, RawUniversity, University};

use crate::config::DirectorySection;

/// 大学目录接口
#[async_trait]
pub trait UniversityDirectory: Send + Sync {
    /// 按国家 / 名称过滤；失败时返回空列表
    async fn search(&self, country: Option<&str>, name: Option<&str>) -> Vec<RawUniversity>;
}

/// Hipolabs 公共大学目录
pub struct HipolabsDirectory {
    client: Client,
    base_url: String,
}

impl HipolabsDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("counsellor/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client ({}), using defaults", e);
                Client::new()
            });
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(cfg: &DirectorySection) -> Self {
        Self::new(cfg.base_url.clone(), Duration::from_secs(cfg.timeout_secs))
    }

    async fn fetch(
        &self,
        country: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<RawUniversity>, reqwest::Error> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(c) = country.filter(|c| !c.trim().is_empty()) {
            params.push(("country", c));
        }
        if let Some(n) = name.filter(|n| !n.trim().is_empty()) {
            params.push(("name", n));
        }

        self.client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<RawUniversity>>()
            .await
    }
}

#[async_trait]
impl UniversityDirectory for HipolabsDirectory {
    async fn search(&self, country: Option<&str>, name: Option<&str>) -> Vec<RawUniversity> {
        match self.fetch(country, name).await {
            Ok(list) => {
                tracing::debug!(?country, count = list.len(), "Directory search");
                list
            }
            Err(e) => {
                tracing::warn!(?country, ?name, "Directory search failed, returning empty list: {}", e);
                Vec::new()
            }
        }
    }
}

/// 固定数据的目录（离线运行与测试）
#[derive(Debug, Default, Clone)]
pub struct StaticDirectory {
    records: Vec<RawUniversity>,
}

impl StaticDirectory {
    pub fn new(records: Vec<RawUniversity>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl UniversityDirectory for StaticDirectory {
    async fn search(&self, country: Option<&str>, name: Option<&str>) -> Vec<RawUniversity> {
        let contains = |field: &Option<String>, needle: &str| {
            field
                .as_deref()
                .map(|v| v.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false)
        };
        self.records
            .iter()
            .filter(|r| country.map_or(true, |c| r.country.as_deref() == Some(c)))
            .filter(|r| name.map_or(true, |n| contains(&r.name, n)))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_directory_returns_empty() {
        let dir = HipolabsDirectory::new("http://127.0.0.1:9/search", Duration::from_millis(500));
        assert!(dir.search(Some("Canada"), None).await.is_empty());
    }

    #[tokio::test]
    async fn test_static_directory_filters() {
        let dir = StaticDirectory::new(vec![
            RawUniversity::new("University of Toronto", "Canada"),
            RawUniversity::new("McGill University", "Canada"),
            RawUniversity::new("University of Oxford", "United Kingdom"),
        ]);
        assert_eq!(dir.search(Some("Canada"), None).await.len(), 2);
        assert_eq!(dir.search(Some("Canada"), Some("mcgill")).await.len(), 1);
        assert_eq!(dir.search(None, None).await.len(), 3);
    }
}
