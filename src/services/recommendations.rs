//! 大学检索与推荐
//!
//! 推荐按偏好国家（最多 3 个）检索，按录取率分为 dream / target / safe。

use serde::Serialize;

use crate::core::CounsellorError;
use crate::directory::{enrich, University, UniversityDirectory};
use crate::store::CounsellorStore;

pub const DEFAULT_COUNTRIES: [&str; 3] = ["United States", "United Kingdom", "Canada"];
const MAX_COUNTRIES: usize = 3;
const PER_COUNTRY: usize = 15;
const PER_CATEGORY: usize = 5;

/// 录取率 < 40 为 dream，≥ 70 为 safe，其余为 target
pub fn category_for(acceptance_pct: u32) -> &'static str {
    if acceptance_pct < 40 {
        "dream"
    } else if acceptance_pct >= 70 {
        "safe"
    } else {
        "target"
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Recommendations {
    pub dream: Vec<University>,
    pub target: Vec<University>,
    pub safe: Vec<University>,
}

impl Recommendations {
    pub fn is_empty(&self) -> bool {
        self.dream.is_empty() && self.target.is_empty() && self.safe.is_empty()
    }

    /// (类别, 大学) 按 dream → target → safe
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &University)> {
        self.dream
            .iter()
            .map(|u| ("dream", u))
            .chain(self.target.iter().map(|u| ("target", u)))
            .chain(self.safe.iter().map(|u| ("safe", u)))
    }
}

/// 检索并补充估计值
pub async fn search_universities(
    directory: &dyn UniversityDirectory,
    country: Option<&str>,
    name: Option<&str>,
    max_records: usize,
) -> Vec<University> {
    let raw = directory.search(country, name).await;
    enrich(&raw, max_records)
}

/// 按用户偏好国家生成推荐
pub async fn recommend(
    store: &dyn CounsellorStore,
    directory: &dyn UniversityDirectory,
    user_id: &str,
    max_records: usize,
) -> Result<Recommendations, CounsellorError> {
    let preferred: Vec<String> = store
        .get_profile(user_id)
        .await?
        .map(|p| p.preferred_countries)
        .unwrap_or_default()
        .into_iter()
        .filter(|c| !c.trim().is_empty())
        .take(MAX_COUNTRIES)
        .collect();
    let countries: Vec<String> = if preferred.is_empty() {
        DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect()
    } else {
        preferred
    };

    let mut seen = std::collections::HashSet::new();
    let mut out = Recommendations::default();
    for country in &countries {
        let found = search_universities(directory, Some(country.as_str()), None, max_records).await;
        tracing::debug!(country = %country, count = found.len(), "Recommendation candidates");
        for uni in found.into_iter().take(PER_COUNTRY) {
            if !seen.insert(uni.name.clone()) {
                continue;
            }
            let bucket = match category_for(uni.acceptance_pct) {
                "dream" => &mut out.dream,
                "safe" => &mut out.safe,
                _ => &mut out.target,
            };
            if bucket.len() < PER_CATEGORY {
                bucket.push(uni);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{RawUniversity, StaticDirectory};
    use crate::models::ProfileUpdate;
    use crate::services::{accounts::signup, profile::update_profile};
    use crate::store::MemoryStore;

    fn directory() -> StaticDirectory {
        let mut records = Vec::new();
        for i in 0..8 {
            records.push(RawUniversity::new(&format!("US College {i}"), "United States"));
        }
        records.push(RawUniversity::new("TU Berlin", "Germany"));
        records.push(RawUniversity::new("University of Toronto", "Canada"));
        // 同名学校在多个国家出现时只保留第一次
        records.push(RawUniversity::new("University of Toronto", "United Kingdom"));
        StaticDirectory::new(records)
    }

    #[test]
    fn test_category_thresholds() {
        assert_eq!(category_for(35), "dream");
        assert_eq!(category_for(40), "target");
        assert_eq!(category_for(69), "target");
        assert_eq!(category_for(70), "safe");
    }

    #[tokio::test]
    async fn test_default_countries_and_caps() {
        let store = MemoryStore::new();
        let recs = recommend(&store, &directory(), "nobody", 80).await.unwrap();
        // United States 35% → dream（最多 5 个）；United Kingdom 40% → target
        assert_eq!(recs.dream.len(), 5);
        assert_eq!(recs.target.len(), 1);
        assert_eq!(recs.target[0].name, "University of Toronto");
        assert!(recs.safe.is_empty());
    }

    #[tokio::test]
    async fn test_preferred_countries() {
        let store = MemoryStore::new();
        let (user, _) = signup(&store, "r@x.com", "R").await.unwrap();
        update_profile(
            &store,
            &user.id,
            ProfileUpdate {
                preferred_countries: Some(vec!["Germany".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let recs = recommend(&store, &directory(), &user.id, 80).await.unwrap();
        let names: Vec<_> = recs.iter().map(|(cat, u)| (cat, u.name.as_str())).collect();
        assert_eq!(names, vec![("safe", "TU Berlin")]);
    }
}
