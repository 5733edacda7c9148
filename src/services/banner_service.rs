use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::database::models::{Banner, BannerInput};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, Page};
use crate::validation::{self, MAX_NAME_LEN};

const SEARCHABLE: &[&str] = &["title"];
const SORTABLE: &[&str] = &["title", "sort_order", "created_at", "updated_at"];

#[derive(Debug, Default, Deserialize)]
pub struct BannerFilters {
    /// `?active=true` returns only banners shown to clients
    pub active: Option<bool>,
}

pub struct BannerService {
    repo: Repository<Banner>,
}

impl BannerService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("banners", "Banner", pool),
        }
    }

    /// Display order unless the caller sorts explicitly
    pub async fn list(&self, mut data: FilterData, filters: BannerFilters, api: &ApiConfig) -> Result<Page<Banner>, ApiError> {
        if data.sort.is_none() {
            data.sort = Some("sort_order".to_string());
        }

        let mut filter = Filter::new("banners")?;
        filter.assign(data, SEARCHABLE, SORTABLE, api)?;
        filter.where_eq_opt("is_active", filters.active)?;
        Ok(filter.fetch_page(self.repo.pool()).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Banner, ApiError> {
        Ok(self.repo.select_404(id).await?)
    }

    pub async fn create(&self, input: BannerInput) -> Result<Banner, ApiError> {
        let title = validation::required_text(&validation::required(input.title, "title")?, "title", MAX_NAME_LEN)?;
        let image_url = validation::url(&validation::required(input.image_url, "image_url")?, "image_url")?;
        let link_url = validation::optional_url(input.link_url.as_deref(), "link_url")?;

        let banner = sqlx::query_as::<_, Banner>(
            "INSERT INTO banners (title, image_url, link_url, sort_order, is_active) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(&title)
        .bind(&image_url)
        .bind(link_url)
        .bind(input.sort_order.unwrap_or(0))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(self.repo.pool())
        .await?;

        Ok(banner)
    }

    pub async fn update(&self, id: Uuid, input: BannerInput) -> Result<Banner, ApiError> {
        let current = self.repo.select_404(id).await?;

        let title = match input.title {
            Some(title) => validation::required_text(&title, "title", MAX_NAME_LEN)?,
            None => current.title,
        };
        let image_url = match input.image_url {
            Some(url) => validation::url(&url, "image_url")?,
            None => current.image_url,
        };
        let link_url = match input.link_url {
            Some(url) => validation::optional_url(Some(&url), "link_url")?,
            None => current.link_url,
        };

        let banner = sqlx::query_as::<_, Banner>(
            "UPDATE banners SET title = $2, image_url = $3, link_url = $4, sort_order = $5, is_active = $6, \
             updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&title)
        .bind(&image_url)
        .bind(link_url)
        .bind(input.sort_order.unwrap_or(current.sort_order))
        .bind(input.is_active.unwrap_or(current.is_active))
        .fetch_one(self.repo.pool())
        .await?;

        Ok(banner)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Banner, ApiError> {
        Ok(self.repo.delete_404(id).await?)
    }
}
