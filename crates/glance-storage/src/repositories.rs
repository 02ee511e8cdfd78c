// Repository layer for database operations

use anyhow::{anyhow, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ============================================
    // Websites
    // ============================================

    /// Insert a website. Returns None when the domain is already taken.
    pub async fn create_website(&self, input: CreateWebsite) -> Result<Option<WebsiteRow>> {
        let row = sqlx::query_as::<_, WebsiteRow>(
            r#"
            INSERT INTO websites (name, domain)
            VALUES ($1, $2)
            ON CONFLICT (domain) DO NOTHING
            RETURNING id, name, domain, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.domain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_website(&self, id: Uuid) -> Result<Option<WebsiteRow>> {
        let row = sqlx::query_as::<_, WebsiteRow>(
            r#"
            SELECT id, name, domain, created_at
            FROM websites
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_website_by_domain(&self, domain: &str) -> Result<Option<WebsiteRow>> {
        let row = sqlx::query_as::<_, WebsiteRow>(
            r#"
            SELECT id, name, domain, created_at
            FROM websites
            WHERE domain = $1
            "#,
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Website used by ingestion when only a domain is known: look up first,
    /// insert if absent. The unique constraint on domain plus the re-select
    /// below means two concurrent first-events for an unseen domain converge
    /// on a single row.
    pub async fn resolve_or_create_website(&self, domain: &str) -> Result<WebsiteRow> {
        if let Some(row) = self.get_website_by_domain(domain).await? {
            return Ok(row);
        }

        let inserted = self
            .create_website(CreateWebsite {
                name: domain.to_string(),
                domain: domain.to_string(),
            })
            .await?;

        match inserted {
            Some(row) => Ok(row),
            // Lost the insert race; the other writer's row is now visible
            None => self
                .get_website_by_domain(domain)
                .await?
                .ok_or_else(|| anyhow!("website vanished after conflicting insert: {domain}")),
        }
    }

    /// Websites with their traffic counters, newest first
    pub async fn list_websites(&self) -> Result<Vec<WebsiteStatsRow>> {
        let rows = sqlx::query_as::<_, WebsiteStatsRow>(
            r#"
            SELECT w.id, w.name, w.domain, w.created_at,
                   COUNT(pv.id) AS total_views,
                   COUNT(DISTINCT pv.session_id) AS unique_sessions
            FROM websites w
            LEFT JOIN page_views pv ON w.id = pv.website_id
            GROUP BY w.id
            ORDER BY w.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update_website_name(&self, id: Uuid, name: &str) -> Result<Option<WebsiteRow>> {
        let row = sqlx::query_as::<_, WebsiteRow>(
            r#"
            UPDATE websites
            SET name = $2
            WHERE id = $1
            RETURNING id, name, domain, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_website(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM websites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Page views
    // ============================================

    pub async fn insert_page_view(&self, input: NewPageView) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO page_views (
                website_id, session_id, path, referrer, user_agent, ip_address,
                country, browser, os, device_type,
                screen_width, screen_height, viewport_width, viewport_height,
                color_depth, pixel_ratio, language, timezone, timezone_offset,
                connection_type, downlink, rtt,
                load_time, dom_content_loaded, first_paint, first_contentful_paint,
                duration
            ) VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10,
                $11, $12, $13, $14,
                $15, $16, $17, $18, $19,
                $20, $21, $22,
                $23, $24, $25, $26,
                $27
            )
            "#,
        )
        .bind(input.website_id)
        .bind(&input.session_id)
        .bind(&input.path)
        .bind(&input.referrer)
        .bind(&input.user_agent)
        .bind(&input.ip_address)
        .bind(&input.country)
        .bind(&input.browser)
        .bind(&input.os)
        .bind(&input.device_type)
        .bind(input.screen_width)
        .bind(input.screen_height)
        .bind(input.viewport_width)
        .bind(input.viewport_height)
        .bind(input.color_depth)
        .bind(input.pixel_ratio)
        .bind(&input.language)
        .bind(&input.timezone)
        .bind(input.timezone_offset)
        .bind(&input.connection_type)
        .bind(input.downlink)
        .bind(input.rtt)
        .bind(input.load_time)
        .bind(input.dom_content_loaded)
        .bind(input.first_paint)
        .bind(input.first_contentful_paint)
        .bind(input.duration)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent page views for a website, newest first
    pub async fn recent_page_views(&self, website_id: Uuid, limit: i64) -> Result<Vec<PageViewRow>> {
        let rows = sqlx::query_as::<_, PageViewRow>(
            r#"
            SELECT id, website_id, session_id, path, referrer, country,
                   browser, os, device_type, duration, created_at
            FROM page_views
            WHERE website_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(website_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ============================================
    // Custom events
    // ============================================

    pub async fn insert_event(&self, input: NewEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (website_id, session_id, event_name, event_data, path)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(input.website_id)
        .bind(&input.session_id)
        .bind(&input.event_name)
        .bind(&input.event_data)
        .bind(&input.path)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent custom events for a website, newest first
    pub async fn recent_events(&self, website_id: Uuid, limit: i64) -> Result<Vec<EventRow>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, website_id, session_id, event_name, event_data, path, created_at
            FROM events
            WHERE website_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(website_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
