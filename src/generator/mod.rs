//! Generator module - builds post pages from the content source using the
//! built-in Tera templates

use anyhow::Result;
use chrono_tz::Tz;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use walkdir::WalkDir;

use crate::content::{
    edited_info, estimate_read_time, NavigationLinks, NavigationResolver, Post, PostResolver,
};
use crate::error::ContentError;
use crate::helpers::{date_xml, format_date};
use crate::prismic::{ContentSource, PreviewToken};
use crate::templates::{
    rich_text, CommentsData, PostPage, PostSummary, SectionData, SiteData, TemplateRenderer,
};
use crate::Spacetraveling;

/// Failure to produce a single post page
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("render failed: {0}")]
    Render(#[from] anyhow::Error),
}

/// Outcome of a full build
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// Slugs written to disk
    pub generated: Vec<String>,
    /// Slugs that disappeared between listing and fetching
    pub skipped: Vec<String>,
    /// Slugs that failed, with the reason
    pub failed: Vec<(String, String)>,
}

/// Static site generator
pub struct Generator {
    app: Spacetraveling,
    renderer: TemplateRenderer,
    tz: Tz,
}

impl Generator {
    /// Create a new generator
    pub fn new(app: &Spacetraveling) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;
        let tz = app.config.tz()?;

        Ok(Self {
            app: app.clone(),
            renderer,
            tz,
        })
    }

    /// Generate the entire site
    ///
    /// Failing to list posts aborts the build. A failure on one post is
    /// recorded in the report and the remaining posts are still generated.
    pub async fn generate(&self, source: &dyn ContentSource) -> Result<GenerateReport> {
        fs::create_dir_all(&self.app.public_dir)?;

        self.copy_static_assets()?;

        let resolver = PostResolver::new(source, self.doc_type());
        let slugs = resolver.list_slugs().await?;
        tracing::info!("Found {} posts", slugs.len());

        let mut report = GenerateReport::default();

        for slug in slugs {
            match self.build_post_html(source, &slug, None).await {
                Ok(html) => {
                    self.write_post(&slug, &html).await?;
                    report.generated.push(slug);
                }
                Err(PageError::Content(e)) if e.is_not_found() => {
                    tracing::warn!("Post {} vanished during generation, skipping", slug);
                    report.skipped.push(slug);
                }
                Err(e) => {
                    tracing::error!("Failed to generate post {}: {}", slug, e);
                    report.failed.push((slug, e.to_string()));
                }
            }
        }

        self.generate_index(source).await?;

        Ok(report)
    }

    /// Resolve a post with its neighbours and render it
    pub async fn build_post_html(
        &self,
        source: &dyn ContentSource,
        slug: &str,
        preview: Option<&PreviewToken>,
    ) -> Result<String, PageError> {
        let post = PostResolver::new(source, self.doc_type())
            .resolve_by_slug(slug, preview)
            .await?;
        let navigation = NavigationResolver::new(source, self.doc_type())
            .find_adjacent(&post.id, preview)
            .await?;

        let page = self.post_page(&post, navigation, preview.is_some());
        Ok(self.renderer.render_post(&self.site_data(), &page)?)
    }

    /// Assemble the view model for a post page
    pub fn post_page(&self, post: &Post, navigation: NavigationLinks, preview: bool) -> PostPage {
        let first_published = post
            .first_publication_date
            .map(|date| date.with_timezone(&self.tz));
        let edited = edited_info(post, self.tz);

        let comments = self.app.config.comments.repo.as_ref().map(|repo| CommentsData {
            repo: repo.clone(),
            issue_term: self.app.config.comments.issue_term.clone(),
            theme: self.app.config.comments.theme.clone(),
        });

        PostPage {
            uid: post.uid.clone(),
            title: post.data.title.clone(),
            subtitle: post.data.subtitle.clone(),
            author: post.data.author.clone(),
            banner_url: post.data.banner.url.clone(),
            date: first_published.as_ref().map(format_date),
            date_xml: first_published.as_ref().map(date_xml),
            read_time: estimate_read_time(post),
            edited: edited.formatted_edit_timestamp,
            sections: post
                .data
                .content
                .iter()
                .map(|section| SectionData {
                    heading: section.heading.clone(),
                    html: rich_text::as_html(&section.body),
                })
                .collect(),
            prev_post: navigation.prev_post,
            next_post: navigation.next_post,
            preview,
            comments,
        }
    }

    /// Output path of a post page
    pub fn post_output_path(&self, slug: &str) -> PathBuf {
        self.app
            .public_dir
            .join("post")
            .join(slug)
            .join("index.html")
    }

    /// Write a rendered post page
    pub async fn write_post(&self, slug: &str, html: &str) -> Result<PathBuf> {
        let output_path = self.post_output_path(slug);
        write_atomic(&output_path, html).await?;
        tracing::debug!("Generated post: {:?}", output_path);
        Ok(output_path)
    }

    /// Generate the home page listing every post
    async fn generate_index(&self, source: &dyn ContentSource) -> Result<()> {
        let posts = PostResolver::new(source, self.doc_type())
            .list_posts()
            .await?;

        let summaries: Vec<PostSummary> = posts
            .iter()
            .map(|post| PostSummary {
                uid: post.uid.clone(),
                title: post.data.title.clone(),
                subtitle: post.data.subtitle.clone(),
                author: post.data.author.clone(),
                date: post
                    .first_publication_date
                    .map(|date| format_date(&date.with_timezone(&self.tz))),
            })
            .collect();

        let html = self.renderer.render_index(&self.site_data(), &summaries)?;
        let output_path = self.app.public_dir.join("index.html");
        write_atomic(&output_path, &html).await?;
        tracing::debug!("Generated index: {:?}", output_path);

        Ok(())
    }

    /// Copy static assets (styles, images) into the public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.app.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.app.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
        }

        Ok(())
    }

    fn site_data(&self) -> SiteData {
        SiteData {
            title: self.app.config.title.clone(),
            description: self.app.config.description.clone(),
            url: self.app.config.url.clone(),
        }
    }

    fn doc_type(&self) -> &str {
        &self.app.config.prismic.document_type
    }
}

/// Write a file so readers see either the old or the new content, never a
/// partial one
async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("No parent directory for {:?}", path))?;
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = parent.join(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        COUNTER.fetch_add(1, AtomicOrdering::Relaxed)
    ));

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", tmp_path, e))?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        anyhow::bail!("Failed to write {:?}: {}", path, e);
    }

    Ok(())
}
