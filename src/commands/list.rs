//! List site content

use anyhow::Result;

use crate::content::PostResolver;
use crate::prismic::ContentSource;
use crate::Spacetraveling;

/// List content known to the content source
pub async fn run(app: &Spacetraveling, source: &dyn ContentSource, content_type: &str) -> Result<()> {
    let resolver = PostResolver::new(source, &app.config.prismic.document_type);

    match content_type {
        "slug" | "slugs" => {
            let slugs = resolver.list_slugs().await?;
            println!("Slugs ({}):", slugs.len());
            for slug in slugs {
                println!("  /post/{}", slug);
            }
        }
        "post" | "posts" => {
            let posts = resolver.list_posts().await?;
            println!("Posts ({}):", posts.len());
            for post in posts {
                let date = post
                    .first_publication_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "draft".to_string());
                println!("  {} - {} [{}]", date, post.data.title, post.uid);
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, slug", content_type);
        }
    }

    Ok(())
}
