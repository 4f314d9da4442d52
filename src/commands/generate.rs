//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::prismic::ContentSource;
use crate::Spacetraveling;

/// Generate the static site from a content source
///
/// Every post is attempted; the build fails afterwards if any of them could
/// not be generated.
pub async fn run(app: &Spacetraveling, source: &dyn ContentSource) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(app)?;
    let report = generator.generate(source).await?;

    for slug in &report.skipped {
        tracing::info!("Skipped missing post: {}", slug);
    }

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} posts in {:.2}s",
        report.generated.len(),
        duration.as_secs_f64()
    );

    if !report.failed.is_empty() {
        let slugs: Vec<&str> = report.failed.iter().map(|(slug, _)| slug.as_str()).collect();
        anyhow::bail!(
            "Failed to generate {} post(s): {}",
            slugs.len(),
            slugs.join(", ")
        );
    }

    Ok(())
}
