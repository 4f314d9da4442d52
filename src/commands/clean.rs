//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::Spacetraveling;

/// Remove every generated file
pub fn run(app: &Spacetraveling) -> Result<()> {
    if app.public_dir.exists() {
        fs::remove_dir_all(&app.public_dir)?;
        tracing::info!("Deleted: {:?}", app.public_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn test_clean_removes_public_dir() {
        let dir = tempfile::tempdir().unwrap();
        let app = Spacetraveling::with_config(dir.path(), SiteConfig::default());
        fs::create_dir_all(app.public_dir.join("post/hello")).unwrap();
        fs::write(app.public_dir.join("post/hello/index.html"), "<html>").unwrap();

        run(&app).unwrap();
        assert!(!app.public_dir.exists());

        // Nothing left to clean
        run(&app).unwrap();
    }
}
