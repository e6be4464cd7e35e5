use anyhow::Result;
use catalog_policy::PolicyLoader;
use tracing::info;

use crate::output;

pub fn list(dir: &str, marketplace: Option<&str>, format: &str) -> Result<()> {
    info!("Listing policies in {}", dir);

    let loader = PolicyLoader::from_dir(dir);
    let listing = loader.list_available_policies(marketplace);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if listing.is_empty() {
        output::print_info(&format!("No policies found in {}", dir));
        return Ok(());
    }

    for (marketplace, categories) in &listing {
        println!("{} ({} categories)", marketplace, categories.len());
        for category in categories {
            println!("  - {}", category);
        }
    }

    Ok(())
}
