use anyhow::{Context, Result, bail};
use catalog_policy::{parse_policy_yaml, validate_policy_structure};
use serde_json::json;
use tracing::info;

use crate::output;

pub fn execute(policy_path: &str, format: &str) -> Result<()> {
    info!("Checking policy file: {}", policy_path);

    let content = std::fs::read_to_string(policy_path)
        .with_context(|| format!("Failed to read policy file: {}", policy_path))?;
    let policy = parse_policy_yaml(&content)
        .with_context(|| format!("Failed to parse policy file: {}", policy_path))?;

    let (valid, errors) = validate_policy_structure(&policy);

    if format == "json" {
        let report = json!({
            "valid": valid,
            "marketplace": policy.marketplace,
            "category": policy.category,
            "version": policy.version,
            "fields": policy.fields.keys().collect::<Vec<_>>(),
            "custom_attributes": policy.custom_attributes.keys().collect::<Vec<_>>(),
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_info(&format!(
            "Policy loaded: {}/{} (version: {})",
            policy.marketplace,
            policy.category,
            policy.version.as_deref().unwrap_or("N/A")
        ));

        println!("\nPolicy Summary:");
        println!("  Fields:            {}", policy.fields.len());
        for (name, rule) in &policy.fields {
            let required = if rule.required { "required" } else { "optional" };
            println!("    - {} ({})", name, required);
        }
        println!("  Custom attributes: {}", policy.custom_attributes.len());
        println!("  Error codes:       {}", policy.error_codes.len());
        println!("  Min images:        {}", policy.warnings.min_images);

        if valid {
            output::print_success("Policy structure is valid");
        } else {
            for error in &errors {
                output::print_error(error);
            }
        }
    }

    if !valid {
        bail!("Policy structure is invalid ({} errors)", errors.len());
    }

    Ok(())
}
