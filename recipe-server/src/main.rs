//! Recipe server: `recipe-server [path/to/recipe.yaml]`.
//! Without a path the recipe comes from CONFIG_YAML / CONFIG_JSON or a recipe file in the working directory.

use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = recipe_api::load_auto(path.as_deref())?;
    recipe_api::init_logging(&config.logging)?;
    tracing::info!(
        modules = config.modules.len(),
        databases = config.databases.len(),
        "recipe loaded"
    );

    recipe_api::run(config).await?;
    Ok(())
}
