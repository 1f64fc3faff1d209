//! Core domain logic for the cookbook recipe catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::recipe::{
    IngredientEntry, IngredientId, InstructionStep, NewRecipe, RecipeDetails, RecipeId,
    RecipeSummary, RecipeValidationError,
};
pub use repo::recipe_repo::{RecipeRepository, RepoError, RepoResult, SqliteRecipeRepository};
pub use service::recipe_service::{RecipeService, RecipeServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
