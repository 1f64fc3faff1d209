//! Recipe use-case service.
//!
//! # Responsibility
//! - Provide add/list/search/detail/delete APIs over a repository.
//! - Normalize free-text input (trimming, blank-to-absent description)
//!   before it reaches persistence.
//!
//! # Invariants
//! - `add_recipe` returns the persisted detail view read back from
//!   storage, not an echo of its input.
//! - Service APIs never bypass repository validation or transaction
//!   contracts.

use crate::model::recipe::{
    IngredientEntry, NewRecipe, RecipeDetails, RecipeId, RecipeSummary, RecipeValidationError,
};
use crate::repo::recipe_repo::{RecipeRepository, RepoError, RepoResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for recipe use-cases.
#[derive(Debug)]
pub enum RecipeServiceError {
    /// Input failed validation before any SQL ran.
    Validation(RecipeValidationError),
    /// Target recipe does not exist.
    RecipeNotFound(RecipeId),
    /// Persistence-layer failure (uniqueness violations included).
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for RecipeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::RecipeNotFound(id) => write!(f, "recipe not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent recipe state: {details}")
            }
        }
    }
}

impl Error for RecipeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RecipeServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::RecipeNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Recipe service facade over repository implementations.
pub struct RecipeService<R: RecipeRepository> {
    repo: R,
}

impl<R: RecipeRepository> RecipeService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Ingests one recipe and returns its persisted detail view.
    ///
    /// # Contract
    /// - Name is trimmed; a blank name fails validation.
    /// - A blank description is stored as absent.
    /// - Instruction steps are trimmed and numbered from input order.
    /// - Atomic: on any fatal failure nothing from this call persists.
    pub fn add_recipe(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
        ingredients: Vec<IngredientEntry>,
        instructions: Vec<String>,
    ) -> Result<RecipeDetails, RecipeServiceError> {
        let input = NewRecipe {
            name: name.into().trim().to_string(),
            description: description.and_then(|value| normalize_text(&value)),
            ingredients,
            instructions: instructions
                .into_iter()
                .map(|step| step.trim().to_string())
                .collect(),
        };

        let recipe_id = self.repo.add_recipe(&input)?;
        self.repo
            .recipe_details(recipe_id)?
            .ok_or(RecipeServiceError::InconsistentState(
                "created recipe not found in read-back",
            ))
    }

    /// Lists all recipes ordered by name, case-insensitive.
    pub fn list_recipes(&self) -> RepoResult<Vec<RecipeSummary>> {
        self.repo.list_recipes()
    }

    /// Searches recipes whose name contains the term, case-insensitive.
    ///
    /// Blank terms and no-match terms both yield an empty list.
    pub fn search_recipes(&self, term: &str) -> RepoResult<Vec<RecipeSummary>> {
        self.repo.search_recipes(term)
    }

    /// Full detail view for one recipe; `None` when the id is unknown.
    pub fn recipe_details(&self, id: RecipeId) -> RepoResult<Option<RecipeDetails>> {
        self.repo.recipe_details(id)
    }

    /// Deletes one recipe with its links and steps.
    pub fn delete_recipe(&mut self, id: RecipeId) -> Result<(), RecipeServiceError> {
        self.repo.delete_recipe(id)?;
        Ok(())
    }
}

/// Trims free text; blank input becomes `None`.
pub fn normalize_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_text;

    #[test]
    fn normalize_text_trims_and_drops_blank() {
        assert_eq!(normalize_text("  fluffy  "), Some("fluffy".to_string()));
        assert_eq!(normalize_text("   "), None);
        assert_eq!(normalize_text(""), None);
    }
}
