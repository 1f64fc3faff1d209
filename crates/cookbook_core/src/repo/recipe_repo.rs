//! Recipe repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Own the one multi-step protocol in the system: the all-or-nothing
//!   recipe ingestion transaction.
//! - Provide list/search/detail/delete queries over the four catalog
//!   tables.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `add_recipe` either persists the full recipe (row, valid links, all
//!   steps) or nothing at all, including ingredient rows created by the
//!   same call.
//! - Step numbers are assigned from input order, 1-based, gapless.
//! - Uniqueness violations surface as `RepoError::Uniqueness`, never as a
//!   raw SQLite error.

use crate::db::DbError;
use crate::db::migrations::latest_version;
use crate::model::recipe::{
    IngredientEntry, IngredientId, InstructionStep, NewRecipe, RecipeDetails, RecipeId,
    RecipeSummary, RecipeValidationError,
};
use crate::search::name_query::build_like_pattern;
use log::{info, warn};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const SUMMARY_SELECT_SQL: &str = "SELECT id, name FROM recipes";
const SUMMARY_ORDER_SQL: &str = "ORDER BY name COLLATE NOCASE ASC, id ASC";

/// Columns every repository connection must provide, per table.
const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("recipes", &["id", "name", "description"]),
    ("ingredients", &["id", "name"]),
    ("instructions", &["id", "recipe_id", "step_number", "description"]),
    (
        "recipe_ingredients",
        &["id", "recipe_id", "ingredient_id", "quantity"],
    ),
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for recipe persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(RecipeValidationError),
    Db(DbError),
    NotFound(RecipeId),
    /// A case-insensitive uniqueness rule was violated.
    Uniqueness {
        constraint: &'static str,
        value: String,
    },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "recipe not found: {id}"),
            Self::Uniqueness { constraint, value } => {
                write!(f, "uniqueness violation on {constraint}: `{value}`")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; run migrations first"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecipeValidationError> for RepoError {
    fn from(value: RecipeValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for catalog operations.
pub trait RecipeRepository {
    /// Persists a recipe with its links and steps in one transaction.
    fn add_recipe(&mut self, recipe: &NewRecipe) -> RepoResult<RecipeId>;
    /// Returns the id of the named ingredient, inserting it when absent.
    fn ensure_ingredient(&mut self, name: &str) -> RepoResult<IngredientId>;
    /// Lists all recipes ordered by name, case-insensitive.
    fn list_recipes(&self) -> RepoResult<Vec<RecipeSummary>>;
    /// Case-insensitive substring match on recipe name.
    fn search_recipes(&self, term: &str) -> RepoResult<Vec<RecipeSummary>>;
    /// Full detail view for one recipe; `None` when the id is unknown.
    fn recipe_details(&self, id: RecipeId) -> RepoResult<Option<RecipeDetails>>;
    /// Deletes one recipe; links and steps go with it via cascade.
    fn delete_recipe(&mut self, id: RecipeId) -> RepoResult<()>;
}

/// SQLite-backed recipe repository over a migrated connection.
pub struct SqliteRecipeRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteRecipeRepository<'conn> {
    /// Constructs a repository, verifying the connection carries the
    /// expected schema version and tables.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RecipeRepository for SqliteRecipeRepository<'_> {
    fn add_recipe(&mut self, recipe: &NewRecipe) -> RepoResult<RecipeId> {
        recipe.validate()?;
        let name = recipe.name.trim();

        // Why: IMMEDIATE takes the write lock up front, so the lookups and
        // inserts below observe one consistent snapshot.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let recipe_id = insert_recipe_row(&tx, name, recipe.description.as_deref())?;

        let mut linked = 0usize;
        for entry in &recipe.ingredients {
            if !entry.is_complete() {
                warn!(
                    "event=ingredient_skip module=repo status=skipped recipe_id={recipe_id} reason=blank_field"
                );
                continue;
            }
            let ingredient_name = entry.name.trim();
            let ingredient_id = resolve_ingredient_id(&tx, ingredient_name)?;
            link_ingredient(&tx, recipe_id, ingredient_id, ingredient_name, entry)?;
            linked += 1;
        }

        for (index, step) in recipe.instructions.iter().enumerate() {
            tx.execute(
                "INSERT INTO instructions (recipe_id, step_number, description)
                 VALUES (?1, ?2, ?3);",
                params![recipe_id, index as i64 + 1, step],
            )?;
        }

        // Drop of an uncommitted `tx` rolls everything back, ingredient
        // inserts included.
        tx.commit()?;
        info!(
            "event=recipe_add module=repo status=ok recipe_id={recipe_id} ingredients={linked} steps={}",
            recipe.instructions.len()
        );
        Ok(recipe_id)
    }

    fn ensure_ingredient(&mut self, name: &str) -> RepoResult<IngredientId> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RecipeValidationError::EmptyIngredientName.into());
        }
        resolve_ingredient_id(self.conn, trimmed)
    }

    fn list_recipes(&self) -> RepoResult<Vec<RecipeSummary>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SUMMARY_SELECT_SQL} {SUMMARY_ORDER_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut recipes = Vec::new();
        while let Some(row) = rows.next()? {
            recipes.push(RecipeSummary {
                id: row.get("id")?,
                name: row.get("name")?,
            });
        }
        Ok(recipes)
    }

    fn search_recipes(&self, term: &str) -> RepoResult<Vec<RecipeSummary>> {
        let Some(pattern) = build_like_pattern(term) else {
            return Ok(Vec::new());
        };

        let mut stmt = self.conn.prepare(&format!(
            "{SUMMARY_SELECT_SQL} WHERE name LIKE ?1 ESCAPE '\\' {SUMMARY_ORDER_SQL};"
        ))?;
        let mut rows = stmt.query([pattern.as_str()])?;
        let mut recipes = Vec::new();
        while let Some(row) = rows.next()? {
            recipes.push(RecipeSummary {
                id: row.get("id")?,
                name: row.get("name")?,
            });
        }
        Ok(recipes)
    }

    fn recipe_details(&self, id: RecipeId) -> RepoResult<Option<RecipeDetails>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM recipes WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let details = RecipeDetails {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            ingredients: load_ingredients(self.conn, id)?,
            instructions: load_instructions(self.conn, id)?,
        };
        Ok(Some(details))
    }

    fn delete_recipe(&mut self, id: RecipeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM recipes WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        info!("event=recipe_delete module=repo status=ok recipe_id={id}");
        Ok(())
    }
}

fn insert_recipe_row(
    tx: &Transaction<'_>,
    name: &str,
    description: Option<&str>,
) -> RepoResult<RecipeId> {
    match tx.execute(
        "INSERT INTO recipes (name, description) VALUES (?1, ?2);",
        params![name, description],
    ) {
        Ok(_) => Ok(tx.last_insert_rowid()),
        Err(err) if is_unique_violation(&err) => {
            warn!(
                "event=recipe_add module=repo status=error error_code=unique_violation name={name}"
            );
            Err(RepoError::Uniqueness {
                constraint: "recipes.name",
                value: name.to_string(),
            })
        }
        Err(err) => Err(err.into()),
    }
}

/// Case-insensitive lookup-or-insert for one ingredient name.
///
/// Works on a plain connection or inside a transaction; during ingestion it
/// is called on the transaction so a rollback removes fresh rows too.
fn resolve_ingredient_id(conn: &Connection, name: &str) -> RepoResult<IngredientId> {
    let mut stmt = conn.prepare("SELECT id FROM ingredients WHERE name = ?1 COLLATE NOCASE;")?;
    let mut rows = stmt.query([name])?;
    if let Some(row) = rows.next()? {
        return Ok(row.get(0)?);
    }

    match conn.execute("INSERT INTO ingredients (name) VALUES (?1);", [name]) {
        Ok(_) => {
            info!("event=ingredient_add module=repo status=ok name={name}");
            Ok(conn.last_insert_rowid())
        }
        Err(err) if is_unique_violation(&err) => Err(RepoError::Uniqueness {
            constraint: "ingredients.name",
            value: name.to_string(),
        }),
        Err(err) => Err(err.into()),
    }
}

fn link_ingredient(
    tx: &Transaction<'_>,
    recipe_id: RecipeId,
    ingredient_id: IngredientId,
    ingredient_name: &str,
    entry: &IngredientEntry,
) -> RepoResult<()> {
    match tx.execute(
        "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity)
         VALUES (?1, ?2, ?3);",
        params![recipe_id, ingredient_id, entry.quantity.trim()],
    ) {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => {
            warn!(
                "event=recipe_add module=repo status=error error_code=unique_violation recipe_id={recipe_id} ingredient={ingredient_name}"
            );
            Err(RepoError::Uniqueness {
                constraint: "recipe_ingredients.recipe_id+ingredient_id",
                value: ingredient_name.to_string(),
            })
        }
        Err(err) => Err(err.into()),
    }
}

fn load_ingredients(conn: &Connection, recipe_id: RecipeId) -> RepoResult<Vec<IngredientEntry>> {
    let mut stmt = conn.prepare(
        "SELECT i.name, ri.quantity
         FROM recipe_ingredients ri
         INNER JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE ri.recipe_id = ?1
         ORDER BY i.name COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([recipe_id])?;
    let mut ingredients = Vec::new();
    while let Some(row) = rows.next()? {
        ingredients.push(IngredientEntry {
            name: row.get("name")?,
            quantity: row.get("quantity")?,
        });
    }
    Ok(ingredients)
}

fn load_instructions(conn: &Connection, recipe_id: RecipeId) -> RepoResult<Vec<InstructionStep>> {
    let mut stmt = conn.prepare(
        "SELECT step_number, description
         FROM instructions
         WHERE recipe_id = ?1
         ORDER BY step_number ASC;",
    )?;
    let mut rows = stmt.query([recipe_id])?;
    let mut steps = Vec::new();
    while let Some(row) = rows.next()? {
        steps.push(InstructionStep {
            step_number: row.get("step_number")?,
            description: row.get("description")?,
        });
    }
    Ok(steps)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(inner, message) => {
            inner.code == rusqlite::ErrorCode::ConstraintViolation
                && message.as_deref().is_some_and(|m| m.contains("UNIQUE"))
        }
        _ => false,
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in REQUIRED_SCHEMA.iter().copied() {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for column in columns.iter().copied() {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
