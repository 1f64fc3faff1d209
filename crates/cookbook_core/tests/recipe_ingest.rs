use cookbook_core::db::open_db_in_memory;
use cookbook_core::{
    IngredientEntry, InstructionStep, RecipeRepository, RecipeService, RecipeServiceError,
    RecipeValidationError, RepoError, SqliteRecipeRepository,
};
use rusqlite::Connection;

#[test]
fn add_recipe_roundtrip_preserves_step_order() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRecipeRepository::try_new(&mut conn).unwrap();
    let mut service = RecipeService::new(repo);

    let details = service
        .add_recipe(
            "Pancakes",
            Some("Breakfast classic.".to_string()),
            vec![IngredientEntry::new("Egg", "1")],
            vec!["Mix".to_string(), "Cook".to_string()],
        )
        .unwrap();

    assert_eq!(details.name, "Pancakes");
    assert_eq!(details.description.as_deref(), Some("Breakfast classic."));
    assert_eq!(details.ingredients, vec![IngredientEntry::new("Egg", "1")]);
    assert_eq!(
        details.instructions,
        vec![
            InstructionStep {
                step_number: 1,
                description: "Mix".to_string(),
            },
            InstructionStep {
                step_number: 2,
                description: "Cook".to_string(),
            },
        ]
    );
}

#[test]
fn duplicate_name_any_case_fails_and_leaves_table_unchanged() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteRecipeRepository::try_new(&mut conn).unwrap();
        let mut service = RecipeService::new(repo);
        service
            .add_recipe("Pancakes", None, Vec::new(), Vec::new())
            .unwrap();

        let err = service
            .add_recipe("PANCAKES", None, Vec::new(), Vec::new())
            .unwrap_err();
        assert!(matches!(
            err,
            RecipeServiceError::Repo(RepoError::Uniqueness {
                constraint: "recipes.name",
                ..
            })
        ));
    }

    assert_eq!(count(&conn, "recipes"), 1);
}

#[test]
fn shared_ingredient_resolves_to_one_row_across_recipes() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteRecipeRepository::try_new(&mut conn).unwrap();
        let mut service = RecipeService::new(repo);
        service
            .add_recipe(
                "Omelette",
                None,
                vec![IngredientEntry::new("Egg", "2 large")],
                Vec::new(),
            )
            .unwrap();
        service
            .add_recipe(
                "Fried Rice",
                None,
                vec![IngredientEntry::new("EGG", "1")],
                Vec::new(),
            )
            .unwrap();
    }

    assert_eq!(count(&conn, "ingredients"), 1);
    assert_eq!(count(&conn, "recipe_ingredients"), 2);
}

#[test]
fn ensure_ingredient_is_idempotent_and_case_insensitive() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRecipeRepository::try_new(&mut conn).unwrap();

    let first = repo.ensure_ingredient("Basil").unwrap();
    let second = repo.ensure_ingredient("  BASIL  ").unwrap();
    assert_eq!(first, second);

    let err = repo.ensure_ingredient("   ").unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(RecipeValidationError::EmptyIngredientName)
    ));
}

#[test]
fn duplicate_ingredient_entry_rolls_back_whole_recipe() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteRecipeRepository::try_new(&mut conn).unwrap();
        let mut service = RecipeService::new(repo);

        let err = service
            .add_recipe(
                "Omelette",
                None,
                vec![
                    IngredientEntry::new("Egg", "2 large"),
                    IngredientEntry::new("egg", "1"),
                ],
                vec!["Whisk".to_string(), "Fry".to_string()],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RecipeServiceError::Repo(RepoError::Uniqueness { .. })
        ));
    }

    assert_eq!(count(&conn, "recipes"), 0);
    assert_eq!(count(&conn, "recipe_ingredients"), 0);
    assert_eq!(count(&conn, "instructions"), 0);
    // Ingredient rows created by the aborted call roll back with it.
    assert_eq!(count(&conn, "ingredients"), 0);
}

#[test]
fn incomplete_ingredient_entries_are_skipped_not_fatal() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRecipeRepository::try_new(&mut conn).unwrap();
    let mut service = RecipeService::new(repo);

    let details = service
        .add_recipe(
            "Toast",
            None,
            vec![
                IngredientEntry::new("", "2 slices"),
                IngredientEntry::new("Butter", "   "),
                IngredientEntry::new("Bread", "2 slices"),
            ],
            vec!["Toast the bread.".to_string()],
        )
        .unwrap();

    assert_eq!(
        details.ingredients,
        vec![IngredientEntry::new("Bread", "2 slices")]
    );
}

#[test]
fn empty_ingredient_and_instruction_lists_are_accepted() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRecipeRepository::try_new(&mut conn).unwrap();
    let mut service = RecipeService::new(repo);

    let details = service
        .add_recipe("Ice Cubes", None, Vec::new(), Vec::new())
        .unwrap();
    assert!(details.ingredients.is_empty());
    assert!(details.instructions.is_empty());
}

#[test]
fn blank_name_fails_validation_before_storage() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteRecipeRepository::try_new(&mut conn).unwrap();
        let mut service = RecipeService::new(repo);

        let err = service
            .add_recipe("   ", None, Vec::new(), Vec::new())
            .unwrap_err();
        assert!(matches!(
            err,
            RecipeServiceError::Validation(RecipeValidationError::EmptyName)
        ));
    }

    assert_eq!(count(&conn, "recipes"), 0);
}

#[test]
fn add_recipe_trims_name_and_drops_blank_description() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRecipeRepository::try_new(&mut conn).unwrap();
    let mut service = RecipeService::new(repo);

    let details = service
        .add_recipe(
            "  Lemonade  ",
            Some("   ".to_string()),
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
    assert_eq!(details.name, "Lemonade");
    assert_eq!(details.description, None);
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let mut conn = Connection::open_in_memory().unwrap();

    let result = SqliteRecipeRepository::try_new(&mut conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_tables() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "PRAGMA user_version = {};",
        cookbook_core::db::migrations::latest_version()
    ))
    .unwrap();

    let result = SqliteRecipeRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("recipes"))
    ));
}

#[test]
fn ingested_recipe_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cookbook.db");

    {
        let mut conn = cookbook_core::db::open_db(&path).unwrap();
        let repo = SqliteRecipeRepository::try_new(&mut conn).unwrap();
        let mut service = RecipeService::new(repo);
        service
            .add_recipe(
                "Pancakes",
                None,
                vec![IngredientEntry::new("Egg", "1")],
                vec!["Mix".to_string()],
            )
            .unwrap();
    }

    let mut conn = cookbook_core::db::open_db(&path).unwrap();
    let repo = SqliteRecipeRepository::try_new(&mut conn).unwrap();
    let service = RecipeService::new(repo);
    let listed = service.list_recipes().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Pancakes");
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
