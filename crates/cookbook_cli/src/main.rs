//! Interactive menu front end for the cookbook catalog.
//!
//! # Responsibility
//! - Collect and validate free-text input before it reaches core.
//! - Dispatch menu actions to `cookbook_core` and format the results.
//!
//! # Invariants
//! - Empty required fields and non-numeric ids are re-prompted here and
//!   never reach the storage layer.
//! - End-of-input on stdin exits (or returns to the menu) gracefully.

use cookbook_core::db::open_db;
use cookbook_core::{
    core_version, default_log_level, init_logging, IngredientEntry, RecipeService,
    RecipeServiceError, RepoError, SqliteRecipeRepository,
};
use log::warn;
use rusqlite::Connection;
use std::io::{self, Write};

const DEFAULT_DB_PATH: &str = "recipes.db";
const ENTRY_SENTINEL: &str = "done";

fn main() {
    setup_logging();

    let mut args = std::env::args().skip(1);
    let result = match args.next().as_deref() {
        Some("seed") => {
            let path = args.next().unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
            run_seed(&path)
        }
        Some(path) => run_menu(path),
        None => run_menu(DEFAULT_DB_PATH),
    };

    if let Err(message) = result {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn setup_logging() {
    let log_dir = std::env::current_dir()
        .map(|dir| dir.join("logs"))
        .ok()
        .and_then(|dir| dir.to_str().map(str::to_string));

    if let Some(log_dir) = log_dir {
        if let Err(message) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {message}");
        }
    }
}

fn run_menu(db_path: &str) -> Result<(), String> {
    let mut conn =
        open_db(db_path).map_err(|err| format!("cannot open catalog `{db_path}`: {err}"))?;

    println!("Cookbook {} — catalog at `{db_path}`", core_version());

    loop {
        print_menu();
        let Some(choice) = prompt("Enter your choice (1-5): ") else {
            println!("\nExiting.");
            return Ok(());
        };

        let outcome = match choice.as_str() {
            "1" => handle_add(&mut conn),
            "2" => handle_list(&mut conn),
            "3" => handle_search(&mut conn),
            "4" => handle_details(&mut conn),
            "5" => {
                println!("Goodbye!");
                return Ok(());
            }
            _ => {
                println!("Invalid choice. Please enter a number between 1 and 5.");
                continue;
            }
        };

        // `None` means stdin closed mid-dialog.
        if outcome.is_none() {
            println!("\nExiting.");
            return Ok(());
        }

        if prompt("\nPress Enter to continue...").is_none() {
            println!("\nExiting.");
            return Ok(());
        }
    }
}

fn print_menu() {
    println!("\n--- Recipe Catalog Menu ---");
    println!("1. Add a New Recipe");
    println!("2. List All Recipes");
    println!("3. Search Recipe by Name");
    println!("4. View Recipe Details");
    println!("5. Exit");
    println!("---------------------------");
}

/// Reads one trimmed line; `None` on end-of-input.
fn prompt(label: &str) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();

    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn prompt_nonempty(label: &str, complaint: &str) -> Option<String> {
    loop {
        let value = prompt(label)?;
        if !value.is_empty() {
            return Some(value);
        }
        println!("{complaint}");
    }
}

fn confirm(label: &str) -> Option<bool> {
    let answer = prompt(label)?;
    Some(answer.eq_ignore_ascii_case("yes"))
}

fn handle_add(conn: &mut Connection) -> Option<()> {
    println!("\n--- Add New Recipe ---");
    let name = prompt_nonempty("Enter Recipe Name: ", "Recipe name cannot be empty.")?;
    let description = prompt("Enter Recipe Description (optional): ")?;

    let ingredients = collect_ingredients()?;
    let instructions = collect_instructions()?;

    let repo = match SqliteRecipeRepository::try_new(conn) {
        Ok(repo) => repo,
        Err(err) => {
            println!("Failed to open catalog: {err}");
            return Some(());
        }
    };
    let mut service = RecipeService::new(repo);
    match service.add_recipe(
        name.clone(),
        (!description.is_empty()).then_some(description),
        ingredients,
        instructions,
    ) {
        Ok(details) => println!("\nRecipe '{}' added with ID {}.", details.name, details.id),
        Err(err) => report_add_error(&name, &err),
    }
    Some(())
}

fn collect_ingredients() -> Option<Vec<IngredientEntry>> {
    let mut ingredients = Vec::new();
    println!("\nEnter Ingredients (type '{ENTRY_SENTINEL}' when finished):");
    loop {
        let name = prompt("  Ingredient Name: ")?;
        if name.eq_ignore_ascii_case(ENTRY_SENTINEL) {
            if ingredients.is_empty() {
                println!("Warning: No ingredients added.");
                if !confirm("Are you sure you want to proceed without ingredients? (yes/no): ")? {
                    continue;
                }
            }
            return Some(ingredients);
        }
        if name.is_empty() {
            println!("  Ingredient name cannot be empty.");
            continue;
        }

        let quantity = prompt_nonempty(
            &format!("  Quantity for '{name}': "),
            "  Quantity cannot be empty.",
        )?;
        ingredients.push(IngredientEntry::new(name, quantity));
    }
}

fn collect_instructions() -> Option<Vec<String>> {
    let mut instructions = Vec::new();
    println!("\nEnter Instructions (one step per line, type '{ENTRY_SENTINEL}' when finished):");
    loop {
        let step = prompt(&format!("  Step {}: ", instructions.len() + 1))?;
        if step.eq_ignore_ascii_case(ENTRY_SENTINEL) {
            if instructions.is_empty() {
                println!("Warning: No instructions added.");
                if !confirm("Are you sure you want to proceed without instructions? (yes/no): ")? {
                    continue;
                }
            }
            return Some(instructions);
        }
        if step.is_empty() {
            println!("  Instruction step cannot be empty.");
            continue;
        }
        instructions.push(step);
    }
}

fn report_add_error(name: &str, err: &RecipeServiceError) {
    match err {
        RecipeServiceError::Repo(RepoError::Uniqueness { constraint, .. })
            if *constraint == "recipes.name" =>
        {
            println!("\nFailed to add recipe: a recipe named '{name}' already exists.");
        }
        RecipeServiceError::Repo(RepoError::Uniqueness { value, .. }) => {
            println!("\nFailed to add recipe: ingredient '{value}' is listed more than once.");
        }
        other => println!("\nFailed to add recipe: {other}"),
    }
}

fn handle_list(conn: &mut Connection) -> Option<()> {
    println!("\n--- All Recipes ---");
    with_service(conn, |service| match service.list_recipes() {
        Ok(recipes) if recipes.is_empty() => println!("No recipes found in the catalog."),
        Ok(recipes) => {
            for recipe in recipes {
                println!("ID: {:<5} Name: {}", recipe.id, recipe.name);
            }
        }
        Err(err) => println!("Error listing recipes: {err}"),
    });
    Some(())
}

fn handle_search(conn: &mut Connection) -> Option<()> {
    println!("\n--- Search Recipe by Name ---");
    let term = prompt("Enter search term: ")?;
    if term.is_empty() {
        println!("Search term cannot be empty.");
        return Some(());
    }

    with_service(conn, |service| match service.search_recipes(&term) {
        Ok(recipes) if recipes.is_empty() => {
            println!("No recipes found matching '{term}'.");
        }
        Ok(recipes) => {
            println!("\nSearch Results:");
            for recipe in recipes {
                println!("ID: {:<5} Name: {}", recipe.id, recipe.name);
            }
        }
        Err(err) => println!("Error searching recipes: {err}"),
    });
    Some(())
}

fn handle_details(conn: &mut Connection) -> Option<()> {
    println!("\n--- View Recipe Details ---");
    let recipe_id = loop {
        let raw = prompt_nonempty(
            "Enter the ID of the recipe to view: ",
            "Recipe ID cannot be empty.",
        )?;
        match raw.parse::<i64>() {
            Ok(id) => break id,
            Err(_) => println!("Invalid ID. Please enter a number."),
        }
    };

    with_service(conn, |service| match service.recipe_details(recipe_id) {
        Ok(Some(details)) => {
            println!("\n------------------------------");
            println!("Recipe: {} (ID: {})", details.name, details.id);
            println!(
                "Description: {}",
                details.description.as_deref().unwrap_or("N/A")
            );
            println!("\nIngredients:");
            if details.ingredients.is_empty() {
                println!("  (No ingredients listed)");
            }
            for ingredient in &details.ingredients {
                println!("  - {} ({})", ingredient.name, ingredient.quantity);
            }
            println!("\nInstructions:");
            if details.instructions.is_empty() {
                println!("  (No instructions listed)");
            }
            for step in &details.instructions {
                println!("  {}. {}", step.step_number, step.description);
            }
            println!("------------------------------");
        }
        Ok(None) => println!("Recipe with ID {recipe_id} not found."),
        Err(err) => println!("Error retrieving details for recipe ID {recipe_id}: {err}"),
    });
    Some(())
}

fn with_service<'conn>(
    conn: &'conn mut Connection,
    action: impl FnOnce(&mut RecipeService<SqliteRecipeRepository<'conn>>),
) {
    match SqliteRecipeRepository::try_new(conn) {
        Ok(repo) => {
            let mut service = RecipeService::new(repo);
            action(&mut service);
        }
        Err(err) => println!("Failed to open catalog: {err}"),
    }
}

fn run_seed(db_path: &str) -> Result<(), String> {
    let mut conn =
        open_db(db_path).map_err(|err| format!("cannot open catalog `{db_path}`: {err}"))?;

    println!("--- Inserting Sample Recipes ---");
    println!("Note: recipes whose names already exist are skipped.");

    let mut added = 0usize;
    let mut skipped = 0usize;
    for (name, description, ingredients, instructions) in sample_recipes() {
        let repo = SqliteRecipeRepository::try_new(&mut conn)
            .map_err(|err| format!("cannot open catalog `{db_path}`: {err}"))?;
        let mut service = RecipeService::new(repo);
        match service.add_recipe(name, Some(description.to_string()), ingredients, instructions) {
            Ok(details) => {
                println!("Added '{}' (ID {}).", details.name, details.id);
                added += 1;
            }
            Err(RecipeServiceError::Repo(RepoError::Uniqueness { value, .. })) => {
                println!("Skipped '{value}': already exists.");
                skipped += 1;
            }
            Err(other) => {
                warn!("event=seed module=cli status=error error={other}");
                println!("Skipped one recipe: {other}");
                skipped += 1;
            }
        }
    }

    println!("\nSample data summary: {added} added, {skipped} skipped.");
    Ok(())
}

type SampleRecipe = (
    &'static str,
    &'static str,
    Vec<IngredientEntry>,
    Vec<String>,
);

fn sample_recipes() -> Vec<SampleRecipe> {
    vec![
        (
            "Classic Pancakes",
            "Fluffy pancakes perfect for breakfast.",
            vec![
                IngredientEntry::new("All-Purpose Flour", "1 1/2 cups"),
                IngredientEntry::new("Baking Powder", "3 1/2 tsp"),
                IngredientEntry::new("Salt", "1 tsp"),
                IngredientEntry::new("White Sugar", "1 tbsp"),
                IngredientEntry::new("Milk", "1 1/4 cups"),
                IngredientEntry::new("Egg", "1"),
                IngredientEntry::new("Butter", "3 tbsp, melted"),
            ],
            vec![
                "In a large bowl, sift together the flour, baking powder, salt and sugar."
                    .to_string(),
                "Make a well in the center and pour in the milk, egg and melted butter; mix until smooth."
                    .to_string(),
                "Heat a lightly oiled griddle over medium high heat.".to_string(),
                "Pour the batter onto the griddle, about 1/4 cup per pancake.".to_string(),
                "Brown on both sides and serve hot.".to_string(),
            ],
        ),
        (
            "Simple Guacamole",
            "Easy and quick guacamole dip.",
            vec![
                IngredientEntry::new("Avocado", "3 ripe"),
                IngredientEntry::new("Lime", "1, juiced"),
                IngredientEntry::new("Salt", "1 tsp"),
                IngredientEntry::new("Onion", "1/2 cup, diced"),
                IngredientEntry::new("Cilantro", "3 tbsp, chopped"),
                IngredientEntry::new("Tomato", "2 roma, diced"),
            ],
            vec![
                "Cut avocados in half, remove pit and scoop flesh into a mixing bowl.".to_string(),
                "Gently mash the avocado with a fork.".to_string(),
                "Add lime juice and salt, stir to combine.".to_string(),
                "Stir in onion, cilantro and tomatoes.".to_string(),
                "Serve immediately with tortilla chips.".to_string(),
            ],
        ),
        (
            "Basic Omelette",
            "A fundamental omelette recipe.",
            vec![
                IngredientEntry::new("Egg", "2 large"),
                IngredientEntry::new("Milk", "2 tbsp"),
                IngredientEntry::new("Salt", "Pinch"),
                IngredientEntry::new("Butter", "1 tsp"),
            ],
            vec![
                "Whisk eggs, milk and salt in a small bowl until blended.".to_string(),
                "Heat butter in a nonstick skillet over medium-high heat.".to_string(),
                "Pour in the egg mixture; gently move cooked portions toward the center."
                    .to_string(),
                "When no visible liquid egg remains, fold in half and slide onto a plate."
                    .to_string(),
            ],
        ),
    ]
}
