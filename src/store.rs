use crate::model::Cookbook;
use crate::ImportError;
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;

pub const RECIPES_TABLE: &str = "recipes";
pub const INGREDIENTS_TABLE: &str = "ingredients";

/// Relational target of an import
pub struct RecipeStore {
    conn: Connection,
}

impl RecipeStore {
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, ImportError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn table_exists(&self, table: &str) -> Result<bool, ImportError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn ensure_absent(&self, table: &str) -> Result<(), ImportError> {
        if self.table_exists(table)? {
            return Err(ImportError::TableExists(table.to_string()));
        }
        Ok(())
    }

    /// Creates and fills `recipes`, then `ingredients`.
    ///
    /// Each table is written in its own transaction. If the second one fails
    /// the first stays in place; existing tables are never touched.
    pub fn load(&mut self, cookbook: &Cookbook) -> Result<(), ImportError> {
        self.write_recipes(cookbook)?;
        self.write_ingredients(cookbook)?;
        info!(
            "Loaded {} recipes and {} ingredients",
            cookbook.recipes.len(),
            cookbook.ingredients.len()
        );
        Ok(())
    }

    fn write_recipes(&mut self, cookbook: &Cookbook) -> Result<(), ImportError> {
        self.ensure_absent(RECIPES_TABLE)?;

        let tag_columns: Vec<String> = cookbook.tag_columns.iter().map(|c| quote(c)).collect();
        let mut create = String::from(
            "CREATE TABLE recipes (
                id                INTEGER PRIMARY KEY,
                name              TEXT NOT NULL UNIQUE,
                standard_portions INTEGER NOT NULL,
                source            TEXT,
                instructions      TEXT NOT NULL",
        );
        for column in &tag_columns {
            create.push_str(&format!(",\n                {column} TEXT"));
        }
        create.push_str("\n            )");

        let mut columns = vec!["id", "name", "standard_portions", "source", "instructions"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        columns.extend(tag_columns);
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let insert = format!(
            "INSERT INTO recipes ({}) VALUES ({placeholders})",
            columns.join(", ")
        );

        let tx = self.conn.transaction()?;
        tx.execute_batch(&create)?;
        {
            let mut stmt = tx.prepare(&insert)?;
            for recipe in &cookbook.recipes {
                let mut values = vec![
                    Value::Integer(recipe.id),
                    Value::Text(recipe.name.clone()),
                    Value::Integer(i64::from(recipe.standard_portions)),
                    recipe.source.clone().map_or(Value::Null, Value::Text),
                    Value::Text(recipe.instructions.clone()),
                ];
                values.extend(cookbook.tag_columns.iter().map(|c| {
                    Value::Text(recipe.tags.get(c).cloned().unwrap_or_default())
                }));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_ingredients(&mut self, cookbook: &Cookbook) -> Result<(), ImportError> {
        self.ensure_absent(INGREDIENTS_TABLE)?;

        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "CREATE TABLE ingredients (
                id        INTEGER PRIMARY KEY,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id),
                name      TEXT NOT NULL,
                section   TEXT NOT NULL,
                amount    REAL,
                unit      TEXT NOT NULL
            );
            CREATE INDEX idx_ingredients_recipe ON ingredients(recipe_id);",
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ingredients (id, recipe_id, name, section, amount, unit)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for i in &cookbook.ingredients {
                stmt.execute(params![
                    i.id,
                    i.recipe_id,
                    i.name,
                    i.section,
                    i.stored_amount(),
                    i.unit,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
