//! Recipes command for listing crafting costs.

use std::io::Write;

use anyhow::Result;
use loot_core::CostTable;

use crate::report::format_number;

pub fn run<W: Write>(writer: &mut W, recipes: &CostTable) -> Result<()> {
    if recipes.is_empty() {
        writeln!(writer, "No recipes configured.")?;
        return Ok(());
    }

    for (name, recipe) in recipes.iter() {
        let currency = i64::try_from(recipe.currency).unwrap_or(i64::MAX);
        writeln!(writer, "{name}: {} Yang", format_number(currency))?;
        for (material, quantity) in &recipe.materials {
            writeln!(writer, "  {material} x{quantity}")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use loot_core::Recipe;

    #[test]
    fn lists_recipes_with_materials() {
        let table: CostTable = [(
            "Owl Pass".to_string(),
            Recipe {
                currency: 2_000_000,
                materials: [("Piece [L]", 1), ("Shard", 500)]
                    .into_iter()
                    .map(|(name, qty)| (name.to_string(), qty))
                    .collect(),
            },
        )]
        .into_iter()
        .collect();

        let mut output = Vec::new();
        run(&mut output, &table).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Owl Pass: 2,000,000 Yang
          Piece [L] x1
          Shard x500
        ");
    }

    #[test]
    fn builtin_table_lists_every_pass() {
        let mut output = Vec::new();
        run(&mut output, &CostTable::builtin()).unwrap();

        let output = String::from_utf8(output).unwrap();
        let headers = output.lines().filter(|l| !l.starts_with(' ')).count();
        assert_eq!(headers, 9);
        assert!(output.contains("Map to the Abandoned Fortress: 7,500,000 Yang"));
    }
}
