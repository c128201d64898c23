use std::collections::BTreeMap;

use crate::contract::model::{RecipeIngredientLine, ShoppingListLine};

/// Sum amounts per `(name, unit)` across all cart rows.
///
/// Output is ordered by name, then unit.
pub fn aggregate<I>(rows: I) -> Vec<ShoppingListLine>
where
    I: IntoIterator<Item = RecipeIngredientLine>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        let key = (row.ingredient.name, row.ingredient.measurement_unit);
        *totals.entry(key).or_insert(0) += i64::from(row.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| ShoppingListLine {
            name,
            measurement_unit,
            total_amount,
        })
        .collect()
}

/// Plain-text document, one `"{name} ({unit}) - {amount}"` line per entry.
pub fn render(lines: &[ShoppingListLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{} ({}) - {}", l.name, l.measurement_unit, l.total_amount))
        .collect::<Vec<_>>()
        .join("\n")
}
