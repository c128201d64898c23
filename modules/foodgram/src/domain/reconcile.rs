use std::collections::{HashMap, HashSet};

use crate::contract::model::{IngredientAmount, IngredientId};

/// A stored recipe-ingredient row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentRow {
    pub id: i32,
    pub ingredient_id: IngredientId,
    pub amount: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountUpdate {
    pub row_id: i32,
    pub amount: i32,
}

/// Minimal set of row mutations turning the current rows into the desired list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub inserts: Vec<IngredientAmount>,
    pub updates: Vec<AmountUpdate>,
    pub deletes: Vec<i32>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Diff `current` against `desired`.
///
/// `desired` must not contain duplicate ingredient ids; the service rejects
/// such submissions before planning. Rows whose amount already matches are
/// left alone.
pub fn plan_reconciliation(current: &[CurrentRow], desired: &[IngredientAmount]) -> ReconcilePlan {
    let by_ingredient: HashMap<IngredientId, &CurrentRow> =
        current.iter().map(|r| (r.ingredient_id, r)).collect();
    let wanted: HashSet<IngredientId> = desired.iter().map(|d| d.ingredient_id).collect();

    let mut plan = ReconcilePlan::default();
    for d in desired {
        match by_ingredient.get(&d.ingredient_id) {
            None => plan.inserts.push(*d),
            Some(row) if row.amount != d.amount => plan.updates.push(AmountUpdate {
                row_id: row.id,
                amount: d.amount,
            }),
            Some(_) => {}
        }
    }
    plan.deletes = current
        .iter()
        .filter(|r| !wanted.contains(&r.ingredient_id))
        .map(|r| r.id)
        .collect();
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOUR: i32 = 1;
    const EGG: i32 = 2;
    const MILK: i32 = 3;

    fn want(ingredient_id: i32, amount: i32) -> IngredientAmount {
        IngredientAmount {
            ingredient_id,
            amount,
        }
    }

    /// Apply a plan to an in-memory row set, allocating ids for inserts.
    fn apply(current: &[CurrentRow], plan: &ReconcilePlan) -> Vec<CurrentRow> {
        let mut rows: Vec<CurrentRow> = current
            .iter()
            .filter(|r| !plan.deletes.contains(&r.id))
            .copied()
            .collect();
        for u in &plan.updates {
            if let Some(r) = rows.iter_mut().find(|r| r.id == u.row_id) {
                r.amount = u.amount;
            }
        }
        let mut next_id = current.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        for i in &plan.inserts {
            rows.push(CurrentRow {
                id: next_id,
                ingredient_id: i.ingredient_id,
                amount: i.amount,
            });
            next_id += 1;
        }
        rows
    }

    fn pairs(rows: &[CurrentRow]) -> Vec<(i32, i32)> {
        let mut v: Vec<_> = rows.iter().map(|r| (r.ingredient_id, r.amount)).collect();
        v.sort();
        v
    }

    #[test]
    fn flour_egg_to_egg_milk() {
        let current = vec![
            CurrentRow { id: 10, ingredient_id: FLOUR, amount: 1 },
            CurrentRow { id: 11, ingredient_id: EGG, amount: 2 },
        ];
        let desired = vec![want(EGG, 3), want(MILK, 1)];

        let plan = plan_reconciliation(&current, &desired);
        assert_eq!(plan.deletes, vec![10]);
        assert_eq!(plan.updates, vec![AmountUpdate { row_id: 11, amount: 3 }]);
        assert_eq!(plan.inserts, vec![want(MILK, 1)]);

        let after = apply(&current, &plan);
        assert_eq!(pairs(&after), vec![(EGG, 3), (MILK, 1)]);
        // the egg row keeps its identity
        assert!(after.iter().any(|r| r.id == 11 && r.amount == 3));
    }

    #[test]
    fn reapplying_the_same_list_is_a_no_op() {
        let current = vec![CurrentRow { id: 1, ingredient_id: EGG, amount: 2 }];
        let desired = vec![want(EGG, 3), want(MILK, 1)];

        let once = apply(&current, &plan_reconciliation(&current, &desired));
        let second = plan_reconciliation(&once, &desired);
        assert!(second.is_empty());
        assert_eq!(pairs(&apply(&once, &second)), pairs(&once));
    }

    #[test]
    fn empty_current_inserts_everything() {
        let desired = vec![want(FLOUR, 100), want(EGG, 2)];
        let plan = plan_reconciliation(&[], &desired);
        assert_eq!(plan.inserts, desired);
        assert!(plan.updates.is_empty());
        assert!(plan.deletes.is_empty());
    }
}
