use std::collections::HashMap;

use num_bigint::{BigUint, RandBigInt};
use rand::Rng;

use crate::bdd::Bdd;
use crate::reference::Ref;

impl Bdd {
    /// A satisfying path of `node` that takes the high branch whenever it
    /// can, as literals: `v` sets variable `v` to true, `-v` to false.
    /// Variables missing from the path may take either value.
    ///
    /// `None` if `node` is the constant false.
    pub fn one_sat(&self, node: Ref) -> Option<Vec<i32>> {
        if self.is_zero(node) {
            return None;
        }
        let mut path = Vec::new();
        let mut node = node;
        while !self.is_terminal(node) {
            let v = self.variable(node) as i32;
            let high = self.high_node(node);
            // Only the zero terminal is unsatisfiable in a reduced BDD.
            let (literal, next) = if self.is_zero(high) {
                (-v, self.low_node(node))
            } else {
                (v, high)
            };
            path.push(literal);
            node = next;
        }
        Some(path)
    }

    /// Number of assignments to variables `1..=num_vars` that satisfy `node`.
    pub fn sat_count(&self, node: Ref, num_vars: u32) -> BigUint {
        let mut cache = HashMap::new();
        let count = self.count_below(node, num_vars, &mut cache);
        count << (self.depth(node, num_vars) - 1) as usize
    }

    /// Draws an assignment to variables `1..=num_vars` uniformly at random
    /// among all assignments satisfying `node`.
    ///
    /// Element `v - 1` of the result is the value of variable `v`.
    pub fn random_sat<R: Rng + ?Sized>(
        &self,
        node: Ref,
        num_vars: u32,
        rng: &mut R,
    ) -> Option<Vec<bool>> {
        if self.is_zero(node) {
            return None;
        }

        // Variables skipped along the path are free, so they keep these bits.
        let mut assignment: Vec<bool> = (0..num_vars).map(|_| rng.gen()).collect();
        let mut cache = HashMap::new();
        let mut current = node;

        while !self.is_terminal(current) {
            let v = self.variable(current);
            assert!(v <= num_vars, "Variable {} is out of range", v);
            let low = self.low_node(current);
            let high = self.high_node(current);

            let weight_low = self.weight(low, v, num_vars, &mut cache);
            let weight_high = self.weight(high, v, num_vars, &mut cache);
            let total = &weight_low + &weight_high;

            let pick = rng.gen_biguint_below(&total);
            if pick < weight_high {
                assignment[(v - 1) as usize] = true;
                current = high;
            } else {
                assignment[(v - 1) as usize] = false;
                current = low;
            }
        }

        Some(assignment)
    }

    fn depth(&self, node: Ref, num_vars: u32) -> u32 {
        if self.is_terminal(node) {
            num_vars + 1
        } else {
            self.variable(node)
        }
    }

    /// Solutions of `child`, a child of a node on variable `v`, over the
    /// variables `v + 1..=num_vars`.
    fn weight(
        &self,
        child: Ref,
        v: u32,
        num_vars: u32,
        cache: &mut HashMap<Ref, BigUint>,
    ) -> BigUint {
        self.count_below(child, num_vars, cache) << (self.depth(child, num_vars) - v - 1) as usize
    }

    /// Satisfying assignments over the variables from `var(node)` to `num_vars`.
    fn count_below(
        &self,
        node: Ref,
        num_vars: u32,
        cache: &mut HashMap<Ref, BigUint>,
    ) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        } else if self.is_one(node) {
            return BigUint::from(1u32);
        }

        if let Some(count) = cache.get(&node) {
            return count.clone();
        }

        let v = self.variable(node);
        let low = self.low_node(node);
        let high = self.high_node(node);

        let count = self.weight(low, v, num_vars, cache) + self.weight(high, v, num_vars, cache);

        cache.insert(node, count.clone());
        count
    }
}
