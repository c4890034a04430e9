//! Reduced ordered BDD manager with complement edges.
//!
//! This is the boolean engine behind [`BddSolver`][crate::solver::BddSolver].
//! Nodes are hash-consed, so two [`Ref`]s are equal iff they denote the same
//! boolean function. Variables are 1-indexed and ordered by their index.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;

use log::{debug, trace};

use crate::reference::Ref;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

pub struct Bdd {
    nodes: RefCell<Vec<Node>>,
    unique: RefCell<HashMap<Node, u32>>,
    cache: RefCell<HashMap<(Ref, Ref, Ref), Ref>>,
    pub zero: Ref,
    pub one: Ref,
}

impl Bdd {
    /// Create a manager with room for `2^capacity_bits` nodes before the
    /// storage has to grow.
    pub fn new(capacity_bits: usize) -> Self {
        assert!(
            capacity_bits <= 31,
            "Capacity bits should be in the range 0..=31"
        );

        let mut nodes = Vec::with_capacity(1 << capacity_bits);
        // Index 0 is a sentry, index 1 is the terminal.
        nodes.push(Node {
            variable: 0,
            low: Ref::positive(0),
            high: Ref::positive(0),
        });
        nodes.push(Node {
            variable: 0,
            low: Ref::positive(1),
            high: Ref::positive(1),
        });
        let one = Ref::positive(1);

        Self {
            nodes: RefCell::new(nodes),
            unique: RefCell::new(HashMap::new()),
            cache: RefCell::new(HashMap::new()),
            zero: -one,
            one,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(16)
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bdd")
            .field("nodes", &self.num_nodes())
            .field("cache", &self.cache.borrow().len())
            .finish()
    }
}

impl Bdd {
    /// Number of allocated nodes, including the terminal.
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len() - 1
    }

    pub fn variable(&self, node: Ref) -> u32 {
        self.nodes.borrow()[node.index() as usize].variable
    }

    /// Variable of the node, or `u32::MAX` for terminals, so that terminals
    /// sort below every variable.
    pub fn level(&self, node: Ref) -> u32 {
        if self.is_terminal(node) {
            u32::MAX
        } else {
            self.variable(node)
        }
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.nodes.borrow()[node.index() as usize].low;
        if node.is_negated() {
            -low
        } else {
            low
        }
    }

    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.nodes.borrow()[node.index() as usize].high;
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        self.is_zero(node) || self.is_one(node)
    }

    pub fn constant(&self, value: bool) -> Ref {
        if value {
            self.one
        } else {
            self.zero
        }
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        // The high edge is never complemented.
        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }

        if low == high {
            return low;
        }

        let node = Node {
            variable: v,
            low,
            high,
        };
        if let Some(&i) = self.unique.borrow().get(&node) {
            return Ref::positive(i);
        }

        let mut nodes = self.nodes.borrow_mut();
        let i = nodes.len() as u32;
        assert!(i < i32::MAX as u32, "BDD storage exhausted");
        nodes.push(node);
        self.unique.borrow_mut().insert(node, i);
        debug!("mk(v = {}, low = {}, high = {}) -> @{}", v, low, high, i);
        Ref::positive(i)
    }

    pub fn mk_var(&self, v: u32) -> Ref {
        self.mk_node(v, self.zero, self.one)
    }

    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        if self.level(node) > v {
            return (node, node);
        }
        assert_eq!(v, self.variable(node));
        (self.low_node(node), self.high_node(node))
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    ///
    /// # Examples
    ///
    /// ```
    /// use vsc_rs::bdd::Bdd;
    ///
    /// let bdd = Bdd::default();
    /// let x = bdd.mk_var(1);
    /// let y = bdd.mk_var(2);
    /// let z = bdd.mk_var(3);
    /// let f = bdd.apply_ite(x, y, z);
    /// let x_and_y = bdd.apply_and(x, y);
    /// let not_x_and_z = bdd.apply_and(-x, z);
    /// assert_eq!(f, bdd.apply_or(x_and_y, not_x_and_z));
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        // ite(1,G,H) => G
        // ite(0,G,H) => H
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }

        // ite(F,G,G) => G
        // ite(F,1,0) => F
        // ite(F,0,1) => ~F
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,G,~F) => ite(F,G,1)
        if g == f {
            return self.apply_ite(f, self.one, h);
        }
        if g == -f {
            return self.apply_ite(f, self.zero, h);
        }
        if h == f {
            return self.apply_ite(f, g, self.zero);
        }
        if h == -f {
            return self.apply_ite(f, g, self.one);
        }

        // ite(~F,G,H) => ite(F,H,G)
        let (f, g, h) = if f.is_negated() { (-f, h, g) } else { (f, g, h) };

        // ite(F,~G,H) => ~ite(F,G,~H)
        let (g, h, n) = if g.is_negated() {
            (-g, -h, true)
        } else {
            (g, h, false)
        };

        let key = (f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            trace!("cache: ite({}, {}, {}) -> {}", f, g, h, res);
            return if n { -res } else { res };
        }

        let m = self.level(f).min(self.level(g)).min(self.level(h));
        assert_ne!(m, u32::MAX);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0);
        let t = self.apply_ite(f1, g1, h1);
        let res = self.mk_node(m, e, t);
        self.cache.borrow_mut().insert(key, res);

        if n {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        nodes
            .into_iter()
            .fold(self.one, |acc, node| self.apply_and(acc, node))
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        nodes
            .into_iter()
            .fold(self.zero, |acc, node| self.apply_or(acc, node))
    }

    /// Evaluate `f` under a total assignment of its variables.
    pub fn evaluate(&self, f: Ref, assignment: impl Fn(u32) -> bool) -> bool {
        let mut current = f;
        while !self.is_terminal(current) {
            let v = self.variable(current);
            current = if assignment(v) {
                self.high_node(current)
            } else {
                self.low_node(current)
            };
        }
        self.is_one(current)
    }

    /// Indices of all nodes reachable from the given roots.
    pub fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<u32> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from_iter(nodes);

        while let Some(node) = queue.pop_front() {
            if visited.insert(node.index()) && !self.is_terminal(node) {
                queue.push_back(self.low_node(node));
                queue.push_back(self.high_node(node));
            }
        }

        visited
    }

    pub fn size(&self, f: Ref) -> usize {
        self.descendants([f]).len()
    }

    pub fn to_bracket_string(&self, node: Ref) -> String {
        if self.is_zero(node) {
            return "(0)".to_string();
        } else if self.is_one(node) {
            return "(1)".to_string();
        }

        format!(
            "{}:(x{}, {}, {})",
            node,
            self.variable(node),
            self.to_bracket_string(self.high_node(node)),
            self.to_bracket_string(self.low_node(node))
        )
    }
}
